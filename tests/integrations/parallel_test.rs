//! Integration tests for Parallel steps

use cadence_core::{yield_tick, FlowError, RunOutcome, Work};
use cadence_integration_tests::utils::driver;
use cadence_test_utils::{assert_pool_clean, Recorder};

/// Work that records its start, yields `ticks` times, then records its end
fn branch(recorder: &Recorder, name: &'static str, ticks: usize) -> Work {
    let recorder = recorder.clone();
    Work::new(move |_token| async move {
        recorder.record(format!("start {}", name));
        for _ in 0..ticks {
            yield_tick().await;
        }
        recorder.record(format!("end {}", name));
        Ok(())
    })
}

#[test]
fn test_parallel_starts_all_before_any_resumes() {
    let driver = driver();
    let owner = driver.host().create_owner("parallel");
    let recorder = Recorder::new();

    owner
        .flow()
        .parallel(vec![
            branch(&recorder, "f1", 3),
            branch(&recorder, "f2", 1),
            branch(&recorder, "f3", 2),
        ])
        .call(recorder.hook("after"))
        .run(false);

    assert_eq!(recorder.events(), vec!["start f1", "start f2", "start f3"]);

    driver.tick();
    assert_eq!(recorder.count("end f2"), 1);
    driver.tick();
    assert_eq!(recorder.count("end f3"), 1);
    driver.tick();
    assert_eq!(recorder.count("end f1"), 1);
    // All branches are done; the step still yields one tick.
    assert_eq!(recorder.count("after"), 0);

    driver.tick();
    assert_eq!(recorder.count("after"), 1);
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_parallel_of_synchronous_work_still_yields() {
    let driver = driver();
    let owner = driver.host().create_owner("sync-parallel");
    let recorder = Recorder::new();

    let handle = owner
        .flow()
        .parallel(vec![branch(&recorder, "a", 0), branch(&recorder, "b", 0)])
        .call(recorder.hook("after"))
        .run(false);

    assert_eq!(
        recorder.events(),
        vec!["start a", "end a", "start b", "end b"]
    );
    assert!(!handle.is_finished());

    driver.tick();
    assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
    assert_eq!(recorder.count("after"), 1);
}

#[test]
fn test_cancelled_branch_cancels_parallel_step() {
    let driver = driver();
    let owner = driver.host().create_owner("parallel-cancel");
    let recorder = Recorder::new();

    let handle = owner
        .flow()
        .parallel(vec![
            branch(&recorder, "slow", 5),
            Work::new(|_token| async {
                yield_tick().await;
                Err(FlowError::Cancelled)
            }),
        ])
        .call(recorder.hook("after"))
        .run(false);

    driver.tick();

    assert_eq!(handle.outcome(), Some(RunOutcome::Cancelled));
    assert_eq!(recorder.events(), vec!["start slow"]);
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_failing_branch_faults_run() {
    let driver = driver();
    let owner = driver.host().create_owner("parallel-fault");

    let handle = owner
        .flow()
        .parallel(vec![Work::new(|_token| async {
            Err(FlowError::Step("branch failed".to_string()))
        })])
        .run(false);

    assert_eq!(
        handle.outcome(),
        Some(RunOutcome::Faulted(FlowError::Step(
            "branch failed".to_string()
        )))
    );
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_branches_observe_owner_cancellation() {
    let driver = driver();
    let owner = driver.host().create_owner("parallel-owner");
    let recorder = Recorder::new();

    let watcher = recorder.clone();
    let handle = owner
        .flow()
        .parallel(vec![Work::new(move |token| async move {
            while !token.is_cancelled() {
                yield_tick().await;
            }
            watcher.record("saw cancel");
            Err(FlowError::Cancelled)
        })])
        .run(false);

    driver.ticks(3);
    owner.destroy();
    driver.tick();

    assert_eq!(recorder.events(), vec!["saw cancel"]);
    assert_eq!(handle.outcome(), Some(RunOutcome::Cancelled));
}
