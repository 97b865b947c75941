//! Integration tests for Repeat and While

use cadence_core::RunOutcome;
use cadence_integration_tests::utils::driver;
use cadence_test_utils::{assert_pool_clean, Recorder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_repeat_three_increments_counter_three_times() {
    let driver = driver();
    let owner = driver.host().create_owner("repeat");
    let counter = Arc::new(AtomicUsize::new(0));

    let body_counter = counter.clone();
    let handle = owner
        .flow()
        .repeat(3, move |c| {
            let counter = body_counter.clone();
            c.call(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
        .run(false);

    assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_repeat_iterations_never_overlap() {
    let driver = driver();
    let owner = driver.host().create_owner("sequential");
    let recorder = Recorder::new();

    let body = recorder.clone();
    owner
        .flow()
        .repeat(3, move |c| {
            c.call(body.hook("start"))
                .wait_frames(1)
                .call(body.hook("end"))
        })
        .run(false);

    assert_eq!(driver.run_until_idle(10), Some(3));
    assert_eq!(
        recorder.events(),
        vec!["start", "end", "start", "end", "start", "end"]
    );
}

#[test]
fn test_repeat_zero_runs_nothing() {
    let driver = driver();
    let owner = driver.host().create_owner("zero");
    let recorder = Recorder::new();

    let body = recorder.clone();
    let handle = owner
        .flow()
        .repeat(0, move |c| c.call(body.hook("body")))
        .call(recorder.hook("after"))
        .run(false);

    assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
    assert_eq!(recorder.events(), vec!["after"]);
}

#[test]
fn test_while_with_false_condition_never_runs_body() {
    let driver = driver();
    let owner = driver.host().create_owner("while-false");
    let recorder = Recorder::new();

    let body = recorder.clone();
    let handle = owner
        .flow()
        .while_loop(|| false, move |c| c.call(body.hook("body")))
        .call(recorder.hook("after"))
        .run(false);

    assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
    assert_eq!(recorder.events(), vec!["after"]);
}

#[test]
fn test_while_rechecks_condition_each_tick() {
    let driver = driver();
    let owner = driver.host().create_owner("while");
    let counter = Arc::new(AtomicUsize::new(0));

    let condition = counter.clone();
    let body_counter = counter.clone();
    let handle = owner
        .flow()
        .while_loop(
            move || condition.load(Ordering::SeqCst) < 3,
            move |c| {
                let counter = body_counter.clone();
                c.call(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            },
        )
        .run(false);

    // One body per tick: the loop yields after every iteration.
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    driver.tick();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    driver.tick();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert!(!handle.is_finished());

    driver.tick();
    assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn test_while_stops_on_break_from_body() {
    let driver = driver();
    let owner = driver.host().create_owner("while-break");
    let recorder = Recorder::new();

    let body = recorder.clone();
    let handle = owner
        .flow()
        .while_loop(|| true, move |c| c.call(body.hook("body")).stop_chain())
        .call(recorder.hook("after"))
        .run(false);

    assert_eq!(handle.outcome(), Some(RunOutcome::Broken));
    assert_eq!(recorder.events(), vec!["body"]);
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_while_stops_when_owner_destroyed() {
    let driver = driver();
    let owner = driver.host().create_owner("while-cancel");
    let recorder = Recorder::new();

    let body = recorder.clone();
    let handle = owner
        .flow()
        .while_loop(|| true, move |c| c.call(body.hook("body")))
        .run(false);

    driver.ticks(2);
    owner.destroy();
    driver.tick();

    assert_eq!(handle.outcome(), Some(RunOutcome::Cancelled));
    assert_eq!(recorder.count("body"), 3);
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_nested_loops_reuse_pooled_chains() {
    let driver = driver();
    let owner = driver.host().create_owner("nested-loops");
    let counter = Arc::new(AtomicUsize::new(0));

    let outer = counter.clone();
    let handle = owner
        .flow()
        .repeat(4, move |c| {
            let inner = outer.clone();
            c.repeat(5, move |c| {
                let counter = inner.clone();
                c.call(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
        })
        .run(false);

    assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
    assert_eq!(counter.load(Ordering::SeqCst), 20);
    // Root, one outer body and one inner body are live at the same time at most.
    assert_eq!(driver.host().pool().stats().created, 3);
}
