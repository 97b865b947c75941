//! Integration tests for step ordering and breaks
//!
//! Steps run strictly in append order; a break stops the chain and every
//! nested chain sharing its break state.

use cadence_core::RunOutcome;
use cadence_integration_tests::utils::driver;
use cadence_test_utils::{assert_pool_clean, Recorder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn test_steps_run_in_append_order() {
    let driver = driver();
    let owner = driver.host().create_owner("ordering");
    let recorder = Recorder::new();

    let nested = recorder.clone();
    let handle = owner
        .flow()
        .call(recorder.hook("a"))
        .wait_frames(1)
        .call(recorder.hook("b"))
        .when(
            || true,
            move |c| c.call(nested.hook("c")).wait_frames(2).call(nested.hook("d")),
        )
        .play({
            let recorder = recorder.clone();
            move |_| async move {
                recorder.record("e");
                Ok(())
            }
        })
        .call(recorder.hook("f"))
        .run(false);

    assert!(driver.run_until_idle(20).is_some());
    assert_eq!(recorder.events(), vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_if_yields_one_tick_after_branch() {
    let driver = driver();
    let owner = driver.host().create_owner("branching");

    let recorder = Recorder::new();
    let nested = recorder.clone();
    let taken = owner
        .flow()
        .when(|| true, move |c| c.call(nested.hook("then")))
        .call(recorder.hook("after"))
        .run(false);

    assert_eq!(recorder.events(), vec!["then"]);
    driver.tick();
    assert_eq!(recorder.events(), vec!["then", "after"]);
    assert_eq!(taken.outcome(), Some(RunOutcome::Completed));

    let recorder = Recorder::new();
    let (then_hook, else_hook) = (recorder.clone(), recorder.clone());
    let otherwise = owner
        .flow()
        .if_else(
            || false,
            move |c| c.call(then_hook.hook("then")),
            move |c| c.call(else_hook.hook("else")),
        )
        .call(recorder.hook("after"))
        .run(false);

    assert_eq!(recorder.events(), vec!["else"]);
    driver.tick();
    assert_eq!(recorder.events(), vec!["else", "after"]);
    assert_eq!(otherwise.outcome(), Some(RunOutcome::Completed));
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_stop_chain_skips_remaining_steps() {
    let driver = driver();
    let owner = driver.host().create_owner("stop");
    let recorder = Recorder::new();

    let handle = owner
        .flow()
        .call(recorder.hook("before"))
        .stop_chain()
        .call(recorder.hook("after"))
        .wait_frames(3)
        .run(false);

    assert_eq!(handle.outcome(), Some(RunOutcome::Broken));
    assert_eq!(recorder.events(), vec!["before"]);
    assert_eq!(driver.host().in_flight(), 0);
}

#[test]
fn test_stop_inside_nested_chain_halts_every_level() {
    let driver = driver();
    let owner = driver.host().create_owner("nested-stop");
    let recorder = Recorder::new();

    let body = recorder.clone();
    let handle = owner
        .flow()
        .repeat(3, move |c| {
            c.call(body.hook("body"))
                .stop_chain()
                .call(body.hook("unreachable"))
        })
        .call(recorder.hook("after"))
        .run(false);

    driver.run_until_idle(10);

    assert_eq!(recorder.events(), vec!["body"]);
    assert_eq!(handle.outcome(), Some(RunOutcome::Broken));
    assert_eq!(assert_pool_clean(driver.host()), Ok(()));
}

#[test]
fn test_stop_in_else_branch_after_wait() {
    let driver = driver();
    let owner = driver.host().create_owner("branch-stop");
    let recorder = Recorder::new();

    let then_rec = recorder.clone();
    let else_rec = recorder.clone();
    let handle = owner
        .flow()
        .if_else(
            || false,
            move |c| c.call(then_rec.hook("then")),
            move |c| c.wait_frames(1).call(else_rec.hook("else")).stop_chain(),
        )
        .call(recorder.hook("after"))
        .run(false);

    assert!(!handle.is_finished());
    driver.run_until_idle(10);

    assert_eq!(recorder.events(), vec!["else"]);
    assert_eq!(handle.outcome(), Some(RunOutcome::Broken));
}

#[test]
fn test_stop_chain_if_halts_only_when_immediate_and_true() {
    let driver = driver();
    let owner = driver.host().create_owner("stop-if");
    let recorder = Recorder::new();

    let halted = owner
        .flow()
        .stop_chain_if(|| true, true)
        .call(recorder.hook("true-immediate"))
        .run(false);
    let not_immediate = owner
        .flow()
        .stop_chain_if(|| true, false)
        .call(recorder.hook("true-deferred"))
        .run(false);
    let false_condition = owner
        .flow()
        .stop_chain_if(|| false, true)
        .call(recorder.hook("false-immediate"))
        .run(false);

    assert_eq!(halted.outcome(), Some(RunOutcome::Broken));
    assert_eq!(not_immediate.outcome(), Some(RunOutcome::Completed));
    assert_eq!(false_condition.outcome(), Some(RunOutcome::Completed));
    assert_eq!(
        recorder.events(),
        vec!["true-deferred", "false-immediate"]
    );
}

#[test]
fn test_stop_chain_if_evaluates_condition_when_reached() {
    let driver = driver();
    let owner = driver.host().create_owner("late-condition");
    let recorder = Recorder::new();
    let flag = Arc::new(AtomicBool::new(false));

    let setter = flag.clone();
    let reader = flag.clone();
    let handle = owner
        .flow()
        .call(move || setter.store(true, Ordering::SeqCst))
        .stop_chain_if(move || reader.load(Ordering::SeqCst), true)
        .call(recorder.hook("after"))
        .run(false);

    assert_eq!(handle.outcome(), Some(RunOutcome::Broken));
    assert!(recorder.is_empty());
}

#[test]
fn test_break_does_not_leak_into_next_spawn() {
    let driver = driver();
    let owner = driver.host().create_owner("fresh-break");
    let recorder = Recorder::new();

    owner.flow().stop_chain().run(false);
    let handle = owner.flow().call(recorder.hook("ran")).run(false);

    assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
    assert_eq!(recorder.events(), vec!["ran"]);
}
