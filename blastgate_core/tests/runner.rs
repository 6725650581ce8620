mod common;

use std::sync::atomic::AtomicBool;

use blastgate_core::run;
use common::Rig;
use rstest::rstest;

#[rstest]
fn stop_flag_set_before_start_runs_nothing() {
    let rig = Rig::new(2);
    let mut ctrl = rig.booted(false);
    let stop = AtomicBool::new(true);
    let summary = run(&mut ctrl, &stop, None).unwrap();
    assert_eq!(summary.ticks, 0);
    assert_eq!(summary.presses, 0);
}

#[rstest]
fn held_button_is_dispatched_once_by_the_loop() {
    let rig = Rig::new(2);
    let mut ctrl = rig.booted(false);
    rig.buttons[1].press();
    let stop = AtomicBool::new(false);

    // 200 Hz => 5 ms per tick on the manual clock
    let summary = run(&mut ctrl, &stop, Some(50)).unwrap();
    assert_eq!(summary.ticks, 50);
    assert_eq!(summary.presses, 1);
    assert_eq!(ctrl.open_gates(), vec![1]);
}

#[rstest]
fn unbooted_controller_ends_the_loop_with_an_error() {
    let rig = Rig::new(1);
    let mut ctrl = rig.controller();
    let stop = AtomicBool::new(false);
    assert!(run(&mut ctrl, &stop, Some(5)).is_err());
}
