mod common;

use blastgate_core::feedback::pattern_for;
use blastgate_core::{FeedbackCfg, GateController, GateEvent};
use blastgate_hardware::{MemoryStore, SimButton, SimKnob, SimRelay, SimServo};
use blastgate_traits::ManualClock;
use common::Rig;
use rstest::rstest;

#[rstest]
#[case(false, 1 + 2)]
#[case(true, 1 + 3)]
fn boot_beeps(#[case] programming: bool, #[case] beeps: usize) {
    let rig = Rig::new(2);
    let mut ctrl = rig.controller();
    ctrl.boot(programming).unwrap();
    assert_eq!(rig.beeper.pulse_count(), beeps);
}

#[rstest]
fn selection_beeps_once_then_twice() {
    let rig = Rig::new(3);
    let mut ctrl = rig.booted(false);
    ctrl.press(0).unwrap();
    assert_eq!(rig.beeper.pulse_count(), 3);
    rig.clear();

    // toggling the collector is acknowledged with a single beep
    ctrl.press(0).unwrap();
    assert_eq!(rig.beeper.pulse_count(), 1);
}

#[rstest]
fn calibration_beeps_grow_with_each_phase() {
    let rig = Rig::new(2);
    let mut ctrl = rig.booted(true);
    let mut counts = Vec::new();
    for _ in 0..3 {
        rig.beeper.clear();
        ctrl.press(1).unwrap();
        counts.push(rig.beeper.pulse_count());
    }
    assert_eq!(counts, vec![1, 2, 3]);
}

#[rstest]
fn captured_endpoints_wait_a_gap_before_beeping() {
    let open = pattern_for(&GateEvent::EndpointCaptured {
        gate: 0,
        endpoint: blastgate_core::Endpoint::Open,
        raw: 1,
    })
    .unwrap();
    assert!(open.lead_gap);
    assert_eq!(open.beeps, 1);
}

#[rstest]
fn disabled_feedback_keeps_the_line_quiet() {
    let beeper = SimRelay::new();
    let mut ctrl = GateController::builder()
        .with_gate(SimServo::new(), SimButton::new())
        .with_collector(SimRelay::new(), SimRelay::new())
        .with_knob(SimKnob::new(0))
        .with_store(MemoryStore::blank())
        .with_beeper(beeper.clone())
        .with_feedback(FeedbackCfg {
            enabled: false,
            ..FeedbackCfg::default()
        })
        .with_clock(Box::new(ManualClock::new()))
        .build()
        .unwrap();
    ctrl.boot(false).unwrap();
    ctrl.press(0).unwrap();
    assert!(beeper.history().is_empty());
}
