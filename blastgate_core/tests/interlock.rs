mod common;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use blastgate_core::{GateError, GateEvent, PressOutcome, StatusSink};
use common::Rig;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
fn select_toggle_and_switch_scenario() {
    let rig = Rig::new(6);
    let mut ctrl = rig.booted(false);
    assert!(ctrl.open_gates().is_empty());
    assert!(!ctrl.collector_on());

    // Press 2: gate 2 opens, collector starts, nothing else moves
    let out = ctrl.press(2).unwrap();
    assert_eq!(out, PressOutcome::Selected { gate: 2 });
    assert_eq!(ctrl.open_gates(), vec![2]);
    assert!(ctrl.collector_on());
    let writes = rig.servo_writes();
    assert_eq!(writes[2], vec![90]);
    for j in [0, 1, 3, 4, 5] {
        assert!(writes[j].is_empty(), "gate {j} should not be commanded");
    }
    assert_eq!(rig.on_line.pulse_count(), 1);
    assert_eq!(rig.off_line.pulse_count(), 0);
    rig.clear();

    // Press 2 again: only the collector changes
    let out = ctrl.press(2).unwrap();
    assert_eq!(out, PressOutcome::CollectorToggled { gate: 2, on: false });
    assert!(ctrl.is_open(2).unwrap());
    assert!(!ctrl.collector_on());
    assert!(rig.servo_writes().iter().all(Vec::is_empty));
    assert_eq!(rig.off_line.pulse_count(), 1);
    rig.clear();

    // Press 4: gate 4 opens, collector back on, gate 2 closes
    ctrl.press(4).unwrap();
    assert_eq!(ctrl.open_gates(), vec![4]);
    assert!(ctrl.collector_on());
    let writes = rig.servo_writes();
    assert_eq!(writes[4].len(), 1);
    assert_eq!(writes[2].len(), 1);
    assert_eq!(rig.on_line.pulse_count(), 1);
}

#[rstest]
fn toggling_twice_restarts_suction_without_servo_commands() {
    let rig = Rig::new(3);
    let mut ctrl = rig.booted(false);
    ctrl.press(1).unwrap();
    rig.clear();

    ctrl.press(1).unwrap();
    ctrl.press(1).unwrap();
    assert!(ctrl.collector_on());
    assert_eq!(rig.servos[1].write_count(), 0);
    assert_eq!(rig.off_line.pulse_count(), 1);
    assert_eq!(rig.on_line.pulse_count(), 1);
}

#[rstest]
fn selection_events_are_ordered_open_collector_close() {
    let rig = Rig::new(4);
    let mut ctrl = rig.booted(false);
    ctrl.press(0).unwrap();
    // collector stays on, so only the gates move
    rig.clear();
    ctrl.press(3).unwrap();
    assert_eq!(
        rig.log.events(),
        vec![
            GateEvent::PressAccepted { gate: 3 },
            GateEvent::GateOpening { gate: 3 },
            GateEvent::GateOpen { gate: 3 },
            GateEvent::GateClosing { gate: 0 },
            GateEvent::GateClosed { gate: 0 },
            GateEvent::SelectionComplete { gate: 3 },
        ]
    );

    ctrl.press(3).unwrap(); // collector off
    rig.clear();
    ctrl.press(1).unwrap();
    assert_eq!(
        rig.log.events(),
        vec![
            GateEvent::PressAccepted { gate: 1 },
            GateEvent::GateOpening { gate: 1 },
            GateEvent::GateOpen { gate: 1 },
            GateEvent::CollectorOn,
            GateEvent::GateClosing { gate: 3 },
            GateEvent::GateClosed { gate: 3 },
            GateEvent::SelectionComplete { gate: 1 },
        ]
    );
}

#[rstest]
fn each_move_waits_for_the_settle_time() {
    let rig = Rig::new(2);
    let mut ctrl = rig.booted(false);
    let before = rig.clock.elapsed().as_millis();
    ctrl.press(0).unwrap();
    // open (750) + collector pulse (500) + beeps (1 + 2 beeps, 1 gap)
    let beeps = 3 * 200 + 100;
    assert_eq!(rig.clock.elapsed().as_millis() - before, 750 + 500 + beeps);
}

#[rstest]
#[case(6)]
#[case(42)]
fn press_outside_the_manifold_is_rejected(#[case] gate: usize) {
    let rig = Rig::new(6);
    let mut ctrl = rig.booted(false);
    let err = ctrl.press(gate).unwrap_err();
    match err.downcast_ref::<GateError>() {
        Some(GateError::InvalidGate { gate: g, count: 6 }) => assert_eq!(*g, gate),
        other => panic!("expected InvalidGate, got {other:?}"),
    }
    assert!(rig.log.events().is_empty());
}

#[rstest]
fn presses_before_boot_are_refused() {
    let rig = Rig::new(2);
    let mut ctrl = rig.controller();
    let err = ctrl.press(0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GateError>(),
        Some(GateError::State(_))
    ));
    assert!(ctrl.tick().is_err());
}

#[rstest]
fn debounced_taps_drive_the_interlock() {
    let rig = Rig::new(3);
    let mut ctrl = rig.booted(false);

    assert_eq!(rig.tap(&mut ctrl, 1), vec![PressOutcome::Selected { gate: 1 }]);
    assert_eq!(rig.tap(&mut ctrl, 2), vec![PressOutcome::Selected { gate: 2 }]);
    assert_eq!(ctrl.open_gates(), vec![2]);
    assert!(ctrl.collector_on());
}

/// Tracks gate and collector state from events alone and checks that suction
/// never runs without an open path, at every intermediate step.
#[derive(Clone, Default)]
struct PathWatch {
    state: Rc<RefCell<ProbeState>>,
}

#[derive(Default)]
struct ProbeState {
    open: BTreeSet<usize>,
    collector_on: bool,
    violations: Vec<String>,
}

impl StatusSink for PathWatch {
    fn on_event(&mut self, event: &GateEvent) {
        let mut st = self.state.borrow_mut();
        match *event {
            GateEvent::GateOpen { gate } => {
                st.open.insert(gate);
            }
            GateEvent::GateClosed { gate } => {
                st.open.remove(&gate);
            }
            GateEvent::CollectorOn => st.collector_on = true,
            GateEvent::CollectorOff => st.collector_on = false,
            _ => {}
        }
        if st.collector_on && st.open.is_empty() {
            let msg = format!("suction with no open gate after {event:?}");
            st.violations.push(msg);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn exclusive_open_and_path_hold_for_any_press_sequence(
        presses in proptest::collection::vec(0usize..6, 1..40)
    ) {
        let rig = Rig::new(6);
        let watch = PathWatch::default();
        let mut ctrl = {
            let mut b = blastgate_core::GateController::builder();
            for (s, btn) in rig.servos.iter().zip(&rig.buttons) {
                b = b.with_gate(s.clone(), btn.clone());
            }
            b.with_collector(rig.on_line.clone(), rig.off_line.clone())
                .with_knob(rig.knob.clone())
                .with_store(rig.store.clone())
                .with_sink(watch.clone())
                .with_clock(Box::new(rig.clock.clone()))
                .build()
                .unwrap()
        };
        ctrl.boot(false).unwrap();

        for &p in &presses {
            ctrl.press(p).unwrap();
            prop_assert!(ctrl.open_gates().len() <= 1);
            if ctrl.collector_on() {
                prop_assert!(!ctrl.open_gates().is_empty());
            }
        }
        let st = watch.state.borrow();
        prop_assert!(st.violations.is_empty(), "{:?}", st.violations);
    }
}
