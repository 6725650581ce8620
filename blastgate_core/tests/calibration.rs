mod common;

use blastgate_core::store::record_addr;
use blastgate_core::{CalibrationSession, Endpoint, GateEvent, Mode, PressOutcome};
use common::Rig;
use rstest::rstest;

#[rstest]
fn taught_endpoints_survive_a_reboot() {
    let rig = Rig::new(6);
    let mut ctrl = rig.booted(true);
    assert_eq!(ctrl.mode(), Some(Mode::Programming));

    assert_eq!(ctrl.press(2).unwrap(), PressOutcome::CaptureStarted { gate: 2 });
    rig.knob.set(1000);
    assert_eq!(
        ctrl.press(2).unwrap(),
        PressOutcome::OpenCaptured { gate: 2, raw: 250 }
    );
    rig.knob.set(0);
    assert_eq!(
        ctrl.press(2).unwrap(),
        PressOutcome::Committed {
            gate: 2,
            open_angle: 151,
            close_angle: 26,
        }
    );
    assert_eq!(ctrl.session(), CalibrationSession::Idle);
    assert_eq!(ctrl.angles(2).unwrap(), (151, 26));
    drop(ctrl);

    // Same store, new controller
    let fresh = Rig::with_store(6, rig.store.clone());
    let ctrl = fresh.booted(false);
    assert_eq!(ctrl.angles(2).unwrap(), (151, 26));
    assert_eq!(ctrl.angles(1).unwrap(), (90, 90));
}

#[rstest]
fn commit_rehomes_the_gate_closed() {
    let rig = Rig::new(3);
    let mut ctrl = rig.booted(true);
    ctrl.press(1).unwrap();
    rig.knob.set(1000);
    ctrl.press(1).unwrap();
    rig.knob.set(0);
    ctrl.press(1).unwrap();

    assert_eq!(rig.servos[1].last_angle(), Some(26));
    assert!(!ctrl.is_open(1).unwrap());
    assert!(!ctrl.collector_on());
    assert_eq!(rig.on_line.pulse_count(), 0);
}

#[rstest]
fn switching_gates_abandons_the_capture() {
    let rig = Rig::new(6);
    let mut ctrl = rig.booted(true);
    let before = rig.store.snapshot();

    ctrl.press(1).unwrap();
    assert_eq!(ctrl.session(), CalibrationSession::CapturingOpen { gate: 1 });
    rig.knob.set(900);
    ctrl.press(3).unwrap();
    assert_eq!(ctrl.session(), CalibrationSession::CapturingOpen { gate: 3 });

    let after = rig.store.snapshot();
    for endpoint in [Endpoint::Open, Endpoint::Close] {
        let addr = usize::from(record_addr(1, endpoint).unwrap());
        assert_eq!(after[addr], before[addr]);
    }
    assert_eq!(after, before);
}

#[rstest]
fn switching_mid_close_capture_keeps_the_open_byte_only() {
    let rig = Rig::new(4);
    let mut ctrl = rig.booted(true);
    rig.knob.set(800);
    ctrl.press(0).unwrap();
    ctrl.press(0).unwrap();
    assert_eq!(ctrl.session(), CalibrationSession::CapturingClose { gate: 0 });

    ctrl.press(2).unwrap();
    let bytes = rig.store.snapshot();
    assert_eq!(bytes[usize::from(record_addr(0, Endpoint::Open).unwrap())], 200);
    assert_eq!(bytes[usize::from(record_addr(0, Endpoint::Close).unwrap())], 128);
    // not applied until the close endpoint is committed
    assert_eq!(ctrl.angles(0).unwrap(), (90, 90));
}

#[rstest]
fn ticks_preview_the_knob_on_the_selected_gate() {
    let rig = Rig::new(3);
    let mut ctrl = rig.booted(true);

    // nothing selected yet: no preview
    assert_eq!(ctrl.tick().unwrap().preview, None);

    ctrl.press(2).unwrap();
    rig.knob.set(1023);
    assert_eq!(ctrl.tick().unwrap().preview, Some(153));
    rig.knob.set(0);
    assert_eq!(ctrl.tick().unwrap().preview, Some(26));
    assert_eq!(rig.servos[2].writes(), vec![153, 26]);
    assert!(rig.servos[0].writes().is_empty());
    // preview does not change the commanded state
    assert!(!ctrl.is_open(2).unwrap());
}

#[rstest]
fn programming_events_announce_each_phase() {
    let rig = Rig::new(2);
    let mut ctrl = rig.booted(true);
    rig.knob.set(1000);
    ctrl.press(1).unwrap();
    ctrl.press(1).unwrap();
    rig.knob.set(0);
    ctrl.press(1).unwrap();

    assert_eq!(
        rig.log.events(),
        vec![
            GateEvent::PressAccepted { gate: 1 },
            GateEvent::CalibrationEntered {
                gate: 1,
                phase: Endpoint::Open
            },
            GateEvent::PressAccepted { gate: 1 },
            GateEvent::EndpointCaptured {
                gate: 1,
                endpoint: Endpoint::Open,
                raw: 250
            },
            GateEvent::CalibrationEntered {
                gate: 1,
                phase: Endpoint::Close
            },
            GateEvent::PressAccepted { gate: 1 },
            GateEvent::EndpointCaptured {
                gate: 1,
                endpoint: Endpoint::Close,
                raw: 0
            },
            GateEvent::CalibrationCommitted {
                gate: 1,
                open_angle: 151,
                close_angle: 26
            },
        ]
    );
}

#[rstest]
fn held_button_at_boot_enters_programming_mode() {
    let rig = Rig::new(3);
    rig.buttons[1].press();
    let mut ctrl = rig.controller();
    assert_eq!(ctrl.boot(false).unwrap(), Mode::Programming);

    // the held button debounces into a press that selects its gate
    let mut handled = Vec::new();
    for _ in 0..10 {
        rig.clock.advance(std::time::Duration::from_millis(5));
        handled.extend(ctrl.tick().unwrap().handled);
    }
    assert_eq!(handled, vec![PressOutcome::CaptureStarted { gate: 1 }]);
}

#[rstest]
fn debounced_taps_teach_a_gate() {
    let rig = Rig::new(3);
    let mut ctrl = rig.booted(true);
    rig.knob.set(600);
    rig.tap(&mut ctrl, 0);
    rig.tap(&mut ctrl, 0);
    rig.knob.set(100);
    let out = rig.tap(&mut ctrl, 0);
    assert_eq!(
        out,
        vec![PressOutcome::Committed {
            gate: 0,
            open_angle: 90 + (150 - 128) / 2,
            close_angle: 90 - (128 - 25) / 2,
        }]
    );
}
