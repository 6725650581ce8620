mod common;

use std::time::Duration;

use blastgate_core::{Debouncer, Edge, InputCfg, TimingCfg};
use blastgate_hardware::{MemoryStore, SimButton, SimKnob, SimRelay, SimServo};
use blastgate_traits::ManualClock;
use common::Rig;
use proptest::prelude::*;
use rstest::rstest;

proptest! {
    // A glitch shorter than the window around a stable level never commits.
    #[test]
    fn short_glitch_yields_no_transition(
        start in 100u64..10_000,
        width in 0u64..30,
        step in 1u64..5,
    ) {
        let mut d = Debouncer::new(30);
        let mut edges = 0;
        let mut t = 0;
        while t < start {
            edges += usize::from(d.sample(false, t).is_some());
            t += step;
        }
        let glitch_end = t + width;
        while t <= glitch_end {
            edges += usize::from(d.sample(true, t).is_some());
            t += step;
        }
        for _ in 0..200 {
            edges += usize::from(d.sample(false, t).is_some());
            t += step;
        }
        prop_assert_eq!(edges, 0);
        prop_assert!(!d.stable());
    }

    // A level held past the window commits exactly once, however often sampled.
    #[test]
    fn sustained_change_yields_one_transition(
        start in 0u64..10_000,
        hold in 31u64..500,
        step in 1u64..10,
    ) {
        let mut d = Debouncer::new(30);
        let mut edges = Vec::new();
        let mut t = start;
        while t <= start + hold {
            if let Some(e) = d.sample(true, t) {
                edges.push(e);
            }
            t += step;
        }
        // the last sample may land before the window closes; one more settles it
        if let Some(e) = d.sample(true, start + hold + 1) {
            edges.push(e);
        }
        prop_assert_eq!(edges, vec![Edge::Pressed]);
    }
}

#[rstest]
fn bounce_on_a_real_button_is_ignored() {
    let rig = Rig::new(2);
    let mut ctrl = rig.booted(false);
    for level in [true, false, true, false] {
        rig.buttons[0].set_high(level);
        rig.clock.advance(Duration::from_millis(5));
        assert!(ctrl.tick().unwrap().is_idle());
    }
    for _ in 0..20 {
        rig.clock.advance(Duration::from_millis(5));
        assert!(ctrl.tick().unwrap().is_idle());
    }
    assert!(ctrl.open_gates().is_empty());
}

#[rstest]
fn active_low_wiring_inverts_the_level() {
    let clock = ManualClock::new();
    let button = SimButton::new();
    // idle line is high on active-low wiring
    button.set_high(true);
    let servo = SimServo::new();
    let mut ctrl = blastgate_core::GateController::builder()
        .with_gate(servo.clone(), button.clone())
        .with_collector(SimRelay::new(), SimRelay::new())
        .with_knob(SimKnob::new(0))
        .with_store(MemoryStore::blank())
        .with_clock(Box::new(clock.clone()))
        .with_input(InputCfg { active_low: true })
        .with_timing(TimingCfg::default())
        .build()
        .unwrap();
    assert_eq!(ctrl.boot(false).unwrap(), blastgate_core::Mode::Normal);

    button.set_high(false);
    let mut handled = Vec::new();
    for _ in 0..10 {
        clock.advance(Duration::from_millis(5));
        handled.extend(ctrl.tick().unwrap().handled);
    }
    assert_eq!(handled.len(), 1);
    assert!(ctrl.is_open(0).unwrap());
}
