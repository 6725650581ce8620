#![allow(dead_code)]

use std::time::Duration;

use blastgate_core::mocks::EventLog;
use blastgate_core::{GateController, PressOutcome, TimingCfg};
use blastgate_hardware::{MemoryStore, SimButton, SimKnob, SimRelay, SimServo};
use blastgate_traits::ManualClock;

/// Simulated wiring for a whole manifold, with handles kept for inspection.
pub struct Rig {
    pub servos: Vec<SimServo>,
    pub buttons: Vec<SimButton>,
    pub on_line: SimRelay,
    pub off_line: SimRelay,
    pub beeper: SimRelay,
    pub knob: SimKnob,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub log: EventLog,
}

impl Rig {
    pub fn new(gates: usize) -> Self {
        Self::with_store(gates, MemoryStore::blank())
    }

    pub fn with_store(gates: usize, store: MemoryStore) -> Self {
        Self {
            servos: (0..gates).map(|_| SimServo::new()).collect(),
            buttons: (0..gates).map(|_| SimButton::new()).collect(),
            on_line: SimRelay::new(),
            off_line: SimRelay::new(),
            beeper: SimRelay::new(),
            knob: SimKnob::new(512),
            store,
            clock: ManualClock::new(),
            log: EventLog::new(),
        }
    }

    pub fn controller(&self) -> GateController {
        let mut b = GateController::builder();
        for (servo, button) in self.servos.iter().zip(&self.buttons) {
            b = b.with_gate(servo.clone(), button.clone());
        }
        b.with_collector(self.on_line.clone(), self.off_line.clone())
            .with_knob(self.knob.clone())
            .with_store(self.store.clone())
            .with_beeper(self.beeper.clone())
            .with_sink(self.log.clone())
            .with_clock(Box::new(self.clock.clone()))
            .with_timing(TimingCfg::default())
            .build()
            .expect("build controller")
    }

    /// Build, boot, and forget everything boot wrote or emitted.
    pub fn booted(&self, programming: bool) -> GateController {
        let mut ctrl = self.controller();
        ctrl.boot(programming).expect("boot");
        self.clear();
        ctrl
    }

    pub fn clear(&self) {
        for s in &self.servos {
            s.clear();
        }
        self.on_line.clear();
        self.off_line.clear();
        self.beeper.clear();
        self.log.take();
    }

    /// Hold button `i` long enough to debounce, let go, and tick until the
    /// release has settled. Returns the presses handled along the way.
    pub fn tap(&self, ctrl: &mut GateController, i: usize) -> Vec<PressOutcome> {
        let mut handled = Vec::new();
        self.buttons[i].press();
        for _ in 0..20 {
            self.clock.advance(Duration::from_millis(5));
            handled.extend(ctrl.tick().expect("tick").handled);
        }
        self.buttons[i].release();
        for _ in 0..20 {
            self.clock.advance(Duration::from_millis(5));
            handled.extend(ctrl.tick().expect("tick").handled);
        }
        handled
    }

    pub fn servo_writes(&self) -> Vec<Vec<u8>> {
        self.servos.iter().map(SimServo::writes).collect()
    }
}
