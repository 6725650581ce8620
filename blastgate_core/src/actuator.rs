//! Gates and the command-and-wait actuator that moves them.

use std::time::Duration;

use blastgate_traits::{Clock, ServoOutput};
use tracing::debug;

use crate::error::Result;
use crate::events::{EventBus, GateEvent};
use crate::hw_error::driver;
use crate::store::RawEndpoints;

/// One manifold port: its servo, taught angles and commanded state.
pub struct Gate {
    id: usize,
    open_angle: u8,
    close_angle: u8,
    is_open: bool,
    servo: Box<dyn ServoOutput>,
}

impl Gate {
    pub fn new(id: usize, servo: Box<dyn ServoOutput>) -> Self {
        let neutral = RawEndpoints::NEUTRAL;
        Self {
            id,
            open_angle: neutral.open_angle(),
            close_angle: neutral.close_angle(),
            is_open: false,
            servo,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// `(open_angle, close_angle)`
    pub fn angles(&self) -> (u8, u8) {
        (self.open_angle, self.close_angle)
    }

    /// Take both angles from stored calibration bytes.
    pub fn apply(&mut self, raw: RawEndpoints) {
        self.open_angle = raw.open_angle();
        self.close_angle = raw.close_angle();
    }

    /// Drive the servo straight to its close angle and mark the gate closed.
    /// No settle wait and no events.
    pub fn home(&mut self) -> Result<()> {
        driver(self.servo.write_angle(self.close_angle), "home gate servo")?;
        self.is_open = false;
        Ok(())
    }

    /// Write an arbitrary angle without touching the commanded state.
    pub fn preview(&mut self, angle: u8) -> Result<()> {
        driver(self.servo.write_angle(angle), "preview gate servo")
    }
}

/// Moves gates between their two endpoints and waits for them to get there.
///
/// There is no position feedback, so the settle time is the only completion
/// signal: `move_to` returns only after it has elapsed.
#[derive(Debug, Clone)]
pub struct GateActuator {
    settle: Duration,
}

impl GateActuator {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    /// Returns false (and does nothing) when the gate is already in the target state.
    pub fn move_to(
        &self,
        gate: &mut Gate,
        open: bool,
        clock: &dyn Clock,
        events: &mut EventBus,
    ) -> Result<bool> {
        if gate.is_open == open {
            return Ok(false);
        }
        let id = gate.id;
        let angle = if open {
            gate.open_angle
        } else {
            gate.close_angle
        };
        debug!(gate = id, angle, open, "moving gate");
        driver(gate.servo.write_angle(angle), "move gate servo")?;
        gate.is_open = open;
        // a rejected command never reports motion
        events.emit(if open {
            GateEvent::GateOpening { gate: id }
        } else {
            GateEvent::GateClosing { gate: id }
        });
        clock.sleep(self.settle);
        events.emit(if open {
            GateEvent::GateOpen { gate: id }
        } else {
            GateEvent::GateClosed { gate: id }
        });
        Ok(true)
    }
}
