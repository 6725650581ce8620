//! Shared collector motor behind a latching relay.

use std::time::Duration;

use blastgate_traits::{Clock, RelayOutput};
use tracing::info;

use crate::error::Result;
use crate::events::{EventBus, GateEvent};
use crate::hw_error::driver;

/// Switches the collector by pulsing the relay's "on" or "off" coil.
///
/// The relay latches, so the pulse is the command; the recorded state is the
/// only record of what the motor is doing.
pub struct CollectorController {
    on_line: Box<dyn RelayOutput>,
    off_line: Box<dyn RelayOutput>,
    pulse: Duration,
    is_on: bool,
}

impl CollectorController {
    pub fn new(on_line: Box<dyn RelayOutput>, off_line: Box<dyn RelayOutput>, pulse: Duration) -> Self {
        Self {
            on_line,
            off_line,
            pulse,
            is_on: false,
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns false (and does nothing) when already in the target state.
    ///
    /// A failure to drop the line after the pulse still records the new
    /// state before the error is returned.
    pub fn set_on(&mut self, on: bool, clock: &dyn Clock, events: &mut EventBus) -> Result<bool> {
        if self.is_on == on {
            return Ok(false);
        }
        let line = if on {
            &mut self.on_line
        } else {
            &mut self.off_line
        };
        driver(line.set_level(true), "raise collector relay line")?;
        clock.sleep(self.pulse);
        // the coil has been energized for the full pulse, so the relay has
        // latched even if the line then fails to drop
        let released = driver(line.set_level(false), "drop collector relay line");
        self.is_on = on;
        info!(collector_on = on, "collector switched");
        events.emit(if on {
            GateEvent::CollectorOn
        } else {
            GateEvent::CollectorOff
        });
        released.map(|()| true)
    }
}
