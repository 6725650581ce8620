//! Audible acknowledgement of operator actions.

use std::sync::Arc;
use std::time::Duration;

use blastgate_traits::{Clock, RelayOutput};
use tracing::warn;

use crate::config::FeedbackCfg;
use crate::events::{GateEvent, StatusSink};
use crate::status::Mode;
use crate::store::Endpoint;

/// Beep pattern for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    /// Wait one gap before the first beep.
    pub lead_gap: bool,
    pub beeps: u8,
}

impl Pattern {
    const fn new(lead_gap: bool, beeps: u8) -> Self {
        Self { lead_gap, beeps }
    }
}

/// Beeps for an event, if it has any.
///
/// One per accepted press, two after a selection or at the end of boot (plus
/// one for programming mode), one more after the open endpoint and two more
/// after the close endpoint.
pub fn pattern_for(event: &GateEvent) -> Option<Pattern> {
    match event {
        GateEvent::BootStarted { .. } | GateEvent::PressAccepted { .. } => {
            Some(Pattern::new(false, 1))
        }
        GateEvent::BootComplete { mode: Mode::Normal } => Some(Pattern::new(false, 2)),
        GateEvent::BootComplete {
            mode: Mode::Programming,
        } => Some(Pattern::new(false, 3)),
        GateEvent::SelectionComplete { .. } => Some(Pattern::new(false, 2)),
        GateEvent::EndpointCaptured {
            endpoint: Endpoint::Open,
            ..
        } => Some(Pattern::new(true, 1)),
        GateEvent::EndpointCaptured {
            endpoint: Endpoint::Close,
            ..
        } => Some(Pattern::new(true, 2)),
        _ => None,
    }
}

/// Drives a buzzer line with the patterns from [`pattern_for`]. Beeps block
/// the control loop for their duration.
pub struct Beeper {
    line: Box<dyn RelayOutput>,
    clock: Arc<dyn Clock + Send + Sync>,
    beep: Duration,
    gap: Duration,
}

impl Beeper {
    pub fn new(
        line: Box<dyn RelayOutput>,
        clock: Arc<dyn Clock + Send + Sync>,
        cfg: &FeedbackCfg,
    ) -> Self {
        Self {
            line,
            clock,
            beep: Duration::from_millis(cfg.beep_ms),
            gap: Duration::from_millis(cfg.gap_ms),
        }
    }

    fn play(&mut self, p: Pattern) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for n in 0..p.beeps {
            if n > 0 || p.lead_gap {
                self.clock.sleep(self.gap);
            }
            self.line.set_level(true)?;
            self.clock.sleep(self.beep);
            self.line.set_level(false)?;
        }
        Ok(())
    }
}

impl StatusSink for Beeper {
    fn on_event(&mut self, event: &GateEvent) {
        if let Some(p) = pattern_for(event)
            && let Err(e) = self.play(p)
        {
            warn!(error = %e, "beeper line failed");
        }
    }
}
