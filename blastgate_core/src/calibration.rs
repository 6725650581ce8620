//! Programming-mode endpoint teaching.
//!
//! Each gate is taught with three presses of its own button: the first
//! selects it, the second stores the knob position as the open endpoint, the
//! third stores the close endpoint, applies both and re-homes the gate.
//! Pressing a different button at any point restarts with that gate and
//! discards the unfinished capture. While a capture is pending, every tick
//! drives the selected servo straight to the knob's angle.

use blastgate_traits::{AnalogInput, ByteStore};
use tracing::{debug, info};

use crate::error::Result;
use crate::events::GateEvent;
use crate::hw_error::driver;
use crate::manifold::Manifold;
use crate::mapping::{knob_angle, quantize};
use crate::session::CalibrationSession;
use crate::status::PressOutcome;
use crate::store::{Endpoint, PersistentCalibration};

#[derive(Debug, Default)]
pub struct CalibrationController {
    session: CalibrationSession,
}

impl CalibrationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> CalibrationSession {
        self.session
    }

    pub fn press<S: ByteStore>(
        &mut self,
        m: &mut Manifold,
        store: &mut PersistentCalibration<S>,
        knob: &mut dyn AnalogInput,
        i: usize,
    ) -> Result<PressOutcome> {
        m.gate(i)?;
        match self.session {
            CalibrationSession::CapturingOpen { gate } if gate == i => {
                let raw = quantize(driver(knob.read(), "read knob")?);
                store.commit(i, Endpoint::Open, raw)?;
                self.session = CalibrationSession::CapturingClose { gate: i };
                info!(gate = i, raw, "open endpoint captured");
                m.emit(GateEvent::EndpointCaptured {
                    gate: i,
                    endpoint: Endpoint::Open,
                    raw,
                });
                m.emit(GateEvent::CalibrationEntered {
                    gate: i,
                    phase: Endpoint::Close,
                });
                Ok(PressOutcome::OpenCaptured { gate: i, raw })
            }
            CalibrationSession::CapturingClose { gate } if gate == i => {
                let raw = quantize(driver(knob.read(), "read knob")?);
                store.commit(i, Endpoint::Close, raw)?;
                let stored = store.read(i)?;
                let g = m.gate_mut(i)?;
                g.apply(stored);
                g.home()?;
                let (open_angle, close_angle) = g.angles();
                self.session = CalibrationSession::Idle;
                info!(gate = i, open_angle, close_angle, "gate calibration committed");
                m.emit(GateEvent::EndpointCaptured {
                    gate: i,
                    endpoint: Endpoint::Close,
                    raw,
                });
                m.emit(GateEvent::CalibrationCommitted {
                    gate: i,
                    open_angle,
                    close_angle,
                });
                Ok(PressOutcome::Committed {
                    gate: i,
                    open_angle,
                    close_angle,
                })
            }
            previous => {
                if let Some(abandoned) = previous.active_gate() {
                    debug!(abandoned, gate = i, "capture abandoned for another gate");
                }
                self.session = CalibrationSession::CapturingOpen { gate: i };
                m.emit(GateEvent::CalibrationEntered {
                    gate: i,
                    phase: Endpoint::Open,
                });
                Ok(PressOutcome::CaptureStarted { gate: i })
            }
        }
    }

    /// Write the knob's angle to the gate being taught. Returns the angle
    /// written, or `None` when no capture is pending.
    pub fn preview(&self, m: &mut Manifold, knob: &mut dyn AnalogInput) -> Result<Option<u8>> {
        let Some(gate) = self.session.active_gate() else {
            return Ok(None);
        };
        let angle = knob_angle(driver(knob.read(), "read knob")?);
        m.gate_mut(gate)?.preview(angle)?;
        Ok(Some(angle))
    }
}
