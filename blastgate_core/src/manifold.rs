//! The owned hardware context both protocols operate on.

use std::sync::Arc;

use blastgate_traits::Clock;

use crate::actuator::{Gate, GateActuator};
use crate::collector::CollectorController;
use crate::error::{GateError, Result};
use crate::events::{EventBus, GateEvent};

pub struct Manifold {
    pub(crate) gates: Vec<Gate>,
    pub(crate) collector: CollectorController,
    pub(crate) actuator: GateActuator,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) events: EventBus,
}

impl Manifold {
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn gate(&self, i: usize) -> Result<&Gate> {
        let count = self.gates.len();
        self.gates
            .get(i)
            .ok_or_else(|| eyre::Report::new(GateError::InvalidGate { gate: i, count }))
    }

    pub(crate) fn gate_mut(&mut self, i: usize) -> Result<&mut Gate> {
        let count = self.gates.len();
        self.gates
            .get_mut(i)
            .ok_or_else(|| eyre::Report::new(GateError::InvalidGate { gate: i, count }))
    }

    /// Open or close gate `i` through the actuator (settle wait included).
    pub(crate) fn move_gate(&mut self, i: usize, open: bool) -> Result<bool> {
        let count = self.gates.len();
        let gate = self
            .gates
            .get_mut(i)
            .ok_or_else(|| eyre::Report::new(GateError::InvalidGate { gate: i, count }))?;
        self.actuator
            .move_to(gate, open, self.clock.as_ref(), &mut self.events)
    }

    pub(crate) fn set_collector(&mut self, on: bool) -> Result<bool> {
        self.collector
            .set_on(on, self.clock.as_ref(), &mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GateEvent) {
        self.events.emit(event);
    }

    pub fn open_gates(&self) -> impl Iterator<Item = usize> + '_ {
        self.gates.iter().filter(|g| g.is_open()).map(|g| g.id())
    }
}
