//! Recording sink for tests and tools that only need to observe the controller.

use std::cell::RefCell;
use std::rc::Rc;

use crate::events::{GateEvent, StatusSink};

/// Records every event; clones share the log.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<GateEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GateEvent> {
        self.events.borrow().clone()
    }

    /// Return and forget everything recorded so far.
    pub fn take(&self) -> Vec<GateEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl StatusSink for EventLog {
    fn on_event(&mut self, event: &GateEvent) {
        self.events.borrow_mut().push(*event);
    }
}
