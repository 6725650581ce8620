//! Semantic events for status renderers and audible feedback.
//!
//! Sinks only observe; nothing they do feeds back into the controller.

use tracing::debug;

use crate::status::Mode;
use crate::store::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    BootStarted { gates: usize },
    /// The calibration store had no valid header and was reset to neutral.
    StoreReset,
    GateReady { gate: usize },
    BootComplete { mode: Mode },
    /// A debounced press was accepted for dispatch.
    PressAccepted { gate: usize },
    GateOpening { gate: usize },
    GateOpen { gate: usize },
    GateClosing { gate: usize },
    GateClosed { gate: usize },
    CollectorOn,
    CollectorOff,
    /// Normal-mode selection finished: target open, others closed.
    SelectionComplete { gate: usize },
    /// Programming mode is now waiting for `phase` of `gate`.
    CalibrationEntered { gate: usize, phase: Endpoint },
    EndpointCaptured { gate: usize, endpoint: Endpoint, raw: u8 },
    CalibrationCommitted {
        gate: usize,
        open_angle: u8,
        close_angle: u8,
    },
}

pub trait StatusSink {
    fn on_event(&mut self, event: &GateEvent);
}

impl<T: StatusSink + ?Sized> StatusSink for Box<T> {
    fn on_event(&mut self, event: &GateEvent) {
        (**self).on_event(event);
    }
}

/// Fans every event out to the registered sinks, in registration order.
#[derive(Default)]
pub struct EventBus {
    sinks: Vec<Box<dyn StatusSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Box<dyn StatusSink>) {
        self.sinks.push(sink);
    }

    pub fn emit(&mut self, event: GateEvent) {
        debug!(?event, "gate event");
        for sink in &mut self.sinks {
            sink.on_event(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
