//! Builder for `GateController`.
//!
//! Collaborators are boxed on the way in; `build()` checks that everything
//! the protocols need was provided and that the timing is usable.

use std::sync::Arc;
use std::time::Duration;

use blastgate_traits::{
    AnalogInput, ByteStore, Clock, DigitalInput, MonotonicClock, RelayOutput, ServoOutput,
};

use crate::actuator::{Gate, GateActuator};
use crate::calibration::CalibrationController;
use crate::collector::CollectorController;
use crate::config::{FeedbackCfg, InputCfg, TimingCfg};
use crate::controller::GateController;
use crate::debounce::ButtonChannel;
use crate::error::{BuildError, Result};
use crate::events::{EventBus, StatusSink};
use crate::feedback::Beeper;
use crate::manifold::Manifold;
use crate::store::{MAX_GATES, PersistentCalibration};

type GateWiring = (Box<dyn ServoOutput>, Box<dyn DigitalInput>);

#[derive(Default)]
pub struct GateControllerBuilder {
    gates: Vec<GateWiring>,
    collector: Option<(Box<dyn RelayOutput>, Box<dyn RelayOutput>)>,
    knob: Option<Box<dyn AnalogInput>>,
    store: Option<Box<dyn ByteStore>>,
    beeper: Option<Box<dyn RelayOutput>>,
    sinks: Vec<Box<dyn StatusSink>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    timing: Option<TimingCfg>,
    input: Option<InputCfg>,
    feedback: Option<FeedbackCfg>,
}

impl GateControllerBuilder {
    /// Add the next gate (index = number of gates added before it).
    pub fn with_gate(
        mut self,
        servo: impl ServoOutput + 'static,
        button: impl DigitalInput + 'static,
    ) -> Self {
        self.gates.push((Box::new(servo), Box::new(button)));
        self
    }

    pub fn with_collector(
        mut self,
        on_line: impl RelayOutput + 'static,
        off_line: impl RelayOutput + 'static,
    ) -> Self {
        self.collector = Some((Box::new(on_line), Box::new(off_line)));
        self
    }

    pub fn with_knob(mut self, knob: impl AnalogInput + 'static) -> Self {
        self.knob = Some(Box::new(knob));
        self
    }

    pub fn with_store(mut self, store: impl ByteStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Buzzer line for audible feedback. Ignored when feedback is disabled.
    pub fn with_beeper(mut self, line: impl RelayOutput + 'static) -> Self {
        self.beeper = Some(Box::new(line));
        self
    }

    pub fn with_sink(mut self, sink: impl StatusSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }

    pub fn with_input(mut self, input: InputCfg) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackCfg) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn build(self) -> Result<GateController> {
        if self.gates.is_empty() {
            return Err(eyre::Report::new(BuildError::MissingGates));
        }
        if self.gates.len() > MAX_GATES {
            return Err(eyre::Report::new(BuildError::TooManyGates {
                gates: self.gates.len(),
                max: MAX_GATES,
            }));
        }
        let (on_line, off_line) = self
            .collector
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCollector))?;
        let knob = self
            .knob
            .ok_or_else(|| eyre::Report::new(BuildError::MissingKnob))?;
        let store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;

        let timing = self.timing.unwrap_or_default();
        let input = self.input.unwrap_or_default();
        let feedback = self.feedback.unwrap_or_default();
        validate(&timing, &feedback)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        let mut events = EventBus::new();
        for sink in self.sinks {
            events.subscribe(sink);
        }
        if feedback.enabled
            && let Some(line) = self.beeper
        {
            events.subscribe(Box::new(Beeper::new(line, Arc::clone(&clock), &feedback)));
        }

        let count = self.gates.len();
        let mut gates = Vec::with_capacity(count);
        let mut buttons = Vec::with_capacity(count);
        for (id, (servo, button)) in self.gates.into_iter().enumerate() {
            gates.push(Gate::new(id, servo));
            buttons.push(ButtonChannel::new(
                button,
                input.active_low,
                timing.debounce_ms,
            ));
        }

        let epoch = clock.now();
        let manifold = Manifold {
            gates,
            collector: CollectorController::new(
                on_line,
                off_line,
                Duration::from_millis(timing.collector_pulse_ms),
            ),
            actuator: GateActuator::new(Duration::from_millis(timing.move_ms)),
            clock,
            events,
        };

        Ok(GateController {
            manifold,
            buttons,
            knob,
            store: PersistentCalibration::new(store, count)?,
            calibration: CalibrationController::new(),
            timing,
            epoch,
            mode: None,
        })
    }
}

fn validate(timing: &TimingCfg, feedback: &FeedbackCfg) -> Result<()> {
    if timing.debounce_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "debounce_ms must be >= 1",
        )));
    }
    if timing.move_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "move_ms must be >= 1",
        )));
    }
    if timing.collector_pulse_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "collector_pulse_ms must be >= 1",
        )));
    }
    if timing.poll_hz == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "poll_hz must be > 0",
        )));
    }
    if feedback.enabled && feedback.beep_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "beep_ms must be >= 1 when feedback is enabled",
        )));
    }
    Ok(())
}
