//! The owned controller context: boot, polling and press dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use blastgate_traits::{AnalogInput, ByteStore, Clock};
use tracing::{debug, info};

use crate::builder::GateControllerBuilder;
use crate::calibration::CalibrationController;
use crate::config::TimingCfg;
use crate::debounce::{ButtonChannel, Edge};
use crate::error::{GateError, Result};
use crate::events::GateEvent;
use crate::interlock::InterlockController;
use crate::manifold::Manifold;
use crate::session::CalibrationSession;
use crate::status::{Mode, PressOutcome, TickStatus};
use crate::store::{PersistentCalibration, StoreReport};

pub struct GateController {
    pub(crate) manifold: Manifold,
    pub(crate) buttons: Vec<ButtonChannel>,
    pub(crate) knob: Box<dyn AnalogInput>,
    pub(crate) store: PersistentCalibration<Box<dyn ByteStore>>,
    pub(crate) calibration: CalibrationController,
    pub(crate) timing: TimingCfg,
    pub(crate) epoch: Instant,
    pub(crate) mode: Option<Mode>,
}

impl std::fmt::Debug for GateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateController")
            .field("gates", &self.manifold.gate_count())
            .field("open", &self.open_gates())
            .field("collector_on", &self.collector_on())
            .field("mode", &self.mode)
            .field("session", &self.calibration.session())
            .finish()
    }
}

impl GateController {
    pub fn builder() -> GateControllerBuilder {
        GateControllerBuilder::default()
    }

    /// Load calibration, home every gate closed (staggered), then pick the
    /// mode: programming when forced or when any button is held.
    pub fn boot(&mut self, force_programming: bool) -> Result<Mode> {
        if let Some(mode) = self.mode {
            return Err(eyre::Report::new(GateError::State(format!(
                "already booted in {mode} mode"
            ))));
        }
        let gates = self.manifold.gate_count();
        info!(gates, "boot started");
        self.manifold.emit(GateEvent::BootStarted { gates });

        let (records, reset) = self.store.load()?;
        if reset {
            self.manifold.emit(GateEvent::StoreReset);
        }

        let stagger = Duration::from_millis(self.timing.boot_stagger_ms);
        for (i, raw) in records.into_iter().enumerate() {
            let gate = self.manifold.gate_mut(i)?;
            gate.apply(raw);
            gate.home()?;
            let (open_angle, close_angle) = gate.angles();
            debug!(gate = i, open_angle, close_angle, "gate homed");
            self.manifold.emit(GateEvent::GateReady { gate: i });
            self.manifold.clock.sleep(stagger);
        }

        let mut held = None;
        for (i, button) in self.buttons.iter_mut().enumerate() {
            if button.read_pressed()? && held.is_none() {
                held = Some(i);
            }
        }
        let mode = if force_programming || held.is_some() {
            Mode::Programming
        } else {
            Mode::Normal
        };
        self.mode = Some(mode);
        info!(%mode, held_button = ?held, "boot complete");
        self.manifold.emit(GateEvent::BootComplete { mode });
        Ok(mode)
    }

    /// One control loop pass: sample every button, dispatch committed
    /// presses in button order, then refresh the calibration preview.
    pub fn tick(&mut self) -> Result<TickStatus> {
        self.booted()?;
        let mut status = TickStatus::default();
        for i in 0..self.buttons.len() {
            let now_ms = self.manifold.clock.ms_since(self.epoch);
            if self.buttons[i].poll(now_ms)? == Some(Edge::Pressed) {
                status.handled.push(self.press(i)?);
            }
        }
        if self.mode == Some(Mode::Programming) {
            status.preview = self
                .calibration
                .preview(&mut self.manifold, self.knob.as_mut())?;
        }
        Ok(status)
    }

    /// Handle an already-debounced press of button `i`.
    pub fn press(&mut self, i: usize) -> Result<PressOutcome> {
        let mode = self.booted()?;
        self.manifold.gate(i)?;
        self.manifold.emit(GateEvent::PressAccepted { gate: i });
        match mode {
            Mode::Normal => InterlockController::press(&mut self.manifold, i),
            Mode::Programming => self.calibration.press(
                &mut self.manifold,
                &mut self.store,
                self.knob.as_mut(),
                i,
            ),
        }
    }

    pub fn gate_count(&self) -> usize {
        self.manifold.gate_count()
    }

    pub fn is_open(&self, i: usize) -> Result<bool> {
        Ok(self.manifold.gate(i)?.is_open())
    }

    pub fn open_gates(&self) -> Vec<usize> {
        self.manifold.open_gates().collect()
    }

    pub fn collector_on(&self) -> bool {
        self.manifold.collector.is_on()
    }

    /// `(open_angle, close_angle)` currently applied to gate `i`.
    pub fn angles(&self, i: usize) -> Result<(u8, u8)> {
        Ok(self.manifold.gate(i)?.angles())
    }

    pub fn session(&self) -> CalibrationSession {
        self.calibration.session()
    }

    /// `None` until `boot` has run.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn timing(&self) -> &TimingCfg {
        &self.timing
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        Arc::clone(&self.manifold.clock)
    }

    /// Read the calibration store without modifying it.
    pub fn inspect_store(&mut self) -> Result<StoreReport> {
        self.store.inspect()
    }

    fn booted(&self) -> Result<Mode> {
        self.mode.ok_or_else(|| {
            eyre::Report::new(GateError::State("controller has not booted".into()))
        })
    }
}
