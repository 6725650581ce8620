//! Button debouncing.

use blastgate_traits::DigitalInput;

use crate::error::Result;
use crate::hw_error::driver;

/// A committed change of the debounced logical level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Turns a stream of raw samples into de-glitched transitions.
///
/// A level must stay unchanged for strictly longer than the window before it
/// replaces the stable level. Sampling more often during the window does not
/// produce extra transitions.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    last_raw: bool,
    last_change_ms: u64,
    stable: bool,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_raw: false,
            last_change_ms: 0,
            stable: false,
        }
    }

    pub fn sample(&mut self, raw: bool, now_ms: u64) -> Option<Edge> {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change_ms = now_ms;
        }
        if now_ms.saturating_sub(self.last_change_ms) > self.window_ms && raw != self.stable {
            self.stable = raw;
            return Some(if raw { Edge::Pressed } else { Edge::Released });
        }
        None
    }

    /// Current debounced level (true = pressed).
    pub fn stable(&self) -> bool {
        self.stable
    }
}

/// One gate's button: the raw input, its polarity and its debouncer.
pub struct ButtonChannel {
    input: Box<dyn DigitalInput>,
    active_low: bool,
    debouncer: Debouncer,
}

impl ButtonChannel {
    pub fn new(input: Box<dyn DigitalInput>, active_low: bool, window_ms: u64) -> Self {
        Self {
            input,
            active_low,
            debouncer: Debouncer::new(window_ms),
        }
    }

    /// Raw pressed state, no debouncing.
    pub fn read_pressed(&mut self) -> Result<bool> {
        let high = driver(self.input.is_high(), "read button")?;
        Ok(high != self.active_low)
    }

    pub fn poll(&mut self, now_ms: u64) -> Result<Option<Edge>> {
        let pressed = self.read_pressed()?;
        Ok(self.debouncer.sample(pressed, now_ms))
    }

    pub fn is_pressed(&self) -> bool {
        self.debouncer.stable()
    }
}
