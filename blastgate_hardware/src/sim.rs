//! Simulated drivers for host builds and tests.
//!
//! Each driver is a cheap handle over shared state: clone it, hand one clone
//! to the controller and keep the other to drive inputs or inspect outputs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blastgate_traits::{
    AnalogInput, BYTE_STORE_LEN, ByteStore, DigitalInput, RelayOutput, ServoOutput,
};
use tracing::trace;

use crate::error::HwError;

#[derive(Debug, Default)]
struct ServoState {
    writes: Vec<u8>,
    fail_next: bool,
}

/// Servo that records every commanded angle.
#[derive(Debug, Clone, Default)]
pub struct SimServo {
    state: Rc<RefCell<ServoState>>,
}

impl SimServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every angle written so far, oldest first.
    pub fn writes(&self) -> Vec<u8> {
        self.state.borrow().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().writes.len()
    }

    pub fn last_angle(&self) -> Option<u8> {
        self.state.borrow().writes.last().copied()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().writes.clear();
    }

    /// Make the next write fail with a PWM error.
    pub fn inject_fault(&self) {
        self.state.borrow_mut().fail_next = true;
    }
}

impl ServoOutput for SimServo {
    fn write_angle(&mut self, angle: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = self.state.borrow_mut();
        if st.fail_next {
            st.fail_next = false;
            return Err(Box::new(HwError::Pwm("injected servo fault".into())));
        }
        trace!(angle, "sim servo write");
        st.writes.push(angle);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RelayState {
    history: Vec<bool>,
    fail_release: bool,
}

/// Output line that records its level history.
#[derive(Debug, Clone, Default)]
pub struct SimRelay {
    state: Rc<RefCell<RelayState>>,
}

impl SimRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> bool {
        self.state.borrow().history.last().copied().unwrap_or(false)
    }

    pub fn history(&self) -> Vec<bool> {
        self.state.borrow().history.clone()
    }

    /// Number of low-to-high edges seen so far.
    pub fn pulse_count(&self) -> usize {
        let mut prev = false;
        let mut edges = 0;
        for &lvl in &self.state.borrow().history {
            if lvl && !prev {
                edges += 1;
            }
            prev = lvl;
        }
        edges
    }

    pub fn clear(&self) {
        self.state.borrow_mut().history.clear();
    }

    /// Make the next attempt to drive the line low fail. The line stays high.
    pub fn inject_release_fault(&self) {
        self.state.borrow_mut().fail_release = true;
    }
}

impl RelayOutput for SimRelay {
    fn set_level(&mut self, high: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = self.state.borrow_mut();
        if !high && st.fail_release {
            st.fail_release = false;
            return Err(Box::new(HwError::Gpio("injected relay release fault".into())));
        }
        trace!(high, "sim relay level");
        st.history.push(high);
        Ok(())
    }
}

/// Button whose electrical level is set by the test or the simulator.
#[derive(Debug, Clone, Default)]
pub struct SimButton {
    level: Rc<Cell<bool>>,
}

impl SimButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_high(&self, high: bool) {
        self.level.set(high);
    }

    /// Drive the line high (pressed, for active-high wiring).
    pub fn press(&self) {
        self.set_high(true);
    }

    pub fn release(&self) {
        self.set_high(false);
    }
}

impl DigitalInput for SimButton {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.level.get())
    }
}

/// Potentiometer returning whatever value was last set.
#[derive(Debug, Clone, Default)]
pub struct SimKnob {
    value: Rc<Cell<u16>>,
}

impl SimKnob {
    pub fn new(value: u16) -> Self {
        Self {
            value: Rc::new(Cell::new(value)),
        }
    }

    pub fn set(&self, value: u16) {
        self.value.set(value);
    }
}

impl AnalogInput for SimKnob {
    fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.value.get())
    }
}

#[derive(Debug)]
struct StoreState {
    bytes: [u8; BYTE_STORE_LEN],
    writes: usize,
    flushes: usize,
}

/// In-memory EEPROM image.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Rc<RefCell<StoreState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::blank()
    }
}

impl MemoryStore {
    /// Factory-fresh memory: every byte reads 0xFF.
    pub fn blank() -> Self {
        Self::from_bytes([0xFF; BYTE_STORE_LEN])
    }

    pub fn from_bytes(bytes: [u8; BYTE_STORE_LEN]) -> Self {
        Self {
            state: Rc::new(RefCell::new(StoreState {
                bytes,
                writes: 0,
                flushes: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> [u8; BYTE_STORE_LEN] {
        self.state.borrow().bytes
    }

    /// Overwrite a byte without counting it as a controller write.
    pub fn poke(&self, addr: u8, value: u8) {
        self.state.borrow_mut().bytes[usize::from(addr)] = value;
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn flush_count(&self) -> usize {
        self.state.borrow().flushes
    }
}

impl ByteStore for MemoryStore {
    fn read_byte(&mut self, addr: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.state.borrow().bytes[usize::from(addr)])
    }

    fn write_byte(
        &mut self,
        addr: u8,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = self.state.borrow_mut();
        st.bytes[usize::from(addr)] = value;
        st.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.state.borrow_mut().flushes += 1;
        Ok(())
    }
}
