//! Narrow capability traits for the collaborators the gate controller drives.
//!
//! Every method returns `Box<dyn Error + Send + Sync>` at the boundary so that
//! simulated, file-backed and Raspberry Pi implementations can plug in without
//! the core knowing their error types.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Size of the byte-addressable calibration memory (addresses 0..=255).
pub const BYTE_STORE_LEN: usize = 256;

/// One raw binary input (a momentary button).
pub trait DigitalInput {
    /// Raw electrical level; no debouncing.
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// The shared potentiometer, sampled as a 10-bit value (0..=1023).
pub trait AnalogInput {
    fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// Angle-commanded servo attached to one gate (0..=180 degrees).
pub trait ServoOutput {
    fn write_angle(&mut self, angle: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A single digital output line: a relay coil or the beeper.
pub trait RelayOutput {
    fn set_level(&mut self, high: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Byte-addressable non-volatile memory (EEPROM-like, 256 bytes).
pub trait ByteStore {
    fn read_byte(&mut self, addr: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>>;
    fn write_byte(
        &mut self,
        addr: u8,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Make preceding writes durable. Stores that persist every byte
    /// immediately can keep the default.
    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

impl<T: DigitalInput + ?Sized> DigitalInput for Box<T> {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).is_high()
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<T: ServoOutput + ?Sized> ServoOutput for Box<T> {
    fn write_angle(&mut self, angle: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_angle(angle)
    }
}

impl<T: RelayOutput + ?Sized> RelayOutput for Box<T> {
    fn set_level(&mut self, high: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_level(high)
    }
}

impl<T: ByteStore + ?Sized> ByteStore for Box<T> {
    fn read_byte(&mut self, addr: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_byte(addr)
    }
    fn write_byte(
        &mut self,
        addr: u8,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_byte(addr, value)
    }
    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).flush()
    }
}
