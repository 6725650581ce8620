//! Driver implementations for the blast-gate controller.
//!
//! - `sim`: in-memory drivers with inspection handles (always available)
//! - `file_store`: the calibration byte store persisted as a 256-byte file
//! - `rpi`: Raspberry Pi GPIO/SPI drivers, behind the `hardware` feature

pub mod error;
pub mod file_store;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod rpi;
pub mod sim;

pub use file_store::FileStore;
pub use sim::{MemoryStore, SimButton, SimKnob, SimRelay, SimServo};

/// Servo pulse width in microseconds for `angle` (clamped to 0..=180),
/// interpolated linearly between the attach-time pulse limits.
pub fn servo_pulse_us(angle: u8, min_pulse_us: u32, max_pulse_us: u32) -> u32 {
    let angle = u32::from(angle.min(180));
    let span = max_pulse_us.saturating_sub(min_pulse_us);
    min_pulse_us + angle * span / 180
}
