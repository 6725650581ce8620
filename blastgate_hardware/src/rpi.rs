//! Raspberry Pi drivers (rppal): software-PWM servos, GPIO buttons and relay
//! lines, and an MCP3008 ADC channel for the knob.

use std::time::Duration;

use blastgate_traits::{AnalogInput, DigitalInput, RelayOutput, ServoOutput};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::{debug, trace};

use crate::error::{HwError, Result};
use crate::servo_pulse_us;

pub fn open_gpio() -> Result<Gpio> {
    Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))
}

/// Hobby servo driven by rppal's software PWM on a plain GPIO line.
pub struct PiServo {
    pin: OutputPin,
    period: Duration,
    min_pulse_us: u32,
    max_pulse_us: u32,
}

impl PiServo {
    pub fn attach(
        gpio: &Gpio,
        pin: u8,
        min_pulse_us: u32,
        max_pulse_us: u32,
        period: Duration,
    ) -> Result<Self> {
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("servo pin {pin}: {e}")))?
            .into_output_low();
        debug!(pin = pin.pin(), min_pulse_us, max_pulse_us, "servo attached");
        Ok(Self {
            pin,
            period,
            min_pulse_us,
            max_pulse_us,
        })
    }

    fn pulse_for(&self, angle: u8) -> Duration {
        Duration::from_micros(u64::from(servo_pulse_us(
            angle,
            self.min_pulse_us,
            self.max_pulse_us,
        )))
    }
}

impl ServoOutput for PiServo {
    fn write_angle(
        &mut self,
        angle: u8,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pulse = self.pulse_for(angle);
        trace!(
            pin = self.pin.pin(),
            angle,
            pulse_us = pulse.as_micros() as u64,
            "servo write"
        );
        self.pin
            .set_pwm(self.period, pulse)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(())
    }
}

pub struct PiButton {
    pin: InputPin,
}

impl PiButton {
    /// Active-low buttons get the internal pull-up, active-high ones the pull-down.
    pub fn new(gpio: &Gpio, pin: u8, active_low: bool) -> Result<Self> {
        let raw = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("button pin {pin}: {e}")))?;
        let pin = if active_low {
            raw.into_input_pullup()
        } else {
            raw.into_input_pulldown()
        };
        Ok(Self { pin })
    }
}

impl DigitalInput for PiButton {
    fn is_high(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.pin.is_high())
    }
}

pub struct PiRelay {
    pin: OutputPin,
}

impl PiRelay {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("output pin {pin}: {e}")))?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl RelayOutput for PiRelay {
    fn set_level(
        &mut self,
        high: bool,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if high {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// One single-ended channel of an MCP3008 (10-bit) on the SPI bus.
pub struct Mcp3008Knob {
    spi: Spi,
    channel: u8,
}

impl Mcp3008Knob {
    pub fn new(bus: u8, slave_select: u8, clock_hz: u32, channel: u8) -> Result<Self> {
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            other => return Err(HwError::Spi(format!("unsupported spi bus {other}"))),
        };
        let ss = match slave_select {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("unsupported slave select {other}"))),
        };
        if channel > 7 {
            return Err(HwError::Spi(format!("mcp3008 has no channel {channel}")));
        }
        let spi = Spi::new(bus, ss, clock_hz, Mode::Mode0)
            .map_err(|e| HwError::Spi(format!("open spi: {e}")))?;
        Ok(Self { spi, channel })
    }
}

impl AnalogInput for Mcp3008Knob {
    fn read(&mut self) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        // start bit, single-ended + channel, then clock out 10 bits
        let tx = [0x01, (0x08 | self.channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok((u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]))
    }
}
