//! Knob-to-byte and byte-to-angle mapping.
//!
//! Both functions are part of the persisted format: bytes written by one
//! build must decode to the same angles in every other.

/// Largest value the 10-bit knob ADC produces.
pub const ADC_MAX: u16 = 1023;
/// Stored byte that decodes to the neutral angle.
pub const NEUTRAL_RAW: u8 = 128;
/// Servo angle used for never-taught gates.
pub const NEUTRAL_ANGLE: u8 = 90;

/// Quantize a knob reading (0..=1023) to a stored byte. Readings above the
/// ADC range saturate at 255.
#[inline]
pub fn quantize(adc: u16) -> u8 {
    u8::try_from(adc.min(ADC_MAX) / 4).unwrap_or(u8::MAX)
}

/// Decode a stored byte to a servo angle: `90 + (raw - 128) / 2`, with the
/// division truncating toward zero. The result always lies in 26..=153.
#[inline]
pub fn angle_of(raw: u8) -> u8 {
    let offset = (i16::from(raw) - i16::from(NEUTRAL_RAW)) / 2;
    u8::try_from(i16::from(NEUTRAL_ANGLE) + offset).unwrap_or(NEUTRAL_ANGLE)
}

/// Angle previewed for a live knob reading.
#[inline]
pub fn knob_angle(adc: u16) -> u8 {
    angle_of(quantize(adc))
}
