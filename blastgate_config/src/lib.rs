#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration CSV handling for the blast-gate controller.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Calibration CSV import/export enforces the `gate,open_raw,close_raw`
//!   header and rejects duplicate gates.
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Most gates the 256-byte calibration store can address
/// (4 header bytes, then two bytes per gate).
pub const MAX_GATES: usize = 126;

/// Calibration CSV schema.
///
/// Expected headers:
/// gate,open_raw,close_raw
///
/// Example:
/// gate,open_raw,close_raw
/// 0,250,0
/// 1,128,128
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationRow {
    pub gate: usize,
    pub open_raw: u8,
    pub close_raw: u8,
}

/// Wiring for one manifold port.
#[derive(Debug, Deserialize)]
pub struct GatePins {
    pub servo_pin: u8,
    pub button_pin: u8,
    /// Optional operator-facing name shown on the status panel.
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CollectorPins {
    /// Latching relay "set" coil.
    pub on_pin: u8,
    /// Latching relay "reset" coil.
    pub off_pin: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KnobCfg {
    pub spi_bus: u8,
    pub slave_select: u8,
    /// MCP3008 input channel (0..=7)
    pub channel: u8,
    pub clock_hz: u32,
}

impl Default for KnobCfg {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            slave_select: 0,
            channel: 0,
            clock_hz: 1_000_000,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BeeperCfg {
    pub pin: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServoCfg {
    pub min_pulse_us: u32,
    pub max_pulse_us: u32,
    pub period_ms: u64,
}

impl Default for ServoCfg {
    fn default() -> Self {
        Self {
            min_pulse_us: 400,
            max_pulse_us: 2500,
            period_ms: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    /// A raw level must hold for longer than this before it counts
    pub debounce_ms: u64,
    /// Settle time after commanding a gate servo (no position feedback)
    pub move_ms: u64,
    /// Width of the pulse on a collector relay coil
    pub collector_pulse_ms: u64,
    /// Delay between gate initializations at boot
    pub boot_stagger_ms: u64,
    /// Control loop polling rate
    pub poll_hz: u32,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            debounce_ms: 30,
            move_ms: 750,
            collector_pulse_ms: 500,
            boot_stagger_ms: 500,
            poll_hz: 200,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct InputCfg {
    /// Treat a low level as pressed when true
    pub active_low: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FeedbackCfg {
    pub enabled: bool,
    pub beep_ms: u64,
    pub gap_ms: u64,
}

impl Default for FeedbackCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            beep_ms: 200,
            gap_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreCfg {
    /// 256-byte calibration image
    pub path: String,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            path: "/var/lib/blastgate/calibration.bin".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub gates: Vec<GatePins>,
    pub collector: CollectorPins,
    #[serde(default)]
    pub knob: KnobCfg,
    #[serde(default)]
    pub beeper: Option<BeeperCfg>,
    #[serde(default)]
    pub servo: ServoCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub input: InputCfg,
    #[serde(default)]
    pub feedback: FeedbackCfg,
    #[serde(default)]
    pub store: StoreCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

const MAX_DURATION_MS: u64 = 60_000;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Gates
        if self.gates.is_empty() {
            eyre::bail!("at least one [[gates]] entry is required");
        }
        if self.gates.len() > MAX_GATES {
            eyre::bail!(
                "{} gates configured but the calibration store holds at most {MAX_GATES}",
                self.gates.len()
            );
        }

        // Pins: every GPIO line has exactly one job
        let mut seen = HashSet::new();
        let mut claim = |pin: u8, what: String| -> eyre::Result<()> {
            if !seen.insert(pin) {
                eyre::bail!("pin {pin} assigned twice (again as {what})");
            }
            Ok(())
        };
        for (i, g) in self.gates.iter().enumerate() {
            claim(g.servo_pin, format!("gates[{i}].servo_pin"))?;
            claim(g.button_pin, format!("gates[{i}].button_pin"))?;
        }
        claim(self.collector.on_pin, "collector.on_pin".into())?;
        claim(self.collector.off_pin, "collector.off_pin".into())?;
        if let Some(b) = &self.beeper {
            claim(b.pin, "beeper.pin".into())?;
        }

        // Knob
        if self.knob.channel > 7 {
            eyre::bail!("knob.channel must be in 0..=7");
        }
        if self.knob.clock_hz == 0 {
            eyre::bail!("knob.clock_hz must be > 0");
        }

        // Servo
        if self.servo.min_pulse_us >= self.servo.max_pulse_us {
            eyre::bail!("servo.min_pulse_us must be < servo.max_pulse_us");
        }
        if self.servo.period_ms == 0 {
            eyre::bail!("servo.period_ms must be >= 1");
        }
        if u64::from(self.servo.max_pulse_us) > self.servo.period_ms.saturating_mul(1000) {
            eyre::bail!("servo.max_pulse_us must fit inside servo.period_ms");
        }

        // Timing
        let t = &self.timing;
        for (name, ms) in [
            ("timing.debounce_ms", t.debounce_ms),
            ("timing.move_ms", t.move_ms),
            ("timing.collector_pulse_ms", t.collector_pulse_ms),
        ] {
            if ms == 0 {
                eyre::bail!("{name} must be >= 1");
            }
            if ms > MAX_DURATION_MS {
                eyre::bail!("{name} is unreasonably large (>60s)");
            }
        }
        if t.boot_stagger_ms > MAX_DURATION_MS {
            eyre::bail!("timing.boot_stagger_ms is unreasonably large (>60s)");
        }
        if t.poll_hz == 0 {
            eyre::bail!("timing.poll_hz must be > 0");
        }

        // Feedback
        if self.feedback.beep_ms > MAX_DURATION_MS || self.feedback.gap_ms > MAX_DURATION_MS {
            eyre::bail!("feedback durations are unreasonably large (>60s)");
        }

        // Store
        if self.store.path.trim().is_empty() {
            eyre::bail!("store.path must not be empty");
        }

        Ok(())
    }
}

/// Read calibration rows, enforcing the exact header and one row per gate.
pub fn load_calibration_csv(path: &Path) -> eyre::Result<Vec<CalibrationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["gate", "open_raw", "close_raw"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'gate,open_raw,close_raw', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<CalibrationRow> = Vec::new();
    let mut gates = HashSet::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        let row = match rec {
            Ok(row) => row,
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        };
        if row.gate >= MAX_GATES {
            eyre::bail!(
                "invalid CSV row {}: gate {} is beyond the store ({MAX_GATES} gates)",
                idx + 2,
                row.gate
            );
        }
        if !gates.insert(row.gate) {
            eyre::bail!("invalid CSV row {}: gate {} listed twice", idx + 2, row.gate);
        }
        rows.push(row);
    }
    if rows.is_empty() {
        eyre::bail!("calibration CSV {:?} has no rows", path);
    }
    Ok(rows)
}

/// Write calibration rows with the header `load_calibration_csv` expects.
pub fn write_calibration_csv<W: std::io::Write>(
    out: W,
    rows: &[CalibrationRow],
) -> eyre::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| eyre::eyre!("write calibration row for gate {}: {}", row.gate, e))?;
    }
    wtr.flush()?;
    Ok(())
}
