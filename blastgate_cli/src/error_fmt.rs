//! Human-readable error descriptions, exit codes and structured JSON errors.
//!
//! Core wraps driver failures with context, so the typed error is usually a
//! link in the chain rather than the head of the report. Every lookup here
//! walks the whole chain.

use blastgate_core::error::{BuildError, GateError};
use blastgate_hardware::error::HwError;

fn find<E: std::error::Error + 'static>(err: &eyre::Report) -> Option<&E> {
    err.chain().find_map(|e| e.downcast_ref::<E>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingGates => {
                "What happened: No gates were wired into the controller.\nLikely causes: The config has no [[gates]] entries.\nHow to fix: Add one [[gates]] table per manifold port.".to_string()
            }
            BuildError::MissingCollector => {
                "What happened: The collector relay lines were not provided.\nLikely causes: The [collector] section is missing or its pins failed to open.\nHow to fix: Set collector.on_pin and collector.off_pin in the config.".to_string()
            }
            BuildError::MissingKnob => {
                "What happened: No calibration knob was provided.\nLikely causes: The ADC failed to initialize.\nHow to fix: Check the [knob] section and the SPI wiring.".to_string()
            }
            BuildError::MissingStore => {
                "What happened: No calibration store was provided.\nLikely causes: The store image could not be opened.\nHow to fix: Check store.path in the config.".to_string()
            }
            BuildError::TooManyGates { gates, max } => format!(
                "What happened: {gates} gates were configured but the calibration store holds {max}.\nLikely causes: Extra [[gates]] entries.\nHow to fix: Remove gates until at most {max} remain."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Zero or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/blastgate.toml for a sample."
            ),
        };
    }

    if let Some(ge) = find::<GateError>(err) {
        return match ge {
            GateError::Config(msg) => format!(
                "What happened: The configuration could not be used ({msg}).\nLikely causes: A missing file, a TOML syntax error, or a pin assigned twice.\nHow to fix: Fix the file named above and rerun; `blastgate self-check` validates without moving anything."
            ),
            GateError::InvalidGate { gate, count } => format!(
                "What happened: Gate {gate} does not exist.\nLikely causes: Gates are numbered from 0 and this manifold has {count}.\nHow to fix: Use a gate index below {count}."
            ),
            GateError::Store(msg) => format!(
                "What happened: The calibration store failed ({msg}).\nLikely causes: The image file is unreadable, truncated or on a read-only path.\nHow to fix: Check store.path and its permissions; `blastgate calibration reset` rewrites a damaged image."
            ),
            GateError::Hardware(msg) | GateError::HardwareFault(msg) => format!(
                "What happened: A hardware driver failed ({msg}).\nLikely causes: Wrong pin numbers, loose wiring, or missing GPIO/SPI permissions.\nHow to fix: Check the pins in the config and the wiring, then rerun with --log-level=debug."
            ),
            GateError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: The controller was used out of order.\nHow to fix: Boot the controller before polling or pressing."
            ),
        };
    }

    if let Some(hw) = find::<HwError>(err) {
        return format!(
            "What happened: {hw}.\nLikely causes: Hardware not present or not accessible to this user.\nHow to fix: Check the wiring and GPIO/SPI permissions, then rerun with --log-level=debug."
        );
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'gate,open_raw,close_raw'.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 config, 4 hardware, 5 calibration store, 1 anything else.
/// (clap exits with 2 on usage errors before any of this runs.)
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if find::<BuildError>(err).is_some() {
        return 3;
    }
    if let Some(ge) = find::<GateError>(err) {
        return match ge {
            GateError::Config(_) => 3,
            GateError::Hardware(_) | GateError::HardwareFault(_) => 4,
            GateError::Store(_) => 5,
            GateError::InvalidGate { .. } | GateError::State(_) => 1,
        };
    }
    match find::<HwError>(err) {
        Some(HwError::Image { .. } | HwError::Io(_)) => 5,
        Some(_) => 4,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if find::<BuildError>(err).is_some() {
        return "Build";
    }
    if let Some(ge) = find::<GateError>(err) {
        return match ge {
            GateError::Config(_) => "Config",
            GateError::Hardware(_) | GateError::HardwareFault(_) => "Hardware",
            GateError::InvalidGate { .. } => "InvalidGate",
            GateError::Store(_) => "Store",
            GateError::State(_) => "State",
        };
    }
    if find::<HwError>(err).is_some() {
        return "Hardware";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(GateError::InvalidGate { gate, count }) = find::<GateError>(err) {
        obj["details"] = json!({ "gate": gate, "count": count });
    }
    obj.to_string()
}
