//! Command implementations: config loading, controller assembly and the
//! run / simulate / self-check / calibration commands.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use blastgate_config::{CalibrationRow, Config};
use blastgate_core::error::GateError;
use blastgate_core::hw_error::map_hw_error;
use blastgate_core::mapping::{NEUTRAL_ANGLE, angle_of};
use blastgate_core::{
    Endpoint, GateController, GateControllerBuilder, GateEvent, PersistentCalibration,
    PressOutcome, StatusSink,
};
use blastgate_hardware::{FileStore, MemoryStore, SimButton, SimKnob, SimRelay, SimServo};
use blastgate_traits::{ByteStore, ManualClock};
use blastgate_ui::StatusPanel;
use eyre::{Result, WrapErr};
use serde_json::{Value, json};

fn config_error(msg: String) -> eyre::Report {
    eyre::Report::new(GateError::Config(msg))
}

/// Read, parse and validate the TOML config. Every failure is a
/// `GateError::Config`.
pub fn load_config(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .map_err(|e| config_error(format!("read {}: {e}", path.display())))?;
    let cfg = blastgate_config::load_toml(&text)
        .map_err(|e| config_error(format!("parse {}: {e}", path.display())))?;
    cfg.validate().map_err(|e| config_error(e.to_string()))?;
    Ok(cfg)
}

fn labels(cfg: &Config) -> Vec<Option<String>> {
    cfg.gates.iter().map(|g| g.label.clone()).collect()
}

fn configure(b: GateControllerBuilder, cfg: &Config) -> GateControllerBuilder {
    b.with_timing((&cfg.timing).into())
        .with_input((&cfg.input).into())
        .with_feedback((&cfg.feedback).into())
}

fn open_store(path: &Path) -> Result<FileStore> {
    FileStore::open(path)
        .map_err(|e| eyre::Report::new(map_hw_error(&e)))
        .wrap_err_with(|| format!("open calibration store {}", path.display()))
}

fn calibration(cfg: &Config) -> Result<PersistentCalibration<FileStore>> {
    PersistentCalibration::new(open_store(Path::new(&cfg.store.path))?, cfg.gates.len())
}

/// Prints the panel to stdout whenever what it shows changes.
struct ConsoleDisplay {
    panel: StatusPanel,
    last: String,
}

impl ConsoleDisplay {
    fn new(labels: Vec<Option<String>>) -> Self {
        Self {
            panel: StatusPanel::new(labels),
            last: String::new(),
        }
    }
}

impl StatusSink for ConsoleDisplay {
    fn on_event(&mut self, event: &GateEvent) {
        self.panel.on_event(event);
        let screen = self.panel.render();
        if screen != self.last {
            println!("{screen}");
            self.last = screen;
        }
    }
}

// ── run ─────────────────────────────────────────────────────────────────────

pub fn cmd_run(cfg: &Config, programming: bool, json: bool) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let mut builder = configure(GateController::builder(), cfg);
    if !json {
        builder = builder.with_sink(ConsoleDisplay::new(labels(cfg)));
    }
    let mut ctrl = attach_drivers(builder, cfg)?.build()?;
    let mode = ctrl.boot(programming)?;
    tracing::info!(%mode, gates = ctrl.gate_count(), "manifold ready");

    let summary = blastgate_core::run(&mut ctrl, &shutdown, None)?;
    if json {
        println!(
            "{}",
            json!({ "ticks": summary.ticks, "presses": summary.presses, "mode": mode.to_string() })
        );
    } else {
        println!(
            "stopped after {} ticks, {} presses",
            summary.ticks, summary.presses
        );
    }
    Ok(())
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn attach_drivers(mut b: GateControllerBuilder, cfg: &Config) -> Result<GateControllerBuilder> {
    use blastgate_hardware::rpi::{Mcp3008Knob, PiButton, PiRelay, PiServo, open_gpio};
    use blastgate_traits::MonotonicClock;

    let gpio = open_gpio()?;
    let period = Duration::from_millis(cfg.servo.period_ms);
    for g in &cfg.gates {
        b = b.with_gate(
            PiServo::attach(
                &gpio,
                g.servo_pin,
                cfg.servo.min_pulse_us,
                cfg.servo.max_pulse_us,
                period,
            )?,
            PiButton::new(&gpio, g.button_pin, cfg.input.active_low)?,
        );
    }
    b = b
        .with_collector(
            PiRelay::new(&gpio, cfg.collector.on_pin)?,
            PiRelay::new(&gpio, cfg.collector.off_pin)?,
        )
        .with_knob(Mcp3008Knob::new(
            cfg.knob.spi_bus,
            cfg.knob.slave_select,
            cfg.knob.clock_hz,
            cfg.knob.channel,
        )?)
        .with_store(open_store(Path::new(&cfg.store.path))?)
        .with_clock(Box::new(MonotonicClock::new()));
    if let Some(beeper) = &cfg.beeper {
        b = b.with_beeper(PiRelay::new(&gpio, beeper.pin)?);
    }
    Ok(b)
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn attach_drivers(mut b: GateControllerBuilder, cfg: &Config) -> Result<GateControllerBuilder> {
    use blastgate_traits::MonotonicClock;

    tracing::warn!("built without the `hardware` feature; running against simulated drivers");
    for _ in &cfg.gates {
        b = b.with_gate(SimServo::new(), idle_button(cfg.input.active_low));
    }
    Ok(b
        .with_collector(SimRelay::new(), SimRelay::new())
        .with_knob(SimKnob::new(512))
        .with_store(open_store(Path::new(&cfg.store.path))?)
        .with_clock(Box::new(MonotonicClock::new())))
}

// ── simulate ────────────────────────────────────────────────────────────────

/// A simulated button resting at its released level.
fn idle_button(active_low: bool) -> SimButton {
    let button = SimButton::new();
    button.set_high(active_low);
    button
}

pub struct SimulateArgs<'a> {
    pub presses: &'a [usize],
    pub programming: bool,
    pub knob: &'a [u16],
    pub store: Option<&'a Path>,
}

pub fn cmd_simulate(cfg: &Config, args: &SimulateArgs<'_>, json: bool) -> Result<()> {
    let gates = cfg.gates.len();
    if let Some(&gate) = args.presses.iter().find(|&&g| g >= gates) {
        return Err(eyre::Report::new(GateError::InvalidGate { gate, count: gates }));
    }

    let store: Box<dyn ByteStore> = match args.store {
        Some(path) => Box::new(open_store(path)?),
        None => Box::new(MemoryStore::blank()),
    };
    let clock = ManualClock::new();
    let panel = StatusPanel::new(labels(cfg));
    let active_low = cfg.input.active_low;
    let buttons: Vec<SimButton> = (0..gates).map(|_| idle_button(active_low)).collect();
    let knob = SimKnob::new(512);

    let mut b = configure(GateController::builder(), cfg);
    for button in &buttons {
        b = b.with_gate(SimServo::new(), button.clone());
    }
    let mut ctrl = b
        .with_collector(SimRelay::new(), SimRelay::new())
        .with_knob(knob.clone())
        .with_store(store)
        .with_sink(panel.clone())
        .with_clock(Box::new(clock.clone()))
        .build()?;
    let mode = ctrl.boot(args.programming)?;
    if !json {
        println!("{}", panel.render());
    }

    let step_ms = blastgate_core::util::period_ms(cfg.timing.poll_hz);
    let settle_ticks = cfg.timing.debounce_ms / step_ms + 4;
    let mut knob_values = args.knob.iter().copied();
    for (n, &gate) in args.presses.iter().enumerate() {
        // only taps that store an endpoint read the knob
        if ctrl.session().active_gate() == Some(gate)
            && let Some(adc) = knob_values.next()
        {
            knob.set(adc);
        }
        let outcome = tap(
            &mut ctrl,
            &buttons[gate],
            &clock,
            active_low,
            Duration::from_millis(step_ms),
            settle_ticks,
        )?;
        if json {
            let line = json!({
                "tap": n,
                "gate": gate,
                "mode": mode.to_string(),
                "outcome": outcome.as_ref().map(outcome_json),
                "open_gates": ctrl.open_gates(),
                "collector_on": ctrl.collector_on(),
                "session": ctrl.session().to_string(),
                "elapsed_ms": u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
            println!("{line}");
        } else {
            println!("> tap {gate}: {}", describe(outcome.as_ref()));
            println!("{}", panel.render());
        }
    }
    Ok(())
}

/// Hold a simulated button through the debounce window, release it, and
/// let the release settle. Returns the press the controller handled.
fn tap(
    ctrl: &mut GateController,
    button: &SimButton,
    clock: &ManualClock,
    active_low: bool,
    step: Duration,
    settle_ticks: u64,
) -> Result<Option<PressOutcome>> {
    let mut outcome = None;
    button.set_high(!active_low);
    for _ in 0..settle_ticks {
        clock.advance(step);
        let status = ctrl.tick()?;
        if outcome.is_none() {
            outcome = status.handled.first().copied();
        }
    }
    button.set_high(active_low);
    for _ in 0..settle_ticks {
        clock.advance(step);
        ctrl.tick()?;
    }
    Ok(outcome)
}

fn describe(outcome: Option<&PressOutcome>) -> String {
    match outcome {
        None => "no press registered".to_string(),
        Some(PressOutcome::CollectorToggled { on, .. }) => {
            format!("collector {}", if *on { "on" } else { "off" })
        }
        Some(PressOutcome::Selected { gate }) => format!("gate {gate} selected"),
        Some(PressOutcome::CaptureStarted { gate }) => {
            format!("teaching gate {gate}, set the open position")
        }
        Some(PressOutcome::OpenCaptured { raw, .. }) => {
            format!("open stored (raw {raw}), set the close position")
        }
        Some(PressOutcome::Committed {
            gate,
            open_angle,
            close_angle,
        }) => format!("gate {gate} calibrated: open {open_angle}, close {close_angle}"),
    }
}

fn outcome_json(outcome: &PressOutcome) -> Value {
    match *outcome {
        PressOutcome::CollectorToggled { gate, on } => {
            json!({ "kind": "collector_toggled", "gate": gate, "collector_on": on })
        }
        PressOutcome::Selected { gate } => json!({ "kind": "selected", "gate": gate }),
        PressOutcome::CaptureStarted { gate } => {
            json!({ "kind": "capture_started", "gate": gate })
        }
        PressOutcome::OpenCaptured { gate, raw } => {
            json!({ "kind": "open_captured", "gate": gate, "raw": raw })
        }
        PressOutcome::Committed {
            gate,
            open_angle,
            close_angle,
        } => json!({
            "kind": "committed",
            "gate": gate,
            "open_angle": open_angle,
            "close_angle": close_angle,
        }),
    }
}

// ── self-check ──────────────────────────────────────────────────────────────

pub fn cmd_self_check(cfg: &Config, json: bool) -> Result<()> {
    let report = calibration(cfg)?.inspect()?;
    let knob = probe_hardware(cfg)?;
    let backend = if cfg!(all(feature = "hardware", target_os = "linux")) {
        "hardware"
    } else {
        "simulated"
    };

    if json {
        println!(
            "{}",
            json!({
                "ok": true,
                "gates": cfg.gates.len(),
                "backend": backend,
                "store": cfg.store.path,
                "store_header_valid": report.header_valid,
                "knob": knob,
            })
        );
        return Ok(());
    }
    println!("config ok: {} gates ({backend} drivers)", cfg.gates.len());
    if report.header_valid {
        println!("store {}: calibrated", cfg.store.path);
    } else {
        println!(
            "store {}: uninitialized, gates will boot at the neutral angle ({NEUTRAL_ANGLE})",
            cfg.store.path
        );
    }
    if let Some(adc) = knob {
        println!("knob: {adc} (angle {})", angle_of(blastgate_core::quantize(adc)));
    }
    println!("self-check ok");
    Ok(())
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn probe_hardware(cfg: &Config) -> Result<Option<u16>> {
    use blastgate_hardware::rpi::{Mcp3008Knob, open_gpio};
    use blastgate_traits::AnalogInput;

    open_gpio()?;
    let mut knob = Mcp3008Knob::new(
        cfg.knob.spi_bus,
        cfg.knob.slave_select,
        cfg.knob.clock_hz,
        cfg.knob.channel,
    )?;
    let adc = knob
        .read()
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
    Ok(Some(adc))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn probe_hardware(_cfg: &Config) -> Result<Option<u16>> {
    Ok(None)
}

// ── calibration ─────────────────────────────────────────────────────────────

pub fn cmd_calibration_show(cfg: &Config, json: bool) -> Result<()> {
    let report = calibration(cfg)?.inspect()?;
    if json {
        let gates: Vec<Value> = report
            .records
            .iter()
            .enumerate()
            .map(|(gate, r)| {
                json!({
                    "gate": gate,
                    "open_raw": r.open_raw,
                    "close_raw": r.close_raw,
                    "open_angle": r.open_angle(),
                    "close_angle": r.close_angle(),
                })
            })
            .collect();
        println!(
            "{}",
            json!({ "header_valid": report.header_valid, "gates": gates })
        );
        return Ok(());
    }
    if !report.header_valid {
        println!("store is uninitialized; values below are reset on the next boot");
    }
    for (gate, r) in report.records.iter().enumerate() {
        let label = cfg.gates[gate]
            .label
            .as_deref()
            .map(|l| format!(" ({l})"))
            .unwrap_or_default();
        println!(
            "gate {gate}{label}: open {} (raw {}), close {} (raw {})",
            r.open_angle(),
            r.open_raw,
            r.close_angle(),
            r.close_raw
        );
    }
    Ok(())
}

pub fn cmd_calibration_export(cfg: &Config, out: Option<&Path>) -> Result<()> {
    let report = calibration(cfg)?.inspect()?;
    if !report.header_valid {
        return Err(eyre::Report::new(GateError::Store(
            "store is uninitialized; nothing to export".into(),
        )));
    }
    let rows: Vec<CalibrationRow> = report
        .records
        .iter()
        .enumerate()
        .map(|(gate, r)| CalibrationRow {
            gate,
            open_raw: r.open_raw,
            close_raw: r.close_raw,
        })
        .collect();
    match out {
        Some(path) => {
            let file = fs::File::create(path)
                .wrap_err_with(|| format!("create {}", path.display()))?;
            blastgate_config::write_calibration_csv(file, &rows)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            blastgate_config::write_calibration_csv(&mut lock, &rows)?;
            lock.flush()?;
        }
    }
    Ok(())
}

pub fn cmd_calibration_import(cfg: &Config, file: &Path, json: bool) -> Result<()> {
    let rows = blastgate_config::load_calibration_csv(file)
        .map_err(|e| config_error(format!("{e}")))?;
    let gates = cfg.gates.len();
    if let Some(row) = rows.iter().find(|r| r.gate >= gates) {
        return Err(config_error(format!(
            "calibration CSV has a row for gate {} but the config has {gates} gates",
            row.gate
        )));
    }

    let mut store = calibration(cfg)?;
    // an uninitialized store is reset first so untouched gates read neutral
    store.load()?;
    for row in &rows {
        store.commit(row.gate, Endpoint::Open, row.open_raw)?;
        store.commit(row.gate, Endpoint::Close, row.close_raw)?;
    }
    tracing::info!(rows = rows.len(), "calibration imported");
    if json {
        println!("{}", json!({ "imported": rows.len() }));
    } else {
        println!("imported calibration for {} gates", rows.len());
    }
    Ok(())
}

pub fn cmd_calibration_reset(cfg: &Config, json: bool) -> Result<()> {
    calibration(cfg)?.reset()?;
    if json {
        println!("{}", json!({ "reset": true, "gates": cfg.gates.len() }));
    } else {
        println!(
            "calibration reset: {} gates at the neutral angle ({NEUTRAL_ANGLE})",
            cfg.gates.len()
        );
    }
    Ok(())
}
