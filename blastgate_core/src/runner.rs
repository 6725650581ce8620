//! Polling loop that drives a booted controller until asked to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{info, trace};

use crate::controller::GateController;
use crate::error::Result;

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub presses: u64,
}

/// Call `tick()` at the configured `poll_hz` until `stop` is set, or until
/// `max_ticks` iterations when given. Errors from a tick end the loop.
///
/// Actuations block inside `tick`, so the effective rate drops while a gate
/// or the collector is moving.
pub fn run(
    ctrl: &mut GateController,
    stop: &AtomicBool,
    max_ticks: Option<u64>,
) -> Result<RunSummary> {
    let period = Duration::from_micros(crate::util::period_us(ctrl.timing().poll_hz));
    let clock = ctrl.clock();
    let mut summary = RunSummary::default();
    info!(period_us = period.as_micros() as u64, "control loop start");

    while !stop.load(Ordering::Relaxed) {
        if max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        let status = ctrl.tick()?;
        summary.ticks += 1;
        if !status.is_idle() {
            summary.presses += status.handled.len() as u64;
            trace!(handled = ?status.handled, "tick handled presses");
        }
        clock.sleep(period);
    }

    info!(ticks = summary.ticks, presses = summary.presses, "control loop stopped");
    Ok(summary)
}
