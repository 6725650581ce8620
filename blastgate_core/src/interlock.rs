//! Normal-mode gate selection.
//!
//! Pressing a closed gate's button:
//! 1. opens that gate,
//! 2. starts the collector if it is off,
//! 3. closes every other open gate, lowest index first.
//!
//! Opening before starting suction and closing only afterwards keeps at
//! least one path open whenever the collector runs, at every step. Pressing
//! the already-open gate only toggles the collector; no servo moves.
//!
//! A selection cut short by a driver error can leave more than one gate
//! open. Re-pressing the selected gate closes those strays before toggling
//! the collector, so the manifold gets back to a single open gate.

use tracing::{info, warn};

use crate::error::Result;
use crate::events::GateEvent;
use crate::manifold::Manifold;
use crate::status::PressOutcome;

pub struct InterlockController;

impl InterlockController {
    pub fn press(m: &mut Manifold, i: usize) -> Result<PressOutcome> {
        if m.gate(i)?.is_open() {
            if m.open_gates().any(|j| j != i) {
                warn!(gate = i, "closing gates left open by an interrupted selection");
                close_others(m, i)?;
            }
            let on = !m.collector.is_on();
            m.set_collector(on)?;
            info!(gate = i, collector_on = on, "collector toggled from open gate");
            return Ok(PressOutcome::CollectorToggled { gate: i, on });
        }

        m.move_gate(i, true)?;
        if !m.collector.is_on() {
            m.set_collector(true)?;
        }
        close_others(m, i)?;

        info!(gate = i, "gate selected");
        m.emit(GateEvent::SelectionComplete { gate: i });
        Ok(PressOutcome::Selected { gate: i })
    }
}

/// Close every open gate except `keep`, lowest index first.
fn close_others(m: &mut Manifold, keep: usize) -> Result<()> {
    let others: Vec<usize> = m.open_gates().filter(|&j| j != keep).collect();
    for j in others {
        m.move_gate(j, false)?;
    }
    Ok(())
}
