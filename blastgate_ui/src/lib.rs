#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Text status panel for the operator display.
//!
//! `StatusPanel` is a [`StatusSink`]: it follows controller events and
//! renders the same screens as the panel on the manifold itself.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use blastgate_core::{Endpoint, GateEvent, Mode, StatusSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Pending,
    Ready,
    Open,
    Closed,
    Opening,
    Closing,
}

impl Line {
    fn text(self) -> &'static str {
        match self {
            Self::Pending => "",
            Self::Ready => "ready",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Closing => "closing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Screen {
    Booting,
    Status,
    /// Programming mode, with the capture prompt if a gate is selected
    Programming(Option<(Endpoint, usize)>),
}

#[derive(Debug)]
struct PanelState {
    labels: Vec<Option<String>>,
    gates: Vec<Line>,
    collector: Option<bool>,
    screen: Screen,
}

/// Shared handle to the rendered panel; clones see the same screen.
#[derive(Debug, Clone)]
pub struct StatusPanel {
    state: Rc<RefCell<PanelState>>,
}

impl StatusPanel {
    /// One optional label per gate, in gate order.
    pub fn new(labels: Vec<Option<String>>) -> Self {
        let gates = vec![Line::Pending; labels.len()];
        Self {
            state: Rc::new(RefCell::new(PanelState {
                labels,
                gates,
                collector: None,
                screen: Screen::Booting,
            })),
        }
    }

    pub fn unlabelled(gates: usize) -> Self {
        Self::new(vec![None; gates])
    }

    pub fn render(&self) -> String {
        let st = self.state.borrow();
        let mut out = String::new();
        match &st.screen {
            Screen::Booting => out.push_str("booting...\n"),
            Screen::Programming(prompt) => {
                out.push_str("programming mode\n");
                if let Some((endpoint, gate)) = prompt {
                    let _ = writeln!(out, "{endpoint} gate {gate}");
                }
            }
            Screen::Status => {
                let collector = match st.collector {
                    None => "ready",
                    Some(true) => "on",
                    Some(false) => "off",
                };
                let _ = writeln!(out, "collector: {collector}");
                for (i, line) in st.gates.iter().enumerate() {
                    if *line == Line::Pending {
                        continue;
                    }
                    match st.labels.get(i).and_then(Option::as_deref) {
                        Some(label) => {
                            let _ = writeln!(out, "gate {i} ({label}): {}", line.text());
                        }
                        None => {
                            let _ = writeln!(out, "gate {i}: {}", line.text());
                        }
                    }
                }
            }
        }
        out
    }

    fn set_gate(st: &mut PanelState, gate: usize, line: Line) {
        if let Some(slot) = st.gates.get_mut(gate) {
            *slot = line;
        }
    }
}

impl StatusSink for StatusPanel {
    fn on_event(&mut self, event: &GateEvent) {
        let mut st = self.state.borrow_mut();
        match *event {
            GateEvent::BootStarted { gates } => {
                st.gates = vec![Line::Pending; gates];
                st.labels.resize(gates, None);
                st.collector = None;
                st.screen = Screen::Status;
            }
            GateEvent::GateReady { gate } => Self::set_gate(&mut st, gate, Line::Ready),
            GateEvent::BootComplete { mode } => {
                st.collector = Some(false);
                for line in &mut st.gates {
                    *line = Line::Closed;
                }
                st.screen = match mode {
                    Mode::Normal => Screen::Status,
                    Mode::Programming => Screen::Programming(None),
                };
            }
            GateEvent::GateOpening { gate } => Self::set_gate(&mut st, gate, Line::Opening),
            GateEvent::GateOpen { gate } => Self::set_gate(&mut st, gate, Line::Open),
            GateEvent::GateClosing { gate } => Self::set_gate(&mut st, gate, Line::Closing),
            GateEvent::GateClosed { gate } => Self::set_gate(&mut st, gate, Line::Closed),
            GateEvent::CollectorOn => st.collector = Some(true),
            GateEvent::CollectorOff => st.collector = Some(false),
            GateEvent::CalibrationEntered { gate, phase } => {
                st.screen = Screen::Programming(Some((phase, gate)));
            }
            GateEvent::CalibrationCommitted { gate, .. } => {
                Self::set_gate(&mut st, gate, Line::Closed);
                st.screen = Screen::Programming(None);
            }
            GateEvent::StoreReset
            | GateEvent::PressAccepted { .. }
            | GateEvent::SelectionComplete { .. }
            | GateEvent::EndpointCaptured { .. } => {}
        }
    }
}
