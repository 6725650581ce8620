//! Controller mode and per-tick results.

/// Operating mode, decided once at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Presses select gates through the interlock.
    Normal,
    /// Presses teach gate endpoints.
    Programming,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Programming => "programming",
        })
    }
}

/// What one handled press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// The gate was already open; only the collector changed.
    CollectorToggled { gate: usize, on: bool },
    /// The gate is now the single open gate and the collector runs.
    Selected { gate: usize },
    /// Programming mode: this gate is now being taught, open endpoint first.
    CaptureStarted { gate: usize },
    /// Programming mode: the open endpoint was stored.
    OpenCaptured { gate: usize, raw: u8 },
    /// Programming mode: both endpoints stored and applied.
    Committed {
        gate: usize,
        open_angle: u8,
        close_angle: u8,
    },
}

impl PressOutcome {
    pub fn gate(&self) -> usize {
        match *self {
            Self::CollectorToggled { gate, .. }
            | Self::Selected { gate }
            | Self::CaptureStarted { gate }
            | Self::OpenCaptured { gate, .. }
            | Self::Committed { gate, .. } => gate,
        }
    }
}

/// Result of one control loop iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickStatus {
    /// Presses committed by the debouncers this tick, in button order.
    pub handled: Vec<PressOutcome>,
    /// Angle written to the gate under calibration, if any.
    pub preview: Option<u8>,
}

impl TickStatus {
    pub fn is_idle(&self) -> bool {
        self.handled.is_empty()
    }
}
