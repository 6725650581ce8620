//! Programming-mode session state.

use crate::store::Endpoint;

/// Which gate is being taught and which endpoint comes next.
///
/// The gate index only exists in the capturing variants, so a capture with no
/// gate (or an idle session that still remembers one) cannot be expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CalibrationSession {
    #[default]
    Idle,
    CapturingOpen {
        gate: usize,
    },
    CapturingClose {
        gate: usize,
    },
}

impl CalibrationSession {
    pub fn active_gate(&self) -> Option<usize> {
        match *self {
            Self::Idle => None,
            Self::CapturingOpen { gate } | Self::CapturingClose { gate } => Some(gate),
        }
    }

    /// Endpoint the next confirming press will capture.
    pub fn pending(&self) -> Option<Endpoint> {
        match self {
            Self::Idle => None,
            Self::CapturingOpen { .. } => Some(Endpoint::Open),
            Self::CapturingClose { .. } => Some(Endpoint::Close),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for CalibrationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::CapturingOpen { gate } => write!(f, "capturing open of gate {gate}"),
            Self::CapturingClose { gate } => write!(f, "capturing close of gate {gate}"),
        }
    }
}
