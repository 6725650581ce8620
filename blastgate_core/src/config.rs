//! Runtime configuration for the controller (already validated, in core units).

/// Fixed delays and polling rate of the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingCfg {
    /// A raw button level must hold for longer than this to count (ms)
    pub debounce_ms: u64,
    /// Gate settle time after a servo command (ms)
    pub move_ms: u64,
    /// Collector relay pulse width (ms)
    pub collector_pulse_ms: u64,
    /// Pause between gate initializations at boot (ms)
    pub boot_stagger_ms: u64,
    /// Control loop rate for the runner
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

/// Button wiring polarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputCfg {
    pub active_low: bool,
}

/// Beeper timing.
#[derive(Debug, Clone, PartialEq, Eq)]
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
