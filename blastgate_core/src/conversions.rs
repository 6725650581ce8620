//! `From` implementations bridging `blastgate_config` sections to core config.

use crate::config::{FeedbackCfg, InputCfg, TimingCfg};

impl From<&blastgate_config::TimingCfg> for TimingCfg {
    fn from(c: &blastgate_config::TimingCfg) -> Self {
        Self {
            debounce_ms: c.debounce_ms,
            move_ms: c.move_ms,
            collector_pulse_ms: c.collector_pulse_ms,
            boot_stagger_ms: c.boot_stagger_ms,
            poll_hz: c.poll_hz,
        }
    }
}

impl From<&blastgate_config::InputCfg> for InputCfg {
    fn from(c: &blastgate_config::InputCfg) -> Self {
        Self {
            active_low: c.active_low,
        }
    }
}

impl From<&blastgate_config::FeedbackCfg> for FeedbackCfg {
    fn from(c: &blastgate_config::FeedbackCfg) -> Self {
        Self {
            enabled: c.enabled,
            beep_ms: c.beep_ms,
            gap_ms: c.gap_ms,
        }
    }
}
