use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum GateError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("no gate {gate}; controller has {count}")]
    InvalidGate { gate: usize, count: usize },
    #[error("calibration store error: {0}")]
    Store(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("no gates configured")]
    MissingGates,
    #[error("missing collector relay lines")]
    MissingCollector,
    #[error("missing knob")]
    MissingKnob,
    #[error("missing calibration store")]
    MissingStore,
    #[error("{gates} gates exceed the calibration store capacity of {max}")]
    TooManyGates { gates: usize, max: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
