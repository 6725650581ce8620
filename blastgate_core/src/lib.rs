#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core blast-gate logic (hardware-agnostic).
//!
//! All hardware goes through the capability traits in `blastgate_traits`;
//! every wait goes through its `Clock`, so the whole controller runs against
//! simulated drivers and a manual clock in tests.
//!
//! ## Architecture
//!
//! - **Debouncing**: `Debouncer` and per-gate `ButtonChannel` (`debounce`)
//! - **Actuation**: `GateActuator` with its settle wait, `CollectorController`
//!   with its relay pulse
//! - **Protocols**: `InterlockController` (normal mode) and
//!   `CalibrationController` (programming mode) over a shared `Manifold`
//! - **Persistence**: `PersistentCalibration` over a 256-byte `ByteStore`
//! - **Events**: `EventBus` fanning `GateEvent`s out to status sinks and the
//!   `Beeper`
//!
//! `GateController` owns all of the above and is built with
//! `GateController::builder()`.

pub mod actuator;
pub mod builder;
pub mod calibration;
pub mod collector;
pub mod config;
pub mod controller;
mod conversions;
pub mod debounce;
pub mod error;
pub mod events;
pub mod feedback;
pub mod hw_error;
pub mod interlock;
pub mod manifold;
pub mod mapping;
pub mod mocks;
pub mod runner;
pub mod session;
pub mod status;
pub mod store;
pub mod util;

pub use builder::GateControllerBuilder;
pub use calibration::CalibrationController;
pub use collector::CollectorController;
pub use config::{FeedbackCfg, InputCfg, TimingCfg};
pub use controller::GateController;
pub use debounce::{ButtonChannel, Debouncer, Edge};
pub use error::{BuildError, GateError, Result};
pub use events::{EventBus, GateEvent, StatusSink};
pub use feedback::Beeper;
pub use interlock::InterlockController;
pub use mapping::{angle_of, quantize};
pub use runner::{RunSummary, run};
pub use session::CalibrationSession;
pub use status::{Mode, PressOutcome, TickStatus};
pub use store::{Endpoint, PersistentCalibration, RawEndpoints, StoreReport};
