//! Maps `Box<dyn Error>` from trait boundaries to typed `GateError`.
//!
//! The traits in `blastgate_traits` use `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `blastgate_hardware::HwError`.

use crate::error::GateError;

/// Map a trait-boundary error to a typed `GateError`.
///
/// Known hardware error types are downcast first; anything else is carried
/// as its display string.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GateError {
    #[cfg(feature = "hardware-errors")]
    {
        use blastgate_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Image { .. } | HwError::Io(_) => GateError::Store(hw.to_string()),
                other => GateError::HardwareFault(other.to_string()),
            };
        }
    }

    GateError::Hardware(e.to_string())
}

/// Lift a driver result into the core `Result`, tagging it with `what`.
pub(crate) fn driver<T>(
    res: Result<T, Box<dyn std::error::Error + Send + Sync>>,
    what: &'static str,
) -> crate::error::Result<T> {
    use eyre::WrapErr;
    res.map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err(what)
}
