//! Maps `Box<dyn Error>` from trait boundaries to typed `ServoError`.
//!
//! The traits in `servo_traits` use `Box<dyn Error + Send + Sync>` so any driver
//! can plug in; this module converts those to our typed error enum, with an
//! optional feature-gated path for `servo_hardware::HwError` downcasting.

use crate::error::{Result, ServoError};
use eyre::WrapErr;
use servo_traits::DriverError;

/// Map a trait-boundary error to a typed `ServoError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to a generic hardware error carrying the message.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ServoError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<servo_hardware::error::HwError>() {
            return match hw {
                servo_hardware::error::HwError::NotAttached
                | servo_hardware::error::HwError::InvalidChannel(_) => {
                    ServoError::HardwareFault(hw.to_string())
                }
                other => ServoError::Hardware(other.to_string()),
            };
        }
    }

    ServoError::Hardware(e.to_string())
}

/// Convert a driver call result into a core result with context.
pub(crate) fn driver<T>(
    r: std::result::Result<T, DriverError>,
    what: &'static str,
) -> Result<T> {
    r.map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err(what)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_errors_become_hardware() {
        let e: DriverError = "bus glitch".into();
        assert_eq!(
            map_hw_error(&*e),
            ServoError::Hardware("bus glitch".to_string())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn detached_write_is_a_fault() {
        let e: DriverError = Box::new(servo_hardware::error::HwError::NotAttached);
        assert!(matches!(map_hw_error(&*e), ServoError::HardwareFault(_)));
    }
}
