use thiserror::Error;

/// Every way a controller operation can report failure. The controller stays
/// usable after any of them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServoError {
    #[error("degree command {0} is outside 0..=180")]
    DegreeOutOfRange(u8),
    #[error("pulse {requested} us is outside the configured bounds; applied {applied} us")]
    Clamped { requested: i32, applied: u16 },
    #[error("servo is disabled")]
    Disabled,
    #[error("no feedback sensor detected")]
    NoFeedback,
    #[error("feedback did not settle within {0} polls")]
    NotSettled(u16),
    #[error("zero search did not converge within {0} iterations")]
    ZeroNotFound(u16),
    #[error("no position has been commanded yet")]
    NeverCommanded,
    #[error("calibration rejected: {0}")]
    CalibrationRejected(&'static str),
    #[error("both timed-move slots are in use")]
    ScheduleFull,
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
}

impl ServoError {
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_) | Self::HardwareFault(_))
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing feedback sensor")]
    MissingSensor,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Typed view of a report, if it carries a `ServoError`.
pub fn servo_error(report: &Report) -> Option<&ServoError> {
    report.downcast_ref::<ServoError>()
}

/// True for driver failures and for reports that carry no `ServoError` at all.
pub(crate) fn is_hardware_report(report: &Report) -> bool {
    servo_error(report).is_none_or(ServoError::is_hardware)
}
