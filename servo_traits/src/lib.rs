//! Hardware-facing traits shared across the servo stack.
//!
//! The controller in `servo_core` only ever talks to hardware through these
//! traits, so simulated drivers can be injected in tests.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error type used at the driver boundary.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Pulse generator for one servo signal line.
///
/// Writing while not attached is invalid; callers attach first.
pub trait Actuator {
    /// Start producing a signal on `channel`, limited to `[min_us, max_us]`.
    fn attach(&mut self, channel: u8, min_us: u16, max_us: u16) -> Result<(), DriverError>;
    /// Set the pulse width in microseconds.
    fn write(&mut self, pulse_us: u16) -> Result<(), DriverError>;
    /// Stop producing a signal and release the line.
    fn detach(&mut self) -> Result<(), DriverError>;
    fn is_attached(&self) -> bool;
}

/// Raw analog position feedback. No filtering; one instantaneous sample per call.
pub trait FeedbackSensor {
    fn read(&mut self, channel: u8) -> Result<u16, DriverError>;
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn attach(&mut self, channel: u8, min_us: u16, max_us: u16) -> Result<(), DriverError> {
        (**self).attach(channel, min_us, max_us)
    }
    fn write(&mut self, pulse_us: u16) -> Result<(), DriverError> {
        (**self).write(pulse_us)
    }
    fn detach(&mut self) -> Result<(), DriverError> {
        (**self).detach()
    }
    fn is_attached(&self) -> bool {
        (**self).is_attached()
    }
}

impl<T: FeedbackSensor + ?Sized> FeedbackSensor for Box<T> {
    fn read(&mut self, channel: u8) -> Result<u16, DriverError> {
        (**self).read(channel)
    }
}
