//! Servo drivers: a simulated servo for tests and sim runs, plus Raspberry Pi
//! backends behind the `hardware` feature.

pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio_pwm;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod mcp3008;
pub mod sim;

pub use servo_traits::{Actuator, FeedbackSensor};
pub use sim::{FeedbackModel, SimulatedActuator, SimulatedSensor, SimulatedServo};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio_pwm::PwmServo;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use mcp3008::Mcp3008;
