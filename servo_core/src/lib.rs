#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Feedback servo position control (hardware-agnostic).
//!
//! This crate drives one position servo through `servo_traits::Actuator` and
//! reads its potentiometer through `servo_traits::FeedbackSensor`.
//!
//! ## Coordinate spaces
//!
//! - **Pulse width** (µs): the canonical unit written to the actuator.
//! - **Degrees** (`0..=180`): mapped linearly onto `[pulse_min, pulse_max]`.
//! - **Relative offset**: signed distance from `pulse_zero`, sign flipped when
//!   the servo is reversed.
//! - **Feedback**: raw ADC counts, mapped back onto pulse widths through the
//!   calibrated anchors `[feedback_min, feedback_max]`.
//!
//! ## Architecture
//!
//! - **Controller**: commands, readback, settle-wait, zero search and range
//!   calibration (`controller` module)
//! - **Builder**: validation and the startup sequence (`builder` module)
//! - **Calibration**: two-point border extrapolation (`calibration` module)
//! - **Configuration**: runtime config structs (`config` module)
//! - **Timed moves**: up to two pending relative moves (`schedule` module)

pub mod builder;
pub mod calibration;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod diagnostics;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod schedule;
pub mod util;

pub use builder::{Servo, ServoBuilder, build_controller};
pub use config::{ServoConfig, Timing};
pub use controller::PositionController;
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use error::{BuildError, ServoError};
