//! Type-state builder for `Servo` and generic `build_controller` constructor.
//!
//! The builder enforces at compile time that an actuator and a feedback sensor
//! are provided before `build()` is available. `try_build()` is always
//! available for dynamic checks. Both paths validate the config and run the
//! startup sequence (feedback presence check, park at rest, detach).

use std::marker::PhantomData;
use std::sync::Arc;

use servo_traits::clock::{Clock, MonotonicClock};
use servo_traits::{Actuator, FeedbackSensor};

use crate::config::{ServoConfig, Timing};
use crate::controller::PositionController;
use crate::error::{BuildError, Result};
use crate::schedule::MoveSchedule;

/// Dynamically dispatched controller produced by the builder.
pub type Servo = PositionController<Box<dyn Actuator>, Box<dyn FeedbackSensor>>;

impl Servo {
    /// Start building a controller.
    pub fn builder() -> ServoBuilder<Missing, Missing> {
        ServoBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Servo`. All fields are validated on `build()`.
pub struct ServoBuilder<A, F> {
    actuator: Option<Box<dyn Actuator>>,
    sensor: Option<Box<dyn FeedbackSensor>>,
    config: Option<ServoConfig>,
    timing: Option<Timing>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _a: PhantomData<A>,
    _f: PhantomData<F>,
}

impl Default for ServoBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            actuator: None,
            sensor: None,
            config: None,
            timing: None,
            clock: None,
            _a: PhantomData,
            _f: PhantomData,
        }
    }
}

/// Validate configuration, construct the controller, and run startup.
///
/// This is the single source of truth for validation and construction,
/// used by both `ServoBuilder::try_build()` and `build_controller()`.
fn validate_and_build<A: Actuator, F: FeedbackSensor>(
    actuator: A,
    sensor: F,
    config: ServoConfig,
    timing: Timing,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<PositionController<A, F>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if config.pulse_min >= config.pulse_max {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pulse_min must be < pulse_max",
        )));
    }
    if !(config.pulse_min..=config.pulse_max).contains(&config.pulse_zero) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pulse_zero must lie within [pulse_min, pulse_max]",
        )));
    }
    if config.is_calibrated && config.feedback_min == config.feedback_max {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "calibrated feedback range must not be empty",
        )));
    }
    if timing.samples_per_read == 0 || timing.presence_samples == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sample counts must be >= 1",
        )));
    }
    if timing.max_iterations == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "max_iterations must be >= 1",
        )));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    let mut ctl = PositionController {
        actuator,
        sensor,
        config,
        timing,
        clock,
        last_pulse: 0,
        last_feedback: 0,
        has_feedback: false,
        schedule: MoveSchedule::default(),
    };
    ctl.startup()?;
    Ok(ctl)
}

impl<A, F> ServoBuilder<A, F> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Servo> {
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;

        validate_and_build(
            actuator,
            sensor,
            self.config.unwrap_or_default(),
            self.timing.unwrap_or_default(),
            self.clock,
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<A, F> ServoBuilder<A, F> {
    /// Servo record; a previously captured calibrated record is accepted as is.
    pub fn with_config(mut self, config: ServoConfig) -> Self {
        self.config = Some(config);
        self
    }
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = Some(timing);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<F> ServoBuilder<Missing, F> {
    pub fn with_actuator(self, actuator: impl Actuator + 'static) -> ServoBuilder<Set, F> {
        ServoBuilder {
            actuator: Some(Box::new(actuator)),
            sensor: self.sensor,
            config: self.config,
            timing: self.timing,
            clock: self.clock,
            _a: PhantomData,
            _f: PhantomData,
        }
    }
}

impl<A> ServoBuilder<A, Missing> {
    pub fn with_sensor(self, sensor: impl FeedbackSensor + 'static) -> ServoBuilder<A, Set> {
        ServoBuilder {
            actuator: self.actuator,
            sensor: Some(Box::new(sensor)),
            config: self.config,
            timing: self.timing,
            clock: self.clock,
            _a: PhantomData,
            _f: PhantomData,
        }
    }
}

impl ServoBuilder<Set, Set> {
    /// Validate and build. Only available when actuator and sensor are set.
    pub fn build(self) -> Result<Servo> {
        self.try_build()
    }
}

/// Build a statically-dispatched controller from concrete drivers.
///
/// Delegates to the shared `validate_and_build`, no duplicated validation logic.
pub fn build_controller<A, F>(
    actuator: A,
    sensor: F,
    config: ServoConfig,
    timing: Option<Timing>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<PositionController<A, F>>
where
    A: Actuator,
    F: FeedbackSensor,
{
    validate_and_build(actuator, sensor, config, timing.unwrap_or_default(), clock)
}
