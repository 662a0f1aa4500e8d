//! Configuration types for the position controller.
//!
//! These are the runtime structs used by `PositionController`. They are
//! separate from the TOML-deserialized config in `servo_config`.

/// The servo record: channels, flags, pulse bounds and feedback anchors.
///
/// Calibration updates `pulse_zero`, `feedback_zero`, `feedback_min`,
/// `feedback_max` and `is_calibrated`; callers may capture the record
/// afterwards and rebuild an already-calibrated controller from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoConfig {
    pub signal_channel: u8,
    pub feedback_channel: u8,
    pub is_calibrated: bool,
    /// Negates relative offsets in both directions.
    pub is_reversed: bool,
    /// Refuse every position command.
    pub is_disabled: bool,
    /// Rest point in microseconds.
    pub pulse_zero: u16,
    pub pulse_min: u16,
    pub pulse_max: u16,
    /// Semantic travel range; not used by the conversions.
    pub degree_min: i16,
    pub degree_max: i16,
    /// Feedback reading at `pulse_zero`.
    pub feedback_zero: u16,
    /// Feedback reading expected at `pulse_min`.
    pub feedback_min: u16,
    /// Feedback reading expected at `pulse_max`.
    pub feedback_max: u16,
}

impl ServoConfig {
    /// Fresh, uncalibrated record for the given channels.
    pub fn with_channels(signal_channel: u8, feedback_channel: u8) -> Self {
        Self {
            signal_channel,
            feedback_channel,
            ..Self::default()
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            signal_channel: 18,
            feedback_channel: 0,
            is_calibrated: false,
            is_reversed: true,
            is_disabled: false,
            pulse_zero: 1500,
            pulse_min: 500,
            pulse_max: 2500,
            degree_min: -500,
            degree_max: 500,
            feedback_zero: 511,
            feedback_min: 0,
            feedback_max: 1023,
        }
    }
}

/// Pacing and iteration limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait between the two samples of a settle poll, and per zero-search step (ms).
    pub settle_interval_ms: u64,
    /// Spacing between raw reads inside one averaged sample (ms).
    pub sample_spacing_ms: u64,
    /// Raw reads per averaged sample.
    pub samples_per_read: u8,
    /// Raw reads used once at startup to decide feedback presence.
    pub presence_samples: u8,
    /// Averaged presence reading must exceed this for feedback to count as present.
    pub noise_threshold: u16,
    /// Iteration budget for settle-wait and zero search.
    pub max_iterations: u16,
    /// Relative excursion used by range calibration (µs).
    pub calibration_range: u16,
    /// Hold after an unconfirmed startup rest command (ms).
    pub startup_hold_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle_interval_ms: 100,
            sample_spacing_ms: 10,
            samples_per_read: 4,
            presence_samples: 8,
            noise_threshold: 5,
            max_iterations: 300,
            calibration_range: 0x160,
            startup_hold_ms: 500,
        }
    }
}
