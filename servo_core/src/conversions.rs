//! `From` implementations bridging `servo_config` types to `servo_core` types.
//!
//! The servo record converts both ways so a calibrated controller's state can
//! be written back into the config file.

use crate::config::{ServoConfig, Timing};

// ── ServoConfig ──────────────────────────────────────────────────────────────

impl From<&servo_config::ServoCfg> for ServoConfig {
    fn from(c: &servo_config::ServoCfg) -> Self {
        Self {
            signal_channel: c.signal_channel,
            feedback_channel: c.feedback_channel,
            is_calibrated: c.is_calibrated,
            is_reversed: c.is_reversed,
            is_disabled: c.is_disabled,
            pulse_zero: c.pulse_zero,
            pulse_min: c.pulse_min,
            pulse_max: c.pulse_max,
            degree_min: c.degree_min,
            degree_max: c.degree_max,
            feedback_zero: c.feedback_zero,
            feedback_min: c.feedback_min,
            feedback_max: c.feedback_max,
        }
    }
}

impl From<&ServoConfig> for servo_config::ServoCfg {
    fn from(c: &ServoConfig) -> Self {
        Self {
            signal_channel: c.signal_channel,
            feedback_channel: c.feedback_channel,
            is_calibrated: c.is_calibrated,
            is_reversed: c.is_reversed,
            is_disabled: c.is_disabled,
            pulse_zero: c.pulse_zero,
            pulse_min: c.pulse_min,
            pulse_max: c.pulse_max,
            degree_min: c.degree_min,
            degree_max: c.degree_max,
            feedback_zero: c.feedback_zero,
            feedback_min: c.feedback_min,
            feedback_max: c.feedback_max,
        }
    }
}

// ── Timing ───────────────────────────────────────────────────────────────────

impl From<&servo_config::TimingCfg> for Timing {
    fn from(c: &servo_config::TimingCfg) -> Self {
        Self {
            settle_interval_ms: c.settle_interval_ms,
            sample_spacing_ms: c.sample_spacing_ms,
            samples_per_read: c.samples_per_read,
            presence_samples: c.presence_samples,
            noise_threshold: c.noise_threshold,
            max_iterations: c.max_iterations,
            calibration_range: c.calibration_range,
            startup_hold_ms: c.startup_hold_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_agree_across_crates() {
        let core: ServoConfig = (&servo_config::ServoCfg::default()).into();
        assert_eq!(core, ServoConfig::default());
        let timing: Timing = (&servo_config::TimingCfg::default()).into();
        assert_eq!(timing, Timing::default());
    }

    #[test]
    fn servo_record_round_trips() {
        let core = ServoConfig {
            is_calibrated: true,
            pulse_zero: 1400,
            feedback_min: 20,
            feedback_max: 990,
            ..ServoConfig::default()
        };
        let cfg: servo_config::ServoCfg = (&core).into();
        assert_eq!(ServoConfig::from(&cfg), core);
    }
}
