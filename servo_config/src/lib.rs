#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the servo controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The `[servo]` table doubles as the persisted calibration record: after a
//!   zero search or range calibration the CLI writes it back with
//!   [`Config::save_toml`], and the next run reconstructs an already-calibrated
//!   controller from it.
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The servo record: channels, flags, and all bounds/anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServoCfg {
    /// Output channel for the pulse signal (BCM GPIO number on hardware).
    pub signal_channel: u8,
    /// Input channel for the feedback ADC.
    pub feedback_channel: u8,
    pub is_calibrated: bool,
    /// Negate relative offsets. Accepts the older `is_clockwise` key.
    #[serde(alias = "is_clockwise")]
    pub is_reversed: bool,
    pub is_disabled: bool,
    pub pulse_zero: u16,
    pub pulse_min: u16,
    pub pulse_max: u16,
    pub degree_min: i16,
    pub degree_max: i16,
    pub feedback_zero: u16,
    pub feedback_min: u16,
    pub feedback_max: u16,
}

impl Default for ServoCfg {
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

/// Pacing and iteration limits for sampling, settling and calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingCfg {
    /// Wait between the two samples of a settle poll (ms).
    pub settle_interval_ms: u64,
    /// Spacing between raw reads inside one averaged sample (ms).
    pub sample_spacing_ms: u64,
    /// Raw reads per averaged sample.
    pub samples_per_read: u8,
    /// Raw reads used once at startup to decide feedback presence.
    pub presence_samples: u8,
    /// Averaged reading at or below this means no sensor is wired.
    pub noise_threshold: u16,
    /// Iteration budget for settle-wait and zero search.
    pub max_iterations: u16,
    /// Relative excursion used by range calibration (µs).
    pub calibration_range: u16,
    /// Hold after the startup rest command when it could not be confirmed (ms).
    pub startup_hold_ms: u64,
}

impl Default for TimingCfg {
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

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Path to a .log file (JSON lines)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// "error" | "warn" | "info" | "debug" | "trace"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Hardware {
    /// PWM frame length; hobby servos expect 20 ms.
    pub pwm_period_ms: u64,
    /// SPI bus of the feedback ADC.
    pub spi_bus: u8,
    /// SPI chip select of the feedback ADC.
    pub spi_slave_select: u8,
    pub spi_clock_hz: u32,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            pwm_period_ms: 20,
            spi_bus: 0,
            spi_slave_select: 0,
            spi_clock_hz: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub servo: ServoCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn to_toml_string(&self) -> eyre::Result<String> {
        toml::to_string_pretty(self).map_err(|e| eyre::eyre!("serialize config: {e}"))
    }

    /// Persist the whole config, typically after calibration updated `[servo]`.
    pub fn save_toml(&self, path: &Path) -> eyre::Result<()> {
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|e| eyre::eyre!("write config {:?}: {}", path, e))
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Servo bounds
        let s = &self.servo;
        if s.pulse_min >= s.pulse_max {
            eyre::bail!("servo.pulse_min must be < servo.pulse_max");
        }
        if !(s.pulse_min..=s.pulse_max).contains(&s.pulse_zero) {
            eyre::bail!("servo.pulse_zero must lie within [pulse_min, pulse_max]");
        }
        if s.degree_min > s.degree_max {
            eyre::bail!("servo.degree_min must be <= servo.degree_max");
        }
        if s.is_calibrated && s.feedback_min == s.feedback_max {
            eyre::bail!("servo.feedback_min and feedback_max must differ on a calibrated servo");
        }

        // Timing
        let t = &self.timing;
        if t.samples_per_read == 0 {
            eyre::bail!("timing.samples_per_read must be >= 1");
        }
        if t.presence_samples == 0 {
            eyre::bail!("timing.presence_samples must be >= 1");
        }
        if t.max_iterations == 0 {
            eyre::bail!("timing.max_iterations must be >= 1");
        }
        if t.calibration_range == 0 {
            eyre::bail!("timing.calibration_range must be >= 1");
        }
        if t.settle_interval_ms > 60 * 1000 {
            eyre::bail!("timing.settle_interval_ms is unreasonably large (>60s)");
        }

        // Hardware
        if self.hardware.pwm_period_ms == 0 {
            eyre::bail!("hardware.pwm_period_ms must be >= 1");
        }
        if self.hardware.spi_clock_hz == 0 {
            eyre::bail!("hardware.spi_clock_hz must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
