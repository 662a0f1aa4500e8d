//! The position-control and calibration state machine (`PositionController`).
//!
//! Every command converges on a pulse width, is clamped into
//! `[pulse_min, pulse_max]`, and only then reaches the actuator. Feedback is
//! averaged in software; settle-wait and zero search are bounded polling loops
//! paced by the injected clock.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use servo_traits::clock::Clock;
use servo_traits::{Actuator, FeedbackSensor};
use tracing::{debug, info, trace, warn};

use crate::calibration::{Sample, fit_range};
use crate::config::{ServoConfig, Timing};
use crate::diagnostics::DiagnosticSink;
use crate::error::{Result, ServoError, is_hardware_report, servo_error};
use crate::hw_error::driver;
use crate::schedule::{MoveSchedule, ScheduledMove};
use crate::util::{degree_to_pulse, map_range, saturate_u16};

/// Errors larger than this (in feedback counts) get a proportional kick
/// during zero search.
const ZERO_SEARCH_KICK_THRESHOLD: i32 = 10;

/// Controller for one feedback servo.
///
/// Operations take `&mut self`; one controller owns its channels exclusively.
pub struct PositionController<A: Actuator, F: FeedbackSensor> {
    pub(crate) actuator: A,
    pub(crate) sensor: F,
    pub(crate) config: ServoConfig,
    pub(crate) timing: Timing,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,

    // 0 until the first accepted command
    pub(crate) last_pulse: u16,
    pub(crate) last_feedback: u16,
    // decided once during startup
    pub(crate) has_feedback: bool,
    pub(crate) schedule: MoveSchedule,
}

impl<A: Actuator, F: FeedbackSensor> std::fmt::Debug for PositionController<A, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionController")
            .field("config", &self.config)
            .field("last_pulse", &self.last_pulse)
            .field("last_feedback", &self.last_feedback)
            .field("has_feedback", &self.has_feedback)
            .field("attached", &self.actuator.is_attached())
            .finish()
    }
}

impl<A: Actuator, F: FeedbackSensor> PositionController<A, F> {
    // ── Accessors ────────────────────────────────────────────────────────────

    /// Current servo record, including anything calibration has updated.
    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn has_feedback(&self) -> bool {
        self.has_feedback
    }

    /// Most recent accepted pulse width; 0 if nothing was commanded yet.
    pub fn last_pulse(&self) -> u16 {
        self.last_pulse
    }

    /// Most recent averaged feedback reading.
    pub fn last_feedback(&self) -> u16 {
        self.last_feedback
    }

    pub fn is_attached(&self) -> bool {
        self.actuator.is_attached()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn sensor(&self) -> &F {
        &self.sensor
    }

    /// Enable or disable position commands at runtime.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.config.is_disabled = disabled;
    }

    /// Pulse width a degree command would produce, or `None` above 180.
    pub fn degree_to_pulse(&self, degrees: u8) -> Option<u16> {
        degree_to_pulse(degrees, self.config.pulse_min, self.config.pulse_max)
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    /// Absolute move in degrees (`0..=180`), mapped onto the pulse bounds.
    pub fn set_degrees(&mut self, degrees: u8, wait: bool) -> Result<()> {
        let Some(pulse) = self.degree_to_pulse(degrees) else {
            debug!(degrees, "degree command rejected");
            return Err(eyre::Report::new(ServoError::DegreeOutOfRange(degrees)));
        };
        self.set_pulse(pulse, wait)
    }

    /// Absolute move in microseconds.
    ///
    /// Out-of-bounds requests are clamped, the clamped value is applied
    /// (including the optional settle-wait), and `Clamped` is reported.
    pub fn set_pulse(&mut self, pulse: u16, wait: bool) -> Result<()> {
        self.command(i32::from(pulse), wait)
    }

    /// Clamp a requested pulse width, which may lie outside the `u16` domain,
    /// and apply it. `Clamped` carries the width that was actually asked for.
    fn command(&mut self, requested: i32, wait: bool) -> Result<()> {
        if self.config.is_disabled {
            debug!(requested, "pulse command refused: disabled");
            return Err(eyre::Report::new(ServoError::Disabled));
        }
        let lo = i32::from(self.config.pulse_min);
        let hi = i32::from(self.config.pulse_max);
        let applied = requested.clamp(lo, hi) as u16;
        self.apply_pulse(applied)?;

        let settled = if wait {
            self.wait_stable().map(drop)
        } else {
            Ok(())
        };
        if i32::from(applied) != requested {
            warn!(requested, applied, "pulse command clamped");
            return Err(eyre::Report::new(ServoError::Clamped {
                requested,
                applied,
            }));
        }
        settled
    }

    /// Move by a signed offset from `pulse_zero`; the sign flips when reversed.
    pub fn set_relative(&mut self, offset: i16, wait: bool) -> Result<()> {
        self.move_relative(i32::from(offset), wait)
    }

    fn move_relative(&mut self, offset: i32, wait: bool) -> Result<()> {
        let signed = if self.config.is_reversed {
            -offset
        } else {
            offset
        };
        self.command(i32::from(self.config.pulse_zero) + signed, wait)
    }

    /// Release the signal line. The next command re-attaches.
    pub fn detach(&mut self) -> Result<()> {
        if self.actuator.is_attached() {
            driver(self.actuator.detach(), "detaching actuator")?;
            debug!("actuator detached");
        }
        Ok(())
    }

    fn apply_pulse(&mut self, pulse: u16) -> Result<()> {
        if !self.actuator.is_attached() {
            driver(
                self.actuator.attach(
                    self.config.signal_channel,
                    self.config.pulse_min,
                    self.config.pulse_max,
                ),
                "attaching actuator",
            )?;
            debug!(channel = self.config.signal_channel, "actuator attached");
        }
        driver(self.actuator.write(pulse), "writing pulse")?;
        self.last_pulse = pulse;
        debug!(pulse, "pulse applied");
        Ok(())
    }

    // ── Readback ─────────────────────────────────────────────────────────────

    /// Current position as a pulse width.
    ///
    /// Without feedback this is the last commanded pulse, verbatim. With
    /// feedback a fresh sample is mapped through the feedback anchors.
    pub fn pulse(&mut self) -> Result<u16> {
        if !self.has_feedback {
            return Ok(self.last_pulse);
        }
        let f = self.feedback()?;
        let c = &self.config;
        let p = map_range(
            i64::from(f),
            i64::from(c.feedback_min),
            i64::from(c.feedback_max),
            i64::from(c.pulse_min),
            i64::from(c.pulse_max),
        );
        Ok(saturate_u16(p))
    }

    /// Current position as an offset from `pulse_zero`; 0 while uncalibrated.
    pub fn relative(&mut self) -> Result<i32> {
        if !self.config.is_calibrated {
            return Ok(0);
        }
        let pulse = i32::from(self.pulse()?);
        let sign = if self.config.is_reversed { 1 } else { -1 };
        Ok(sign * (i32::from(self.config.pulse_zero) - pulse))
    }

    // ── Feedback ─────────────────────────────────────────────────────────────

    /// Averaged feedback with the default sample count.
    pub fn feedback(&mut self) -> Result<u16> {
        self.sample_feedback(self.timing.samples_per_read)
    }

    /// Average of `count` raw reads spaced by `sample_spacing_ms`; the first
    /// read is immediate. A count of 0 is treated as 1.
    pub fn sample_feedback(&mut self, count: u8) -> Result<u16> {
        let count = count.max(1);
        let mut sum: u32 = 0;
        for i in 0..count {
            if i > 0 {
                self.clock.sleep_ms(self.timing.sample_spacing_ms);
            }
            let raw = driver(
                self.sensor.read(self.config.feedback_channel),
                "reading feedback",
            )?;
            sum += u32::from(raw);
        }
        self.last_feedback = (sum / u32::from(count)) as u16;
        trace!(count, feedback = self.last_feedback, "feedback sampled");
        Ok(self.last_feedback)
    }

    /// Block until two consecutive samples agree and return that reading.
    ///
    /// Fails with `NoFeedback` without touching the sensor when no feedback
    /// is wired, or with `NotSettled` once the iteration budget is spent.
    pub fn wait_stable(&mut self) -> Result<u16> {
        if !self.has_feedback {
            return Err(eyre::Report::new(ServoError::NoFeedback));
        }
        let budget = self.timing.max_iterations;
        for iteration in 1..=budget {
            let prev = self.feedback()?;
            self.clock.sleep_ms(self.timing.settle_interval_ms);
            let cur = self.feedback()?;
            if prev == cur {
                debug!(iteration, feedback = cur, "feedback settled");
                return Ok(cur);
            }
        }
        warn!(budget, feedback = self.last_feedback, "feedback did not settle");
        Err(eyre::Report::new(ServoError::NotSettled(budget)))
    }

    // ── Calibration ──────────────────────────────────────────────────────────

    /// Make the current horn position the new zero point.
    ///
    /// Searches for the pulse width that reproduces the current feedback
    /// reading and commits it as `pulse_zero` / `feedback_zero`. Without
    /// feedback the last command is simply re-issued.
    pub fn zero_at_current(&mut self) -> Result<()> {
        if !self.has_feedback {
            if self.last_pulse == 0 {
                return Err(eyre::Report::new(ServoError::NeverCommanded));
            }
            let pulse = self.last_pulse;
            return self.set_pulse(pulse, false);
        }

        let lo = i32::from(self.config.pulse_min);
        let hi = i32::from(self.config.pulse_max);
        let start = if self.last_pulse > 0 {
            self.last_pulse
        } else {
            self.config.pulse_zero
        };
        let mut candidate = i32::from(start).clamp(lo, hi);
        let wanted = self.feedback()?;
        debug!(wanted, start = candidate, "zero search started");

        let budget = self.timing.max_iterations;
        for iteration in 1..=budget {
            self.set_pulse(candidate as u16, false)?;
            self.clock.sleep_ms(self.timing.settle_interval_ms);
            let got = self.feedback()?;
            if got == wanted {
                self.config.pulse_zero = candidate as u16;
                self.config.feedback_zero = wanted;
                info!(
                    iteration,
                    pulse_zero = candidate,
                    feedback_zero = wanted,
                    "zero point committed"
                );
                return Ok(());
            }
            let err = i32::from(wanted) - i32::from(got);
            candidate += err.signum();
            if err.abs() > ZERO_SEARCH_KICK_THRESHOLD {
                candidate += 2 * err;
            }
            candidate = candidate.clamp(lo, hi);
            trace!(iteration, err, candidate, "zero search step");
        }
        warn!(budget, wanted, "zero search did not converge");
        Err(eyre::Report::new(ServoError::ZeroNotFound(budget)))
    }

    /// Fit `feedback_min` / `feedback_max` from two short excursions around
    /// a freshly searched zero point, then return to zero.
    ///
    /// The true pulse extremes are never commanded. On rejection the anchors
    /// and `is_calibrated` are left as they were.
    pub fn calibrate(&mut self) -> Result<()> {
        if !self.has_feedback {
            return Err(eyre::Report::new(ServoError::NoFeedback));
        }
        self.zero_at_current()
            .wrap_err("zero search before calibration")?;

        let zero = Sample {
            pulse: self.config.pulse_zero,
            feedback: self.config.feedback_zero,
        };
        let range = i32::from(self.timing.calibration_range);
        let toward_min = self.excursion(range)?;
        let toward_max = self.excursion(-range)?;
        let fit = fit_range(
            zero,
            toward_min,
            toward_max,
            self.config.pulse_min,
            self.config.pulse_max,
        );

        self.move_relative(0, false)?;

        let fitted = fit.map_err(|reason| {
            warn!(reason, ?toward_min, ?toward_max, "calibration rejected");
            eyre::Report::new(ServoError::CalibrationRejected(reason))
        })?;
        self.config.feedback_min = fitted.min;
        self.config.feedback_max = fitted.max;
        self.config.is_calibrated = true;
        info!(
            feedback_min = fitted.min,
            feedback_max = fitted.max,
            pulse_zero = zero.pulse,
            feedback_zero = zero.feedback,
            "range calibrated"
        );
        Ok(())
    }

    /// Relative move with settle-wait, then sample where the horn ended up.
    /// Settle and clamp failures are tolerated here.
    fn excursion(&mut self, offset: i32) -> Result<Sample> {
        if let Err(e) = self.move_relative(offset, true) {
            match servo_error(&e) {
                Some(ServoError::NotSettled(_) | ServoError::Clamped { .. }) => {
                    warn!(offset, error = %e, "calibration excursion not confirmed");
                }
                _ => return Err(e),
            }
        }
        let feedback = self.feedback()?;
        Ok(Sample {
            pulse: self.last_pulse,
            feedback,
        })
    }

    // ── Timed moves ──────────────────────────────────────────────────────────

    /// Queue a relative move to be applied by `tick` once `after` has elapsed.
    pub fn schedule_relative(&mut self, offset: i16, after: Duration) -> Result<()> {
        let due = self.clock.now() + after;
        self.schedule
            .push(ScheduledMove { due, offset })
            .map_err(eyre::Report::new)?;
        debug!(offset, after_ms = after.as_millis() as u64, "move scheduled");
        Ok(())
    }

    /// Apply every scheduled move that is due, earliest first, and return how
    /// many reached the actuator.
    ///
    /// A clamped move still counts as applied and a refused one (disabled) is
    /// dropped; both are logged and the remaining due moves still run. A driver
    /// failure ends the tick and leaves the remaining moves queued.
    pub fn tick(&mut self) -> Result<usize> {
        let now = self.clock.now();
        let mut applied = 0;
        while let Some(mv) = self.schedule.pop_due(now) {
            let Err(e) = self.set_relative(mv.offset, false) else {
                applied += 1;
                continue;
            };
            match servo_error(&e) {
                Some(ServoError::Clamped { .. }) => {
                    warn!(offset = mv.offset, error = %e, "timed move clamped");
                    applied += 1;
                }
                Some(ServoError::Disabled) => {
                    warn!(offset = mv.offset, "timed move dropped: disabled");
                }
                _ => return Err(e.wrap_err("applying timed move")),
            }
        }
        Ok(applied)
    }

    pub fn pending_moves(&self) -> usize {
        self.schedule.len()
    }

    pub fn cancel_scheduled(&mut self) {
        self.schedule.clear();
    }

    // ── Diagnostics ──────────────────────────────────────────────────────────

    /// Write channels, flags, bounds and a fresh feedback reading to `sink`.
    pub fn dump(&mut self, sink: &mut dyn DiagnosticSink) -> Result<()> {
        let c = self.config;
        sink.record("signal_channel", &c.signal_channel);
        sink.record("feedback_channel", &c.feedback_channel);
        sink.record("has_feedback", &self.has_feedback);
        sink.record("is_calibrated", &c.is_calibrated);
        sink.record("is_reversed", &c.is_reversed);
        sink.record("is_disabled", &c.is_disabled);
        sink.record("pulse_zero", &c.pulse_zero);
        sink.record("pulse_min", &c.pulse_min);
        sink.record("pulse_max", &c.pulse_max);
        sink.record("degree_min", &c.degree_min);
        sink.record("degree_max", &c.degree_max);
        sink.record("feedback_zero", &c.feedback_zero);
        sink.record("feedback_min", &c.feedback_min);
        sink.record("feedback_max", &c.feedback_max);
        let now = self.feedback()?;
        sink.record("feedback_now", &now);
        Ok(())
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Check for feedback, park at the rest point, release the line.
    pub(crate) fn startup(&mut self) -> Result<()> {
        let level = self.sample_feedback(self.timing.presence_samples)?;
        self.has_feedback = level > self.timing.noise_threshold;
        info!(
            level,
            threshold = self.timing.noise_threshold,
            has_feedback = self.has_feedback,
            "feedback presence"
        );

        let zero = self.config.pulse_zero;
        if let Err(e) = self.set_pulse(zero, true) {
            if is_hardware_report(&e) {
                return Err(e.wrap_err("parking at rest position"));
            }
            debug!(error = %e, "rest position not confirmed; holding");
            self.clock.sleep_ms(self.timing.startup_hold_ms);
        }
        self.detach()
    }
}
