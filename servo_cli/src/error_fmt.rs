//! Human-readable error descriptions and structured JSON error formatting.

use servo_core::error::{BuildError, ServoError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingActuator => {
                "What happened: No actuator was provided to the controller.\nLikely causes: The PWM driver failed to initialize or was not passed to the builder.\nHow to fix: Ensure the actuator is created successfully and passed via with_actuator(...).".to_string()
            }
            BuildError::MissingSensor => {
                "What happened: No feedback sensor was provided to the controller.\nLikely causes: The ADC driver failed to initialize or was not passed to the builder.\nHow to fix: Ensure the sensor is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the [servo] or [timing] table.\nHow to fix: Edit the config file, then rerun. See etc/servo_config.toml for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<ServoError>() {
        return match se {
            ServoError::DegreeOutOfRange(d) => format!(
                "What happened: {d} degrees is not a valid position.\nHow to fix: Use a value between 0 and 180."
            ),
            ServoError::Clamped { requested, applied } => format!(
                "What happened: {requested} us lies outside the configured bounds; the servo moved to {applied} us instead.\nHow to fix: Stay within [servo].pulse_min..pulse_max or widen the bounds."
            ),
            ServoError::Disabled => {
                "What happened: The servo is disabled.\nHow to fix: Set servo.is_disabled = false in the config.".to_string()
            }
            ServoError::NoFeedback => {
                "What happened: No feedback sensor was detected.\nLikely causes: The potentiometer wiper is not connected to the ADC, or the ADC channel is wrong.\nHow to fix: Check the wiring and [servo].feedback_channel.".to_string()
            }
            ServoError::NotSettled(n) => format!(
                "What happened: The feedback reading never settled ({n} polls).\nLikely causes: A noisy potentiometer, a load fighting the servo, or a settle interval that is too short.\nHow to fix: Check the mechanics or raise timing.settle_interval_ms."
            ),
            ServoError::ZeroNotFound(n) => format!(
                "What happened: No pulse width reproduced the current reading within {n} steps.\nLikely causes: The horn is beyond the reachable pulse bounds or the feedback is noisy.\nHow to fix: Move the horn inside the travel range and retry, or raise timing.max_iterations."
            ),
            ServoError::NeverCommanded => {
                "What happened: There is no position to re-issue.\nHow to fix: Command a position first.".to_string()
            }
            ServoError::CalibrationRejected(reason) => format!(
                "What happened: Calibration produced an unusable range ({reason}).\nLikely causes: The potentiometer is not linear around the zero point, or the excursion hit a stop.\nHow to fix: Move the horn toward the middle of its travel or lower timing.calibration_range. The previous calibration was kept."
            ),
            ServoError::ScheduleFull => {
                "What happened: Both timed-move slots are in use.\nHow to fix: Wait for a pending move to fire.".to_string()
            }
            ServoError::Hardware(msg) | ServoError::HardwareFault(msg) => format!(
                "What happened: The servo hardware reported an error ({msg}).\nLikely causes: Wrong GPIO/SPI settings, wiring or power issues, or insufficient permissions.\nHow to fix: Check the [hardware] table and the wiring, then rerun with --log-level=debug."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") || lower.contains("parse config") {
        return format!(
            "What happened: The config file could not be loaded.\nHow to fix: Check the path passed via --config and the TOML syntax. Original: {msg}"
        );
    }

    if lower.starts_with("servo.")
        || lower.starts_with("timing.")
        || lower.starts_with("hardware.")
        || lower.starts_with("logging.")
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable name for the error kind, used as the JSON `reason`.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    match err.downcast_ref::<ServoError>() {
        Some(ServoError::DegreeOutOfRange(_)) => "DegreeOutOfRange",
        Some(ServoError::Clamped { .. }) => "Clamped",
        Some(ServoError::Disabled) => "Disabled",
        Some(ServoError::NoFeedback) => "NoFeedback",
        Some(ServoError::NotSettled(_)) => "NotSettled",
        Some(ServoError::ZeroNotFound(_)) => "ZeroNotFound",
        Some(ServoError::NeverCommanded) => "NeverCommanded",
        Some(ServoError::CalibrationRejected(_)) => "CalibrationRejected",
        Some(ServoError::ScheduleFull) => "ScheduleFull",
        Some(ServoError::Hardware(_) | ServoError::HardwareFault(_)) => "Hardware",
        None => "Error",
    }
}

/// Map domain errors to stable exit codes; anything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<ServoError>() {
        Some(ServoError::DegreeOutOfRange(_) | ServoError::Clamped { .. }) => 3,
        Some(ServoError::Disabled) => 4,
        Some(ServoError::NoFeedback) => 5,
        Some(ServoError::NotSettled(_) | ServoError::ZeroNotFound(_)) => 6,
        Some(ServoError::CalibrationRejected(_)) => 7,
        Some(ServoError::Hardware(_) | ServoError::HardwareFault(_)) => 8,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = reason_name(err);
    let obj = match err.downcast_ref::<ServoError>() {
        Some(ServoError::Clamped { requested, applied }) => json!({
            "reason": reason,
            "details": { "requested_us": requested, "applied_us": applied },
            "message": humanize(err),
        }),
        Some(ServoError::NotSettled(n) | ServoError::ZeroNotFound(n)) => json!({
            "reason": reason,
            "details": { "iterations": n },
            "message": humanize(err),
        }),
        _ => json!({ "reason": reason, "message": humanize(err) }),
    };
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_get_stable_codes() {
        let e = eyre::Report::new(ServoError::Disabled);
        assert_eq!(exit_code_for_error(&e), 4);
        assert!(humanize(&e).contains("disabled"));

        let e = eyre::Report::new(ServoError::NotSettled(300)).wrap_err("moving");
        assert_eq!(exit_code_for_error(&e), 6);
        assert_eq!(reason_name(&e), "NotSettled");

        let e = eyre::eyre!("something odd");
        assert_eq!(exit_code_for_error(&e), 1);
        assert!(humanize(&e).starts_with("Something went wrong."));
    }

    #[test]
    fn clamped_json_carries_both_pulses() {
        let e = eyre::Report::new(ServoError::Clamped {
            requested: 3000,
            applied: 2500,
        });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Clamped");
        assert_eq!(v["details"]["requested_us"], 3000);
        assert_eq!(v["details"]["applied_us"], 2500);
    }
}
