//! Driver assembly and command execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::Result;
use serde_json::{Value, json};
use servo_core::{PositionController, ServoConfig, Timing, build_controller};
use servo_traits::{Actuator, FeedbackSensor};

use crate::cli::{Commands, MoveArgs};

/// Polling period while holding a position or waiting for timed moves.
const POLL_MS: u64 = 5;

/// Run `cmd` against the configured backend.
pub fn run(cfg: &servo_config::Config, cmd: &Commands, json: bool) -> Result<()> {
    let servo: ServoConfig = (&cfg.servo).into();
    let timing: Timing = (&cfg.timing).into();

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        use eyre::WrapErr;

        let hw = &cfg.hardware;
        let actuator = servo_hardware::PwmServo::new(hw.pwm_period_ms)
            .wrap_err("open PWM output")?;
        let sensor =
            servo_hardware::Mcp3008::new(hw.spi_bus, hw.spi_slave_select, hw.spi_clock_hz)
                .wrap_err("open feedback ADC")?;
        let mut ctl = build_controller(actuator, sensor, servo, Some(timing), None)?;
        execute(&mut ctl, cfg, cmd, json)
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        let sim = sim_from_env();
        let mut ctl = build_controller(sim.actuator(), sim.sensor(), servo, Some(timing), None)?;
        if let Some(pos) = std::env::var("SERVO_SIM_POSITION")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
        {
            tracing::debug!(position_us = pos, "sim horn displaced");
            sim.displace(pos);
        }
        execute(&mut ctl, cfg, cmd, json)
    }
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn sim_from_env() -> servo_hardware::SimulatedServo {
    match std::env::var("SERVO_SIM_FEEDBACK").as_deref() {
        Ok("none") => servo_hardware::SimulatedServo::without_feedback(),
        _ => servo_hardware::SimulatedServo::new(),
    }
}

fn execute<A: Actuator, F: FeedbackSensor>(
    ctl: &mut PositionController<A, F>,
    cfg: &servo_config::Config,
    cmd: &Commands,
    json: bool,
) -> Result<()> {
    match cmd {
        Commands::Move(args) => {
            let result = run_move(ctl, args);
            // release the line even when the move failed
            let released = ctl.detach();
            result?;
            released?;
            let pulse = ctl.last_pulse();
            emit(json, json!({ "command": "move", "pulse": pulse }), || {
                format!("moved to {pulse} us")
            });
        }
        Commands::Read => {
            let pulse = ctl.pulse()?;
            let relative = ctl.relative()?;
            let feedback = if ctl.has_feedback() {
                Value::from(ctl.feedback()?)
            } else {
                Value::Null
            };
            emit(
                json,
                json!({
                    "command": "read",
                    "pulse": pulse,
                    "relative": relative,
                    "feedback": feedback,
                    "has_feedback": ctl.has_feedback(),
                }),
                || format!("pulse {pulse} us, relative {relative} us, feedback {feedback}"),
            );
        }
        Commands::Zero { save } => {
            let result = ctl.zero_at_current();
            ctl.detach()?;
            result?;
            let saved = persist(cfg, ctl.config(), save.as_deref())?;
            let c = ctl.config();
            emit(
                json,
                json!({
                    "command": "zero",
                    "pulse_zero": c.pulse_zero,
                    "feedback_zero": c.feedback_zero,
                    "saved": saved,
                }),
                || {
                    format!(
                        "zero at {} us (feedback {}){}",
                        c.pulse_zero,
                        c.feedback_zero,
                        saved_note(saved.as_deref())
                    )
                },
            );
        }
        Commands::Calibrate { save } => {
            let result = ctl.calibrate();
            ctl.detach()?;
            result?;
            let saved = persist(cfg, ctl.config(), save.as_deref())?;
            let c = ctl.config();
            emit(
                json,
                json!({
                    "command": "calibrate",
                    "pulse_zero": c.pulse_zero,
                    "feedback_zero": c.feedback_zero,
                    "feedback_min": c.feedback_min,
                    "feedback_max": c.feedback_max,
                    "saved": saved,
                }),
                || {
                    format!(
                        "calibrated: feedback {}..{} around zero {} us / {}{}",
                        c.feedback_min,
                        c.feedback_max,
                        c.pulse_zero,
                        c.feedback_zero,
                        saved_note(saved.as_deref())
                    )
                },
            );
        }
        Commands::Status => {
            let mut pairs: Vec<(String, String)> = Vec::new();
            ctl.dump(&mut pairs)?;
            if json {
                let map: serde_json::Map<String, Value> = pairs
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                println!("{}", Value::Object(map));
            } else {
                for (k, v) in pairs {
                    println!("{k}: {v}");
                }
            }
        }
        Commands::SelfCheck => {
            let has_feedback = ctl.has_feedback();
            emit(
                json,
                json!({ "command": "self-check", "ok": true, "has_feedback": has_feedback }),
                || {
                    if has_feedback {
                        "ok (feedback present)".to_string()
                    } else {
                        "ok (no feedback; position readback echoes commands)".to_string()
                    }
                },
            );
        }
    }
    Ok(())
}

fn run_move<A: Actuator, F: FeedbackSensor>(
    ctl: &mut PositionController<A, F>,
    args: &MoveArgs,
) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    if args.hold_ms.is_some() || args.after_ms.is_some() {
        let flag = Arc::clone(&stop);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    match (args.degrees, args.pulse, args.offset, args.after_ms) {
        (_, _, Some(offset), Some(after)) => {
            ctl.schedule_relative(offset, Duration::from_millis(after))?;
            while ctl.pending_moves() > 0 {
                if stop.load(Ordering::Relaxed) {
                    ctl.cancel_scheduled();
                    tracing::info!("timed move cancelled");
                    return Ok(());
                }
                ctl.tick()?;
                std::thread::sleep(Duration::from_millis(POLL_MS));
            }
            if args.wait {
                ctl.wait_stable()?;
            }
        }
        (Some(deg), _, _, _) => ctl.set_degrees(deg, args.wait)?,
        (_, Some(pulse), _, _) => ctl.set_pulse(pulse, args.wait)?,
        (_, _, Some(offset), None) => ctl.set_relative(offset, args.wait)?,
        (None, None, None, _) => eyre::bail!("one of --degrees, --pulse or --offset is required"),
    }

    if let Some(hold) = args.hold_ms {
        let deadline = Instant::now() + Duration::from_millis(hold);
        while Instant::now() < deadline {
            if stop.load(Ordering::Relaxed) {
                tracing::info!("hold interrupted");
                break;
            }
            std::thread::sleep(Duration::from_millis(POLL_MS));
        }
    }
    Ok(())
}

/// Write the updated `[servo]` record, keeping the rest of the file's settings.
fn persist(
    cfg: &servo_config::Config,
    servo: &ServoConfig,
    save: Option<&Path>,
) -> Result<Option<String>> {
    let Some(path) = save else {
        return Ok(None);
    };
    let mut out = cfg.clone();
    out.servo = servo.into();
    out.save_toml(path)?;
    tracing::info!(path = %path.display(), "servo record saved");
    Ok(Some(path.display().to_string()))
}

fn saved_note(saved: Option<&str>) -> String {
    saved.map(|p| format!(", saved to {p}")).unwrap_or_default()
}

fn emit(json: bool, value: Value, human: impl FnOnce() -> String) {
    if json {
        println!("{value}");
    } else {
        println!("{}", human());
    }
}

/// Resolve which config file to read, if any.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let p = PathBuf::from(crate::cli::DEFAULT_CONFIG);
            p.exists().then_some(p)
        }
    }
}

/// Load the config, or fall back to defaults when no file is in play.
pub fn load_config(path: Option<&Path>) -> Result<servo_config::Config> {
    match path {
        Some(p) => servo_config::load_file(p),
        None => {
            tracing::debug!("no config file; using defaults");
            Ok(servo_config::Config::default())
        }
    }
}

