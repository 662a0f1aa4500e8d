use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Short pacing keeps the simulated settle loops fast.
const FAST_TIMING: &str = r#"
[timing]
settle_interval_ms = 1
sample_spacing_ms = 0
startup_hold_ms = 0
"#;

fn write_config(dir: &tempfile::TempDir, servo: &str) -> PathBuf {
    let toml = format!("[servo]\n{servo}\n{FAST_TIMING}");
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn servo_cmd(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("servo").unwrap();
    cmd.arg("--config").arg(cfg).arg("--log-level").arg("error");
    cmd
}

fn json_line(out: &[u8]) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(out);
    let line = stdout
        .lines()
        .find(|l| l.trim_start().starts_with('{'))
        .unwrap_or_else(|| panic!("no JSON line; stdout was: {stdout}"));
    serde_json::from_str(line).expect("valid JSON")
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["move", "--degrees", "90"], 0, "moved to 1500 us", "stdout")]
#[case(&["move", "--offset", "-100", "--wait"], 0, "moved to 1600 us", "stdout")]
#[case(&["move", "--offset", "50", "--after-ms", "20"], 0, "moved to 1450 us", "stdout")]
#[case(&["move", "--pulse", "1200", "--hold-ms", "20"], 0, "moved to 1200 us", "stdout")]
#[case(&["move"], 2, "required", "stderr")]
#[case(&["move", "--degrees", "200"], 3, "not a valid position", "stderr")]
#[case(&["move", "--pulse", "3000"], 3, "outside the configured bounds", "stderr")]
#[case(&["self-check"], 0, "feedback present", "stdout")]
#[case(&["status"], 0, "feedback_now:", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = servo_cmd(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn read_reports_mapped_feedback() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = servo_cmd(&cfg)
        .arg("--json")
        .arg("read")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = json_line(&out);
    assert_eq!(v["has_feedback"], true);
    assert_eq!(v["feedback"], 511);
    let pulse = v["pulse"].as_u64().unwrap();
    assert!(pulse.abs_diff(1500) <= 1, "pulse {pulse}");
    assert_eq!(v["relative"], 0);
}

#[rstest]
fn unwired_feedback_echoes_commands() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = servo_cmd(&cfg)
        .env("SERVO_SIM_FEEDBACK", "none")
        .arg("--json")
        .arg("read")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = json_line(&out);
    assert_eq!(v["has_feedback"], false);
    assert!(v["feedback"].is_null());
    assert_eq!(v["pulse"], 1500);
}

#[rstest]
fn calibrate_without_feedback_fails_with_stable_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = servo_cmd(&cfg)
        .env("SERVO_SIM_FEEDBACK", "none")
        .arg("--json")
        .arg("calibrate")
        .assert()
        .code(5)
        .get_output()
        .stdout
        .clone();
    let v = json_line(&out);
    assert_eq!(v["reason"], "NoFeedback");
}

#[rstest]
fn disabled_servo_refuses_moves() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "is_disabled = true");
    servo_cmd(&cfg)
        .args(["move", "--degrees", "10"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("disabled"));
}

#[rstest]
fn json_errors_go_to_stdout() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = servo_cmd(&cfg)
        .args(["--json", "move", "--pulse", "100"])
        .assert()
        .code(3)
        .get_output()
        .stdout
        .clone();
    let v = json_line(&out);
    assert_eq!(v["reason"], "Clamped");
    assert_eq!(v["details"]["applied_us"], 500);
}

#[rstest]
fn invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "pulse_min = 2600");
    servo_cmd(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[rstest]
fn zero_saves_displaced_position() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let saved = dir.path().join("zeroed.toml");
    servo_cmd(&cfg)
        .env("SERVO_SIM_POSITION", "1800")
        .arg("zero")
        .arg("--save")
        .arg(&saved)
        .assert()
        .success()
        .stdout(predicate::str::contains("saved to"));

    let written = servo_config::load_file(&saved).expect("saved config loads");
    assert!(written.servo.pulse_zero.abs_diff(1800) <= 1);
    assert_eq!(written.servo.feedback_zero, 664);
    // timing survives the rewrite
    assert_eq!(written.timing.settle_interval_ms, 1);
}

#[rstest]
fn calibrated_record_is_reused_by_next_run() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let saved = dir.path().join("calibrated.toml");
    let out = servo_cmd(&cfg)
        .arg("--json")
        .arg("calibrate")
        .arg("--save")
        .arg(&saved)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = json_line(&out);
    assert_eq!(v["command"], "calibrate");
    assert!(v["feedback_max"].as_u64().unwrap() > 1000);

    let written = servo_config::load_file(&saved).expect("saved config loads");
    assert!(written.servo.is_calibrated);

    let out = servo_cmd(&saved)
        .arg("--json")
        .arg("read")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = json_line(&out);
    assert_eq!(v["pulse"], 1500);
    assert_eq!(v["relative"], 0);
}

#[rstest]
fn status_json_has_every_key() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "signal_channel = 12");
    let out = servo_cmd(&cfg)
        .arg("--json")
        .arg("status")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = json_line(&out);
    assert_eq!(v["signal_channel"], "12");
    for key in ["has_feedback", "pulse_zero", "feedback_min", "feedback_now"] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
}
