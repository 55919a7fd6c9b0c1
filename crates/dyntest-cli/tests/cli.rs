use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn dyntest(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dyntest"))
        .args(args)
        .env_remove("DYNTEST_SEED")
        .env_remove("DYNTEST_CASES")
        .env_remove("DYNTEST_LANGUAGES")
        .env_remove("DYNTEST_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("dyntest binary should start")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_config(path: &Path, body: &str) {
    fs::write(path, body).expect("config should be written");
}

#[test]
fn languages_lists_every_target() {
    let output = dyntest(&["languages"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for id in ["python", "c", "cpp", "java", "rust"] {
        assert!(
            text.lines().any(|l| l.starts_with(id)),
            "missing {id} in:\n{text}"
        );
    }
    assert!(text.contains("wrapping-32"));
    assert!(text.contains("unbounded"));
}

#[test]
fn show_is_deterministic_for_a_seed() {
    let first = dyntest(&["show", "--seed", "42", "--cases", "5"]);
    let second = dyntest(&["show", "--seed", "42", "--cases", "5"]);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let spec: serde_json::Value =
        serde_json::from_slice(&first.stdout).expect("show should print JSON");
    let text = spec.to_string();
    assert!(text.contains("dynamic_5"));
    assert!(!text.contains("dynamic_6"));
}

#[test]
fn missing_seed_is_rejected() {
    let output = dyntest(&["show", "--cases", "3"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No seed given"), "stderr was: {stderr}");
}

#[test]
fn invalid_seed_is_a_usage_error() {
    let output = dyntest(&["show", "--seed", "forty-two", "--cases", "3"]);
    assert!(!output.status.success());
}

#[test]
fn seed_and_cases_fall_back_to_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("dyntest.toml");
    write_config(&config, "seed = 42\ndynamic_cases = 2\n");

    let from_config = dyntest(&["--config", config.to_str().unwrap(), "show"]);
    let from_flags = dyntest(&["show", "--seed", "42", "--cases", "2"]);
    assert!(from_config.status.success());
    assert_eq!(from_config.stdout, from_flags.stdout);
}

#[test]
fn generate_writes_units_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");

    let output = dyntest(&[
        "generate",
        "--seed",
        "42",
        "--cases",
        "4",
        "--languages",
        "python,java",
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(out.join("python").join("dynamic_test.py").is_file());
    assert!(out.join("java").join("DynamicTest.java").is_file());
    assert!(!out.join("c").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["dynamic_cases"], 4);
    assert_eq!(manifest["units"].as_array().unwrap().len(), 2);
    assert!(stdout(&output).contains("Spec digest:"));
}

#[test]
fn generate_replaces_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let out_str = out.to_str().unwrap();

    let first = dyntest(&[
        "generate", "--seed", "1", "--cases", "2", "--languages", "c,cpp", "--out", out_str,
    ]);
    assert!(first.status.success());
    let second = dyntest(&[
        "generate", "--seed", "1", "--cases", "2", "--languages", "rust", "--out", out_str,
    ]);
    assert!(second.status.success());

    assert!(out.join("rust").join("dynamic_test.rs").is_file());
    assert!(!out.join("c").exists());
    assert!(!out.join("cpp").exists());
}

#[test]
fn run_with_missing_toolchain_fails_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("dyntest.toml");
    write_config(
        &config,
        "[toolchains.python]\nrun = [\"dyntest-missing-interpreter-3b9d\", \"{src}\"]\n",
    );
    let report = dir.path().join("report.json");
    let work_root = dir.path().join("work");

    let output = dyntest(&[
        "--config",
        config.to_str().unwrap(),
        "run",
        "--seed",
        "7",
        "--cases",
        "3",
        "--languages",
        "python",
        "--timeout-secs",
        "10",
        "--work-root",
        work_root.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("toolchain not found: dyntest-missing-interpreter-3b9d"), "{text}");
    assert!(text.contains("Exit code: 1"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["exit_code"], 1);
    assert_eq!(json["languages"]["python"]["outcome"]["kind"], "toolchain_missing");
    assert_eq!(fs::read_dir(&work_root).unwrap().count(), 0);
}

#[test]
fn unknown_config_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("dyntest.toml");
    write_config(&config, "seed = 1\ndynamic_cases = 1\ntimeout = 5\n");

    let output = dyntest(&["--config", config.to_str().unwrap(), "show"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
}
