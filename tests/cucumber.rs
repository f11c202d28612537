//! BDD test runner using cucumber for the tgate CLI.
//!
//! This module sets up the cucumber test framework to execute Gherkin feature files
//! located in the `features/` directory.
//!
//! Step definitions cover:
//! - Given steps: benchmark tables and config files in a scratch working directory
//! - When steps: CLI command execution
//! - Then steps: exit code, output and receipt assertions

use assert_cmd::Command;
use cucumber::gherkin::Step;
use cucumber::{World, given, then, when};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tgate_types::{DEFAULT_CONFIG_FILE, DEFAULT_INPUT_FILE};

/// World struct that holds state across BDD scenario steps.
#[derive(Debug, Default, World)]
pub struct TgateWorld {
    /// Scratch working directory for the scenario
    temp_dir: Option<TempDir>,
    /// Exit code from last command execution
    last_exit_code: Option<i32>,
    /// Stdout from last command execution
    last_stdout: String,
    /// Stderr from last command execution
    last_stderr: String,
}

impl TgateWorld {
    pub fn ensure_temp_dir(&mut self) {
        if self.temp_dir.is_none() {
            self.temp_dir = Some(TempDir::new().expect("Failed to create temp directory"));
        }
    }

    pub fn temp_path(&self) -> PathBuf {
        self.temp_dir
            .as_ref()
            .expect("Temp dir not initialized")
            .path()
            .to_path_buf()
    }

    fn run_tgate(&mut self, args: &[&str]) {
        self.ensure_temp_dir();

        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("tgate").expect("Failed to find tgate binary");
        cmd.current_dir(self.temp_path()).env_remove("RUST_LOG").args(args);

        let output = cmd.output().expect("Failed to execute tgate");
        self.last_exit_code = Some(output.status.code().unwrap_or(-1));
        self.last_stdout = String::from_utf8_lossy(&output.stdout).to_string();
        self.last_stderr = String::from_utf8_lossy(&output.stderr).to_string();
    }
}

// ============================================================================
// GIVEN STEPS - Fixture Creation
// ============================================================================

#[given("a temporary working directory")]
async fn given_temp_directory(world: &mut TgateWorld) {
    world.ensure_temp_dir();
}

/// Write the step table (header row first) as the default benchmark file
#[given("the benchmark results:")]
async fn given_benchmark_results(world: &mut TgateWorld, step: &Step) {
    world.ensure_temp_dir();
    let table = step.table.as_ref().expect("Step requires a table");

    let mut csv = String::new();
    for row in &table.rows {
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    fs::write(world.temp_path().join(DEFAULT_INPUT_FILE), csv)
        .expect("Failed to write benchmark results");
}

#[given("the config file:")]
async fn given_config_file(world: &mut TgateWorld, step: &Step) {
    world.ensure_temp_dir();
    let body = step.docstring.as_ref().expect("Step requires a docstring");
    fs::write(world.temp_path().join(DEFAULT_CONFIG_FILE), body)
        .expect("Failed to write config file");
}

// ============================================================================
// WHEN STEPS - CLI Command Execution
// ============================================================================

#[when("I run tgate check")]
async fn when_check(world: &mut TgateWorld) {
    world.run_tgate(&["check"]);
}

#[when(expr = "I run tgate check with {string}")]
async fn when_check_with(world: &mut TgateWorld, extra: String) {
    let mut args = vec!["check"];
    args.extend(extra.split_whitespace());
    world.run_tgate(&args);
}

// ============================================================================
// THEN STEPS - Assertions
// ============================================================================

#[then(expr = "the exit code should be {int}")]
async fn then_exit_code(world: &mut TgateWorld, expected: i32) {
    assert_eq!(
        world.last_exit_code,
        Some(expected),
        "Unexpected exit code. stdout: {} stderr: {}",
        world.last_stdout,
        world.last_stderr
    );
}

#[then(expr = "stdout should be {string}")]
async fn then_stdout_is(world: &mut TgateWorld, expected: String) {
    assert_eq!(world.last_stdout.trim_end(), expected);
}

#[then(expr = "stderr should contain {string}")]
async fn then_stderr_contains(world: &mut TgateWorld, expected: String) {
    assert!(
        world.last_stderr.contains(&expected),
        "Expected stderr to contain '{}', got: {}",
        expected,
        world.last_stderr
    );
}

#[then(expr = "the receipt {string} should record status {string}")]
async fn then_receipt_status(world: &mut TgateWorld, file: String, expected: String) {
    let receipt = read_receipt(world, &file);
    assert_eq!(receipt["schema"], "tgate.check.v1");
    assert_eq!(receipt["verdict"]["status"], expected.as_str());
}

#[then(expr = "the receipt {string} should record metric {float}")]
async fn then_receipt_metric(world: &mut TgateWorld, file: String, expected: f64) {
    let receipt = read_receipt(world, &file);
    let metric = receipt["metric"].as_f64().expect("metric should be a number");
    assert!(
        (metric - expected).abs() <= expected.abs() * 1e-9,
        "Expected metric {expected}, got {metric}"
    );
}

fn read_receipt(world: &TgateWorld, file: &str) -> serde_json::Value {
    let path = world.temp_path().join(file);
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read receipt {}: {e}", path.display()));
    serde_json::from_str(&text).expect("Receipt should be valid JSON")
}

// ============================================================================
// MAIN FUNCTION
// ============================================================================

#[tokio::main]
async fn main() {
    TgateWorld::run("features/").await;
}
