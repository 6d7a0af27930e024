use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

pub const ADMIN: &str = "lead@example.com";
pub const WEB: &str = "web@example.com";
pub const SALES: &str = "sales@example.com";

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Harness with an admin plus WEB and SALES members already registered
    pub fn with_team() -> Self {
        let harness = Self::new();
        harness.run_success(&["user", "add", ADMIN, "Lead", "--admin"]);
        harness.run_success(&["--as", ADMIN, "user", "add", WEB, "WEB"]);
        harness.run_success(&["--as", ADMIN, "user", "add", SALES, "SALES"]);
        harness
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("pulse").expect("Failed to find pulse binary");

        // Run where no pulse.toml exists and point the store at the temp database
        cmd.current_dir(self.temp_dir.path());
        cmd.env("PULSE_BACKEND__DATABASE_PATH", &self.db_path);
        cmd.env("PULSE_DASHBOARD__TIMEZONE", "UTC");
        cmd.env_remove("PULSE_USER_EMAIL");
        cmd.env_remove("PULSE_BACKEND__KIND");
        cmd.env_remove("RUST_LOG");

        cmd
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs `args` as `email`
    pub fn run_as(&self, email: &str, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().arg("--as").arg(email).args(args).assert()
    }

    /// Adds a task and returns its full id
    pub fn add_task(&self, email: &str, args: &[&str]) -> String {
        let assert = self.run_as(email, args).success();
        let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
        extract_task_id(&stdout).expect("add output should contain the task id")
    }
}

/// Pulls the full id out of the "Task ID: <short> (<full>)" line.
pub fn extract_task_id(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.contains("Task ID:"))?;
    let start = line.rfind('(')? + 1;
    let end = line.rfind(')')?;
    Some(line[start..end].to_string())
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains task table headers
    pub fn has_task_table_headers() -> impl Predicate<str> {
        predicate::str::contains("ID")
            .and(predicate::str::contains("Title"))
            .and(predicate::str::contains("Status"))
            .and(predicate::str::contains("Deadline"))
    }

    /// Predicate to check if output indicates successful task creation
    pub fn task_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("Created task")
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
