//! Fluent wrapper around assert_cmd::Command.

// Allow dead code since this is a test utility shared by several test crates
#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Fluent wrapper around `assert_cmd::Command` for the `larkmd` binary.
///
/// Credentials from the surrounding shell are removed so tests never reach
/// a real document service by accident.
pub struct LarkmdCommand {
    args: Vec<String>,
}

impl LarkmdCommand {
    /// Creates a new command for the `larkmd` binary.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Sets the `--config` option.
    pub fn config(mut self, path: &Path) -> Self {
        self.args.push("--config".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    /// Adds arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Adds a path argument.
    pub fn path(self, path: &Path) -> Self {
        let path = path.to_string_lossy().to_string();
        self.args([path])
    }

    /// Returns the current arguments (for testing).
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("larkmd").expect("Failed to find larkmd binary");
        cmd.env_remove("LARKMD_ACCESS_TOKEN")
            .env_remove("LARKMD_BASE_URL")
            .env_remove("RUST_LOG")
            .args(&self.args);
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    /// Configures for the `convert` command on a path.
    pub fn convert(self, path: &Path) -> Self {
        self.args(["convert"]).path(path)
    }

    /// Configures for the `render` command on a block dump.
    pub fn render(self, path: &Path) -> Self {
        self.args(["render"]).path(path)
    }

    /// Configures for the `upload` command.
    pub fn upload(self, path: &Path, document: &str) -> Self {
        self.args(["upload"]).path(path).args(["--document", document])
    }

    // ===========================================
    // Format Options
    // ===========================================

    /// Adds `--format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }
}

impl Default for LarkmdCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_runs_binary() {
        LarkmdCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_builds_args_in_order() {
        let cmd = LarkmdCommand::new()
            .config(Path::new("/tmp/c.toml"))
            .convert(Path::new("a.md"))
            .format_json();
        assert_eq!(
            cmd.get_args(),
            &["--config", "/tmp/c.toml", "convert", "a.md", "--format", "json"]
        );
    }
}
