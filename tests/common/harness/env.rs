//! Isolated test environment with temp directory.

use super::LarkmdCommand;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment with a temporary working directory.
///
/// Every command run through [`TestEnv::cmd`] reads `config.toml` from this
/// directory, never the user's real config.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestEnv {
    /// Creates a new environment with an empty config file.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        let env = Self {
            _temp_dir: temp_dir,
            root,
        };
        env.write_config("");
        env
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Replaces the environment's config file.
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).expect("Failed to write config");
    }

    /// Writes a file (creating parent directories) and returns its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        self.write_bytes(name, content.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Creates a LarkmdCommand configured for this test environment.
    pub fn cmd(&self) -> LarkmdCommand {
        LarkmdCommand::new().config(&self.config_path())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_creates_temp_directory_and_config() {
        let env = TestEnv::new();
        assert!(env.root().is_dir());
        assert!(env.config_path().is_file());
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.root().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_write_file_creates_parents() {
        let env = TestEnv::new();
        let path = env.write_file("docs/nested/a.md", "# A");
        assert!(path.starts_with(env.root()));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# A");
    }

    #[test]
    fn test_env_provides_command() {
        let env = TestEnv::new();
        let cmd = env.cmd();
        let args = cmd.get_args();
        assert_eq!(args[0], "--config");
        assert_eq!(args[1], env.config_path().to_string_lossy());
    }
}
