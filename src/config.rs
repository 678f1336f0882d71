//! Harness configuration.
//!
//! Configuration can be built in code with [`HarnessConfig::builder`] or
//! loaded from a JSON or YAML file with [`HarnessConfig::load`]:
//!
//! ```yaml
//! cols: 120
//! timeoutMs: 5000
//! env:
//!   GH_HOST: my.ghes.com
//! recorder:
//!   enabled: false
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HarnessError, Result};
use crate::wait::{DEFAULT_GRACE_PERIOD, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, as_millis};

/// Default terminal width.
pub const DEFAULT_COLS: u16 = 80;
/// Default terminal height.
pub const DEFAULT_ROWS: u16 = 24;
/// Recorder looked up on `PATH` when none is configured.
pub const DEFAULT_RECORDER: &str = "asciinema";

/// Settings for a scripted run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarnessConfig {
    /// Number of columns.
    pub cols: u16,
    /// Number of rows.
    pub rows: u16,
    /// Expectation timeout in milliseconds.
    pub timeout_ms: u64,
    /// Output poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Teardown grace period in milliseconds.
    pub grace_ms: u64,
    /// Extra environment variables for the target process.
    pub env: HashMap<String, String>,
    /// Working directory for the target process.
    pub cwd: Option<PathBuf>,
    /// Session recording.
    pub recorder: RecorderConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            timeout_ms: as_millis(DEFAULT_TIMEOUT),
            poll_interval_ms: as_millis(DEFAULT_POLL_INTERVAL),
            grace_ms: as_millis(DEFAULT_GRACE_PERIOD),
            env: HashMap::new(),
            cwd: None,
            recorder: RecorderConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Create a new config builder.
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }

    /// Load a config file. `.json` is read as JSON, `.yaml`/`.yml` as YAML,
    /// anything else is tried as JSON then YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("failed to read {}: {e}", path.display())))?;

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config: Self = if ext == "json" {
            serde_json::from_str(&contents)?
        } else if ext == "yaml" || ext == "yml" {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)
                .or_else(|_| serde_yaml::from_str(&contents))
                .map_err(|e| HarnessError::Config(format!("config parse error: {e}")))?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(HarnessError::Config(format!(
                "terminal size must be non-zero, got {}x{}",
                self.cols, self.rows
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(HarnessError::Config(
                "pollIntervalMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Expectation timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Output poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Teardown grace period.
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

/// Session recorder settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    /// Whether every session is recorded. A missing recorder is then fatal.
    pub enabled: bool,
    /// Recorder program looked up on `PATH`.
    pub program: String,
    /// Directory for recordings; the OS temp dir when unset.
    pub dir: Option<PathBuf>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: DEFAULT_RECORDER.to_string(),
            dir: None,
        }
    }
}

impl RecorderConfig {
    /// Directory recordings are written to.
    pub fn base_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Builder for [`HarnessConfig`].
#[derive(Debug, Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    /// Set the terminal size.
    pub fn size(mut self, cols: u16, rows: u16) -> Self {
        self.config.cols = cols;
        self.config.rows = rows;
        self
    }

    /// Set the expectation timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = as_millis(timeout);
        self
    }

    /// Set the output poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = as_millis(interval).max(1);
        self
    }

    /// Set the teardown grace period.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.config.grace_ms = as_millis(grace);
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cwd = Some(path.into());
        self
    }

    /// Run without a session recorder.
    pub fn no_recorder(mut self) -> Self {
        self.config.recorder.enabled = false;
        self
    }

    /// Use a different recorder program.
    pub fn recorder_program(mut self, program: impl Into<String>) -> Self {
        self.config.recorder.enabled = true;
        self.config.recorder.program = program.into();
        self
    }

    /// Write recordings to `dir`.
    pub fn recording_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.recorder.dir = Some(dir.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> HarnessConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HarnessConfig::default();
        assert_eq!(config.cols, DEFAULT_COLS);
        assert_eq!(config.rows, DEFAULT_ROWS);
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert!(config.recorder.enabled);
        assert_eq!(config.recorder.program, "asciinema");
    }

    #[test]
    fn test_builder() {
        let config = HarnessConfig::builder()
            .size(120, 40)
            .timeout(Duration::from_millis(750))
            .env("GH_HOST", "my.ghes.com")
            .no_recorder()
            .build();
        assert_eq!(config.cols, 120);
        assert_eq!(config.rows, 40);
        assert_eq!(config.timeout_ms, 750);
        assert_eq!(config.env.get("GH_HOST").map(String::as_str), Some("my.ghes.com"));
        assert!(!config.recorder.enabled);
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.yaml");
        fs::write(&path, "cols: 100\ntimeoutMs: 5000\nrecorder:\n  enabled: false\n").unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.cols, 100);
        assert_eq!(config.rows, DEFAULT_ROWS);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(!config.recorder.enabled);
        assert_eq!(config.recorder.program, DEFAULT_RECORDER);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.json");
        fs::write(&path, r#"{"graceMs": 50, "env": {"A": "1"}}"#).unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.grace_period(), Duration::from_millis(50));
        assert_eq!(config.env.get("A").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_load_rejects_zero_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.yml");
        fs::write(&path, "cols: 0\n").unwrap();

        assert!(matches!(
            HarnessConfig::load(&path),
            Err(HarnessError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = HarnessConfig::load(Path::new("/nonexistent/harness.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
