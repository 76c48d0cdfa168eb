//! Coordinator configuration

use cue_core::{CueError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Timing knobs for the playback coordinator
///
/// All durations are in milliseconds so the values read naturally from TOML
/// and environment variables (`CUE_GRACE_PERIOD_MS=5000`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Position poll interval
    pub poll_interval_ms: u64,

    /// Delay before the queue tail is resolved and appended
    pub debounce_ms: u64,

    /// How long polling stays suppressed after a seek
    pub seek_settle_ms: u64,

    /// How long a pending track may wait for backend confirmation
    pub grace_period_ms: u64,

    /// Past this position, skip-previous restarts the current track
    pub restart_threshold_ms: u64,

    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            debounce_ms: 1500,
            seek_settle_ms: 300,
            grace_period_ms: 3000,
            restart_threshold_ms: 3000,
            event_capacity: 64,
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from an optional TOML file and `CUE_*` variables
    ///
    /// Environment variables override the file; missing keys keep their
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(
            path,
            config::Environment::with_prefix("CUE")
                .prefix_separator("_")
                .try_parsing(true),
        )
    }

    fn load_with(path: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(CueError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(environment);

        let config: Self = settings
            .build()
            .map_err(|e| CueError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CueError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("poll_interval_ms", self.poll_interval_ms),
            ("debounce_ms", self.debounce_ms),
            ("seek_settle_ms", self.seek_settle_ms),
            ("grace_period_ms", self.grace_period_ms),
        ];

        for (name, value) in intervals {
            if value == 0 {
                return Err(CueError::Config(format!("{name} must be greater than 0")));
            }
        }

        if self.event_capacity == 0 {
            return Err(CueError::Config(
                "event_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Position poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Queue tail debounce delay
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Seek settle delay
    pub fn seek_settle(&self) -> Duration {
        Duration::from_millis(self.seek_settle_ms)
    }

    /// Pending-track grace period
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Skip-previous restart threshold
    pub fn restart_threshold(&self) -> Duration {
        Duration::from_millis(self.restart_threshold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<config::Map<String, String>>();

        config::Environment::with_prefix("CUE")
            .prefix_separator("_")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.debounce(), Duration::from_millis(1500));
        assert_eq!(config.seek_settle(), Duration::from_millis(300));
        assert_eq!(config.grace_period(), Duration::from_secs(3));
        assert_eq!(config.restart_threshold(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_sources_gives_defaults() {
        let config = CoordinatorConfig::load_with(None, env(&[])).unwrap();
        assert_eq!(config, CoordinatorConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "debounce_ms = 800").unwrap();
        writeln!(file, "grace_period_ms = 5000").unwrap();

        let config = CoordinatorConfig::load_with(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.debounce_ms, 800);
        assert_eq!(config.grace_period_ms, 5000);
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "seek_settle_ms = 500").unwrap();

        let config = CoordinatorConfig::load_with(
            Some(file.path()),
            env(&[("CUE_SEEK_SETTLE_MS", "250")]),
        )
        .unwrap();
        assert_eq!(config.seek_settle_ms, 250);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = CoordinatorConfig::load_with(
            Some(Path::new("/nonexistent/cue-config.toml")),
            env(&[]),
        );
        assert!(matches!(result, Err(CueError::Config(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = CoordinatorConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));

        let result = CoordinatorConfig::load_with(None, env(&[("CUE_DEBOUNCE_MS", "0")]));
        assert!(matches!(result, Err(CueError::Config(_))));
    }
}
