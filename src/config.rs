use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use checkfactor::daemon::PollConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    /// Factor working directory (the one holding `state/` and `results/`)
    pub working_dir: PathBuf,
    /// Directions to check; empty means discover them from `state/`
    pub directions: Vec<String>,
    /// Show only the text after the last `_` of each direction name
    pub trim_names: bool,
    /// Number of re-imaging stages the run is configured for
    pub reimages: u32,
    pub poll: PollSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub evaluation_timeout_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            evaluation_timeout_ms: 10000,
        }
    }
}

impl PollSettings {
    pub fn to_poll_config(&self) -> PollConfig {
        PollConfig::new(Duration::from_secs(self.interval_secs))
            .with_evaluation_timeout(Duration::from_millis(self.evaluation_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            working_dir: PathBuf::from("."),
            directions: Vec::new(),
            trim_names: false,
            reimages: 0,
            poll: PollSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject settings the poll loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_secs == 0 {
            bail!("poll.interval_secs must be greater than zero");
        }
        if self.poll.evaluation_timeout_ms == 0 {
            bail!("poll.evaluation_timeout_ms must be greater than zero");
        }
        if self.working_dir.as_os_str().is_empty() {
            bail!("working_dir must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert_eq!(config.working_dir, PathBuf::from("."));
        assert!(config.directions.is_empty());
        assert_eq!(config.poll.interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("working_dir: /data/run1\ntrim_names: true\n").unwrap();
        assert_eq!(config.working_dir, PathBuf::from("/data/run1"));
        assert!(config.trim_names);
        assert_eq!(config.reimages, 0);
        assert_eq!(config.poll.evaluation_timeout_ms, 10000);
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("checkfactor.yml");
        fs::write(
            &path,
            "working_dir: /data/run1\ndirections: [facet_patch_1, facet_patch_2]\nreimages: 2\npoll:\n  interval_secs: 30\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.directions, vec!["facet_patch_1", "facet_patch_2"]);
        assert_eq!(config.reimages, 2);
        assert_eq!(config.poll.interval_secs, 30);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("checkfactor.yml");
        fs::write(&path, "poll:\n  interval_secs: 0\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.poll.evaluation_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_config_conversion() {
        let settings = PollSettings {
            interval_secs: 5,
            evaluation_timeout_ms: 250,
        };
        let poll = settings.to_poll_config();
        assert_eq!(poll.interval, Duration::from_secs(5));
        assert_eq!(poll.evaluation_timeout, Duration::from_millis(250));
    }
}
