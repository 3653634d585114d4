//! Watch configuration loaded from `~/.pipewatch/config.yaml`.
//!
//! The configuration is read once at startup into an explicit [`Config`]
//! struct that is passed by reference into the session constructors; there
//! are no ambient globals. An empty entity list is a fatal configuration
//! error surfaced before the poll loop starts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WatchError};
use crate::types::MonitoredEntity;

/// Default poll cadence, measured start-of-cycle to start-of-cycle.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default per-fetch timeout; a timed-out fetch degrades to that entity's
/// error record.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Backoff applied after a loop-scoped (credential-shaped) failure.
pub const TRANSIENT_BACKOFF_SECS: u64 = 10;

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

/// PipeWatch configuration as stored in `~/.pipewatch/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// CodePipeline pipelines to watch, in display order
    #[serde(default)]
    pub pipelines: Vec<String>,

    /// CodeBuild projects to watch, displayed after the pipelines
    #[serde(default)]
    pub build_projects: Vec<String>,

    /// AWS region passed to the fetchers (falls back to ambient AWS config)
    #[serde(default)]
    pub region: Option<String>,

    /// AWS profile passed to the fetchers
    #[serde(default)]
    pub profile: Option<String>,

    /// Poll cadence in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-fetch timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipelines: Vec::new(),
            build_projects: Vec::new(),
            region: None,
            profile: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Get the default configuration file path (`~/.pipewatch/config.yaml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| WatchError::ConfigMissingField {
            field: "HOME environment variable".to_string(),
        })?;

        Ok(PathBuf::from(home).join(".pipewatch").join("config.yaml"))
    }

    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WatchError::ConfigNotFound {
                    path: path.to_path_buf(),
                    source: Some(e),
                }
            } else {
                WatchError::io("reading config file", path, e)
            }
        })?;

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| WatchError::ConfigInvalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(
            path = %path.display(),
            pipelines = config.pipelines.len(),
            build_projects = config.build_projects.len(),
            "loaded configuration"
        );

        Ok(config)
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// The ordered entity list: pipelines first, then build projects,
    /// preserving configuration order. This order fixes the screen layout
    /// for the whole session.
    pub fn entities(&self) -> Vec<MonitoredEntity> {
        self.pipelines
            .iter()
            .map(MonitoredEntity::pipeline)
            .chain(self.build_projects.iter().map(MonitoredEntity::build))
            .collect()
    }

    /// Validate the configuration.
    ///
    /// Fails when no entities are configured, or when entity names collide
    /// (slots are keyed by name, so names must be unique across both kinds).
    pub fn validate(&self) -> Result<()> {
        if self.pipelines.is_empty() && self.build_projects.is_empty() {
            return Err(WatchError::config_validation(
                "no pipelines or build projects configured",
            ));
        }

        let mut seen = HashSet::new();
        for entity in self.entities() {
            if !seen.insert(entity.name.clone()) {
                return Err(WatchError::config_validation(format!(
                    "duplicate entity name: {}",
                    entity.name
                )));
            }
        }

        if self.poll_interval_secs == 0 {
            return Err(WatchError::config_validation(
                "poll_interval_secs must be at least 1",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
pipelines:
  - web-app
  - api-service
build_projects:
  - nightly-tests
region: eu-west-1
profile: staging
poll_interval_secs: 10
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.pipelines, vec!["web-app", "api-service"]);
        assert_eq!(config.build_projects, vec!["nightly-tests"]);
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.profile.as_deref(), Some("staging"));
        assert_eq!(config.poll_interval_secs, 10);
        // Untouched fields keep their defaults
        assert_eq!(config.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "pipelines: [web-app]\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert!(config.region.is_none());
        assert!(config.build_projects.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, WatchError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "pipelines: [unclosed\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, WatchError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_entities_preserve_order() {
        let config = Config {
            pipelines: vec!["a".into(), "b".into()],
            build_projects: vec!["c".into()],
            ..Config::default()
        };

        let entities = config.entities();
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].name, "a");
        assert_eq!(entities[0].kind, EntityKind::Pipeline);
        assert_eq!(entities[2].name, "c");
        assert_eq!(entities[2].kind, EntityKind::Build);
    }

    #[test]
    fn test_validate_empty_config() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_validate_duplicate_names() {
        let config = Config {
            pipelines: vec!["web-app".into()],
            build_projects: vec!["web-app".into()],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate entity name"));
    }

    #[test]
    fn test_validate_zero_interval() {
        let config = Config {
            pipelines: vec!["web-app".into()],
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
