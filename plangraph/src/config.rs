use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{
    magic::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_CONFIG_PATH},
    utils::error::{Error, PgResult},
};

/// Limits and parallelism of state-space exploration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_states: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<u64>,
    /// Worker threads of the parallel explorer. Unset means available parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

/// Bound on role discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_definitions: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Parsed level, `info` when the configured value is not recognized.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanGraphConfig {
    pub exploration: ExplorationConfig,
    pub closure: ClosureConfig,
    pub log: LogConfig,
}

impl PlanGraphConfig {
    /// Get the default path to the configuration file.
    pub fn default_path() -> PathBuf {
        // Check if the environment variable is set
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push(CONFIG_DIR_NAME);
        path.push(CONFIG_FILE_NAME);
        path
    }

    /// Load the configuration from `path`, or from [`Self::default_path`].
    ///
    /// An explicit path must exist. The default path may be absent, in which
    /// case the defaults are returned.
    pub fn load(path: Option<&Path>) -> PgResult<Self> {
        match path {
            Some(path) => Self::load_from_toml(path),
            None => {
                let path = Self::default_path();
                if path.is_file() {
                    Self::load_from_toml(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> PgResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;

        toml::from_str(&toml_str).map_err(|e| Error::ConfigParseError {
            source: e,
            file: path.display().to_string(),
        })
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save_to_toml(&self, path: &Path) -> PgResult<()> {
        let toml_str = toml::to_string(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_use_defaults() {
        let config: PlanGraphConfig = toml::from_str(
            r#"
            [exploration]
            max_states = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.exploration.max_states, Some(1000));
        assert_eq!(config.exploration.time_budget_ms, None);
        assert_eq!(config.closure, ClosureConfig::default());
        assert_eq!(config.log.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = PlanGraphConfig {
            exploration: ExplorationConfig {
                max_states: Some(10),
                time_budget_ms: Some(250),
                threads: Some(2),
            },
            closure: ClosureConfig {
                max_definitions: Some(64),
            },
            log: LogConfig {
                level: "debug".to_string(),
            },
        };
        config.save_to_toml(&path).unwrap();

        let loaded = PlanGraphConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[exploration]\nmax_states = \"many\"\n").unwrap();

        match PlanGraphConfig::load_from_toml(&path) {
            Err(Error::ConfigParseError { file, .. }) => assert!(file.ends_with("config.toml")),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            PlanGraphConfig::load(Some(&path)),
            Err(Error::IoError(_))
        ));
    }
}
