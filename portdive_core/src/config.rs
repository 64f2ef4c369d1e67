//! Game configuration.

use crate::matrix::Fragment;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default time between two pwner ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1500);

/// The reference port matrix: eight addresses of four fragments.
pub fn reference_rows() -> Vec<Vec<Fragment>> {
    vec![
        vec![193, 68, 30, 20],
        vec![193, 69, 40, 20],
        vec![194, 66, 20, 30],
        vec![194, 66, 40, 40],
        vec![194, 67, 10, 20],
        vec![194, 67, 10, 30],
        vec![194, 67, 20, 20],
        vec![194, 68, 20, 20],
    ]
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Initial port rows (shape is validated when the game is built)
    pub rows: Vec<Vec<Fragment>>,

    /// Time between two pwner ticks
    pub tick_interval: Duration,

    /// Master seed (None = drawn from the environment)
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: reference_rows(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            seed: None,
        }
    }
}

/// On-disk shape of a configuration file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    rows: Vec<Vec<Fragment>>,
    #[serde(default)]
    tick_ms: Option<u64>,
    #[serde(default)]
    seed: Option<u64>,
}

impl GameConfig {
    /// Parses a JSON configuration: `{ "rows": [[..]], "tick_ms": 1600, "seed": 7 }`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        Ok(Self {
            rows: file.rows,
            tick_interval: file
                .tick_ms
                .map_or(DEFAULT_TICK_INTERVAL, Duration::from_millis),
            seed: file.seed,
        })
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.rows.len(), 8);
        assert!(config.rows.iter().all(|r| r.len() == 4));
        assert_eq!(config.tick_interval, Duration::from_millis(1500));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_config_from_json() {
        let config =
            GameConfig::from_json_str(r#"{ "rows": [[1, 2], [3, 4]], "tick_ms": 1600, "seed": 7 }"#)
                .unwrap();
        assert_eq!(config.rows, vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(config.tick_interval, Duration::from_millis(1600));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_config_optional_fields() {
        let config = GameConfig::from_json_str(r#"{ "rows": [[5]] }"#).unwrap();
        assert_eq!(config.tick_interval, DEFAULT_TICK_INTERVAL);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_config_malformed() {
        assert!(matches!(
            GameConfig::from_json_str(r#"{ "tick_ms": 10 }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            GameConfig::from_json_file("/nonexistent/portdive.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_config_builders() {
        let config = GameConfig::default()
            .with_seed(3)
            .with_tick_interval(Duration::from_millis(10));
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.tick_interval, Duration::from_millis(10));
    }
}
