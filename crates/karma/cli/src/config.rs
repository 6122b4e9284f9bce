//! CLI configuration

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ledger file used when neither the flag, the environment, nor the config
/// file names one.
pub const DEFAULT_LEDGER_FILE: &str = "karma.json";

/// Leaderboard rows per list when unconfigured.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct KarmaConfig {
    /// Ledger snapshot file
    pub ledger_path: Option<PathBuf>,

    /// Rows per leaderboard list (0 shows everything)
    pub leaderboard_limit: Option<usize>,
}

impl KarmaConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: KarmaConfig = toml::from_str(&contents)
                .map_err(|e| CliError::Config(format!("{}: {}", config_path.display(), e)))?;
            Ok(config)
        } else {
            Ok(KarmaConfig::default())
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> CliResult<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| CliError::Config("Cannot find config directory".into()))?;
        Ok(config_dir.join("karma").join("config.toml"))
    }

    /// Ledger path: explicit override, then config file, then `karma.json`.
    pub fn resolve_ledger_path(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.ledger_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE))
    }

    /// Leaderboard limit: explicit override, then config file, then 10.
    pub fn resolve_leaderboard_limit(&self, cli_override: Option<usize>) -> usize {
        cli_override
            .or(self.leaderboard_limit)
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
    }
}
