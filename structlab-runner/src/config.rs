//! Backtest configuration: a TOML file with environment overrides.
//!
//! ```toml
//! [analysis]
//! timeframes = ["4h", "1h", "15m"]
//! execution_timeframe = "15m"
//!
//! [walk_forward]
//! lookback = 400
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Any key can be overridden with `STRUCTLAB_<SECTION>__<KEY>=value`, e.g.
//! `STRUCTLAB_WALK_FORWARD__STEP=10` or `STRUCTLAB_ANALYSIS__SWING__ATR_PERIOD=21`.
//! Booleans and numbers are parsed; `STRUCTLAB_ANALYSIS__TIMEFRAMES` takes a
//! comma-separated list.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use structlab_core::{AnalysisConfig, ConfigurationError};

use crate::logging::LoggingConfig;
use crate::walk_forward::WalkForwardConfig;

/// Prefix of environment variables that override file values.
pub const ENV_PREFIX: &str = "STRUCTLAB";
/// Separator between nested keys in an override variable.
pub const ENV_SEPARATOR: &str = "__";
/// Keys whose overrides are split on commas.
const LIST_KEYS: [&str; 1] = ["analysis.timeframes"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("load config: {0}")]
    Source(#[from] config::ConfigError),
    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub analysis: AnalysisConfig,
    pub walk_forward: WalkForwardConfig,
    pub logging: LoggingConfig,
}

impl BacktestConfig {
    /// Load a TOML file and apply overrides from the process environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&content, environment())
    }

    /// Parse `content`, layer the `STRUCTLAB_` entries of `env` over it and validate.
    pub fn from_toml<I>(content: &str, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: config::Map<String, String> = env.into_iter().collect();
        Self::load(content, environment().source(Some(vars)))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.analysis.validate()?;
        self.walk_forward.validate()
    }

    fn load(content: &str, env: Environment) -> Result<Self, ConfigError> {
        let config: BacktestConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .add_source(env)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        tracing::debug!(
            timeframes = ?config.analysis.timeframes,
            lookback = config.walk_forward.lookback,
            "config loaded"
        );
        Ok(config)
    }
}

fn environment() -> Environment {
    LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    )
}
