//! Trial configuration: defaults, JSON, and environment overrides.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_TRIALS: &str = "PAIRLANG_TRIALS";
pub const ENV_MAX_DEPTH: &str = "PAIRLANG_MAX_DEPTH";
pub const ENV_SEED: &str = "PAIRLANG_SEED";

/// How many expressions to generate, how deep, and from which seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    pub trials: u64,
    pub max_depth: usize,
    /// Drawn from OS entropy when absent; the seed used is always reported.
    pub seed: Option<u64>,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            max_depth: 4,
            seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: expected a non-negative integer, found `{value}`")]
    InvalidEnv { var: &'static str, value: String },

    #[error("{var} is not valid unicode")]
    NotUnicode { var: &'static str },

    #[error("invalid trial config: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl TrialConfig {
    /// Defaults overridden by whichever `PAIRLANG_*` variables are set.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| match std::env::var(var) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { var }),
        })
    }

    /// Like [`TrialConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(mut lookup: F) -> ConfigResult<Self>
    where
        F: FnMut(&'static str) -> ConfigResult<Option<String>>,
    {
        let mut config = Self::default();
        if let Some(trials) = parse_var(ENV_TRIALS, lookup(ENV_TRIALS)?)? {
            config.trials = trials;
        }
        if let Some(max_depth) = parse_var(ENV_MAX_DEPTH, lookup(ENV_MAX_DEPTH)?)? {
            config.max_depth = max_depth;
        }
        if let Some(seed) = parse_var(ENV_SEED, lookup(ENV_SEED)?)? {
            config.seed = Some(seed);
        }
        Ok(config)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: Option<String>) -> ConfigResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}
