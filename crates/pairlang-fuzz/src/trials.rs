//! The trial loop: generate, check, count, stop at the first mismatch.

use std::collections::BTreeMap;

use pairlang_host::{HostContext, HostError};
use pairlang_types::ErrorKind;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::config::{ConfigError, TrialConfig};
use crate::generator::Generator;
use crate::oracle::{check, Mismatch};

/// Summary of a run in which every trial agreed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialReport {
    /// The seed the generator was built from.
    pub seed: u64,
    pub trials: u64,
    /// Trials whose shared outcome was a value.
    pub values: u64,
    /// Trials whose shared outcome was an error, by kind.
    pub errors: BTreeMap<ErrorKind, u64>,
}

impl TrialReport {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            trials: 0,
            values: 0,
            errors: BTreeMap::new(),
        }
    }

    pub fn error_count(&self, kind: ErrorKind) -> u64 {
        self.errors.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Error)]
pub enum TrialError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not set up the reference evaluator: {0}")]
    Host(#[from] HostError),

    #[error("trial {trial} (seed {seed}): {mismatch}")]
    Mismatch {
        seed: u64,
        trial: u64,
        mismatch: Box<Mismatch>,
    },
}

pub type TrialResult<T> = Result<T, TrialError>;

/// Run `config.trials` trials, each on a fresh expression of depth
/// `config.max_depth` with an empty scope.
pub fn run_trials(config: &TrialConfig) -> TrialResult<TrialReport> {
    let seed = config.seed.unwrap_or_else(rand::random);
    let _span = info_span!("run_trials", seed, trials = config.trials, max_depth = config.max_depth)
        .entered();

    let ctx = HostContext::new()?;
    let mut generator = Generator::new(seed);
    let mut report = TrialReport::new(seed);

    for trial in 0..config.trials {
        let expr = generator.generate(config.max_depth, &[]);
        match check(&ctx, &expr) {
            Ok(agreement) => {
                debug!(trial, %expr, outcome = %agreement.outcome, "agreed");
                match agreement.kind {
                    Some(kind) => *report.errors.entry(kind).or_insert(0) += 1,
                    None => report.values += 1,
                }
                report.trials += 1;
            }
            Err(mismatch) => {
                warn!(trial, seed, mismatch = %mismatch.to_json(), "evaluators disagree");
                return Err(TrialError::Mismatch {
                    seed,
                    trial,
                    mismatch: Box::new(mismatch),
                });
            }
        }
    }

    info!(
        trials = report.trials,
        values = report.values,
        errors = ?report.errors,
        "all trials agreed"
    );
    Ok(report)
}

/// [`run_trials`] with the configuration read from `PAIRLANG_*` variables.
pub fn run_trials_from_env() -> TrialResult<TrialReport> {
    let config = TrialConfig::from_env()?;
    run_trials(&config)
}
