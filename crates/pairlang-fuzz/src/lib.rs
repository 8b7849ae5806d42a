//! Differential testing of the pairlang evaluators.
//!
//! A seeded [`Generator`] produces random expressions; [`check`] runs each
//! through the substitution evaluator and the WebAssembly reference
//! evaluator and demands identical values or identical error text;
//! [`run_trials`] repeats that under a [`TrialConfig`].

pub mod config;
pub mod generator;
pub mod oracle;
pub mod trials;

pub use config::{ConfigError, TrialConfig};
pub use generator::Generator;
pub use oracle::{check, safe_evaluate, safe_reference, Agreement, Mismatch};
pub use trials::{run_trials, run_trials_from_env, TrialError, TrialReport};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=pairlang_fuzz=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
