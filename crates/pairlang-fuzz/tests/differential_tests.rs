//! Integration tests for the differential tester.
//!
//! Tests cover:
//! - the oracle on hand-written scenarios, values and every error class
//! - seeded trial runs (equivalence over generated expressions)
//! - generator determinism, depth bound and scoping
//! - configuration from JSON and variable lookups
//! - mismatch reporting

use std::collections::{BTreeSet, HashMap};

use pairlang_fuzz::config::{ENV_MAX_DEPTH, ENV_SEED, ENV_TRIALS};
use pairlang_fuzz::{
    check, init_tracing, run_trials, run_trials_from_env, ConfigError, Generator, Mismatch,
    TrialConfig, TrialError,
};
use pairlang_host::HostContext;
use pairlang_types::{ErrorKind, Expr, Name, Outcome, Value};
use proptest::prelude::*;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn ctx() -> HostContext {
    init_tracing();
    HostContext::new().unwrap_or_else(|e| panic!("host setup failed: {e}"))
}

fn n(value: f64) -> Expr {
    Expr::Number(value)
}

/// Check and panic on disagreement; returns the shared outcome.
fn agreed(expr: &Expr) -> (Outcome, Option<ErrorKind>) {
    match check(&ctx(), expr) {
        Ok(agreement) => (agreement.outcome, agreement.kind),
        Err(mismatch) => panic!("{mismatch}"),
    }
}

fn agreed_error(expr: &Expr, kind: ErrorKind, text: &str) {
    assert_eq!(agreed(expr), (Outcome::Error(text.to_string()), Some(kind)));
}

fn agreed_value(expr: &Expr, value: Value) {
    assert_eq!(agreed(expr), (Outcome::Value(value), None));
}

/// Every name bound by a `Bind` anywhere in `expr`.
fn bound_names(expr: &Expr, out: &mut Vec<Name>) {
    match expr {
        Expr::Number(_) | Expr::Bool(_) | Expr::Var(_) => {}
        Expr::Sum(l, r) | Expr::Less(l, r) | Expr::Pair(l, r) => {
            bound_names(l, out);
            bound_names(r, out);
        }
        Expr::Bind { name, bound, body } => {
            out.push(name.clone());
            bound_names(bound, out);
            bound_names(body, out);
        }
        Expr::If {
            test,
            then_branch,
            else_branch,
        } => {
            bound_names(test, out);
            bound_names(then_branch, out);
            bound_names(else_branch, out);
        }
        Expr::Head(inner) | Expr::Tail(inner) => bound_names(inner, out),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Oracle scenarios
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn sum_of_boolean_and_number() {
    agreed_error(
        &Expr::sum(Expr::Bool(true), n(3.0)),
        ErrorKind::TypeMismatch,
        "+: contract violation; expected: number?; given: true; argument position: 1st; other argument: 3",
    );
}

#[test]
fn less_of_number_and_boolean() {
    agreed_error(
        &Expr::less(n(3.0), Expr::Bool(false)),
        ErrorKind::TypeMismatch,
        "<=: contract violation; expected: number?; given: false; argument position: 2nd; other argument: 3",
    );
}

#[test]
fn pair_projections() {
    agreed_value(&Expr::head(Expr::pair(n(1.0), n(2.0))), Value::Number(1.0));
    agreed_value(&Expr::tail(Expr::pair(n(1.0), n(2.0))), Value::Number(2.0));
}

#[test]
fn bind_then_sum() {
    let expr = Expr::bind("x", n(5.0), Expr::sum(Expr::var("x"), Expr::var("x")));
    agreed_value(&expr, Value::Number(10.0));
}

#[test]
fn number_as_if_test() {
    agreed_error(
        &Expr::if_then_else(n(3.0), n(1.0), n(2.0)),
        ErrorKind::NonBooleanTest,
        "if: test expression must be a boolean",
    );
}

#[test]
fn unbound_variable() {
    agreed_error(&Expr::var("z"), ErrorKind::FreeVariable, "z: unbound identifier");
}

#[test]
fn projection_of_non_pair() {
    agreed_error(
        &Expr::head(Expr::bind("p", n(2.5), Expr::var("p"))),
        ErrorKind::NotAPair,
        "head: contract violation; expected: pair?; given: 2.5",
    );
}

#[test]
fn shadowing_agrees() {
    let expr = Expr::bind(
        "x",
        Expr::pair(n(1.0), n(-0.0)),
        Expr::bind(
            "x",
            Expr::tail(Expr::var("x")),
            Expr::sum(Expr::var("x"), Expr::var("x")),
        ),
    );
    agreed_value(&expr, Value::Number(-0.0));
}

#[test]
fn pair_values_render_in_error_text() {
    agreed_error(
        &Expr::less(Expr::pair(Expr::Bool(false), n(0.1)), n(1.0)),
        ErrorKind::TypeMismatch,
        "<=: contract violation; expected: number?; given: (false . 0.1); argument position: 1st; other argument: 1",
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Trial runs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn seeded_run_agrees_everywhere() {
    init_tracing();
    let config = TrialConfig {
        trials: 500,
        max_depth: 4,
        seed: Some(0x5eed),
    };
    let report = run_trials(&config).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(report.seed, 0x5eed);
    assert_eq!(report.trials, 500);
    let errors: u64 = report.errors.values().sum();
    assert_eq!(report.values + errors, 500);
    assert_eq!(report.error_count(ErrorKind::Internal), 0);
}

#[test]
fn seeded_runs_are_reproducible() {
    let config = TrialConfig {
        trials: 100,
        max_depth: 3,
        seed: Some(42),
    };
    let first = run_trials(&config).unwrap_or_else(|e| panic!("{e}"));
    let second = run_trials(&config).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(first, second);
}

#[test]
fn unseeded_run_reports_its_seed() {
    let config = TrialConfig {
        trials: 20,
        max_depth: 2,
        seed: None,
    };
    let report = run_trials(&config).unwrap_or_else(|e| panic!("{e}"));
    let replay = run_trials(&TrialConfig {
        seed: Some(report.seed),
        ..config
    })
    .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(report, replay);
}

#[test]
fn zero_trials_is_an_empty_report() {
    let report = run_trials(&TrialConfig {
        trials: 0,
        max_depth: 4,
        seed: Some(1),
    })
    .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(report.trials, 0);
    assert_eq!(report.values, 0);
    assert!(report.errors.is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// Generator
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn same_seed_same_expressions() {
    let mut a = Generator::new(9);
    let mut b = Generator::new(9);
    for _ in 0..50 {
        assert_eq!(a.generate(4, &[]), b.generate(4, &[]));
    }
}

#[test]
fn depth_zero_yields_leaves() {
    let mut generator = Generator::new(3);
    for _ in 0..200 {
        assert_eq!(generator.generate(0, &[]).depth(), 0);
    }
}

#[test]
fn empty_scope_leaves_are_fresh_names() {
    let mut generator = Generator::new(11);
    let mut seen = BTreeSet::new();
    for _ in 0..300 {
        if let Expr::Var(name) = generator.generate(0, &[]) {
            assert!(seen.insert(name), "fresh names must not repeat");
        }
    }
}

#[test]
fn variables_prefer_scope() {
    let scope = vec!["q".to_string()];
    let mut generator = Generator::new(5);
    let mut counts: HashMap<bool, u32> = HashMap::new();
    for _ in 0..3_000 {
        if let Expr::Var(name) = generator.generate(0, &scope) {
            *counts.entry(name == "q").or_insert(0) += 1;
        }
    }
    let in_scope = counts.get(&true).copied().unwrap_or(0);
    let fresh = counts.get(&false).copied().unwrap_or(0);
    assert!(fresh > 0, "some variables should be unbound");
    assert!(in_scope > fresh * 4, "scope names should dominate: {in_scope} vs {fresh}");
}

#[test]
fn generator_covers_every_error_kind() {
    let report = run_trials(&TrialConfig {
        trials: 2_000,
        max_depth: 3,
        seed: Some(2024),
    })
    .unwrap_or_else(|e| panic!("{e}"));
    for kind in [
        ErrorKind::FreeVariable,
        ErrorKind::NonBooleanTest,
        ErrorKind::TypeMismatch,
        ErrorKind::NotAPair,
    ] {
        assert!(report.error_count(kind) > 0, "no {kind} outcomes in {report:?}");
    }
    assert!(report.values > 0);
}

proptest! {
    #[test]
    fn generated_depth_is_bounded(seed in any::<u64>(), depth in 0usize..6) {
        let expr = Generator::new(seed).generate(depth, &[]);
        prop_assert!(expr.depth() <= depth);
    }

    #[test]
    fn bound_names_are_unique(seed in any::<u64>()) {
        let expr = Generator::new(seed).generate(5, &[]);
        let mut names = Vec::new();
        bound_names(&expr, &mut names);
        let unique: BTreeSet<_> = names.iter().collect();
        prop_assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn generated_expressions_agree(seed in any::<u64>()) {
        let ctx = ctx();
        let expr = Generator::new(seed).generate(4, &[]);
        if let Err(mismatch) = check(&ctx, &expr) {
            prop_assert!(false, "{}", mismatch.to_json());
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Configuration
// ══════════════════════════════════════════════════════════════════════════════

fn lookup_from<'a>(
    vars: &'a [(&'static str, &'a str)],
) -> impl FnMut(&'static str) -> Result<Option<String>, ConfigError> + 'a {
    move |var| {
        Ok(vars
            .iter()
            .find(|(name, _)| *name == var)
            .map(|(_, value)| value.to_string()))
    }
}

#[test]
fn default_config() {
    assert_eq!(
        TrialConfig::default(),
        TrialConfig {
            trials: 1000,
            max_depth: 4,
            seed: None
        }
    );
}

#[test]
fn json_config_fills_defaults() {
    let config = TrialConfig::from_json(r#"{ "seed": 17 }"#).unwrap();
    assert_eq!(config.seed, Some(17));
    assert_eq!(config.trials, 1000);
    assert_eq!(config.max_depth, 4);
}

#[test]
fn json_config_rejects_wrong_types() {
    assert!(matches!(
        TrialConfig::from_json(r#"{ "trials": "many" }"#),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn variables_override_defaults() {
    let vars = [(ENV_TRIALS, "25"), (ENV_MAX_DEPTH, " 2 "), (ENV_SEED, "99")];
    let config = TrialConfig::from_lookup(lookup_from(&vars)).unwrap();
    assert_eq!(
        config,
        TrialConfig {
            trials: 25,
            max_depth: 2,
            seed: Some(99)
        }
    );
}

#[test]
fn missing_variables_keep_defaults() {
    let config = TrialConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(config, TrialConfig::default());
}

#[test]
fn malformed_variable_is_an_error() {
    let vars = [(ENV_MAX_DEPTH, "-1")];
    let err = TrialConfig::from_lookup(lookup_from(&vars)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidEnv { var: ENV_MAX_DEPTH, .. }
    ));
    assert_eq!(
        err.to_string(),
        "PAIRLANG_MAX_DEPTH: expected a non-negative integer, found `-1`"
    );
}

#[test]
fn run_from_looked_up_config() {
    let vars = [(ENV_TRIALS, "40"), (ENV_MAX_DEPTH, "3"), (ENV_SEED, "8")];
    let config = TrialConfig::from_lookup(lookup_from(&vars)).unwrap();
    let report = run_trials(&config).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(report.seed, 8);
    assert_eq!(report.trials, 40);
}

/// The only test in this binary that touches the process environment.
#[test]
fn run_from_environment() {
    std::env::set_var(ENV_TRIALS, "12");
    std::env::set_var(ENV_MAX_DEPTH, "2");
    std::env::set_var(ENV_SEED, "31");
    let config = TrialConfig::from_env();
    let report = run_trials_from_env();

    std::env::set_var(ENV_SEED, "not-a-seed");
    let malformed = run_trials_from_env();

    std::env::remove_var(ENV_TRIALS);
    std::env::remove_var(ENV_MAX_DEPTH);
    std::env::remove_var(ENV_SEED);

    assert_eq!(
        config.unwrap(),
        TrialConfig {
            trials: 12,
            max_depth: 2,
            seed: Some(31)
        }
    );
    let report = report.unwrap_or_else(|e| panic!("{e}"));
    assert_eq!((report.seed, report.trials), (31, 12));
    assert!(matches!(
        malformed,
        Err(TrialError::Config(ConfigError::InvalidEnv { var: ENV_SEED, .. }))
    ));
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

// ══════════════════════════════════════════════════════════════════════════════
// Mismatch reporting
// ══════════════════════════════════════════════════════════════════════════════

fn sample_mismatch() -> Mismatch {
    Mismatch {
        expr: Expr::sum(Expr::var("x"), n(1.0)).to_string(),
        reference: Outcome::Error("x: unbound identifier".into()),
        evaluator: Outcome::Value(Value::Number(1.0)),
    }
}

#[test]
fn mismatch_json_carries_both_outcomes() {
    let json: serde_json::Value = serde_json::from_str(&sample_mismatch().to_json()).unwrap();
    assert_eq!(json["expr"], "(+ x 1)");
    assert_eq!(json["reference"]["error"], "x: unbound identifier");
    assert_eq!(json["evaluator"]["value"]["Number"], 1.0);
}

#[test]
fn trial_error_names_seed_and_trial() {
    let err = TrialError::Mismatch {
        seed: 7,
        trial: 3,
        mismatch: Box::new(sample_mismatch()),
    };
    let text = err.to_string();
    assert!(text.starts_with("trial 3 (seed 7): evaluators disagree on (+ x 1)"));
}
