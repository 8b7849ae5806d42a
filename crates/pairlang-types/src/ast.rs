//! AST node types for pairlang expressions.
//!
//! Expressions are immutable trees. Recursive children are boxed; the
//! constructor helpers (`Expr::sum`, `Expr::bind`, ...) take care of the
//! boxing so call sites read like the expression they build.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::value::write_number;

/// A variable name.
pub type Name = String;

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// A pairlang expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
    /// Variable reference. Only evaluates if an enclosing `Bind` substituted it.
    Var(Name),
    /// `lhs + rhs`
    Sum(Box<Expr>, Box<Expr>),
    /// `lhs <= rhs`
    Less(Box<Expr>, Box<Expr>),
    /// `let name = bound in body`
    Bind {
        name: Name,
        bound: Box<Expr>,
        body: Box<Expr>,
    },
    /// `if test then then_branch else else_branch`
    If {
        test: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Pair constructor.
    Pair(Box<Expr>, Box<Expr>),
    /// First component of a pair.
    Head(Box<Expr>),
    /// Second component of a pair.
    Tail(Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<Name>) -> Self {
        Self::Var(name.into())
    }

    pub fn sum(lhs: Expr, rhs: Expr) -> Self {
        Self::Sum(Box::new(lhs), Box::new(rhs))
    }

    pub fn less(lhs: Expr, rhs: Expr) -> Self {
        Self::Less(Box::new(lhs), Box::new(rhs))
    }

    pub fn bind(name: impl Into<Name>, bound: Expr, body: Expr) -> Self {
        Self::Bind {
            name: name.into(),
            bound: Box::new(bound),
            body: Box::new(body),
        }
    }

    pub fn if_then_else(test: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Self::If {
            test: Box::new(test),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn pair(first: Expr, second: Expr) -> Self {
        Self::Pair(Box::new(first), Box::new(second))
    }

    pub fn head(pair: Expr) -> Self {
        Self::Head(Box::new(pair))
    }

    pub fn tail(pair: Expr) -> Self {
        Self::Tail(Box::new(pair))
    }

    /// Names referenced somewhere in the expression without an enclosing
    /// `Bind` of the same name.
    pub fn free_vars(&self) -> BTreeSet<Name> {
        let mut free = BTreeSet::new();
        let mut bound = Vec::new();
        self.collect_free(&mut bound, &mut free);
        free
    }

    /// Whether `name` occurs free in the expression.
    pub fn is_free(&self, name: &str) -> bool {
        self.free_vars().contains(name)
    }

    fn collect_free<'a>(&'a self, bound: &mut Vec<&'a str>, free: &mut BTreeSet<Name>) {
        match self {
            Expr::Number(_) | Expr::Bool(_) => {}
            Expr::Var(name) => {
                if !bound.contains(&name.as_str()) {
                    free.insert(name.clone());
                }
            }
            Expr::Sum(lhs, rhs) | Expr::Less(lhs, rhs) | Expr::Pair(lhs, rhs) => {
                lhs.collect_free(bound, free);
                rhs.collect_free(bound, free);
            }
            Expr::Bind { name, bound: rhs, body } => {
                rhs.collect_free(bound, free);
                bound.push(name);
                body.collect_free(bound, free);
                bound.pop();
            }
            Expr::If {
                test,
                then_branch,
                else_branch,
            } => {
                test.collect_free(bound, free);
                then_branch.collect_free(bound, free);
                else_branch.collect_free(bound, free);
            }
            Expr::Head(inner) | Expr::Tail(inner) => inner.collect_free(bound, free),
        }
    }

    /// Height of the tree; literals and variables have depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Bool(_) | Expr::Var(_) => 0,
            Expr::Sum(lhs, rhs) | Expr::Less(lhs, rhs) | Expr::Pair(lhs, rhs) => {
                1 + lhs.depth().max(rhs.depth())
            }
            Expr::Bind { bound, body, .. } => 1 + bound.depth().max(body.depth()),
            Expr::If {
                test,
                then_branch,
                else_branch,
            } => 1 + test.depth().max(then_branch.depth()).max(else_branch.depth()),
            Expr::Head(inner) | Expr::Tail(inner) => 1 + inner.depth(),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Rendering
// ══════════════════════════════════════════════════════════════════════════════

/// S-expression rendering, used in mismatch diagnostics.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write_number(*n, f),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Var(name) => f.write_str(name),
            Expr::Sum(lhs, rhs) => write!(f, "(+ {lhs} {rhs})"),
            Expr::Less(lhs, rhs) => write!(f, "(<= {lhs} {rhs})"),
            Expr::Bind { name, bound, body } => write!(f, "(let ([{name} {bound}]) {body})"),
            Expr::If {
                test,
                then_branch,
                else_branch,
            } => write!(f, "(if {test} {then_branch} {else_branch})"),
            Expr::Pair(first, second) => write!(f, "(pair {first} {second})"),
            Expr::Head(inner) => write!(f, "(head {inner})"),
            Expr::Tail(inner) => write!(f, "(tail {inner})"),
        }
    }
}
