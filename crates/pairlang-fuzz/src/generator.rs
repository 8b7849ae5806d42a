//! Depth-bounded, scope-aware random expression generation.
//!
//! Leaves are drawn from small literal pools chosen to hit the interesting
//! corners of the value model: both zeros, negatives, fractions that do not
//! round-trip through decimal, and non-ASCII identifiers.

use pairlang_types::{Expr, Name};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Numbers a literal leaf can take.
pub const NUMBER_POOL: [f64; 8] = [0.0, -0.0, 1.0, -1.0, 2.5, -3.75, 42.0, 0.1];

/// Stems for generated identifiers.
pub const NAME_ALPHABET: [&str; 6] = ["a", "b", "x", "y", "ζ", "é"];

/// A variable leaf is a fresh, unbound name with probability
/// `1 / UNBOUND_ODDS`.
pub const UNBOUND_ODDS: u32 = 10;

/// Leaf forms, then compound forms; `depth > 0` picks among all of them.
const LEAF_FORMS: u32 = 3;
const ALL_FORMS: u32 = LEAF_FORMS + 7;

/// Seeded expression generator.
///
/// Two generators built from the same seed produce the same sequence of
/// expressions.
pub struct Generator {
    rng: StdRng,
    /// Suffix for the next fresh name; never reused.
    next_name: u64,
}

impl Generator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_name: 0,
        }
    }

    /// Generate an expression of at most `depth` levels of nesting whose
    /// variable leaves prefer the names in `scope`.
    pub fn generate(&mut self, depth: usize, scope: &[Name]) -> Expr {
        let upper = if depth == 0 { LEAF_FORMS } else { ALL_FORMS };
        match self.rng.gen_range(0..upper) {
            0 => self.number(),
            1 => Expr::Bool(self.rng.gen()),
            2 => self.variable(scope),
            3 => Expr::sum(self.generate(depth - 1, scope), self.generate(depth - 1, scope)),
            4 => Expr::less(self.generate(depth - 1, scope), self.generate(depth - 1, scope)),
            5 => self.bind(depth, scope),
            6 => Expr::if_then_else(
                self.generate(depth - 1, scope),
                self.generate(depth - 1, scope),
                self.generate(depth - 1, scope),
            ),
            7 => Expr::pair(self.generate(depth - 1, scope), self.generate(depth - 1, scope)),
            8 => Expr::head(self.generate(depth - 1, scope)),
            _ => Expr::tail(self.generate(depth - 1, scope)),
        }
    }

    fn number(&mut self) -> Expr {
        let idx = self.rng.gen_range(0..NUMBER_POOL.len());
        Expr::Number(NUMBER_POOL[idx])
    }

    fn variable(&mut self, scope: &[Name]) -> Expr {
        if scope.is_empty() || self.rng.gen_ratio(1, UNBOUND_ODDS) {
            return Expr::Var(self.fresh_name());
        }
        let idx = self.rng.gen_range(0..scope.len());
        Expr::Var(scope[idx].clone())
    }

    /// `bound` sees the outer scope; `body` also sees the new name.
    fn bind(&mut self, depth: usize, scope: &[Name]) -> Expr {
        let name = self.fresh_name();
        let bound = self.generate(depth - 1, scope);
        let mut inner = scope.to_vec();
        inner.push(name.clone());
        let body = self.generate(depth - 1, &inner);
        Expr::bind(name, bound, body)
    }

    /// A name that no earlier call has returned.
    pub fn fresh_name(&mut self) -> Name {
        let stem = NAME_ALPHABET[self.rng.gen_range(0..NAME_ALPHABET.len())];
        let name = format!("{stem}{}", self.next_name);
        self.next_name += 1;
        name
    }
}
