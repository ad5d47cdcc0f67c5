//! Genome semantics and manipulation.
//!
//! Provides decoding of a genome against pixel coordinates, the mating table,
//! and random generation and mutation through a single owned generator.

use rand::prelude::*;

use crate::schema::{Genome, Operator};

/// Value produced by overflow past the signed 32-bit range and by division
/// by zero. Decoded values never exceed it.
pub const SATURATION: i64 = 1 << 31;

/// Evaluate a genome at pixel `(x, y)`.
///
/// Two accumulators start at `a = x`, `b = y`. Each operator updates `a`
/// from `a` and `b`, then `b` is refreshed alternately from `x` and `y`
/// (x after the first operator, y after the second, and so on). Returns the
/// final `a`, which lies in `[0, SATURATION]` for coordinates up to
/// `SATURATION`.
pub fn decode(x: u32, y: u32, genome: &Genome) -> i64 {
    let x = i64::from(x);
    let y = i64::from(y);
    let mut a = x;
    let mut b = y;
    let mut refresh_x = true;

    for op in genome.iter() {
        a = apply(op, a, b);
        b = if refresh_x { x } else { y };
        refresh_x = !refresh_x;
    }

    a
}

/// Apply one operator to the accumulators.
#[inline]
fn apply(op: Operator, a: i64, b: i64) -> i64 {
    match op {
        Operator::Add => match a.checked_add(b) {
            Some(sum) if sum <= i64::from(i32::MAX) => sum,
            _ => SATURATION,
        },
        Operator::Sub => {
            if a < b {
                0
            } else {
                a - b
            }
        }
        Operator::Mul => match a.checked_mul(b) {
            Some(product) if product <= i64::from(i32::MAX) => product,
            _ => SATURATION,
        },
        Operator::Div => {
            if b == 0 {
                SATURATION
            } else {
                a / b
            }
        }
    }
}

/// Position-wise mating table, indexed by `[a.index()][b.index()]`.
///
/// This is the Klein four-group with `+` as identity: symmetric, and every
/// symbol is its own inverse.
pub const MATE_TABLE: [[Operator; 4]; 4] = {
    use Operator::{Add, Div, Mul, Sub};
    [
        [Add, Sub, Mul, Div],
        [Sub, Add, Div, Mul],
        [Mul, Div, Add, Sub],
        [Div, Mul, Sub, Add],
    ]
};

/// Combine two operators through the mating table.
#[inline]
pub fn mate_operator(a: Operator, b: Operator) -> Operator {
    MATE_TABLE[a.index()][b.index()]
}

/// Combine two genomes of equal length position by position.
pub fn mate(a: &Genome, b: &Genome) -> Genome {
    debug_assert_eq!(a.len(), b.len(), "mated genomes differ in length");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| mate_operator(x, y))
        .collect()
}

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniformly random operator.
    pub fn random_operator(&mut self) -> Operator {
        Operator::ALL[self.rng.gen_range(0..Operator::ALL.len())]
    }

    /// Generate a random genome of `len` symbols.
    pub fn random_genome(&mut self, len: usize) -> Genome {
        (0..len).map(|_| self.random_operator()).collect()
    }

    /// Overwrite the first `prefix` symbols with random operators.
    ///
    /// Symbols at or past `prefix` are left untouched.
    pub fn mutate(&mut self, genome: &mut Genome, prefix: usize) {
        let end = prefix.min(genome.len());
        for slot in &mut genome.ops_mut()[..end] {
            *slot = self.random_operator();
        }
    }
}
