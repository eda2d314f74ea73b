//! core/jaccard.rs — Support-weighted multi-class Jaccard index.
//!
//! For each class c present in `a`:
//!   J_c = |a == c ∧ b == c| / |a == c ∨ b == c|
//! and the result is Σ_c |a == c| · J_c / |a|.
//! Classes only present in `b` carry zero weight. The metric is asymmetric;
//! callers wanting a symmetric value average both directions.

use crate::core::measure::Code;

const N_CODES: usize = Code::MAX as usize + 1;

/// Per-class tallies for one ordered pair of vectors.
#[derive(Clone, Debug)]
struct ClassCounts {
    support_a: [u32; N_CODES],
    support_b: [u32; N_CODES],
    both: [u32; N_CODES],
}

impl ClassCounts {
    fn tally(a: &[Code], b: &[Code]) -> Self {
        let mut counts = Self {
            support_a: [0; N_CODES],
            support_b: [0; N_CODES],
            both: [0; N_CODES],
        };
        for (&x, &y) in a.iter().zip(b) {
            counts.support_a[x as usize] += 1;
            counts.support_b[y as usize] += 1;
            if x == y {
                counts.both[x as usize] += 1;
            }
        }
        counts
    }
}

/// Weighted Jaccard of `a` against `b`, weights taken from `a`.
///
/// Both slices must have the same length. Empty input yields 0.0.
pub fn weighted_jaccard(a: &[Code], b: &[Code]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "feature vectors differ in length");
    let counts = ClassCounts::tally(a, b);

    let mut weighted = 0.0f64;
    let mut total = 0u64;
    for c in 0..N_CODES {
        let sa = counts.support_a[c];
        if sa == 0 {
            continue;
        }
        let inter = counts.both[c];
        let union = sa + counts.support_b[c] - inter;
        weighted += f64::from(sa) * (f64::from(inter) / f64::from(union));
        total += u64::from(sa);
    }

    if total == 0 {
        0.0
    } else {
        weighted / total as f64
    }
}

/// Average of both directions.
pub fn symmetric_weighted_jaccard(a: &[Code], b: &[Code]) -> f64 {
    (weighted_jaccard(a, b) + weighted_jaccard(b, a)) / 2.0
}
