//! Move selection with Metropolis-Hastings jump ratios (spec §4.4).
//!
//! Index ranges below follow the inclusive `lo..hi` convention used
//! throughout this crate's grounding document (`0..N-1` means N values,
//! both ends included), not Rust's half-open range syntax.

use crate::rng::SbrlRng;
use crate::ruleset::RuleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Swap { i: usize, j: usize },
    Add { rule_id: usize, pos: usize },
    Delete { pos: usize },
}

/// A proposed edit plus the pieces the chain needs to evaluate and
/// accept/reject it: the scaled Hastings jump ratio and the
/// `length4bound` that exposes only the affected prefix to the
/// evaluator's pruning bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub mv: Move,
    pub jump_ratio: f64,
    pub length4bound: isize,
}

/// Base probabilities and MH ratios by list-length regime (spec §4.4's
/// table). Returns `(p_swap, p_add, p_delete, ratio_swap, ratio_add,
/// ratio_delete)`; unused ratios for a zero-probability move are `0.0`
/// and never read.
fn regime_probs(l: usize, r: usize) -> (f64, f64, f64, f64, f64, f64) {
    if l <= 2 {
        (0.0, 1.0, 0.0, 0.0, 0.5, 0.0)
    } else if l == 3 {
        (0.0, 0.5, 0.5, 0.0, 2.0 / 3.0, 2.0)
    } else if r >= 2 && l == r - 1 {
        (0.5, 0.0, 0.5, 1.0, 0.0, 2.0 / 3.0)
    } else if r >= 3 && l == r - 2 {
        (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 1.0, 1.5, 1.0)
    } else {
        (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 1.0, 1.0, 1.0)
    }
}

/// Picks `(i, j)`, `i != j`, both over the non-default positions
/// `0..=L-2`.
fn pick_swap_indices(l: usize, rng: &mut impl SbrlRng) -> (usize, usize) {
    let span = l - 1;
    let i = rng.uniform_below(span);
    let mut j = rng.uniform_below(span);
    while j == i {
        j = rng.uniform_below(span);
    }
    (i, j)
}

/// Uniformly samples a candidate rule id in `[1, R-2]` not already in
/// `ruleset`, retrying up to 10 times before falling back to a
/// deterministic bump through the same span (spec §4.4). Note this span
/// never offers id `R-1` as a candidate — a quirk inherited faithfully
/// from the reference implementation's own range, not a translation
/// error.
///
/// Returns `None` when every id in `[1, R-2]` — and, after widening the
/// search, every non-default id at all — is already present; the
/// reference implementation's unconditional retry loop can spin forever
/// in this case (it is only reachable for very small `R`, e.g. R=3's
/// `L=3` regime row), so callers must treat `None` as "no room to add"
/// rather than looping.
pub fn pick_random_rule(ruleset: &RuleSet, r: usize, rng: &mut impl SbrlRng) -> Option<usize> {
    let span = r.saturating_sub(2).max(1);
    let mut candidate = 1 + rng.uniform_below(span);
    for _ in 0..10 {
        if !ruleset.contains(candidate) {
            return Some(candidate);
        }
        candidate = 1 + rng.uniform_below(span);
    }
    for step in 0..span {
        let bumped = 1 + (candidate - 1 + step) % span;
        if !ruleset.contains(bumped) {
            return Some(bumped);
        }
    }
    (1..r).find(|&id| !ruleset.contains(id))
}

/// Selects a move and its jump ratio/length4bound for the chain's
/// acceptance test (spec §4.4, §4.5).
pub fn propose(ruleset: &RuleSet, r: usize, rng: &mut impl SbrlRng) -> Proposal {
    let l = ruleset.len();
    let (p_swap, p_add, p_delete, ratio_swap, ratio_add, ratio_delete) = regime_probs(l, r);
    debug_assert!((p_swap + p_add + p_delete - 1.0).abs() < 1e-9);

    let u = rng.uniform01();
    if p_swap > 0.0 && u < p_swap {
        let (i, j) = pick_swap_indices(l, rng);
        Proposal {
            mv: Move::Swap { i, j },
            jump_ratio: ratio_swap,
            length4bound: 1 + i.max(j) as isize,
        }
    } else if p_add > 0.0 && u < p_swap + p_add {
        match pick_random_rule(ruleset, r, rng) {
            Some(rule_id) => {
                let pos = rng.uniform_below(l);
                let scale = (r as isize - 1 - l as isize).max(0) as f64;
                Proposal {
                    mv: Move::Add { rule_id, pos },
                    jump_ratio: ratio_add * scale,
                    length4bound: pos as isize + 1,
                }
            }
            // No free id left to add (only reachable for tiny R, where
            // the list is already saturated despite the regime still
            // assigning add some probability mass). Falling back to
            // delete keeps the chain alive instead of stalling.
            None => {
                let pos = rng.uniform_below(l - 1);
                let denom = (r as isize - l as isize).max(1) as f64;
                Proposal {
                    mv: Move::Delete { pos },
                    jump_ratio: ratio_delete / denom,
                    length4bound: pos as isize,
                }
            }
        }
    } else {
        let pos = rng.uniform_below(l - 1);
        let denom = (r as isize - l as isize).max(1) as f64;
        Proposal {
            mv: Move::Delete { pos },
            jump_ratio: ratio_delete / denom,
            length4bound: pos as isize,
        }
    }
}
