//! Process-wide precomputed tables (spec §3, §5), re-architected as an
//! explicit, passed-by-reference value instead of process globals (spec
//! §9 "Global precomputed tables" — the redesign this crate adopts).
//!
//! A `TrainingContext` is built once per training run from the candidate
//! rules, the labels, and the run's hyperparameters, then borrowed by
//! every chain. It owns nothing mutable except the permutation cursor
//! used to hand out seed rule ids, which is `Cell`-guarded interior
//! mutability — safe because the whole core is single-threaded by
//! design (spec §5).

use std::cell::Cell;

use statrs::distribution::{Discrete, DiscreteCDF, Poisson};
use statrs::function::gamma::ln_gamma;

use crate::error::{CoreError, CoreResult};
use crate::rng::SbrlRng;
use crate::rule::{ClassLabel, Rule, MAX_CARDINALITY};

/// Sentinel stored at `log_gammas[0]`: never read except as a guard,
/// since `lgamma(0)` is undefined.
const LOG_GAMMA_SENTINEL: f64 = -1.0e18;

pub struct TrainingContext {
    lambda: f64,
    eta: f64,
    alphas: Vec<f64>,
    alpha_sum: f64,
    log_gamma_sum: f64,
    log_lambda_pmf: Vec<f64>,
    log_eta_pmf: [f64; MAX_CARDINALITY + 1],
    eta_norm: f64,
    card_count: [u32; MAX_CARDINALITY + 1],
    log_gammas: Vec<f64>,
    permutation: Vec<usize>,
    cursor: Cell<usize>,
}

impl TrainingContext {
    /// Builds every precomputed table in spec §3/§4.3 and generates the
    /// chain-seeding permutation (spec §4.5) in one pass.
    ///
    /// `alphas` must already be resolved to one entry per class (spec
    /// §6's "single value broadcast, or exactly `C` values" is a
    /// `sbrl-io`/CLI-layer concern, not this constructor's).
    pub fn new(
        rules: &[Rule],
        labels: &[ClassLabel],
        n_samples: usize,
        lambda: f64,
        eta: f64,
        alphas: Vec<f64>,
        rng: &mut impl SbrlRng,
    ) -> CoreResult<Self> {
        let r = rules.len();
        debug_assert!(r >= 2, "need at least the default rule plus one candidate");
        debug_assert_eq!(alphas.len(), labels.len());

        let clamped_lambda = if lambda > (r - 1) as f64 {
            log::warn!(
                "lambda {lambda} exceeds R-1={}; clamping (spec §7 recoverable warning)",
                r - 1
            );
            (r - 1) as f64
        } else {
            lambda
        };
        let lambda_dist = Poisson::new(clamped_lambda.max(f64::MIN_POSITIVE))
            .map_err(|e| CoreError::Invariant(format!("invalid lambda for Poisson: {e}")))?;
        let log_lambda_pmf: Vec<f64> = (0..r).map(|k| lambda_dist.ln_pmf(k as u64)).collect();

        let eta_dist = Poisson::new(eta.max(f64::MIN_POSITIVE))
            .map_err(|e| CoreError::Invariant(format!("invalid eta for Poisson: {e}")))?;
        let mut log_eta_pmf = [0.0f64; MAX_CARDINALITY + 1];
        for (c, slot) in log_eta_pmf.iter_mut().enumerate() {
            *slot = eta_dist.ln_pmf(c as u64);
        }
        let eta_norm = eta_dist.cdf(MAX_CARDINALITY as f64) - eta_dist.pmf(0);

        let mut card_count = [0u32; MAX_CARDINALITY + 1];
        for rule in rules {
            card_count[rule.cardinality()] += 1;
        }

        let alpha_sum: f64 = alphas.iter().sum();
        let log_gamma_sum: f64 = alphas.iter().map(|&a| ln_gamma(a)).sum();

        let max_n = (n_samples as f64 + 2.0 * (1.0 + alpha_sum)).ceil() as usize + 1;
        let mut log_gammas = Vec::with_capacity(max_n);
        log_gammas.push(LOG_GAMMA_SENTINEL);
        log_gammas.extend((1..max_n).map(|n| ln_gamma(n as f64)));

        let mut keyed: Vec<(f64, usize)> = (1..r).map(|id| (rng.uniform01(), id)).collect();
        keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("uniform01 never NaN"));
        let permutation = keyed.into_iter().map(|(_, id)| id).collect();

        Ok(Self {
            lambda: clamped_lambda,
            eta,
            alphas,
            alpha_sum,
            log_gamma_sum,
            log_lambda_pmf,
            log_eta_pmf,
            eta_norm,
            card_count,
            log_gammas,
            permutation,
            cursor: Cell::new(0),
        })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    pub fn alpha_sum(&self) -> f64 {
        self.alpha_sum
    }

    pub fn log_gamma_sum(&self) -> f64 {
        self.log_gamma_sum
    }

    pub fn eta_norm(&self) -> f64 {
        self.eta_norm
    }

    pub fn card_count(&self) -> [u32; MAX_CARDINALITY + 1] {
        self.card_count
    }

    pub fn log_lambda_pmf(&self, k: usize) -> f64 {
        self.log_lambda_pmf[k]
    }

    pub fn log_lambda_len(&self) -> usize {
        self.log_lambda_pmf.len()
    }

    pub fn log_eta_pmf(&self, cardinality: usize) -> f64 {
        self.log_eta_pmf[cardinality]
    }

    pub fn log_gamma(&self, n: usize) -> f64 {
        self.log_gammas[n]
    }

    /// Next rule id from the chain-seeding permutation, advancing the
    /// shared cursor with wraparound. Ids 1..R only — the default rule
    /// (id 0) is never a seed candidate.
    pub fn next_seed_id(&self) -> usize {
        let idx = self.cursor.get();
        self.cursor.set((idx + 1) % self.permutation.len());
        self.permutation[idx]
    }

    pub fn permutation_len(&self) -> usize {
        self.permutation.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitvector::BitVector;
    use crate::rng::seeded_rng;

    fn toy_rules() -> Vec<Rule> {
        vec![
            Rule::default_rule(4).unwrap(),
            Rule::new(1, "a".into(), 1, BitVector::from_string("1100").unwrap()).unwrap(),
            Rule::new(2, "b,c".into(), 2, BitVector::from_string("0011").unwrap()).unwrap(),
        ]
    }

    fn toy_labels() -> Vec<ClassLabel> {
        vec![
            ClassLabel::new(0, BitVector::from_string("1100").unwrap()),
            ClassLabel::new(1, BitVector::from_string("0011").unwrap()),
        ]
    }

    #[test]
    fn permutation_covers_all_non_default_ids_and_wraps() {
        let mut rng = seeded_rng(7);
        let ctx = TrainingContext::new(&toy_rules(), &toy_labels(), 4, 1.0, 1.0, vec![1.0, 1.0], &mut rng).unwrap();
        assert_eq!(ctx.permutation_len(), 2);
        let first_pass = [ctx.next_seed_id(), ctx.next_seed_id()];
        let mut sorted = first_pass;
        sorted.sort();
        assert_eq!(sorted, [1, 2]);
        // wraps back to the start of the permutation
        assert_eq!(ctx.next_seed_id(), first_pass[0]);
    }

    #[test]
    fn lambda_clamps_when_too_large() {
        let mut rng = seeded_rng(7);
        let ctx = TrainingContext::new(&toy_rules(), &toy_labels(), 4, 99.0, 1.0, vec![1.0, 1.0], &mut rng).unwrap();
        assert_eq!(ctx.lambda(), 2.0); // R-1 = 3-1 = 2
    }
}
