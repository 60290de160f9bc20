//! Log-posterior evaluation with prefix bound (spec §4.3).
//!
//! `alpha` values are required to be positive integers (spec guarantees
//! `alphas[j] >= 1`, and the original `pysbrl` implementation stores them
//! as a C `int` array) — they index directly into the `log_gammas` table
//! alongside sample counts.

use crate::context::TrainingContext;
use crate::rule::{ClassLabel, Rule};
use crate::ruleset::RuleSet;

/// Numerical floor added before taking `ln` of a remaining cardinality
/// count, so a cardinality bucket exhausted mid-list never produces
/// `ln(0)` (spec §4.3).
const CARD_COUNT_EPS: f64 = 1e-4;

/// `log_posterior` is the fully-evaluated list score; `prefix_bound` is
/// an upper bound on any completion of the first `length4bound` entries,
/// meaningless (and left at a large negative sentinel) when
/// `length4bound <= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub log_posterior: f64,
    pub prefix_bound: f64,
}

const PREFIX_BOUND_SENTINEL: f64 = -1.0e18;

impl TrainingContext {
    /// Evaluates `ruleset`'s log posterior and, when `length4bound > 0`,
    /// an upper bound on any rule list sharing its first `length4bound`
    /// entries — used by the chain to prune weak proposals before
    /// scoring them in full (spec §4.5).
    pub fn evaluate(
        &self,
        ruleset: &RuleSet,
        rules: &[Rule],
        labels: &[ClassLabel],
        length4bound: isize,
    ) -> Evaluation {
        let l = ruleset.len();
        let non_default_entries = l.saturating_sub(1);
        let compute_prefix = length4bound > 0;
        let prefix_cutoff = if compute_prefix {
            (length4bound as usize).min(non_default_entries)
        } else {
            0
        };

        let mut log_prior = self.log_lambda_pmf(l - 1);
        let base_k = (l - 1)
            .max(self.lambda().floor() as usize)
            .min(self.log_lambda_len() - 1);
        let mut prefix_prior = if compute_prefix {
            self.log_lambda_pmf(base_k)
        } else {
            PREFIX_BOUND_SENTINEL
        };

        let mut card_count_local = self.card_count();
        let mut norm_constant = self.eta_norm();
        for i in 0..non_default_entries {
            let cardinality = rules[ruleset.rule_id_at(i)].cardinality();
            let contribution = self.log_eta_pmf(cardinality)
                - norm_constant.ln()
                - (card_count_local[cardinality] as f64 + CARD_COUNT_EPS).ln();
            log_prior += contribution;
            if compute_prefix && i < prefix_cutoff {
                prefix_prior += contribution;
            }
            card_count_local[cardinality] -= 1;
            if card_count_local[cardinality] == 0 {
                norm_constant -= self.log_eta_pmf(cardinality).exp();
            }
        }

        let mut log_likelihood = 0.0f64;
        let mut prefix_log_likelihood = 0.0f64;
        let mut supports: Vec<f64> = labels.iter().map(|lb| lb.support() as f64).collect();
        let alpha_sum_idx = self.alpha_sum().round() as usize;

        for k in 0..l {
            let captures = ruleset.captures_at(k);
            let mut n_sum = 0.0f64;
            let mut term = 0.0f64;
            for (j, label) in labels.iter().enumerate() {
                let mut matched = captures.clone();
                matched.and_eq(label.truthtable());
                let n_j = matched.count_ones() as f64;
                supports[j] -= n_j;
                n_sum += n_j;
                let alpha_idx = self.alphas()[j].round() as usize;
                term += self.log_gamma(n_j as usize + alpha_idx);
            }
            term -= self.log_gamma(n_sum as usize + alpha_sum_idx);
            log_likelihood += term;

            if compute_prefix && k < length4bound as usize {
                prefix_log_likelihood += term;
            }
            if compute_prefix && k == (length4bound as usize).saturating_sub(1) {
                let mut optimistic = 0.0f64;
                for (j, _) in labels.iter().enumerate() {
                    let alpha_idx = self.alphas()[j].round() as usize;
                    optimistic += self.log_gamma_sum() - self.log_gamma(alpha_idx)
                        + self.log_gamma(supports[j] as usize + alpha_idx)
                        - self.log_gamma(supports[j] as usize + alpha_sum_idx);
                }
                prefix_log_likelihood += optimistic;
            }
        }

        Evaluation {
            log_posterior: log_prior + log_likelihood,
            prefix_bound: if compute_prefix {
                prefix_prior + prefix_log_likelihood
            } else {
                PREFIX_BOUND_SENTINEL
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitvector::BitVector;
    use crate::rng::seeded_rng;
    use crate::rule::Rule;

    fn e1_setup() -> (Vec<Rule>, Vec<ClassLabel>, TrainingContext) {
        let rules = vec![
            Rule::default_rule(4).unwrap(),
            Rule::new(1, "r1".into(), 1, BitVector::from_string("1100").unwrap()).unwrap(),
            Rule::new(2, "r2".into(), 1, BitVector::from_string("0011").unwrap()).unwrap(),
        ];
        let labels = vec![
            ClassLabel::new(0, BitVector::from_string("1100").unwrap()),
            ClassLabel::new(1, BitVector::from_string("0011").unwrap()),
        ];
        let mut rng = seeded_rng(42);
        let ctx = TrainingContext::new(&rules, &labels, 4, 1.0, 1.0, vec![1.0, 1.0], &mut rng).unwrap();
        (rules, labels, ctx)
    }

    #[test]
    fn perfect_split_beats_default_only() {
        let (rules, labels, ctx) = e1_setup();
        let perfect = RuleSet::init(&[1, 0], &rules, 4).unwrap();
        let default_only = RuleSet::init(&[0], &rules, 4).unwrap();
        let perfect_eval = ctx.evaluate(&perfect, &rules, &labels, -1);
        let default_eval = ctx.evaluate(&default_only, &rules, &labels, -1);
        assert!(perfect_eval.log_posterior > default_eval.log_posterior);
    }

    #[test]
    fn length4bound_non_positive_is_sentinel() {
        let (rules, labels, ctx) = e1_setup();
        let rs = RuleSet::init(&[1, 0], &rules, 4).unwrap();
        let eval = ctx.evaluate(&rs, &rules, &labels, 0);
        assert_eq!(eval.prefix_bound, PREFIX_BOUND_SENTINEL);
    }

    #[test]
    fn e5_prefix_bound_monotone_on_covered_prefixes() {
        let (rules, labels, ctx) = e1_setup();
        let rs = RuleSet::init(&[1, 0], &rules, 4).unwrap();
        let mut last = f64::NEG_INFINITY;
        for len4 in 1..rs.len() {
            let eval = ctx.evaluate(&rs, &rules, &labels, len4 as isize);
            assert!(eval.prefix_bound >= last - 1e-9, "{} < {}", eval.prefix_bound, last);
            last = eval.prefix_bound;
        }
    }
}
