//! Single-chain Metropolis-Hastings loop (spec §4.5).

use crate::context::TrainingContext;
use crate::error::{CoreError, CoreResult};
use crate::proposer::{propose, Move};
use crate::rng::SbrlRng;
use crate::rule::{ClassLabel, Rule, DEFAULT_RULE_ID};
use crate::ruleset::RuleSet;

/// The result of one chain's run: the best rule-id list it found and
/// the log posterior attached to it. `best_ids` always terminates on
/// [`DEFAULT_RULE_ID`] and can be rematerialized into a fresh
/// [`RuleSet`] at any time (spec §5).
#[derive(Debug, Clone)]
pub struct ChainResult {
    pub best_ids: Vec<usize>,
    pub best_log_posterior: f64,
}

/// Runs one chain: seeded initialization, then `iters` propose/evaluate/
/// accept-reject rounds, tracking the best list seen against the
/// cross-chain baseline `v_star`.
///
/// `v_star` is only used to gate initialization (spec §4.5 step 1); the
/// chain's own `best_log_posterior` starts at its seed's score and is
/// never reset to `v_star`, so a chain that cannot beat the global best
/// still returns its own local optimum for the trainer to compare.
pub fn run_chain(
    ctx: &TrainingContext,
    rules: &[Rule],
    labels: &[ClassLabel],
    n_samples: usize,
    iters: usize,
    v_star: f64,
    rng: &mut impl SbrlRng,
) -> CoreResult<ChainResult> {
    let r = rules.len();

    let mut current = None;
    for _attempt in 0..r.saturating_sub(1) {
        let seed_id = ctx.next_seed_id();
        let candidate = RuleSet::init(&[seed_id, DEFAULT_RULE_ID], rules, n_samples)?;
        let eval = ctx.evaluate(&candidate, rules, labels, 1);
        if eval.prefix_bound >= v_star {
            current = Some((candidate, eval.log_posterior));
            break;
        }
    }
    let (mut current_ruleset, mut current_lp) = current.ok_or(CoreError::NoInitialization {
        attempts: r.saturating_sub(1),
    })?;

    let mut best_ids = current_ruleset.backup();
    let mut best_log_posterior = current_lp;

    for _ in 0..iters {
        let proposal = propose(&current_ruleset, r, rng);
        let mut candidate = current_ruleset.clone();
        let applied = match proposal.mv {
            Move::Swap { i, j } => candidate.swap_any(i, j, rules),
            Move::Add { rule_id, pos } => candidate.add(rule_id, pos, rules),
            Move::Delete { pos } => candidate.delete(pos, rules),
        };
        applied?;

        let eval = ctx.evaluate(&candidate, rules, labels, proposal.length4bound);
        if eval.prefix_bound <= best_log_posterior {
            continue;
        }

        let log_u = rng.uniform01().ln();
        let accept = log_u < (eval.log_posterior - current_lp) + proposal.jump_ratio.ln();
        if !accept {
            continue;
        }

        current_ruleset = candidate;
        current_lp = eval.log_posterior;

        if current_lp > best_log_posterior {
            best_log_posterior = current_lp;
            best_ids = current_ruleset.backup();
        }
    }

    let best = RuleSet::init(&best_ids, rules, n_samples)?;
    Ok(ChainResult {
        best_ids: best.backup(),
        best_log_posterior,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitvector::BitVector;
    use crate::rng::seeded_rng;

    fn e1_rules() -> Vec<Rule> {
        vec![
            Rule::default_rule(4).unwrap(),
            Rule::new(1, "r1".into(), 1, BitVector::from_string("1100").unwrap()).unwrap(),
            Rule::new(2, "r2".into(), 1, BitVector::from_string("0011").unwrap()).unwrap(),
        ]
    }

    fn e1_labels() -> Vec<ClassLabel> {
        vec![
            ClassLabel::new(0, BitVector::from_string("1100").unwrap()),
            ClassLabel::new(1, BitVector::from_string("0011").unwrap()),
        ]
    }

    #[test]
    fn e1_chain_converges_to_a_perfect_split() {
        let rules = e1_rules();
        let labels = e1_labels();
        let mut ctx_rng = seeded_rng(42);
        let ctx = TrainingContext::new(&rules, &labels, 4, 1.0, 1.0, vec![1.0, 1.0], &mut ctx_rng).unwrap();

        let default_only = RuleSet::init(&[DEFAULT_RULE_ID], &rules, 4).unwrap();
        let v_star = ctx.evaluate(&default_only, &rules, &labels, -1).log_posterior;

        let mut rng = seeded_rng(42);
        let result = run_chain(&ctx, &rules, &labels, 4, 200, v_star, &mut rng).unwrap();

        assert_eq!(result.best_ids.len(), 2);
        assert_eq!(*result.best_ids.last().unwrap(), DEFAULT_RULE_ID);
        assert!(result.best_ids[0] == 1 || result.best_ids[0] == 2);
        assert!(result.best_log_posterior > v_star);
    }

    #[test]
    fn chain_result_always_terminates_on_default() {
        let rules = e1_rules();
        let labels = e1_labels();
        let mut ctx_rng = seeded_rng(7);
        let ctx = TrainingContext::new(&rules, &labels, 4, 1.0, 1.0, vec![1.0, 1.0], &mut ctx_rng).unwrap();
        let default_only = RuleSet::init(&[DEFAULT_RULE_ID], &rules, 4).unwrap();
        let v_star = ctx.evaluate(&default_only, &rules, &labels, -1).log_posterior;

        let mut rng = seeded_rng(123);
        let result = run_chain(&ctx, &rules, &labels, 4, 50, v_star, &mut rng).unwrap();
        assert_eq!(*result.best_ids.last().unwrap(), DEFAULT_RULE_ID);
    }
}
