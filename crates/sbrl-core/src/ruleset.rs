//! Ordered rule list with per-position capture bit-vectors that partition
//! the sample universe (spec §3, §4.2).
//!
//! Every operation here is an incremental rewrite of the
//! `not_captured`/`captures` bookkeeping: a sample is captured by entry
//! `k` iff it matches entry `k`'s rule and no earlier entry captured it.
//! The default rule (id 0) always terminates the list, which is what
//! guarantees the partition is total.

use crate::bitvector::BitVector;
use crate::error::{CoreError, CoreResult};
use crate::rule::{Rule, DEFAULT_RULE_ID};

/// One position in a [`RuleSet`]: a candidate rule id plus the samples it
/// captures at that position.
#[derive(Debug, Clone)]
pub struct Entry {
    rule_id: usize,
    captures: BitVector,
}

impl Entry {
    pub fn rule_id(&self) -> usize {
        self.rule_id
    }

    pub fn captures(&self) -> &BitVector {
        &self.captures
    }
}

/// An ordered sequence of `(rule_id, captures)` entries whose capture
/// vectors partition the `n_samples`-sized universe. `rules` passed to
/// every mutator here must be indexed by rule id (`rules[id].id() ==
/// id`), which is how the loader lays out the candidate-rule table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    entries: Vec<Entry>,
    n_samples: usize,
}

impl RuleSet {
    /// Builds a ruleset from `ids` (in order) by the incremental partition
    /// algorithm: `not_captured` starts all-ones, and each entry peels off
    /// the samples its rule matches that no earlier entry claimed.
    ///
    /// The last id must be [`DEFAULT_RULE_ID`] so `not_captured` ends
    /// empty — this is asserted, not merely hoped for. Note this
    /// constructor itself places no lower bound on `ids.len()`; the [2, R]
    /// operating range named in spec §3 is maintained by the proposer and
    /// MCMC loop (seeds start at length 2, delete never triggers below
    /// it), not by this general-purpose builder — `Trainer` also uses a
    /// degenerate length-1 `[default]` list purely to seed `v*`.
    pub fn init(ids: &[usize], rules: &[Rule], n_samples: usize) -> CoreResult<Self> {
        assert_eq!(
            ids.last().copied(),
            Some(DEFAULT_RULE_ID),
            "ruleset must terminate on the default rule"
        );
        let mut not_captured = BitVector::init(n_samples)?;
        not_captured.set_all();
        let mut entries = Vec::with_capacity(ids.len());
        for &id in ids {
            let mut captures = not_captured.clone();
            captures.and_eq(rules[id].truthtable());
            not_captured.and_eq_not(&captures);
            entries.push(Entry { rule_id: id, captures });
        }
        if not_captured.count_ones() != 0 {
            return Err(CoreError::Invariant(
                "RuleSet::init: default rule did not close the partition".into(),
            ));
        }
        Ok(Self { entries, n_samples })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn rule_id_at(&self, position: usize) -> usize {
        self.entries[position].rule_id
    }

    pub fn captures_at(&self, position: usize) -> &BitVector {
        &self.entries[position].captures
    }

    pub fn contains(&self, rule_id: usize) -> bool {
        self.entries.iter().any(|e| e.rule_id == rule_id)
    }

    /// Rule ids in list order — the plain-array representation used for
    /// the best-so-far state (spec §5) and for rebuilding a fresh
    /// `RuleSet` from it.
    pub fn backup(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.rule_id).collect()
    }

    /// Inserts `rule_id` at `position` (`0 <= position < len()`, never
    /// the trailing default slot) and rebuilds captures from `position`
    /// onward.
    pub fn add(&mut self, rule_id: usize, position: usize, rules: &[Rule]) -> CoreResult<()> {
        debug_assert!(position < self.entries.len());
        debug_assert!(!self.contains(rule_id));
        let mut not_captured = BitVector::init(self.n_samples)?;
        for e in &self.entries[position..] {
            not_captured.or_eq(&e.captures);
        }
        let mut suffix_ids = Vec::with_capacity(self.entries.len() - position + 1);
        suffix_ids.push(rule_id);
        suffix_ids.extend(self.entries[position..].iter().map(|e| e.rule_id));

        let mut rebuilt = Vec::with_capacity(suffix_ids.len());
        for id in suffix_ids {
            let mut captures = not_captured.clone();
            captures.and_eq(rules[id].truthtable());
            not_captured.and_eq_not(&captures);
            rebuilt.push(Entry { rule_id: id, captures });
        }
        if not_captured.count_ones() != 0 {
            return Err(CoreError::Invariant(
                "RuleSet::add: suffix rebuild left residual capture mass".into(),
            ));
        }
        self.entries.truncate(position);
        self.entries.extend(rebuilt);
        Ok(())
    }

    /// Removes the entry at `position`, merging its captures forward into
    /// later entries in list order.
    pub fn delete(&mut self, position: usize, rules: &[Rule]) -> CoreResult<()> {
        let removed = self.entries.remove(position);
        let mut old_captured = removed.captures;
        for entry in self.entries[position..].iter_mut() {
            let mut gain = old_captured.clone();
            gain.and_eq(rules[entry.rule_id].truthtable());
            entry.captures.or_eq(&gain);
            old_captured.and_eq_not(&entry.captures);
        }
        if old_captured.count_ones() != 0 {
            return Err(CoreError::Invariant(
                "RuleSet::delete: removed entry's captures did not fully re-absorb".into(),
            ));
        }
        Ok(())
    }

    /// Optimized adjacent swap of positions `i` and `i+1`. Kept for
    /// testability (the involution test in spec §8) — the proposer always
    /// routes through [`Self::swap_any`] instead.
    pub fn swap(&mut self, i: usize, rules: &[Rule]) -> CoreResult<()> {
        let j = i + 1;
        debug_assert!(j < self.entries.len());
        let next_id = self.entries[j].rule_id;
        let mut gain = self.entries[i].captures.clone();
        gain.and_eq(rules[next_id].truthtable());
        self.entries[j].captures.or_eq(&gain);
        let updated_next = self.entries[j].captures.clone();
        self.entries[i].captures.and_eq_not(&updated_next);
        self.entries.swap(i, j);
        Ok(())
    }

    /// General swap of positions `i` and `j` (neither may be the trailing
    /// default position). Only the `[min(i,j), max(i,j)]` window is
    /// touched; the union of captures across that window is invariant.
    pub fn swap_any(&mut self, i: usize, j: usize, rules: &[Rule]) -> CoreResult<()> {
        if i == j {
            return Ok(());
        }
        let (lo, hi) = (i.min(j), i.max(j));
        let mut caught = self.entries[lo].captures.clone();
        for k in (lo + 1)..=hi {
            caught.or_eq(&self.entries[k].captures);
        }
        let before_total = caught.count_ones();

        self.entries.swap(i, j);
        let mut after_total = 0u32;
        for k in lo..=hi {
            let id_k = self.entries[k].rule_id;
            let mut new_captures = caught.clone();
            new_captures.and_eq(rules[id_k].truthtable());
            after_total += new_captures.count_ones();
            caught.xor_eq(&new_captures);
            self.entries[k].captures = new_captures;
        }
        if caught.count_ones() != 0 {
            return Err(CoreError::Invariant(
                "RuleSet::swap_any: window did not fully re-partition".into(),
            ));
        }
        if after_total != before_total {
            return Err(CoreError::Invariant(format!(
                "RuleSet::swap_any: popcount not conserved ({before_total} -> {after_total})"
            )));
        }
        Ok(())
    }

    /// Partition invariant check (spec §8, property 1): every sample is
    /// captured exactly once. Intended for tests and assertions, not the
    /// hot path.
    pub fn is_valid_partition(&self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let mut union = BitVector::init(self.n_samples).unwrap();
        let mut total = 0u32;
        for e in &self.entries {
            union.or_eq(&e.captures);
            total += e.captures.count_ones();
        }
        union.count_ones() as usize == self.n_samples && total as usize == self.n_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: usize, tt: &str) -> Rule {
        Rule::new(id, format!("r{id}"), 1, BitVector::from_string(tt).unwrap()).unwrap()
    }

    fn e1_rules() -> Vec<Rule> {
        vec![
            Rule::default_rule(4).unwrap(),
            rule(1, "1100"),
            rule(2, "0011"),
        ]
    }

    #[test]
    fn e2_disjoint_swap() {
        let rules = vec![
            Rule::default_rule(4).unwrap(),
            rule(1, "1110"),
            rule(2, "0111"),
        ];
        let mut rs = RuleSet::init(&[1, 2, 0], &rules, 4).unwrap();
        assert_eq!(rs.captures_at(0).to_bit_string(), "1110");
        assert_eq!(rs.captures_at(1).to_bit_string(), "0001");
        assert_eq!(rs.captures_at(2).to_bit_string(), "0000");

        rs.swap(0, &rules).unwrap();
        assert_eq!(rs.captures_at(0).to_bit_string(), "0111");
        assert_eq!(rs.captures_at(1).to_bit_string(), "1000");
        assert_eq!(rs.rule_id_at(0), 2);
        assert_eq!(rs.rule_id_at(1), 1);
        let total: u32 = rs.entries().iter().map(|e| e.captures().count_ones()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn e3_add_middle() {
        let rules = vec![
            Rule::default_rule(4).unwrap(),
            rule(1, "1100"),
            rule(2, "1010"),
        ];
        let mut rs = RuleSet::init(&[1, 0], &rules, 4).unwrap();
        assert_eq!(rs.captures_at(0).to_bit_string(), "1100");
        assert_eq!(rs.captures_at(1).to_bit_string(), "0011");

        rs.add(2, 1, &rules).unwrap();
        assert_eq!(rs.captures_at(0).to_bit_string(), "1100");
        assert_eq!(rs.captures_at(1).to_bit_string(), "0010");
        assert_eq!(rs.captures_at(2).to_bit_string(), "0001");
        assert!(rs.is_valid_partition());
    }

    #[test]
    fn e4_delete_merges_into_next() {
        let rules = vec![
            Rule::default_rule(4).unwrap(),
            rule(1, "1111"),
            rule(2, "1111"),
        ];
        let rs = RuleSet::init(&[1, 2, 0], &rules, 4).unwrap();
        assert_eq!(rs.captures_at(0).to_bit_string(), "1111");
        assert_eq!(rs.captures_at(1).to_bit_string(), "0000");
        assert_eq!(rs.captures_at(2).to_bit_string(), "0000");

        let mut rs = rs;
        rs.delete(0, &rules).unwrap();
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.captures_at(0).to_bit_string(), "1111");
        assert_eq!(rs.captures_at(1).to_bit_string(), "0000");
        assert!(rs.is_valid_partition());
    }

    #[test]
    fn add_delete_round_trip() {
        let rules = e1_rules();
        let rs = RuleSet::init(&[1, 0], &rules, 4).unwrap();
        let mut added = rs.clone();
        added.add(2, 1, &rules).unwrap();
        added.delete(1, &rules).unwrap();
        assert_eq!(added.backup(), rs.backup());
        for k in 0..rs.len() {
            assert_eq!(added.captures_at(k), rs.captures_at(k));
        }
    }

    #[test]
    fn adjacent_swap_is_involution() {
        let rules = vec![
            Rule::default_rule(6).unwrap(),
            rule(1, "111000"),
            rule(2, "011100"),
        ];
        let rs = RuleSet::init(&[1, 2, 0], &rules, 6).unwrap();
        let mut twice = rs.clone();
        twice.swap(0, &rules).unwrap();
        twice.swap(0, &rules).unwrap();
        assert_eq!(twice.backup(), rs.backup());
        for k in 0..rs.len() {
            assert_eq!(twice.captures_at(k), rs.captures_at(k));
        }
    }

    #[test]
    fn swap_any_preserves_partition_and_popcount() {
        let rules = vec![
            Rule::default_rule(10).unwrap(),
            rule(1, "1111000000"),
            rule(2, "0011110000"),
            rule(3, "0000111100"),
        ];
        let mut rs = RuleSet::init(&[1, 2, 3, 0], &rules, 10).unwrap();
        let before: u32 = rs.entries().iter().map(|e| e.captures().count_ones()).sum();
        rs.swap_any(0, 2, &rules).unwrap();
        let after: u32 = rs.entries().iter().map(|e| e.captures().count_ones()).sum();
        assert_eq!(before, after);
        assert!(rs.is_valid_partition());
        assert_eq!(rs.rule_id_at(0), 3);
        assert_eq!(rs.rule_id_at(2), 1);
    }
}
