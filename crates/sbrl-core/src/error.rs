//! Error kinds for the SBRL core (spec §7: AllocError, InvariantError,
//! NoInitialization — IoError/FormatError/ConfigError belong to `sbrl-io`,
//! which owns the file loader).

/// Errors surfaced by `BitVector`/`RuleSet`/`TrainingContext`/`Trainer`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A `Vec` allocation failed while growing a bit-vector or ruleset.
    #[error("allocation failed while {0}")]
    Alloc(&'static str),

    /// A post-condition the algorithm relies on for correctness did not
    /// hold. Per spec this is a programming bug, not a recoverable
    /// condition — callers should treat it as fatal to the run.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// A candidate rule's clause count exceeds `MAX_CARDINALITY`.
    #[error("rule {id} has cardinality {cardinality}, exceeding the cap of {max}")]
    CardinalityTooLarge {
        id: usize,
        cardinality: usize,
        max: usize,
    },

    /// No chain found a 2-rule seed whose prefix bound beat the current
    /// best-across-chains within the allotted retries; the chain is
    /// skipped (spec §7 NoInitialization).
    #[error("no valid initialization found after {attempts} attempts")]
    NoInitialization { attempts: usize },

    /// Every chain failed to initialize and no chain improved on the
    /// default-only baseline; the trainer has nothing to return.
    #[error("training produced no improving rule list across {chains} chains")]
    NoViableChains { chains: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
