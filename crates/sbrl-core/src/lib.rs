//! Core MCMC search over ordered Bayesian rule lists.
//!
//! This crate contains the algorithmic heart of the trainer, independent
//! of file formats, CLI wiring, and process output.
//!
//! # Module Structure
//!
//! - `bitvector` — packed bit arrays with bulk logical ops (`BitVector`)
//! - `rule` — candidate rule / class label data model
//! - `ruleset` — ordered rule list with disjoint capture vectors
//! - `context` — precomputed log-PMF/log-gamma tables (`TrainingContext`)
//! - `posterior` — log-posterior evaluation with prefix bound
//! - `proposer` — MCMC move selection
//! - `chain` — single-chain Metropolis-Hastings loop
//! - `trainer` — multi-chain driver and θ computation
//! - `rng` — pluggable uniform generator
//! - `error` — core error kinds

mod bitvector;
mod chain;
mod context;
mod error;
mod posterior;
mod proposer;
mod rng;
mod rule;
mod ruleset;
mod trainer;

pub use bitvector::BitVector;
pub use chain::{run_chain, ChainResult};
pub use context::TrainingContext;
pub use error::{CoreError, CoreResult};
pub use posterior::Evaluation;
pub use proposer::{pick_random_rule, propose, Move, Proposal};
pub use rng::{seeded_rng, SbrlRng};
pub use rule::{cardinality_from_feature, ClassLabel, Rule, DEFAULT_RULE_ID, MAX_CARDINALITY};
pub use ruleset::{Entry, RuleSet};
pub use trainer::{train, TrainedModel, TrainerConfig};
