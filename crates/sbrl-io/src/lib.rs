//! Text-format loader and model serializer for the SBRL trainer — the
//! external collaborators spec §1 names as out of the algorithmic core.
//!
//! # Module Structure
//!
//! - `loader` — parses the rules/labels text format (spec §6)
//! - `model` — serializes a trained model to/from JSON
//! - `config` — resolves the CLI-facing alpha argument
//! - `error` — I/O-facing error kinds (spec §7)

mod config;
mod error;
mod loader;
mod model;

pub use config::resolve_alphas;
pub use error::{IoError, IoResult};
pub use loader::{load_dataset, load_labels, load_rules};
pub use model::Model;
