//! Resolves the CLI-facing `alpha` argument (spec §6: "either a single
//! value broadcast to all classes, or exactly C values") into the
//! per-class vector the core requires.

use crate::error::{IoError, IoResult};

/// Broadcasts a single α to every class, or passes through an
/// already-per-class vector. Any other length is a [`IoError::Config`]
/// (spec §7 ConfigError).
pub fn resolve_alphas(alphas: &[f64], n_classes: usize) -> IoResult<Vec<f64>> {
    match alphas.len() {
        1 => Ok(vec![alphas[0]; n_classes]),
        n if n == n_classes => Ok(alphas.to_vec()),
        n => Err(IoError::Config(format!(
            "alpha must have length 1 or {n_classes} (got {n})"
        ))),
    }
}
