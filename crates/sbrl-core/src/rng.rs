//! Pluggable uniform(0,1) / uniform-integer generator (spec §6).
//!
//! `SbrlRng` is a thin trait over anything implementing [`rand::Rng`] so
//! callers can swap generators without the core depending on a concrete
//! type; the trainer itself is seeded once per run with
//! [`rand::rngs::SmallRng`], the same choice `rbp-mccfr` and
//! `rbp-clustering` make for deterministic, hash-seeded reproducibility.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform(0,1) draws and uniform integers in `[0, k)`, used throughout
/// the proposer and the Metropolis-Hastings accept/reject test.
pub trait SbrlRng {
    fn uniform01(&mut self) -> f64;
    fn uniform_below(&mut self, k: usize) -> usize;
}

impl<R: Rng + ?Sized> SbrlRng for R {
    fn uniform01(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn uniform_below(&mut self, k: usize) -> usize {
        debug_assert!(k > 0, "uniform_below: empty range");
        self.random_range(0..k)
    }
}

/// Seeds a [`SmallRng`] per spec §6: a negative seed draws fresh entropy
/// from wall-clock time, any other value is used verbatim for
/// reproducible trajectories across runs (spec §8, property 6).
pub fn seeded_rng(seed: i64) -> SmallRng {
    if seed < 0 {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_nanos() as u64;
        SmallRng::seed_from_u64(nanos)
    } else {
        SmallRng::seed_from_u64(seed as u64)
    }
}
