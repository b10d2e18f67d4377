//! Explicit random streams for mutation and sampling.
//!
//! Nothing in the domain reaches for a global generator: callers pass a stream
//! in. Parallel workers each derive their own stream from the run seed so a
//! run is reproducible regardless of scheduling.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Odd 64-bit constant used to spread worker indices across the seed space.
const WORKER_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

/// Independent deterministic stream for worker `worker_index` of a run seeded with `run_seed`.
pub fn worker_rng(run_seed: u64, worker_index: usize) -> StdRng {
    let offset = (worker_index as u64).wrapping_add(1).wrapping_mul(WORKER_SEED_STRIDE);
    StdRng::seed_from_u64(run_seed ^ offset)
}
