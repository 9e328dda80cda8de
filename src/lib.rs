//! # qec-memory-sim
//!
//! Stabilizer-code memory experiments with minimum-weight perfect matching
//! decoding.
//!
//! Simulates an n-qubit stabilizer state as a binary symplectic tableau
//! plus phase bits, drives it through repeated rounds of Pauli noise and
//! stabilizer measurement, and pairs the resulting defects with an Edmonds
//! blossom matcher to recover the logical state. Everything is exact GF(2)
//! arithmetic on packed bit rows; no amplitudes anywhere, so code
//! distances of 25+ simulate comfortably.
//!
//! ## Pipeline
//!
//! - **Tableau**: Clifford gates and Pauli measurement as bit-row updates
//! - **Layout**: rotated/unrotated surface, toric and repetition codes
//! - **Noise**: seeded per-trial sampling of X/Y/Z flips and readout errors
//! - **Syndrome**: a defect is an outcome differing from the round before
//! - **Decoder**: space-time defect graph, blossom matching, uniform or
//!   log-likelihood edge weights
//! - **Driver**: `run_trial` / `run_experiment` logical error rates
//!
//! One trial is a strict sequential pipeline; experiments parallelize over
//! independently seeded trials.

pub mod error;
pub mod gf2;
pub mod pauli;
pub mod tableau;
pub mod layout;
pub mod noise;
pub mod syndrome;
pub mod graph;
pub mod matching;
pub mod experiment;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::experiment::*;
    pub use crate::graph::*;
    pub use crate::layout::*;
    pub use crate::matching::*;
    pub use crate::noise::*;
    pub use crate::pauli::*;
    pub use crate::syndrome::*;
    pub use crate::tableau::*;
}
