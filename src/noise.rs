//! Stochastic Pauli noise.
//!
//! Errors are sampled per qubit and per round from independent X/Y/Z
//! Bernoulli draws, with an optional classical flip on each recorded
//! syndrome bit. Sampling and application are deliberately split: the
//! sampler only produces [`NoiseEvent`]s, and the caller decides when to
//! feed them to the tableau, so injected errors can be logged or replayed.
//!
//! Every draw comes from an explicit `Rng` handed in by the caller, and
//! the sampler consumes exactly three draws per qubit whatever the
//! outcomes, so a fixed seed reproduces a trial bit for bit.

use rand::Rng;
use tracing::debug;

use crate::error::{QecError, QecResult};
use crate::layout::StabKind;
use crate::pauli::Pauli;

/// One sampled single-qubit error, applied once and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseEvent {
    pub qubit: usize,
    pub pauli: Pauli,
}

/// Independent per-qubit Pauli error rates plus a measurement flip rate.
///
/// All probabilities live in `[0, 0.5]`; anything above coin-flip noise
/// has no decoding interpretation and is rejected by [`NoiseConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseConfig {
    pub p_x: f64,
    pub p_y: f64,
    pub p_z: f64,
    /// Probability that a recorded syndrome bit reads back flipped.
    pub p_meas: f64,
}

impl NoiseConfig {
    /// Depolarizing channel of strength `p`, split evenly across X, Y, Z.
    pub fn depolarizing(p: f64) -> Self {
        NoiseConfig {
            p_x: p / 3.0,
            p_y: p / 3.0,
            p_z: p / 3.0,
            p_meas: 0.0,
        }
    }

    /// Independent rates per Pauli type, perfect measurements.
    pub fn independent(p_x: f64, p_y: f64, p_z: f64) -> Self {
        NoiseConfig {
            p_x,
            p_y,
            p_z,
            p_meas: 0.0,
        }
    }

    /// No noise at all.
    pub fn quiet() -> Self {
        NoiseConfig::independent(0.0, 0.0, 0.0)
    }

    /// Same channel with syndrome readout flipped at rate `p_meas`.
    pub fn with_measurement_flip(mut self, p_meas: f64) -> Self {
        self.p_meas = p_meas;
        self
    }

    pub fn is_quiet(&self) -> bool {
        self.p_x == 0.0 && self.p_y == 0.0 && self.p_z == 0.0 && self.p_meas == 0.0
    }

    /// Probability that a qubit error in one round flips a stabilizer of
    /// the given type: Z-type checks see X and Y, X-type checks Z and Y.
    pub fn flip_probability(&self, kind: StabKind) -> f64 {
        match kind {
            StabKind::Z => self.p_x + self.p_y,
            StabKind::X => self.p_z + self.p_y,
        }
    }

    pub fn validate(&self) -> QecResult<()> {
        for (label, p) in [
            ("p_x", self.p_x),
            ("p_y", self.p_y),
            ("p_z", self.p_z),
            ("p_meas", self.p_meas),
        ] {
            if !(0.0..=0.5).contains(&p) {
                return Err(QecError::configuration(format!(
                    "{} = {} outside [0, 0.5]",
                    label, p
                )));
            }
        }
        Ok(())
    }
}

/// Lazily sample errors for qubits `0..num_qubits`.
///
/// The config must already be validated. Events come out ordered by qubit,
/// and X before Y before Z on the same qubit.
pub fn sample_errors<'a, R: Rng + ?Sized>(
    num_qubits: usize,
    config: &NoiseConfig,
    rng: &'a mut R,
) -> ErrorSampler<'a, R> {
    debug!(num_qubits, p_x = config.p_x, p_y = config.p_y, p_z = config.p_z, "sampling noise");
    ErrorSampler {
        config: *config,
        rng,
        num_qubits,
        qubit: 0,
        stage: 0,
    }
}

/// Iterator over sampled [`NoiseEvent`]s; see [`sample_errors`].
pub struct ErrorSampler<'a, R: Rng + ?Sized> {
    config: NoiseConfig,
    rng: &'a mut R,
    num_qubits: usize,
    qubit: usize,
    stage: u8,
}

impl<R: Rng + ?Sized> Iterator for ErrorSampler<'_, R> {
    type Item = NoiseEvent;

    fn next(&mut self) -> Option<NoiseEvent> {
        while self.qubit < self.num_qubits {
            while self.stage < 3 {
                let (p, pauli) = match self.stage {
                    0 => (self.config.p_x, Pauli::X),
                    1 => (self.config.p_y, Pauli::Y),
                    _ => (self.config.p_z, Pauli::Z),
                };
                self.stage += 1;
                if self.rng.gen_bool(p) {
                    return Some(NoiseEvent {
                        qubit: self.qubit,
                        pauli,
                    });
                }
            }
            self.stage = 0;
            self.qubit += 1;
        }
        None
    }
}
