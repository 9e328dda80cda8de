//! Syndrome extraction rounds.
//!
//! A syndrome is a difference signal: bit i is set when generator i's
//! measured outcome differs from the previous round's recorded outcome.
//! Under that convention a fresh data error lights up the one or two
//! checks bounding it, and a misread measurement lights the same check in
//! two consecutive rounds, which is exactly the defect structure matching
//! decoders pair up.
//!
//! The extractor's first act is a **reference round**: measuring every
//! generator once projects the prepared state into a definite stabilizer
//! configuration (X-type checks on |0…0⟩ come up with random signs) and
//! records the outcomes the next round will diff against.

use rand::Rng;
use tracing::trace;

use crate::error::QecResult;
use crate::gf2::BitRow;
use crate::layout::CodeLayout;
use crate::pauli::PauliString;
use crate::tableau::StabilizerTableau;

/// One round's defect bits, one per stabilizer generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syndrome {
    bits: BitRow,
}

impl Syndrome {
    pub(crate) fn new(bits: BitRow) -> Self {
        Syndrome { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Defect flag for generator `i`.
    pub fn get(&self, i: usize) -> bool {
        self.bits.get(i)
    }

    pub fn is_clear(&self) -> bool {
        self.bits.is_zero()
    }

    pub fn defect_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Indices of triggered generators, ascending.
    pub fn defects(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }
}

/// Drives repeated stabilizer measurement against one layout.
pub struct SyndromeExtractor<'a> {
    layout: &'a CodeLayout,
    /// Recorded outcome per generator from the latest round, measurement
    /// flips included.
    prev: Vec<bool>,
}

impl<'a> SyndromeExtractor<'a> {
    /// Run the reference round and record its outcomes.
    pub fn new<R: Rng + ?Sized>(
        layout: &'a CodeLayout,
        tableau: &mut StabilizerTableau,
        rng: &mut R,
    ) -> QecResult<Self> {
        let mut prev = Vec::with_capacity(layout.num_stabilizers());
        for i in 0..layout.num_stabilizers() {
            let m = tableau.measure_pauli(layout.generator_string(i), rng)?;
            prev.push(m.value);
        }
        Ok(SyndromeExtractor { layout, prev })
    }

    pub fn num_generators(&self) -> usize {
        self.prev.len()
    }

    /// Measure every generator in list order and return the defect bits.
    ///
    /// `p_meas` is the classical readout flip rate; a flipped bit is
    /// recorded as such, so the flip shows up again as a defect in the
    /// following round.
    pub fn extract_round<R: Rng + ?Sized>(
        &mut self,
        tableau: &mut StabilizerTableau,
        p_meas: f64,
        rng: &mut R,
    ) -> QecResult<Syndrome> {
        let mut bits = BitRow::zeros(self.prev.len());
        for i in 0..self.prev.len() {
            let m = tableau.measure_pauli(self.layout.generator_string(i), rng)?;
            let recorded = m.value ^ rng.gen_bool(p_meas);
            if recorded != self.prev[i] {
                bits.set(i, true);
            }
            self.prev[i] = recorded;
        }
        let syndrome = Syndrome::new(bits);
        trace!(defects = syndrome.defect_count(), "extracted round");
        Ok(syndrome)
    }

    /// Account for a Pauli correction applied to the state mid-run.
    ///
    /// The correction flips the sign of every generator it anticommutes
    /// with; folding those flips into the recorded outcomes keeps the next
    /// round's diff from re-reporting them as defects.
    pub fn note_correction(&mut self, correction: &PauliString) {
        for i in 0..self.prev.len() {
            if correction.anticommutes_with(self.layout.generator_string(i)) {
                self.prev[i] = !self.prev[i];
            }
        }
    }
}
