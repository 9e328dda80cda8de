//! Pauli operators in sparse and dense form.
//!
//! Stabilizer generators and logical operators are products of single-qubit
//! Paulis. Two representations cover the crate's needs:
//! - [`PauliOp`]: a sparse list of `(qubit, Pauli)` terms, the natural form
//!   for code definitions (a plaquette touches four qubits out of hundreds);
//! - [`PauliString`]: dense X/Z bit-planes over all qubits, the form the
//!   tableau measures and the layout validator multiplies.
//!
//! Commutation is the symplectic inner product: two Pauli strings
//! anticommute exactly when `x1·z2 + z1·x2` is odd over GF(2).

use smallvec::SmallVec;

use crate::gf2::BitRow;

/// A single-qubit Pauli operator. Identity is expressed by absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pauli {
    X,
    Y,
    Z,
}

impl Pauli {
    /// True if the operator has an X component (X or Y).
    pub fn has_x(self) -> bool {
        matches!(self, Pauli::X | Pauli::Y)
    }

    /// True if the operator has a Z component (Z or Y).
    pub fn has_z(self) -> bool {
        matches!(self, Pauli::Z | Pauli::Y)
    }

    /// Distinct single-qubit Paulis anticommute; equal ones commute.
    pub fn anticommutes_with(self, other: Pauli) -> bool {
        self != other
    }

    pub fn label(self) -> char {
        match self {
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// Recover a Pauli from its X/Z component bits, if any.
    pub fn from_bits(x: bool, z: bool) -> Option<Pauli> {
        match (x, z) {
            (false, false) => None,
            (true, false) => Some(Pauli::X),
            (false, true) => Some(Pauli::Z),
            (true, true) => Some(Pauli::Y),
        }
    }
}

impl std::fmt::Display for Pauli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Sparse product of single-qubit Paulis on distinct qubits.
///
/// Terms are kept sorted by qubit index; most generators have weight at
/// most four, so the storage is inline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PauliOp {
    terms: SmallVec<[(usize, Pauli); 8]>,
}

impl PauliOp {
    pub fn new() -> Self {
        PauliOp::default()
    }

    /// Build from `(qubit, Pauli)` pairs. Repeated qubits must not appear.
    pub fn from_terms(terms: impl IntoIterator<Item = (usize, Pauli)>) -> Self {
        let mut terms: SmallVec<[(usize, Pauli); 8]> = terms.into_iter().collect();
        terms.sort_unstable_by_key(|&(q, _)| q);
        debug_assert!(
            terms.windows(2).all(|w| w[0].0 != w[1].0),
            "duplicate qubit in Pauli operator"
        );
        PauliOp { terms }
    }

    pub fn single(qubit: usize, pauli: Pauli) -> Self {
        PauliOp {
            terms: SmallVec::from_slice(&[(qubit, pauli)]),
        }
    }

    pub fn terms(&self) -> &[(usize, Pauli)] {
        &self.terms
    }

    /// Number of non-identity single-qubit factors.
    pub fn weight(&self) -> usize {
        self.terms.len()
    }

    pub fn is_identity(&self) -> bool {
        self.terms.is_empty()
    }

    /// Largest qubit index touched, if any.
    pub fn max_qubit(&self) -> Option<usize> {
        self.terms.last().map(|&(q, _)| q)
    }

    /// The Pauli acting on `qubit`, if the operator touches it.
    pub fn on_qubit(&self, qubit: usize) -> Option<Pauli> {
        self.terms
            .binary_search_by_key(&qubit, |&(q, _)| q)
            .ok()
            .map(|i| self.terms[i].1)
    }

    /// Densify over `num_qubits` qubits.
    pub fn to_dense(&self, num_qubits: usize) -> PauliString {
        let mut dense = PauliString::identity(num_qubits);
        for &(q, p) in &self.terms {
            debug_assert!(q < num_qubits);
            if p.has_x() {
                dense.xs.set(q, true);
            }
            if p.has_z() {
                dense.zs.set(q, true);
            }
        }
        dense
    }
}

impl std::fmt::Display for PauliOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "I");
        }
        for (i, &(q, p)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}{}", p.label(), q)?;
        }
        Ok(())
    }
}

/// Dense Pauli string as X and Z bit-planes over all qubits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauliString {
    pub(crate) xs: BitRow,
    pub(crate) zs: BitRow,
}

impl PauliString {
    pub fn identity(num_qubits: usize) -> Self {
        PauliString {
            xs: BitRow::zeros(num_qubits),
            zs: BitRow::zeros(num_qubits),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.xs.len()
    }

    pub fn x_bit(&self, qubit: usize) -> bool {
        self.xs.get(qubit)
    }

    pub fn z_bit(&self, qubit: usize) -> bool {
        self.zs.get(qubit)
    }

    /// The Pauli on `qubit`, if non-identity.
    pub fn on_qubit(&self, qubit: usize) -> Option<Pauli> {
        Pauli::from_bits(self.xs.get(qubit), self.zs.get(qubit))
    }

    /// Number of qubits with a non-identity factor.
    pub fn weight(&self) -> usize {
        let mut count = 0;
        for (x, z) in self.xs.words().iter().zip(self.zs.words()) {
            count += (x | z).count_ones() as usize;
        }
        count
    }

    /// Multiply `other` into this string, ignoring phase.
    pub fn mul_assign_unsigned(&mut self, other: &PauliString) {
        self.xs.xor_assign(&other.xs);
        self.zs.xor_assign(&other.zs);
    }

    /// Symplectic inner product; true means the strings anticommute.
    pub fn anticommutes_with(&self, other: &PauliString) -> bool {
        self.xs.and_parity(&other.zs) ^ self.zs.and_parity(&other.xs)
    }
}
