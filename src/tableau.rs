//! Stabilizer tableau simulation in the Aaronson–Gottesman form.
//!
//! An n-qubit stabilizer state is tracked by 2n Pauli rows over packed
//! X/Z bit-planes plus a sign bit per row:
//! - rows `0..n` are **destabilizers**, rows `n..2n` are **stabilizers**;
//! - the all-|0⟩ state starts as X_i destabilizers and Z_i stabilizers;
//! - Clifford gates act column-wise on the two bit-planes with exact
//!   sign bookkeeping; measurement replaces or projects rows.
//!
//! Every update is exact GF(2) arithmetic. The only nondeterminism is the
//! coin flipped when a measured observable anticommutes with the stabilizer
//! group, and that coin always comes from an explicit `Rng` passed in by
//! the caller.

use rand::Rng;

use crate::error::{QecError, QecResult};
use crate::gf2::BitRow;
use crate::pauli::{Pauli, PauliString};

/// The supported Clifford gates, with their qubit operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    H(usize),
    S(usize),
    /// Inverse of S.
    Sdg(usize),
    X(usize),
    Y(usize),
    Z(usize),
    /// Controlled-X; first operand is the control.
    Cnot(usize, usize),
    Cz(usize, usize),
    Swap(usize, usize),
}

impl Gate {
    pub fn name(&self) -> &'static str {
        match self {
            Gate::H(_) => "H",
            Gate::S(_) => "S",
            Gate::Sdg(_) => "Sdg",
            Gate::X(_) => "X",
            Gate::Y(_) => "Y",
            Gate::Z(_) => "Z",
            Gate::Cnot(_, _) => "CNOT",
            Gate::Cz(_, _) => "CZ",
            Gate::Swap(_, _) => "SWAP",
        }
    }

    /// Operand qubits; the second is `None` for single-qubit gates.
    pub fn qubits(&self) -> (usize, Option<usize>) {
        match *self {
            Gate::H(q) | Gate::S(q) | Gate::Sdg(q) | Gate::X(q) | Gate::Y(q) | Gate::Z(q) => {
                (q, None)
            }
            Gate::Cnot(a, b) | Gate::Cz(a, b) | Gate::Swap(a, b) => (a, Some(b)),
        }
    }
}

/// Result of measuring a Pauli observable.
///
/// `value` is the outcome bit: `false` for the +1 eigenvalue, `true` for
/// −1. `random` records whether the outcome was a fresh coin flip or was
/// determined by the stabilizer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureOutcome {
    pub value: bool,
    pub random: bool,
}

/// Read-only copy of the tableau rows, for test comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableauSnapshot {
    xs: Vec<BitRow>,
    zs: Vec<BitRow>,
    phases: BitRow,
}

/// An n-qubit stabilizer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilizerTableau {
    num_qubits: usize,
    /// X bit-planes for the 2n rows; row r, qubit q.
    xs: Vec<BitRow>,
    /// Z bit-planes for the 2n rows.
    zs: Vec<BitRow>,
    /// Sign bit per row; true means the row carries a −1 sign.
    phases: BitRow,
}

/// `rows[target] ^= rows[source]` without cloning either row.
fn xor_rows(rows: &mut [BitRow], target: usize, source: usize) {
    debug_assert_ne!(target, source);
    if target < source {
        let (head, tail) = rows.split_at_mut(source);
        head[target].xor_assign(&tail[0]);
    } else {
        let (head, tail) = rows.split_at_mut(target);
        tail[0].xor_assign(&head[source]);
    }
}

/// `rows[target] = rows[source]` without cloning.
fn copy_row(rows: &mut [BitRow], target: usize, source: usize) {
    debug_assert_ne!(target, source);
    if target < source {
        let (head, tail) = rows.split_at_mut(source);
        head[target].copy_from(&tail[0]);
    } else {
        let (head, tail) = rows.split_at_mut(target);
        tail[0].copy_from(&head[source]);
    }
}

/// Net power of i picked up when multiplying Pauli row `source` into
/// `target`, as (number of +1 contributions) − (number of −1 contributions).
///
/// This is the word-parallel form of the Aaronson–Gottesman g-function:
/// per qubit, g(x1,z1,x2,z2) with (x1,z1) from the source row and (x2,z2)
/// from the target row.
fn phase_exponent(source: (&BitRow, &BitRow), target: (&BitRow, &BitRow)) -> i64 {
    let (sx, sz) = source;
    let (tx, tz) = target;
    let mut plus: i64 = 0;
    let mut minus: i64 = 0;
    for k in 0..sx.words().len() {
        let x1 = sx.words()[k];
        let z1 = sz.words()[k];
        let x2 = tx.words()[k];
        let z2 = tz.words()[k];
        let p = (x1 & z1 & z2 & !x2) | (x1 & !z1 & x2 & z2) | (!x1 & z1 & x2 & !z2);
        let m = (x1 & z1 & x2 & !z2) | (x1 & !z1 & !x2 & z2) | (!x1 & z1 & x2 & z2);
        plus += p.count_ones() as i64;
        minus += m.count_ones() as i64;
    }
    plus - minus
}

impl StabilizerTableau {
    /// The all-|0⟩ state on `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        assert!(num_qubits > 0, "tableau needs at least one qubit");
        let rows = 2 * num_qubits;
        let mut xs = vec![BitRow::zeros(num_qubits); rows];
        let mut zs = vec![BitRow::zeros(num_qubits); rows];
        for q in 0..num_qubits {
            xs[q].set(q, true); // destabilizer X_q
            zs[num_qubits + q].set(q, true); // stabilizer Z_q
        }
        StabilizerTableau {
            num_qubits,
            xs,
            zs,
            phases: BitRow::zeros(rows),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Signs of the n stabilizer rows; true means −1.
    pub fn stabilizer_signs(&self) -> Vec<bool> {
        (self.num_qubits..2 * self.num_qubits)
            .map(|r| self.phases.get(r))
            .collect()
    }

    /// The i-th stabilizer row as an unsigned Pauli string.
    pub fn stabilizer(&self, i: usize) -> PauliString {
        assert!(i < self.num_qubits);
        let row = self.num_qubits + i;
        PauliString {
            xs: self.xs[row].clone(),
            zs: self.zs[row].clone(),
        }
    }

    /// Copy of the full row state, for before/after comparisons in tests.
    pub fn snapshot(&self) -> TableauSnapshot {
        TableauSnapshot {
            xs: self.xs.clone(),
            zs: self.zs.clone(),
            phases: self.phases.clone(),
        }
    }

    fn check_qubit(&self, gate: &Gate, q: usize) -> QecResult<()> {
        if q >= self.num_qubits {
            return Err(QecError::invalid_gate(format!(
                "{}: qubit {} out of range for {} qubits",
                gate.name(),
                q,
                self.num_qubits
            )));
        }
        Ok(())
    }

    /// Apply one Clifford gate.
    pub fn apply_gate(&mut self, gate: Gate) -> QecResult<()> {
        let (a, b) = gate.qubits();
        self.check_qubit(&gate, a)?;
        if let Some(b) = b {
            self.check_qubit(&gate, b)?;
            if a == b {
                return Err(QecError::invalid_gate(format!(
                    "{}: operands must be distinct, got qubit {} twice",
                    gate.name(),
                    a
                )));
            }
        }
        match gate {
            Gate::H(q) => self.h(q),
            Gate::S(q) => self.s(q),
            Gate::Sdg(q) => self.sdg(q),
            Gate::X(q) => self.x_gate(q),
            Gate::Y(q) => self.y_gate(q),
            Gate::Z(q) => self.z_gate(q),
            Gate::Cnot(c, t) => self.cnot(c, t),
            Gate::Cz(a, b) => self.cz(a, b),
            Gate::Swap(a, b) => self.swap(a, b),
        }
        Ok(())
    }

    /// Inject a Pauli error: sign-only update, the row structure is fixed.
    pub fn apply_pauli(&mut self, qubit: usize, pauli: Pauli) -> QecResult<()> {
        if qubit >= self.num_qubits {
            return Err(QecError::invalid_gate(format!(
                "Pauli {}: qubit {} out of range for {} qubits",
                pauli, qubit, self.num_qubits
            )));
        }
        match pauli {
            Pauli::X => self.x_gate(qubit),
            Pauli::Y => self.y_gate(qubit),
            Pauli::Z => self.z_gate(qubit),
        }
        Ok(())
    }

    fn h(&mut self, q: usize) {
        for r in 0..2 * self.num_qubits {
            let x = self.xs[r].get(q);
            let z = self.zs[r].get(q);
            if x && z {
                self.phases.flip(r);
            }
            self.xs[r].set(q, z);
            self.zs[r].set(q, x);
        }
    }

    fn s(&mut self, q: usize) {
        for r in 0..2 * self.num_qubits {
            let x = self.xs[r].get(q);
            let z = self.zs[r].get(q);
            if x && z {
                self.phases.flip(r);
            }
            self.zs[r].set(q, z ^ x);
        }
    }

    fn sdg(&mut self, q: usize) {
        for r in 0..2 * self.num_qubits {
            let x = self.xs[r].get(q);
            let z = self.zs[r].get(q);
            if x && !z {
                self.phases.flip(r);
            }
            self.zs[r].set(q, z ^ x);
        }
    }

    fn x_gate(&mut self, q: usize) {
        for r in 0..2 * self.num_qubits {
            if self.zs[r].get(q) {
                self.phases.flip(r);
            }
        }
    }

    fn y_gate(&mut self, q: usize) {
        for r in 0..2 * self.num_qubits {
            if self.xs[r].get(q) ^ self.zs[r].get(q) {
                self.phases.flip(r);
            }
        }
    }

    fn z_gate(&mut self, q: usize) {
        for r in 0..2 * self.num_qubits {
            if self.xs[r].get(q) {
                self.phases.flip(r);
            }
        }
    }

    fn cnot(&mut self, c: usize, t: usize) {
        for r in 0..2 * self.num_qubits {
            let xc = self.xs[r].get(c);
            let zc = self.zs[r].get(c);
            let xt = self.xs[r].get(t);
            let zt = self.zs[r].get(t);
            if xc && zt && xt == zc {
                self.phases.flip(r);
            }
            self.xs[r].set(t, xt ^ xc);
            self.zs[r].set(c, zc ^ zt);
        }
    }

    fn cz(&mut self, a: usize, b: usize) {
        for r in 0..2 * self.num_qubits {
            let xa = self.xs[r].get(a);
            let za = self.zs[r].get(a);
            let xb = self.xs[r].get(b);
            let zb = self.zs[r].get(b);
            if xa && xb && (za ^ zb) {
                self.phases.flip(r);
            }
            self.zs[r].set(a, za ^ xb);
            self.zs[r].set(b, zb ^ xa);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        for r in 0..2 * self.num_qubits {
            let xa = self.xs[r].get(a);
            let xb = self.xs[r].get(b);
            self.xs[r].set(a, xb);
            self.xs[r].set(b, xa);
            let za = self.zs[r].get(a);
            let zb = self.zs[r].get(b);
            self.zs[r].set(a, zb);
            self.zs[r].set(b, za);
        }
    }

    /// Row operation `row[target] *= row[source]` with exact sign tracking.
    fn row_mult(&mut self, target: usize, source: usize) {
        let g = phase_exponent(
            (&self.xs[source], &self.zs[source]),
            (&self.xs[target], &self.zs[target]),
        );
        let r = 2 * (self.phases.get(target) as i64 + self.phases.get(source) as i64) + g;
        let r = r.rem_euclid(4);
        debug_assert!(r == 0 || r == 2, "row product picked up an imaginary phase");
        self.phases.set(target, r == 2);
        xor_rows(&mut self.xs, target, source);
        xor_rows(&mut self.zs, target, source);
    }

    fn row_anticommutes(&self, row: usize, obs: &PauliString) -> bool {
        self.xs[row].and_parity(&obs.zs) ^ self.zs[row].and_parity(&obs.xs)
    }

    /// Measure an arbitrary Pauli observable.
    ///
    /// If the observable anticommutes with some stabilizer row the outcome
    /// is a coin flip from `rng` and the tableau collapses accordingly;
    /// otherwise the outcome is read off the group exactly and the state is
    /// untouched.
    pub fn measure_pauli<R: Rng + ?Sized>(
        &mut self,
        obs: &PauliString,
        rng: &mut R,
    ) -> QecResult<MeasureOutcome> {
        if obs.num_qubits() != self.num_qubits {
            return Err(QecError::invalid_gate(format!(
                "observable on {} qubits measured against {}-qubit tableau",
                obs.num_qubits(),
                self.num_qubits
            )));
        }
        let n = self.num_qubits;
        let pivot = (n..2 * n).find(|&r| self.row_anticommutes(r, obs));

        match pivot {
            Some(p) => {
                // Random branch: clear every other anticommuting row, then
                // install the observable in place of the pivot stabilizer.
                let anticommuting: Vec<usize> = (0..2 * n)
                    .filter(|&r| r != p && self.row_anticommutes(r, obs))
                    .collect();
                for r in anticommuting {
                    self.row_mult(r, p);
                }
                copy_row(&mut self.xs, p - n, p);
                copy_row(&mut self.zs, p - n, p);
                let src_phase = self.phases.get(p);
                self.phases.set(p - n, src_phase);

                let value: bool = rng.gen();
                self.xs[p].copy_from(&obs.xs);
                self.zs[p].copy_from(&obs.zs);
                self.phases.set(p, value);
                Ok(MeasureOutcome { value, random: true })
            }
            None => {
                // Deterministic branch: the observable is in the stabilizer
                // group; accumulate the generators flagged by anticommuting
                // destabilizers and read the sign off the product.
                let mut acc_x = BitRow::zeros(n);
                let mut acc_z = BitRow::zeros(n);
                let mut acc_r: i64 = 0;
                for d in 0..n {
                    if self.row_anticommutes(d, obs) {
                        let s = n + d;
                        let g =
                            phase_exponent((&self.xs[s], &self.zs[s]), (&acc_x, &acc_z));
                        acc_r = (acc_r + 2 * self.phases.get(s) as i64 + g).rem_euclid(4);
                        acc_x.xor_assign(&self.xs[s]);
                        acc_z.xor_assign(&self.zs[s]);
                    }
                }
                debug_assert!(acc_r == 0 || acc_r == 2);
                debug_assert!(
                    acc_x == obs.xs && acc_z == obs.zs,
                    "projected product must reproduce the observable"
                );
                Ok(MeasureOutcome {
                    value: acc_r == 2,
                    random: false,
                })
            }
        }
    }

    /// Measure Z on a single qubit.
    pub fn measure_z<R: Rng + ?Sized>(
        &mut self,
        qubit: usize,
        rng: &mut R,
    ) -> QecResult<MeasureOutcome> {
        if qubit >= self.num_qubits {
            return Err(QecError::invalid_gate(format!(
                "measure: qubit {} out of range for {} qubits",
                qubit, self.num_qubits
            )));
        }
        let mut obs = PauliString::identity(self.num_qubits);
        obs.zs.set(qubit, true);
        self.measure_pauli(&obs, rng)
    }

    /// Full symplectic self-check: stabilizers pairwise commute,
    /// destabilizers pairwise commute, and destabilizer i anticommutes
    /// with stabilizer j exactly when i = j.
    pub fn invariants_hold(&self) -> bool {
        let n = self.num_qubits;
        let anticommute = |r1: usize, r2: usize| {
            self.xs[r1].and_parity(&self.zs[r2]) ^ self.zs[r1].and_parity(&self.xs[r2])
        };
        for i in 0..n {
            for j in 0..n {
                if anticommute(n + i, n + j) {
                    return false;
                }
                if anticommute(i, j) {
                    return false;
                }
                if anticommute(i, n + j) != (i == j) {
                    return false;
                }
            }
        }
        true
    }
}

/// One instruction in a [`Circuit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitOp {
    Gate(Gate),
    MeasureZ(usize),
}

/// A recorded sequence of gates and single-qubit measurements.
///
/// Circuits replay against any tableau of the right width; `sample` runs
/// them from a fresh all-|0⟩ state and collects the measurement record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Circuit {
    num_qubits: usize,
    ops: Vec<CircuitOp>,
}

impl Circuit {
    pub fn new(num_qubits: usize) -> Self {
        Circuit {
            num_qubits,
            ops: Vec::new(),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn ops(&self) -> &[CircuitOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn push(&mut self, gate: Gate) {
        self.ops.push(CircuitOp::Gate(gate));
    }

    pub fn measure_z(&mut self, qubit: usize) {
        self.ops.push(CircuitOp::MeasureZ(qubit));
    }

    /// Replay every op against `tableau`, returning measurement outcomes
    /// in program order.
    pub fn run<R: Rng + ?Sized>(
        &self,
        tableau: &mut StabilizerTableau,
        rng: &mut R,
    ) -> QecResult<Vec<bool>> {
        if tableau.num_qubits() != self.num_qubits {
            return Err(QecError::invalid_gate(format!(
                "circuit on {} qubits run against {}-qubit tableau",
                self.num_qubits,
                tableau.num_qubits()
            )));
        }
        let mut record = Vec::new();
        for op in &self.ops {
            match *op {
                CircuitOp::Gate(gate) => tableau.apply_gate(gate)?,
                CircuitOp::MeasureZ(q) => record.push(tableau.measure_z(q, rng)?.value),
            }
        }
        Ok(record)
    }

    /// Run from a fresh all-|0⟩ state and return the measurement record.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> QecResult<Vec<bool>> {
        let mut tableau = StabilizerTableau::new(self.num_qubits);
        self.run(&mut tableau, rng)
    }
}
