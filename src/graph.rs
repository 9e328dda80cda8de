//! Decoding-graph construction.
//!
//! A window of syndromes becomes one weighted graph per stabilizer type:
//! every defect is a node carrying its (generator, round) position, and
//! edges join defect pairs that a chain of elementary errors could have
//! produced. Space separation is the hop distance through the layout's
//! matching skeleton, time separation the round gap.
//!
//! Open-boundary codes get one **virtual twin** per defect, joined to its
//! real node at the boundary cost and to every other virtual for free.
//! Twins give the matcher an even node count and let any subset of defects
//! terminate on the boundary while unused twins pair off among themselves.
//!
//! All weights are even integers: they are stored as twice a half-weight,
//! which keeps the matcher's dual variables integral and its arithmetic
//! exact.

use tracing::debug;

use crate::error::{QecError, QecResult};
use crate::layout::{BoundaryCondition, CodeLayout, StabKind};
use crate::matching::Matching;
use crate::noise::NoiseConfig;
use crate::pauli::{Pauli, PauliString};
use crate::syndrome::Syndrome;
use crate::tableau::StabilizerTableau;

/// Scale ceiling for log-likelihood half-weights.
pub const MAX_HALF_WEIGHT: i64 = 500;

/// How edge weights are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    /// Pure geometry: every hop costs the same.
    #[default]
    Uniform,
    /// Hops cost ln((1−p)/p) for their transition probability, rescaled to
    /// integers with ceiling [`MAX_HALF_WEIGHT`].
    LogLikelihood,
}

/// Decoder-side configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderConfig {
    pub weighting: Weighting,
    /// Rounds per decode window; `None` decodes the whole trial at once.
    pub window: Option<usize>,
}

impl DecoderConfig {
    pub fn validate(&self) -> QecResult<()> {
        if self.window == Some(0) {
            return Err(QecError::configuration("decode window must be positive"));
        }
        Ok(())
    }
}

/// A triggered stabilizer at a given round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefectNode {
    /// Global generator index in the layout.
    pub generator: usize,
    /// Round offset within the decoded window.
    pub round: usize,
}

/// One weighted edge; `a < b`, weight even and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEdge {
    pub a: usize,
    pub b: usize,
    pub weight: i64,
}

/// The matcher's input: defects of one type plus their virtual twins.
///
/// Nodes `0..m` are the real defects in round-major order; for open codes
/// nodes `m..2m` are their virtual boundary twins.
#[derive(Debug, Clone)]
pub struct DecodingGraph {
    kind: StabKind,
    defects: Vec<DefectNode>,
    /// Skeleton-local stab index per defect.
    locals: Vec<usize>,
    num_nodes: usize,
    edges: Vec<GraphEdge>,
    has_virtuals: bool,
}

impl DecodingGraph {
    /// Build the graph for one stabilizer type over a syndrome window.
    pub fn build(
        window: &[Syndrome],
        kind: StabKind,
        layout: &CodeLayout,
        config: &DecoderConfig,
        noise: &NoiseConfig,
    ) -> QecResult<Self> {
        let skeleton = layout.skeleton(kind);
        let mut defects = Vec::new();
        for (t, syndrome) in window.iter().enumerate() {
            if syndrome.len() != layout.num_stabilizers() {
                return Err(QecError::invalid_layout(format!(
                    "syndrome holds {} bits but the layout has {} stabilizers",
                    syndrome.len(),
                    layout.num_stabilizers()
                )));
            }
            for gen in syndrome.defects() {
                if layout.generators()[gen].kind == kind {
                    defects.push(DefectNode { generator: gen, round: t });
                }
            }
        }
        let mut locals = Vec::with_capacity(defects.len());
        for d in &defects {
            match skeleton.local_of(d.generator) {
                Some(l) => locals.push(l),
                None => {
                    return Err(QecError::invalid_layout(format!(
                        "generator {} is not {}-type",
                        d.generator,
                        kind.label()
                    )))
                }
            }
        }

        let m = defects.len();
        let has_virtuals = layout.boundary() == BoundaryCondition::Open;
        let num_nodes = if has_virtuals { 2 * m } else { m };
        let (hw_space, hw_time) = match config.weighting {
            Weighting::Uniform => (1, 1),
            Weighting::LogLikelihood => llr_half_weights(kind, noise),
        };

        let mut edges = Vec::new();
        for i in 0..m {
            for j in (i + 1)..m {
                let d_time = defects[i].round.abs_diff(defects[j].round) as i64;
                if let Some(d_space) = skeleton.distance(locals[i], locals[j]) {
                    edges.push(GraphEdge {
                        a: i,
                        b: j,
                        weight: 2 * (d_space as i64 * hw_space + d_time * hw_time),
                    });
                }
            }
        }
        if has_virtuals {
            for i in 0..m {
                if let Some(d_boundary) = skeleton.boundary_distance(locals[i]) {
                    edges.push(GraphEdge {
                        a: i,
                        b: m + i,
                        weight: 2 * d_boundary as i64 * hw_space,
                    });
                }
            }
            for i in 0..m {
                for j in (i + 1)..m {
                    edges.push(GraphEdge {
                        a: m + i,
                        b: m + j,
                        weight: 0,
                    });
                }
            }
        }

        debug!(
            kind = %kind,
            defects = m,
            nodes = num_nodes,
            edges = edges.len(),
            "built decoding graph"
        );
        Ok(DecodingGraph {
            kind,
            defects,
            locals,
            num_nodes,
            edges,
            has_virtuals,
        })
    }

    pub fn kind(&self) -> StabKind {
        self.kind
    }

    pub fn defects(&self) -> &[DefectNode] {
        &self.defects
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Virtual twins sit above the real block.
    pub fn is_virtual(&self, node: usize) -> bool {
        self.has_virtuals && node >= self.defects.len()
    }

    /// Turn a perfect matching back into a Pauli mask on the data qubits.
    ///
    /// Every real-real pair contributes a minimum-hop chain between its
    /// stabs (empty when the pair is purely time-separated), every
    /// real-virtual pair a chain to the boundary; virtual-virtual pairs
    /// are padding. Chains XOR together, so overlapping paths cancel.
    pub fn correction(&self, matching: &Matching, layout: &CodeLayout) -> QecResult<Correction> {
        let skeleton = layout.skeleton(self.kind);
        let pauli = self.kind.detected_error();
        let mut correction = Correction::identity(layout.num_qubits());
        for (a, b) in matching.pairs() {
            let qubits = match (self.is_virtual(a), self.is_virtual(b)) {
                (false, false) => skeleton.error_path(self.locals[a], self.locals[b]),
                (false, true) => skeleton.boundary_error_path(self.locals[a]),
                (true, false) => skeleton.boundary_error_path(self.locals[b]),
                (true, true) => continue,
            };
            let qubits = qubits.ok_or_else(|| {
                QecError::invalid_layout("matched defects have no connecting error chain")
            })?;
            for q in qubits {
                correction.flip(q, pauli);
            }
        }
        Ok(correction)
    }
}

/// Half-weights (space, time) for log-likelihood mode.
///
/// Weights are normalized so the largest finite one sits at the ceiling;
/// impossible transitions (p = 0) are priced at the ceiling outright so
/// the graph keeps its structure and the matcher only picks them when
/// forced.
fn llr_half_weights(kind: StabKind, noise: &NoiseConfig) -> (i64, i64) {
    let p_space = noise.flip_probability(kind);
    let p_time = noise.p_meas;
    let raw = |p: f64| -> Option<f64> {
        if p > 0.0 {
            Some(((1.0 - p) / p).ln())
        } else {
            None
        }
    };
    let w_ref = [raw(p_space), raw(p_time)]
        .iter()
        .flatten()
        .fold(0.0f64, |acc, &w| acc.max(w));
    let half = |p: f64| -> i64 {
        match raw(p) {
            Some(w) if w_ref > 0.0 => {
                ((w / w_ref * MAX_HALF_WEIGHT as f64).round() as i64).clamp(1, MAX_HALF_WEIGHT)
            }
            Some(_) => 1,
            None => MAX_HALF_WEIGHT,
        }
    };
    (half(p_space), half(p_time))
}

/// A decoded Pauli mask, ready to push back into the tableau.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    string: PauliString,
}

impl Correction {
    pub fn identity(num_qubits: usize) -> Self {
        Correction {
            string: PauliString::identity(num_qubits),
        }
    }

    pub fn as_string(&self) -> &PauliString {
        &self.string
    }

    pub fn is_identity(&self) -> bool {
        self.string.weight() == 0
    }

    pub fn weight(&self) -> usize {
        self.string.weight()
    }

    /// XOR a single-qubit Pauli into the mask.
    pub fn flip(&mut self, qubit: usize, pauli: Pauli) {
        if pauli.has_x() {
            self.string.xs.flip(qubit);
        }
        if pauli.has_z() {
            self.string.zs.flip(qubit);
        }
    }

    /// Fold another correction in; X and Z parts combine into Y.
    pub fn merge(&mut self, other: &Correction) {
        self.string.mul_assign_unsigned(&other.string);
    }

    pub fn terms(&self) -> Vec<(usize, Pauli)> {
        (0..self.string.num_qubits())
            .filter_map(|q| self.string.on_qubit(q).map(|p| (q, p)))
            .collect()
    }

    /// Apply the mask to the state.
    pub fn apply(&self, tableau: &mut StabilizerTableau) -> QecResult<()> {
        for (qubit, pauli) in self.terms() {
            tableau.apply_pauli(qubit, pauli)?;
        }
        Ok(())
    }
}
