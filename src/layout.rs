//! Static descriptions of stabilizer codes.
//!
//! A [`CodeLayout`] fixes everything the rest of the pipeline needs to know
//! about a code before any qubit is simulated:
//! - the data-qubit count and an ordered list of stabilizer generators,
//!   each tagged **X-type** or **Z-type** with a lattice coordinate;
//! - logical Z/X operator pairs that commute with every generator but are
//!   not products of them;
//! - per-type **matching skeletons**: graphs with one node per same-type
//!   generator (plus a boundary node for open codes) and one edge per data
//!   qubit, connecting the generators that qubit's errors flip.
//!
//! The skeletons carry the geometry used for decoding: hop distances give
//! edge weights, and shortest paths give the qubit chains that corrections
//! are built from. Construction validates the whole structure and fails
//! with [`QecError::InvalidLayout`] on a broken code, so downstream stages
//! can trust any layout they are handed.

use std::fmt;

use petgraph::algo::{astar, dijkstra};
use petgraph::graph::{NodeIndex, UnGraph};
use smallvec::SmallVec;

use crate::error::{QecError, QecResult};
use crate::gf2::{rank, BitRow};
use crate::pauli::{Pauli, PauliOp, PauliString};

/// Stabilizer type: Z-type plaquettes detect bit flips, X-type stars
/// detect phase flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StabKind {
    X,
    Z,
}

impl StabKind {
    pub fn label(self) -> char {
        match self {
            StabKind::X => 'X',
            StabKind::Z => 'Z',
        }
    }

    /// The pure bit-flip or phase-flip error this stabilizer type detects.
    /// Y errors flip both types and are seen by both kinds of check.
    pub fn detected_error(self) -> Pauli {
        match self {
            StabKind::Z => Pauli::X,
            StabKind::X => Pauli::Z,
        }
    }

    /// The Pauli this type's checks are products of.
    pub fn pauli(self) -> Pauli {
        match self {
            StabKind::X => Pauli::X,
            StabKind::Z => Pauli::Z,
        }
    }
}

impl fmt::Display for StabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One stabilizer generator with its type and lattice coordinate.
#[derive(Debug, Clone)]
pub struct Generator {
    pub op: PauliOp,
    pub kind: StabKind,
    /// (row, column) in the family's site coordinates, for display only.
    pub coord: (usize, usize),
}

/// Whether the code terminates on open boundaries or wraps around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCondition {
    Open,
    Periodic,
}

/// The built-in code families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeFamily {
    /// Rotated surface code; odd distance d ≥ 3, d² data qubits.
    RotatedSurface,
    /// Unrotated (planar) surface code; d ≥ 2, d² + (d−1)² data qubits.
    #[default]
    UnrotatedSurface,
    /// Toric code on a d×d torus; 2d² data qubits, two logical pairs.
    Toric,
    /// Repetition code; bit-flip protection only.
    Repetition,
}

impl CodeFamily {
    pub fn label(&self) -> &'static str {
        match self {
            CodeFamily::RotatedSurface => "rotated surface",
            CodeFamily::UnrotatedSurface => "unrotated surface",
            CodeFamily::Toric => "toric",
            CodeFamily::Repetition => "repetition",
        }
    }
}

impl fmt::Display for CodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Node payload in a matching skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonNode {
    /// Local index of a same-type stabilizer.
    Stab(usize),
    /// The shared open-boundary terminal.
    Boundary,
}

/// The matching geometry for one stabilizer type.
///
/// Nodes are the generators of that type (plus one boundary node for open
/// codes); each data qubit whose detected error flips one or two of them
/// becomes an edge carrying the qubit index. Hop distances through this
/// graph are the "minimum elementary errors" metric the decoder weights
/// edges by, and shortest paths are the correction chains.
#[derive(Debug, Clone)]
pub struct MatchSkeleton {
    kind: StabKind,
    /// Global generator index per local node.
    stabs: Vec<usize>,
    /// Local node per global generator index, where the kind matches.
    local: Vec<Option<usize>>,
    graph: UnGraph<SkeletonNode, usize>,
    node_ids: Vec<NodeIndex>,
    boundary_id: Option<NodeIndex>,
    /// All-pairs hop distances between local stabs; `None` = unreachable.
    dist: Vec<Vec<Option<u32>>>,
    boundary_dist: Vec<Option<u32>>,
}

impl MatchSkeleton {
    fn build(
        kind: StabKind,
        num_qubits: usize,
        generators: &[Generator],
        boundary: BoundaryCondition,
    ) -> QecResult<Self> {
        let stabs: Vec<usize> = generators
            .iter()
            .enumerate()
            .filter(|(_, g)| g.kind == kind)
            .map(|(i, _)| i)
            .collect();
        let mut local = vec![None; generators.len()];
        for (l, &s) in stabs.iter().enumerate() {
            local[s] = Some(l);
        }

        let mut graph = UnGraph::new_undirected();
        let node_ids: Vec<NodeIndex> = (0..stabs.len())
            .map(|l| graph.add_node(SkeletonNode::Stab(l)))
            .collect();
        let boundary_id = match boundary {
            BoundaryCondition::Open => Some(graph.add_node(SkeletonNode::Boundary)),
            BoundaryCondition::Periodic => None,
        };

        let trigger = kind.detected_error();
        for q in 0..num_qubits {
            let flipped: SmallVec<[usize; 4]> = stabs
                .iter()
                .enumerate()
                .filter(|&(_, &s)| {
                    generators[s]
                        .op
                        .on_qubit(q)
                        .map_or(false, |p| p.anticommutes_with(trigger))
                })
                .map(|(l, _)| l)
                .collect();
            match flipped.len() {
                0 => {}
                1 => match boundary_id {
                    Some(b) => {
                        graph.add_edge(node_ids[flipped[0]], b, q);
                    }
                    None => {
                        return Err(QecError::invalid_layout(format!(
                            "periodic code, but qubit {} flips a single {}-type stabilizer",
                            q,
                            kind.label()
                        )))
                    }
                },
                2 => {
                    graph.add_edge(node_ids[flipped[0]], node_ids[flipped[1]], q);
                }
                n => {
                    return Err(QecError::invalid_layout(format!(
                        "qubit {} flips {} {}-type stabilizers, matching needs at most two",
                        q,
                        n,
                        kind.label()
                    )))
                }
            }
        }

        let mut dist = Vec::with_capacity(stabs.len());
        let mut boundary_dist = vec![None; stabs.len()];
        for (l, &id) in node_ids.iter().enumerate() {
            let reach = dijkstra(&graph, id, None, |_| 1u32);
            dist.push(
                node_ids
                    .iter()
                    .map(|other| reach.get(other).copied())
                    .collect::<Vec<_>>(),
            );
            boundary_dist[l] = boundary_id.and_then(|b| reach.get(&b).copied());
        }

        Ok(MatchSkeleton {
            kind,
            stabs,
            local,
            graph,
            node_ids,
            boundary_id,
            dist,
            boundary_dist,
        })
    }

    pub fn kind(&self) -> StabKind {
        self.kind
    }

    pub fn num_stabs(&self) -> usize {
        self.stabs.len()
    }

    /// Global generator index behind local node `l`.
    pub fn stab_at(&self, l: usize) -> usize {
        self.stabs[l]
    }

    /// Local node for a global generator index, if it has this kind.
    pub fn local_of(&self, generator: usize) -> Option<usize> {
        self.local.get(generator).copied().flatten()
    }

    pub fn has_boundary(&self) -> bool {
        self.boundary_id.is_some()
    }

    /// Hop distance between two local stabs, possibly through the boundary.
    pub fn distance(&self, a: usize, b: usize) -> Option<u32> {
        self.dist[a][b]
    }

    /// Hop distance from a local stab to the open boundary.
    pub fn boundary_distance(&self, a: usize) -> Option<u32> {
        self.boundary_dist[a]
    }

    /// Data qubits of a minimum-hop error chain connecting two stabs.
    pub fn error_path(&self, a: usize, b: usize) -> Option<Vec<usize>> {
        let goal = self.node_ids[b];
        let (_, path) = astar(&self.graph, self.node_ids[a], |n| n == goal, |_| 1u32, |_| {
            0u32
        })?;
        self.path_qubits(&path)
    }

    /// Data qubits of a minimum-hop chain from a stab to the boundary.
    pub fn boundary_error_path(&self, a: usize) -> Option<Vec<usize>> {
        let goal = self.boundary_id?;
        let (_, path) = astar(&self.graph, self.node_ids[a], |n| n == goal, |_| 1u32, |_| {
            0u32
        })?;
        self.path_qubits(&path)
    }

    /// Parallel edges are broken by the smallest qubit index so decoded
    /// corrections are reproducible.
    fn path_qubits(&self, path: &[NodeIndex]) -> Option<Vec<usize>> {
        let mut qubits = Vec::with_capacity(path.len().saturating_sub(1));
        for pair in path.windows(2) {
            let q = self
                .graph
                .edges_connecting(pair[0], pair[1])
                .map(|e| *e.weight())
                .min()?;
            qubits.push(q);
        }
        Some(qubits)
    }
}

/// Immutable description of a stabilizer code.
///
/// Built once per experiment from a family and distance (or assembled from
/// explicit parts via [`CodeLayout::custom`]) and shared by reference from
/// then on; nothing downstream mutates it.
#[derive(Debug, Clone)]
pub struct CodeLayout {
    name: String,
    distance: usize,
    boundary: BoundaryCondition,
    num_qubits: usize,
    generators: Vec<Generator>,
    dense_generators: Vec<PauliString>,
    logical_zs: Vec<PauliOp>,
    logical_xs: Vec<PauliOp>,
    dense_logical_zs: Vec<PauliString>,
    dense_logical_xs: Vec<PauliString>,
    skeleton_x: MatchSkeleton,
    skeleton_z: MatchSkeleton,
}

impl CodeLayout {
    /// Build one of the stock code families at the given distance.
    pub fn new(family: CodeFamily, distance: usize) -> QecResult<Self> {
        match family {
            CodeFamily::RotatedSurface => {
                if distance < 3 || distance % 2 == 0 {
                    return Err(QecError::configuration(format!(
                        "rotated surface code needs odd distance >= 3, got {}",
                        distance
                    )));
                }
                let (n, gens, lz, lx) = rotated_surface(distance);
                Self::assemble(
                    format!("rotated surface d={}", distance),
                    distance,
                    n,
                    gens,
                    lz,
                    lx,
                    BoundaryCondition::Open,
                )
            }
            CodeFamily::UnrotatedSurface => {
                if distance < 2 {
                    return Err(QecError::configuration(format!(
                        "unrotated surface code needs distance >= 2, got {}",
                        distance
                    )));
                }
                let (n, gens, lz, lx) = unrotated_surface(distance);
                Self::assemble(
                    format!("unrotated surface d={}", distance),
                    distance,
                    n,
                    gens,
                    lz,
                    lx,
                    BoundaryCondition::Open,
                )
            }
            CodeFamily::Toric => {
                if distance < 2 {
                    return Err(QecError::configuration(format!(
                        "toric code needs distance >= 2, got {}",
                        distance
                    )));
                }
                let (n, gens, lz, lx) = toric(distance);
                Self::assemble(
                    format!("toric d={}", distance),
                    distance,
                    n,
                    gens,
                    lz,
                    lx,
                    BoundaryCondition::Periodic,
                )
            }
            CodeFamily::Repetition => {
                if distance < 2 {
                    return Err(QecError::configuration(format!(
                        "repetition code needs distance >= 2, got {}",
                        distance
                    )));
                }
                let (n, gens, lz, lx) = repetition(distance);
                Self::assemble(
                    format!("repetition d={}", distance),
                    distance,
                    n,
                    gens,
                    lz,
                    lx,
                    BoundaryCondition::Open,
                )
            }
        }
    }

    /// Assemble a layout from explicit parts, running the full validation.
    pub fn custom(
        name: impl Into<String>,
        distance: usize,
        num_qubits: usize,
        generators: Vec<Generator>,
        logical_zs: Vec<PauliOp>,
        logical_xs: Vec<PauliOp>,
        boundary: BoundaryCondition,
    ) -> QecResult<Self> {
        if distance == 0 {
            return Err(QecError::configuration("code distance must be positive"));
        }
        Self::assemble(
            name.into(),
            distance,
            num_qubits,
            generators,
            logical_zs,
            logical_xs,
            boundary,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        name: String,
        distance: usize,
        num_qubits: usize,
        generators: Vec<Generator>,
        logical_zs: Vec<PauliOp>,
        logical_xs: Vec<PauliOp>,
        boundary: BoundaryCondition,
    ) -> QecResult<Self> {
        if num_qubits == 0 {
            return Err(QecError::invalid_layout("layout has no data qubits"));
        }
        if generators.is_empty() {
            return Err(QecError::invalid_layout("layout has no stabilizers"));
        }
        for (i, g) in generators.iter().enumerate() {
            if g.op.is_identity() {
                return Err(QecError::invalid_layout(format!(
                    "stabilizer {} is the identity",
                    i
                )));
            }
            if g.op.max_qubit().map_or(false, |q| q >= num_qubits) {
                return Err(QecError::invalid_layout(format!(
                    "stabilizer {} touches a qubit outside 0..{}",
                    i, num_qubits
                )));
            }
        }
        if logical_zs.len() != logical_xs.len() || logical_zs.is_empty() {
            return Err(QecError::invalid_layout(
                "logical operators must come in matched Z/X pairs",
            ));
        }
        for op in logical_zs.iter().chain(logical_xs.iter()) {
            if op.is_identity() || op.max_qubit().map_or(false, |q| q >= num_qubits) {
                return Err(QecError::invalid_layout(
                    "logical operator empty or out of range",
                ));
            }
        }

        let dense_generators: Vec<PauliString> =
            generators.iter().map(|g| g.op.to_dense(num_qubits)).collect();
        for i in 0..dense_generators.len() {
            for j in (i + 1)..dense_generators.len() {
                if dense_generators[i].anticommutes_with(&dense_generators[j]) {
                    return Err(QecError::invalid_layout(format!(
                        "stabilizers {} and {} anticommute",
                        i, j
                    )));
                }
            }
        }

        let dense_logical_zs: Vec<PauliString> =
            logical_zs.iter().map(|op| op.to_dense(num_qubits)).collect();
        let dense_logical_xs: Vec<PauliString> =
            logical_xs.iter().map(|op| op.to_dense(num_qubits)).collect();
        for (k, lz) in dense_logical_zs.iter().enumerate() {
            for (i, g) in dense_generators.iter().enumerate() {
                if lz.anticommutes_with(g) {
                    return Err(QecError::invalid_layout(format!(
                        "logical Z {} anticommutes with stabilizer {}",
                        k, i
                    )));
                }
            }
        }
        for (k, lx) in dense_logical_xs.iter().enumerate() {
            for (i, g) in dense_generators.iter().enumerate() {
                if lx.anticommutes_with(g) {
                    return Err(QecError::invalid_layout(format!(
                        "logical X {} anticommutes with stabilizer {}",
                        k, i
                    )));
                }
            }
        }
        // Logical pairing: Z_k anticommutes with X_k and with nothing else.
        for (k, lz) in dense_logical_zs.iter().enumerate() {
            for (m, lx) in dense_logical_xs.iter().enumerate() {
                let anti = lz.anticommutes_with(lx);
                if anti != (k == m) {
                    return Err(QecError::invalid_layout(format!(
                        "logical Z {} and logical X {} break the symplectic pairing",
                        k, m
                    )));
                }
            }
        }

        // Logicals must extend the stabilizer span, not sit inside it.
        let mut rows: Vec<BitRow> = dense_generators
            .iter()
            .map(|g| symplectic_row(g, num_qubits))
            .collect();
        let span = rank(&rows);
        rows.extend(
            dense_logical_zs
                .iter()
                .chain(dense_logical_xs.iter())
                .map(|l| symplectic_row(l, num_qubits)),
        );
        let extended = rank(&rows);
        let logical_count = dense_logical_zs.len() + dense_logical_xs.len();
        if extended != span + logical_count {
            return Err(QecError::invalid_layout(
                "logical operators are not independent of the stabilizer span",
            ));
        }

        let skeleton_x = MatchSkeleton::build(StabKind::X, num_qubits, &generators, boundary)?;
        let skeleton_z = MatchSkeleton::build(StabKind::Z, num_qubits, &generators, boundary)?;

        Ok(CodeLayout {
            name,
            distance,
            boundary,
            num_qubits,
            generators,
            dense_generators,
            logical_zs,
            logical_xs,
            dense_logical_zs,
            dense_logical_xs,
            skeleton_x,
            skeleton_z,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    pub fn boundary(&self) -> BoundaryCondition {
        self.boundary
    }

    /// Data qubits only; syndrome measurements are simulated directly, so
    /// ancillas never enter the tableau.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn num_stabilizers(&self) -> usize {
        self.generators.len()
    }

    /// Data plus one measure qubit per stabilizer, as the hardware count.
    pub fn num_physical_qubits(&self) -> usize {
        self.num_qubits + self.generators.len()
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// Dense form of stabilizer `i`, ready to measure.
    pub fn generator_string(&self, i: usize) -> &PauliString {
        &self.dense_generators[i]
    }

    pub fn logical_zs(&self) -> &[PauliOp] {
        &self.logical_zs
    }

    pub fn logical_xs(&self) -> &[PauliOp] {
        &self.logical_xs
    }

    pub fn logical_z_string(&self, k: usize) -> &PauliString {
        &self.dense_logical_zs[k]
    }

    pub fn logical_x_string(&self, k: usize) -> &PauliString {
        &self.dense_logical_xs[k]
    }

    pub fn num_logicals(&self) -> usize {
        self.logical_zs.len()
    }

    pub fn skeleton(&self, kind: StabKind) -> &MatchSkeleton {
        match kind {
            StabKind::X => &self.skeleton_x,
            StabKind::Z => &self.skeleton_z,
        }
    }
}

/// One operator as a GF(2) row: X bits in columns `0..n`, Z bits in `n..2n`.
fn symplectic_row(op: &PauliString, n: usize) -> BitRow {
    let mut row = BitRow::zeros(2 * n);
    for q in 0..n {
        if op.x_bit(q) {
            row.set(q, true);
        }
        if op.z_bit(q) {
            row.set(n + q, true);
        }
    }
    row
}

fn op_from(qubits: &[usize], pauli: Pauli) -> PauliOp {
    PauliOp::from_terms(qubits.iter().map(|&q| (q, pauli)))
}

type FamilyParts = (usize, Vec<Generator>, Vec<PauliOp>, Vec<PauliOp>);

/// Rotated surface code, odd d.
///
/// Data qubits form a d×d grid (row-major index r·d+c). Ancilla sites sit
/// on the (d+1)×(d+1) dual grid; site (r,c) is Z-type when r+c is even.
/// Interior sites always host a stabilizer; top/bottom edges keep only
/// X-type, left/right edges only Z-type, corners none. That yields the
/// standard d²−1 generators (8 for d=3, the "17 qubit" planar patch once
/// measure qubits are counted).
fn rotated_surface(d: usize) -> FamilyParts {
    let mut gens = Vec::new();
    for r in 0..=d {
        for c in 0..=d {
            let kind = if (r + c) % 2 == 0 {
                StabKind::Z
            } else {
                StabKind::X
            };
            let on_row_edge = r == 0 || r == d;
            let on_col_edge = c == 0 || c == d;
            let keep = if on_row_edge && on_col_edge {
                false
            } else if on_row_edge {
                kind == StabKind::X
            } else if on_col_edge {
                kind == StabKind::Z
            } else {
                true
            };
            if !keep {
                continue;
            }
            let mut support = Vec::with_capacity(4);
            for (dr, dc) in [(0isize, 0isize), (0, -1), (-1, 0), (-1, -1)] {
                let qr = r as isize + dr;
                let qc = c as isize + dc;
                if qr >= 0 && qc >= 0 && (qr as usize) < d && (qc as usize) < d {
                    support.push(qr as usize * d + qc as usize);
                }
            }
            support.sort_unstable();
            gens.push(Generator {
                op: op_from(&support, kind.pauli()),
                kind,
                coord: (r, c),
            });
        }
    }
    let logical_z = op_from(&(0..d).collect::<Vec<_>>(), Pauli::Z);
    let logical_x = op_from(&(0..d).map(|r| r * d).collect::<Vec<_>>(), Pauli::X);
    (d * d, gens, vec![logical_z], vec![logical_x])
}

/// Unrotated (planar) surface code.
///
/// Sites live on a (2d−1)×(2d−1) grid; data qubits occupy even-parity
/// sites, Z-type stabilizers odd rows at even columns, X-type even rows at
/// odd columns. Boundary stabilizers lose their clipped neighbor and drop
/// to weight 3.
fn unrotated_surface(d: usize) -> FamilyParts {
    let side = 2 * d - 1;
    let mut data_at = vec![vec![None; side]; side];
    let mut next = 0usize;
    for i in 0..side {
        for j in 0..side {
            if (i + j) % 2 == 0 {
                data_at[i][j] = Some(next);
                next += 1;
            }
        }
    }
    let neighbors = |i: usize, j: usize| -> Vec<usize> {
        let mut out = Vec::with_capacity(4);
        for (di, dj) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
            let ni = i as isize + di;
            let nj = j as isize + dj;
            if ni >= 0 && nj >= 0 && (ni as usize) < side && (nj as usize) < side {
                if let Some(q) = data_at[ni as usize][nj as usize] {
                    out.push(q);
                }
            }
        }
        out.sort_unstable();
        out
    };
    let mut gens = Vec::new();
    for i in 0..side {
        for j in 0..side {
            let kind = if i % 2 == 1 && j % 2 == 0 {
                StabKind::Z
            } else if i % 2 == 0 && j % 2 == 1 {
                StabKind::X
            } else {
                continue;
            };
            gens.push(Generator {
                op: op_from(&neighbors(i, j), kind.pauli()),
                kind,
                coord: (i, j),
            });
        }
    }
    let logical_z: Vec<usize> = (0..side)
        .step_by(2)
        .filter_map(|j| data_at[0][j])
        .collect();
    let logical_x: Vec<usize> = (0..side)
        .step_by(2)
        .filter_map(|i| data_at[i][0])
        .collect();
    (
        next,
        gens,
        vec![op_from(&logical_z, Pauli::Z)],
        vec![op_from(&logical_x, Pauli::X)],
    )
}

/// Toric code on a d×d torus.
///
/// Qubits sit on edges: horizontal edge (r,c) has index r·d+c, vertical
/// edge (r,c) has d²+r·d+c. Every vertex star (X-type) and plaquette
/// (Z-type) is kept as a generator even though each set multiplies to the
/// identity; the redundant syndrome bits are what real toric-code runs
/// record. Two logical pairs wind the two cycles of the torus.
fn toric(d: usize) -> FamilyParts {
    let h = |r: usize, c: usize| (r % d) * d + (c % d);
    let v = |r: usize, c: usize| d * d + (r % d) * d + (c % d);
    let mut gens = Vec::new();
    for r in 0..d {
        for c in 0..d {
            let mut support = vec![h(r, c), h(r, c + d - 1), v(r, c), v(r + d - 1, c)];
            support.sort_unstable();
            gens.push(Generator {
                op: op_from(&support, Pauli::X),
                kind: StabKind::X,
                coord: (r, c),
            });
        }
    }
    for r in 0..d {
        for c in 0..d {
            let mut support = vec![h(r, c), h(r + 1, c), v(r, c), v(r, c + 1)];
            support.sort_unstable();
            gens.push(Generator {
                op: op_from(&support, Pauli::Z),
                kind: StabKind::Z,
                coord: (r, c),
            });
        }
    }
    let z1: Vec<usize> = (0..d).map(|c| h(0, c)).collect();
    let x1: Vec<usize> = (0..d).map(|r| h(r, 0)).collect();
    let z2: Vec<usize> = (0..d).map(|r| v(r, 0)).collect();
    let x2: Vec<usize> = (0..d).map(|c| v(0, c)).collect();
    (
        2 * d * d,
        gens,
        vec![op_from(&z1, Pauli::Z), op_from(&z2, Pauli::Z)],
        vec![op_from(&x1, Pauli::X), op_from(&x2, Pauli::X)],
    )
}

/// Distance-d repetition code: Z_i Z_{i+1} checks, bit-flip protection only.
fn repetition(d: usize) -> FamilyParts {
    let gens = (0..d - 1)
        .map(|i| Generator {
            op: op_from(&[i, i + 1], Pauli::Z),
            kind: StabKind::Z,
            coord: (0, i),
        })
        .collect();
    let logical_x: Vec<usize> = (0..d).collect();
    (
        d,
        gens,
        vec![PauliOp::single(0, Pauli::Z)],
        vec![op_from(&logical_x, Pauli::X)],
    )
}
