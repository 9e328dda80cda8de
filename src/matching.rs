//! Minimum-weight pairing of syndrome defects.
//!
//! A decoding graph hands over an even set of nodes and a menu of weighted
//! edges, and the decoder has to pick the cheapest way to pair every node
//! off. That is minimum-weight perfect matching, solved here with Edmonds'
//! blossom method in its primal-dual formulation (Galil, ACM Computing
//! Surveys 18, 1986).
//!
//! The matcher keeps vertex duals doubled so every edge slack stays an
//! integer, contracts odd alternating cycles into blossom nodes, and runs
//! in O(V^3). Minimisation works by reflecting weights off their maximum:
//! a maximum-cardinality maximum-weight search on the reflected graph
//! returns the cheapest perfect matching on the real one. All scans run
//! in fixed index order, so equal-weight ties resolve identically on
//! every run.

use tracing::debug;

use crate::error::{QecError, QecResult};
use crate::graph::DecodingGraph;

/// Sentinel for "no vertex / no edge / no blossom".
const NONE: usize = usize::MAX;

/// A perfect pairing of decoding-graph nodes.
///
/// Node indices follow the graph that produced the matching: real defects
/// first, their virtual boundary twins after them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    mate: Vec<Option<usize>>,
}

impl Matching {
    /// Number of nodes covered by the matching.
    pub fn len(&self) -> usize {
        self.mate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mate.is_empty()
    }

    /// The node paired with `node`, if `node` is in range.
    pub fn partner(&self, node: usize) -> Option<usize> {
        self.mate.get(node).copied().flatten()
    }

    /// All matched pairs as `(low, high)` index tuples in ascending order.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.mate.len() / 2);
        for (v, partner) in self.mate.iter().enumerate() {
            if let Some(w) = *partner {
                if v < w {
                    out.push((v, w));
                }
            }
        }
        out
    }
}

/// Pair off every node of `graph` at minimum total edge weight.
///
/// Every graph the builder produces admits a perfect matching: open
/// boundaries give each defect a virtual twin and periodic histories are
/// chunked on even defect parity. A graph that breaks that contract is
/// reported as [`QecError::NoPerfectMatching`] instead of being silently
/// half-paired.
pub fn decode(graph: &DecodingGraph) -> QecResult<Matching> {
    let n = graph.num_nodes();
    if n == 0 {
        return Ok(Matching { mate: Vec::new() });
    }
    if n % 2 != 0 {
        return Err(QecError::NoPerfectMatching {
            nodes: n,
            reason: "odd number of nodes".into(),
        });
    }
    // Reflect weights off their maximum so that maximising the reflected
    // total minimises the real one; every perfect matching holds exactly
    // n/2 edges, so the constant shift cancels. The +2 keeps reflected
    // weights positive and even.
    let top = graph.edges().iter().map(|e| e.weight).max().unwrap_or(0);
    let edges: Vec<(usize, usize, i64)> = graph
        .edges()
        .iter()
        .map(|e| (e.a, e.b, top + 2 - e.weight))
        .collect();
    debug!(nodes = n, edges = edges.len(), "pairing defects");
    let mate = BlossomMatcher::new(n, edges).solve();

    let mut paired = vec![None; n];
    for (v, &m) in mate.iter().enumerate() {
        if m != NONE {
            paired[v] = Some(m);
        }
    }
    if let Some(v) = paired.iter().position(|p| p.is_none()) {
        return Err(QecError::NoPerfectMatching {
            nodes: n,
            reason: format!("node {v} has no partner"),
        });
    }
    Ok(Matching { mate: paired })
}

/// Maximum-weight maximum-cardinality matcher over an explicit edge list.
///
/// Blossoms occupy the index range `n..2n` on top of the trivial vertex
/// blossoms `0..n`. Edge `k` owns the two endpoints `2k` (facing its
/// first vertex) and `2k + 1` (facing its second); `p ^ 1` is always the
/// opposite end of the endpoint `p`.
struct BlossomMatcher {
    nvertex: usize,
    edges: Vec<(usize, usize, i64)>,
    /// Vertex attached to each endpoint.
    endpoint: Vec<usize>,
    /// Remote endpoints of the edges incident to each vertex.
    neighbend: Vec<Vec<usize>>,
    /// Remote endpoint of each vertex's matched edge.
    mate: Vec<usize>,
    /// 0 free, 1 S, 2 T; bit 4 marks breadcrumbs while tracing.
    label: Vec<u8>,
    /// Remote endpoint of the edge through which a label arrived.
    labelend: Vec<usize>,
    /// Top-level blossom containing each vertex.
    inblossom: Vec<usize>,
    blossomparent: Vec<usize>,
    /// Sub-blossoms in cycle order, base first; empty for trivial slots.
    blossomchilds: Vec<Vec<usize>>,
    blossombase: Vec<usize>,
    /// Connecting endpoints between consecutive children of a blossom.
    blossomendps: Vec<Vec<usize>>,
    /// Least-slack edge candidates feeding the dual updates.
    bestedge: Vec<usize>,
    blossombestedges: Vec<Option<Vec<usize>>>,
    unusedblossoms: Vec<usize>,
    /// Doubled vertex duals followed by blossom duals.
    dualvar: Vec<i64>,
    /// Edges known to have zero slack.
    allowedge: Vec<bool>,
    queue: Vec<usize>,
}

impl BlossomMatcher {
    fn new(nvertex: usize, edges: Vec<(usize, usize, i64)>) -> Self {
        let nedge = edges.len();
        let maxweight = edges.iter().map(|&(_, _, w)| w).max().unwrap_or(0).max(0);
        let mut endpoint = Vec::with_capacity(2 * nedge);
        let mut neighbend = vec![Vec::new(); nvertex];
        for (k, &(i, j, _)) in edges.iter().enumerate() {
            debug_assert!(i < nvertex && j < nvertex && i != j);
            endpoint.push(i);
            endpoint.push(j);
            neighbend[i].push(2 * k + 1);
            neighbend[j].push(2 * k);
        }
        BlossomMatcher {
            nvertex,
            edges,
            endpoint,
            neighbend,
            mate: vec![NONE; nvertex],
            label: vec![0; 2 * nvertex],
            labelend: vec![NONE; 2 * nvertex],
            inblossom: (0..nvertex).collect(),
            blossomparent: vec![NONE; 2 * nvertex],
            blossomchilds: vec![Vec::new(); 2 * nvertex],
            blossombase: (0..nvertex)
                .chain(std::iter::repeat(NONE).take(nvertex))
                .collect(),
            blossomendps: vec![Vec::new(); 2 * nvertex],
            bestedge: vec![NONE; 2 * nvertex],
            blossombestedges: vec![None; 2 * nvertex],
            unusedblossoms: (nvertex..2 * nvertex).collect(),
            dualvar: std::iter::repeat(maxweight)
                .take(nvertex)
                .chain(std::iter::repeat(0).take(nvertex))
                .collect(),
            allowedge: vec![false; nedge],
            queue: Vec::new(),
        }
    }

    /// Doubled slack of edge `k`. Not meaningful for edges inside blossoms.
    fn slack(&self, k: usize) -> i64 {
        let (i, j, wt) = self.edges[k];
        self.dualvar[i] + self.dualvar[j] - 2 * wt
    }

    fn blossom_leaves(&self, b: usize, out: &mut Vec<usize>) {
        if b < self.nvertex {
            out.push(b);
        } else {
            for &child in &self.blossomchilds[b] {
                self.blossom_leaves(child, out);
            }
        }
    }

    /// Label the top-level blossom holding `w`, recording arrival endpoint
    /// `p`. An S-label enqueues every leaf for scanning; a T-label
    /// immediately S-labels the mate of the blossom base.
    fn assign_label(&mut self, w: usize, t: u8, p: usize) {
        let b = self.inblossom[w];
        debug_assert!(self.label[w] == 0 && self.label[b] == 0);
        self.label[w] = t;
        self.label[b] = t;
        self.labelend[w] = p;
        self.labelend[b] = p;
        self.bestedge[w] = NONE;
        self.bestedge[b] = NONE;
        if t == 1 {
            let mut leaves = Vec::new();
            self.blossom_leaves(b, &mut leaves);
            self.queue.extend(leaves);
        } else if t == 2 {
            let base = self.blossombase[b];
            debug_assert!(self.mate[base] != NONE);
            let mate_end = self.mate[base];
            self.assign_label(self.endpoint[mate_end], 1, mate_end ^ 1);
        }
    }

    /// Trace back from `v` and `w` towards their tree roots. Returns the
    /// base of the first blossom common to both paths, or `None` when the
    /// roots differ and the connecting edge closes an augmenting path.
    fn scan_blossom(&mut self, v: usize, w: usize) -> Option<usize> {
        let mut v = v;
        let mut w = w;
        let mut path = Vec::new();
        let mut base = NONE;
        while v != NONE || w != NONE {
            let mut b = self.inblossom[v];
            if self.label[b] & 4 != 0 {
                base = self.blossombase[b];
                break;
            }
            debug_assert_eq!(self.label[b], 1);
            path.push(b);
            self.label[b] = 5;
            debug_assert_eq!(self.labelend[b], self.mate[self.blossombase[b]]);
            if self.labelend[b] == NONE {
                // Root of this tree is a single vertex.
                v = NONE;
            } else {
                v = self.endpoint[self.labelend[b]];
                b = self.inblossom[v];
                debug_assert_eq!(self.label[b], 2);
                debug_assert!(self.labelend[b] != NONE);
                v = self.endpoint[self.labelend[b]];
            }
            // Alternate between the two paths.
            if w != NONE {
                std::mem::swap(&mut v, &mut w);
            }
        }
        for b in path {
            self.label[b] = 1;
        }
        if base == NONE {
            None
        } else {
            Some(base)
        }
    }

    /// Contract the odd cycle closed by edge `k` into a fresh blossom
    /// rooted at `base`, relabelling its T-vertices as S.
    fn add_blossom(&mut self, base: usize, k: usize) {
        let (mut v, mut w, _) = self.edges[k];
        let bb = self.inblossom[base];
        let mut bv = self.inblossom[v];
        let mut bw = self.inblossom[w];
        let b = match self.unusedblossoms.pop() {
            Some(b) => b,
            None => unreachable!("blossom pool exhausted"),
        };
        self.blossombase[b] = base;
        self.blossomparent[b] = NONE;
        self.blossomparent[bb] = b;
        // Collect the cycle: up from v, across edge k, down from w.
        let mut path = Vec::new();
        let mut endps = Vec::new();
        while bv != bb {
            self.blossomparent[bv] = b;
            path.push(bv);
            endps.push(self.labelend[bv]);
            debug_assert!(
                self.label[bv] == 2
                    || (self.label[bv] == 1
                        && self.labelend[bv] == self.mate[self.blossombase[bv]])
            );
            debug_assert!(self.labelend[bv] != NONE);
            v = self.endpoint[self.labelend[bv]];
            bv = self.inblossom[v];
        }
        path.push(bb);
        path.reverse();
        endps.reverse();
        endps.push(2 * k);
        while bw != bb {
            self.blossomparent[bw] = b;
            path.push(bw);
            endps.push(self.labelend[bw] ^ 1);
            debug_assert!(
                self.label[bw] == 2
                    || (self.label[bw] == 1
                        && self.labelend[bw] == self.mate[self.blossombase[bw]])
            );
            debug_assert!(self.labelend[bw] != NONE);
            w = self.endpoint[self.labelend[bw]];
            bw = self.inblossom[w];
        }
        debug_assert_eq!(self.label[bb], 1);
        self.label[b] = 1;
        self.labelend[b] = self.labelend[bb];
        self.dualvar[b] = 0;
        self.blossomchilds[b] = path;
        self.blossomendps[b] = endps;
        // Fold every leaf into the new blossom; former T-leaves turn S and
        // join the scan queue.
        let mut leaves = Vec::new();
        self.blossom_leaves(b, &mut leaves);
        for leaf in leaves {
            if self.label[self.inblossom[leaf]] == 2 {
                self.queue.push(leaf);
            }
            self.inblossom[leaf] = b;
        }
        // Merge the children's least-slack edge lists.
        let mut bestedgeto = vec![NONE; 2 * self.nvertex];
        let childs = self.blossomchilds[b].clone();
        for bv in childs {
            let lists: Vec<Vec<usize>> = match self.blossombestedges[bv].take() {
                Some(list) => vec![list],
                None => {
                    let mut lv = Vec::new();
                    self.blossom_leaves(bv, &mut lv);
                    lv.iter()
                        .map(|&leaf| self.neighbend[leaf].iter().map(|&p| p / 2).collect())
                        .collect()
                }
            };
            for list in lists {
                for k2 in list {
                    let (ei, ej, _) = self.edges[k2];
                    let j = if self.inblossom[ej] == b { ei } else { ej };
                    let bj = self.inblossom[j];
                    if bj != b
                        && self.label[bj] == 1
                        && (bestedgeto[bj] == NONE
                            || self.slack(k2) < self.slack(bestedgeto[bj]))
                    {
                        bestedgeto[bj] = k2;
                    }
                }
            }
            self.bestedge[bv] = NONE;
        }
        let best: Vec<usize> = bestedgeto.into_iter().filter(|&e| e != NONE).collect();
        self.bestedge[b] = NONE;
        for &k2 in &best {
            if self.bestedge[b] == NONE || self.slack(k2) < self.slack(self.bestedge[b]) {
                self.bestedge[b] = k2;
            }
        }
        self.blossombestedges[b] = Some(best);
    }

    /// Undo a blossom contraction. During a stage (`endstage` false) the
    /// T-blossom's children are relabelled so the alternating tree stays
    /// intact; at end of stage the contents are simply released.
    fn expand_blossom(&mut self, b: usize, endstage: bool) {
        let childs = std::mem::take(&mut self.blossomchilds[b]);
        let endps = std::mem::take(&mut self.blossomendps[b]);
        for &s in &childs {
            self.blossomparent[s] = NONE;
            if s < self.nvertex {
                self.inblossom[s] = s;
            } else if endstage && self.dualvar[s] == 0 {
                // Zero dual means the sub-blossom no longer pays for its
                // contraction; unpack it as well.
                self.expand_blossom(s, endstage);
            } else {
                let mut leaves = Vec::new();
                self.blossom_leaves(s, &mut leaves);
                for leaf in leaves {
                    self.inblossom[leaf] = s;
                }
            }
        }
        if !endstage && self.label[b] == 2 {
            // Walk from the entry child around to the base, relabelling
            // alternate children as T and marking the crossed edges allowed.
            debug_assert!(self.labelend[b] != NONE);
            let entrychild = self.inblossom[self.endpoint[self.labelend[b] ^ 1]];
            let mut j = child_index(&childs, entrychild) as i64;
            let (jstep, endptrick): (i64, usize) = if j & 1 != 0 {
                // Odd entry: go forward and wrap around.
                j -= childs.len() as i64;
                (1, 0)
            } else {
                (-1, 1)
            };
            let mut p = self.labelend[b];
            while j != 0 {
                let q = wrap(&endps, j - endptrick as i64);
                let vt = self.endpoint[p ^ 1];
                self.label[vt] = 0;
                self.label[self.endpoint[q ^ endptrick ^ 1]] = 0;
                self.assign_label(vt, 2, p);
                self.allowedge[q / 2] = true;
                j += jstep;
                p = wrap(&endps, j - endptrick as i64) ^ endptrick;
                self.allowedge[p / 2] = true;
                j += jstep;
            }
            // The base child keeps label T without growing through its mate.
            let bv = childs[0];
            let vt = self.endpoint[p ^ 1];
            self.label[vt] = 2;
            self.label[bv] = 2;
            self.labelend[vt] = p;
            self.labelend[bv] = p;
            self.bestedge[bv] = NONE;
            // Children on the far side of the base either picked up a label
            // from outside or revert to free.
            j += jstep;
            while wrap(&childs, j) != entrychild {
                let bv = wrap(&childs, j);
                if self.label[bv] == 1 {
                    j += jstep;
                    continue;
                }
                let mut leaves = Vec::new();
                self.blossom_leaves(bv, &mut leaves);
                if let Some(v) = leaves.into_iter().find(|&v| self.label[v] != 0) {
                    debug_assert_eq!(self.label[v], 2);
                    debug_assert_eq!(self.inblossom[v], bv);
                    self.label[v] = 0;
                    let base_mate = self.mate[self.blossombase[bv]];
                    self.label[self.endpoint[base_mate]] = 0;
                    let le = self.labelend[v];
                    self.assign_label(v, 2, le);
                }
                j += jstep;
            }
        }
        // Recycle the blossom slot.
        self.label[b] = 0;
        self.labelend[b] = NONE;
        self.blossombase[b] = NONE;
        self.blossombestedges[b] = None;
        self.bestedge[b] = NONE;
        self.unusedblossoms.push(b);
    }

    /// Promote `v` to the base of blossom `b` by flipping matched and
    /// unmatched edges along the even-length path between them, recursing
    /// into any sub-blossom the path crosses.
    fn augment_blossom(&mut self, b: usize, v: usize) {
        let mut t = v;
        while self.blossomparent[t] != b {
            t = self.blossomparent[t];
        }
        if t >= self.nvertex {
            self.augment_blossom(t, v);
        }
        let childs = self.blossomchilds[b].clone();
        let endps = self.blossomendps[b].clone();
        let i = child_index(&childs, t);
        let mut j = i as i64;
        let (jstep, endptrick): (i64, usize) = if i & 1 != 0 {
            j -= childs.len() as i64;
            (1, 0)
        } else {
            (-1, 1)
        };
        while j != 0 {
            j += jstep;
            let child = wrap(&childs, j);
            let p = wrap(&endps, j - endptrick as i64) ^ endptrick;
            if child >= self.nvertex {
                let entry = self.endpoint[p];
                self.augment_blossom(child, entry);
            }
            j += jstep;
            let child = wrap(&childs, j);
            if child >= self.nvertex {
                let entry = self.endpoint[p ^ 1];
                self.augment_blossom(child, entry);
            }
            // Match the edge connecting those two children.
            self.mate[self.endpoint[p]] = p ^ 1;
            self.mate[self.endpoint[p ^ 1]] = p;
        }
        self.blossomchilds[b].rotate_left(i);
        self.blossomendps[b].rotate_left(i);
        self.blossombase[b] = self.blossombase[self.blossomchilds[b][0]];
        debug_assert_eq!(self.blossombase[b], v);
    }

    /// Flip matched and unmatched edges along the augmenting path that
    /// closes through edge `k`, walking both alternating trees down to
    /// their roots.
    fn augment_matching(&mut self, k: usize) {
        let (v, w, _) = self.edges[k];
        for (start, start_end) in [(v, 2 * k + 1), (w, 2 * k)] {
            let mut s = start;
            let mut p = start_end;
            loop {
                let bs = self.inblossom[s];
                debug_assert_eq!(self.label[bs], 1);
                debug_assert_eq!(self.labelend[bs], self.mate[self.blossombase[bs]]);
                if bs >= self.nvertex {
                    self.augment_blossom(bs, s);
                }
                self.mate[s] = p;
                if self.labelend[bs] == NONE {
                    // Reached the root of this tree.
                    break;
                }
                let t = self.endpoint[self.labelend[bs]];
                let bt = self.inblossom[t];
                debug_assert_eq!(self.label[bt], 2);
                debug_assert!(self.labelend[bt] != NONE);
                s = self.endpoint[self.labelend[bt]];
                let j = self.endpoint[self.labelend[bt] ^ 1];
                debug_assert_eq!(self.blossombase[bt], t);
                if bt >= self.nvertex {
                    self.augment_blossom(bt, j);
                }
                self.mate[j] = self.labelend[bt];
                p = self.labelend[bt] ^ 1;
            }
        }
    }

    /// Run stages until no augmenting path remains, then report the vertex
    /// matched to each vertex (`NONE` for unmatched ones).
    fn solve(mut self) -> Vec<usize> {
        // Each stage either augments the matching by one edge or proves it
        // maximum.
        for _ in 0..self.nvertex {
            for l in &mut self.label {
                *l = 0;
            }
            for e in &mut self.bestedge {
                *e = NONE;
            }
            for be in &mut self.blossombestedges[self.nvertex..] {
                *be = None;
            }
            for a in &mut self.allowedge {
                *a = false;
            }
            self.queue.clear();
            for v in 0..self.nvertex {
                if self.mate[v] == NONE && self.label[self.inblossom[v]] == 0 {
                    self.assign_label(v, 1, NONE);
                }
            }
            let mut augmented = false;
            loop {
                // Grow alternating trees from every single vertex until an
                // augmenting path appears or the trees saturate.
                while !augmented {
                    let v = match self.queue.pop() {
                        Some(v) => v,
                        None => break,
                    };
                    debug_assert_eq!(self.label[self.inblossom[v]], 1);
                    for idx in 0..self.neighbend[v].len() {
                        let p = self.neighbend[v][idx];
                        let k = p / 2;
                        let w = self.endpoint[p];
                        if self.inblossom[v] == self.inblossom[w] {
                            continue;
                        }
                        let kslack = if self.allowedge[k] {
                            0
                        } else {
                            let s = self.slack(k);
                            if s <= 0 {
                                self.allowedge[k] = true;
                            }
                            s
                        };
                        if self.allowedge[k] {
                            let bw = self.inblossom[w];
                            if self.label[bw] == 0 {
                                // Free vertex: adopt it as a T-vertex.
                                self.assign_label(w, 2, p ^ 1);
                            } else if self.label[bw] == 1 {
                                // S-S edge: either a new blossom or an
                                // augmenting path between two trees.
                                match self.scan_blossom(v, w) {
                                    Some(base) => self.add_blossom(base, k),
                                    None => {
                                        self.augment_matching(k);
                                        augmented = true;
                                        break;
                                    }
                                }
                            } else if self.label[w] == 0 {
                                // Unreached vertex inside a T-blossom; note
                                // how it was reached for a later expansion.
                                debug_assert_eq!(self.label[bw], 2);
                                self.label[w] = 2;
                                self.labelend[w] = p ^ 1;
                            }
                        } else if self.label[self.inblossom[w]] == 1 {
                            let bv = self.inblossom[v];
                            if self.bestedge[bv] == NONE
                                || kslack < self.slack(self.bestedge[bv])
                            {
                                self.bestedge[bv] = k;
                            }
                        } else if self.label[w] == 0 {
                            if self.bestedge[w] == NONE
                                || kslack < self.slack(self.bestedge[w])
                            {
                                self.bestedge[w] = k;
                            }
                        }
                    }
                }
                if augmented {
                    break;
                }

                // No augmenting path under the current duals; shift them by
                // the tightest constraint and retry.
                let mut deltatype = 0u8;
                let mut delta = 0;
                let mut deltaedge = NONE;
                let mut deltablossom = NONE;

                // Tightest edge from an S-vertex to a free vertex.
                for v in 0..self.nvertex {
                    if self.label[self.inblossom[v]] == 0 && self.bestedge[v] != NONE {
                        let d = self.slack(self.bestedge[v]);
                        if deltatype == 0 || d < delta {
                            delta = d;
                            deltatype = 2;
                            deltaedge = self.bestedge[v];
                        }
                    }
                }
                // Half the tightest S-S edge; the slack stays even because
                // doubled duals only ever move in matching parity.
                for b in 0..2 * self.nvertex {
                    if self.blossomparent[b] == NONE
                        && self.label[b] == 1
                        && self.bestedge[b] != NONE
                    {
                        let kslack = self.slack(self.bestedge[b]);
                        debug_assert_eq!(kslack % 2, 0);
                        let d = kslack / 2;
                        if deltatype == 0 || d < delta {
                            delta = d;
                            deltatype = 3;
                            deltaedge = self.bestedge[b];
                        }
                    }
                }
                // Cheapest T-blossom to expand.
                for b in self.nvertex..2 * self.nvertex {
                    if self.blossombase[b] != NONE
                        && self.blossomparent[b] == NONE
                        && self.label[b] == 2
                        && (deltatype == 0 || self.dualvar[b] < delta)
                    {
                        delta = self.dualvar[b];
                        deltatype = 4;
                        deltablossom = b;
                    }
                }
                if deltatype == 0 {
                    // Saturated: take the final dual step that certifies the
                    // maximum-cardinality optimum.
                    deltatype = 1;
                    delta = self.dualvar[..self.nvertex]
                        .iter()
                        .copied()
                        .min()
                        .unwrap_or(0)
                        .max(0);
                }

                for v in 0..self.nvertex {
                    match self.label[self.inblossom[v]] {
                        1 => self.dualvar[v] -= delta,
                        2 => self.dualvar[v] += delta,
                        _ => {}
                    }
                }
                for b in self.nvertex..2 * self.nvertex {
                    if self.blossombase[b] != NONE && self.blossomparent[b] == NONE {
                        match self.label[b] {
                            1 => self.dualvar[b] += delta,
                            2 => self.dualvar[b] -= delta,
                            _ => {}
                        }
                    }
                }

                match deltatype {
                    1 => break,
                    2 => {
                        // The now-tight edge reaches a free vertex.
                        self.allowedge[deltaedge] = true;
                        let (i, j, _) = self.edges[deltaedge];
                        let v = if self.label[self.inblossom[i]] == 0 { j } else { i };
                        debug_assert_eq!(self.label[self.inblossom[v]], 1);
                        self.queue.push(v);
                    }
                    3 => {
                        // The now-tight edge joins two S-blossoms.
                        self.allowedge[deltaedge] = true;
                        let (i, _, _) = self.edges[deltaedge];
                        debug_assert_eq!(self.label[self.inblossom[i]], 1);
                        self.queue.push(i);
                    }
                    _ => self.expand_blossom(deltablossom, false),
                }
            }
            if !augmented {
                break;
            }
            // End of stage: S-blossoms with zero dual will not survive the
            // label reset, unpack them now.
            for b in self.nvertex..2 * self.nvertex {
                if self.blossomparent[b] == NONE
                    && self.blossombase[b] != NONE
                    && self.label[b] == 1
                    && self.dualvar[b] == 0
                {
                    self.expand_blossom(b, true);
                }
            }
        }
        // Convert remote endpoints into plain vertex indices.
        for v in 0..self.nvertex {
            if self.mate[v] != NONE {
                self.mate[v] = self.endpoint[self.mate[v]];
            }
        }
        for v in 0..self.nvertex {
            debug_assert!(self.mate[v] == NONE || self.mate[self.mate[v]] == v);
        }
        self.mate
    }
}

/// Position of `child` in its parent's cycle list.
fn child_index(childs: &[usize], child: usize) -> usize {
    match childs.iter().position(|&c| c == child) {
        Some(i) => i,
        None => unreachable!("sub-blossom not recorded in its parent"),
    }
}

/// Cyclic list indexing; negative offsets count from the end.
fn wrap(list: &[usize], j: i64) -> usize {
    let n = list.len() as i64;
    list[(((j % n) + n) % n) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf2::BitRow;
    use crate::graph::{DecoderConfig, DecodingGraph, GraphEdge, Weighting};
    use crate::layout::{CodeFamily, CodeLayout, StabKind};
    use crate::noise::NoiseConfig;
    use crate::pauli::Pauli;
    use crate::syndrome::{Syndrome, SyndromeExtractor};
    use crate::tableau::StabilizerTableau;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn run_matcher(n: usize, edges: &[(usize, usize, i64)]) -> Vec<Option<usize>> {
        BlossomMatcher::new(n, edges.to_vec())
            .solve()
            .into_iter()
            .map(|m| if m == NONE { None } else { Some(m) })
            .collect()
    }

    /// Cardinality and total weight of a matching, panicking on anything
    /// that is not a valid matching over the given edges.
    fn score(mate: &[Option<usize>], edges: &[(usize, usize, i64)]) -> (usize, i64) {
        let mut wt = HashMap::new();
        for &(i, j, w) in edges {
            wt.insert((i.min(j), i.max(j)), w);
        }
        let mut cardinality = 0;
        let mut total = 0;
        for (v, m) in mate.iter().enumerate() {
            if let Some(w) = *m {
                assert_eq!(mate[w], Some(v), "matching must be symmetric");
                if v < w {
                    let weight = wt.get(&(v, w)).copied();
                    assert!(weight.is_some(), "matched pair {v}-{w} must be an edge");
                    cardinality += 1;
                    total += weight.unwrap();
                }
            }
        }
        (cardinality, total)
    }

    /// Exhaustive best matching by (cardinality, weight), for cross-checks.
    fn brute_best(n: usize, edges: &[(usize, usize, i64)]) -> (usize, i64) {
        fn go(adj: &[Vec<(usize, i64)>], used: &mut [bool], v: usize) -> (usize, i64) {
            if v == adj.len() {
                return (0, 0);
            }
            if used[v] {
                return go(adj, used, v + 1);
            }
            let mut best = go(adj, used, v + 1);
            for idx in 0..adj[v].len() {
                let (w, wt) = adj[v][idx];
                if w > v && !used[w] {
                    used[w] = true;
                    let (c, t) = go(adj, used, v + 1);
                    used[w] = false;
                    if (c + 1, t + wt) > best {
                        best = (c + 1, t + wt);
                    }
                }
            }
            best
        }
        let mut adj = vec![Vec::new(); n];
        for &(i, j, w) in edges {
            adj[i].push((j, w));
            adj[j].push((i, w));
        }
        go(&adj, &mut vec![false; n], 0)
    }

    /// Exhaustive minimum-weight perfect matching over graph edges, or
    /// `None` when no perfect matching exists.
    fn brute_min_perfect(n: usize, edges: &[GraphEdge]) -> Option<i64> {
        fn go(wt: &[Vec<Option<i64>>], used: &mut [bool]) -> Option<i64> {
            let v = match used.iter().position(|u| !u) {
                Some(v) => v,
                None => return Some(0),
            };
            used[v] = true;
            let mut best: Option<i64> = None;
            for w in v + 1..wt.len() {
                if used[w] || wt[v][w].is_none() {
                    continue;
                }
                used[w] = true;
                if let Some(rest) = go(wt, used) {
                    let total = wt[v][w].unwrap() + rest;
                    best = Some(best.map_or(total, |b| b.min(total)));
                }
                used[w] = false;
            }
            used[v] = false;
            best
        }
        let mut wt = vec![vec![None; n]; n];
        for e in edges {
            wt[e.a][e.b] = Some(e.weight);
            wt[e.b][e.a] = Some(e.weight);
        }
        go(&wt, &mut vec![false; n])
    }

    fn syndrome_with(defects: &[usize], len: usize) -> Syndrome {
        let mut bits = BitRow::zeros(len);
        for &d in defects {
            bits.set(d, true);
        }
        Syndrome::new(bits)
    }

    fn single_error_window(layout: &CodeLayout, qubit: usize, pauli: Pauli) -> Vec<Syndrome> {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut tableau = StabilizerTableau::new(layout.num_qubits());
        let mut ex = SyndromeExtractor::new(layout, &mut tableau, &mut rng).unwrap();
        tableau.apply_pauli(qubit, pauli).unwrap();
        vec![ex.extract_round(&mut tableau, 0.0, &mut rng).unwrap()]
    }

    #[test]
    fn test_matcher_single_edge() {
        assert_eq!(run_matcher(2, &[(0, 1, 2)]), vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_matcher_empty_edge_list() {
        assert_eq!(run_matcher(3, &[]), vec![None, None, None]);
    }

    #[test]
    fn test_matcher_prefers_heavier_of_two_sharing_a_vertex() {
        // Only one edge fits; the heavier one wins.
        let mate = run_matcher(3, &[(0, 1, 10), (1, 2, 11)]);
        assert_eq!(mate, vec![None, Some(2), Some(1)]);
    }

    #[test]
    fn test_matcher_cardinality_beats_weight() {
        // Two light edges cover all four vertices and beat the heavy one.
        let mate = run_matcher(4, &[(0, 1, 5), (1, 2, 11), (2, 3, 5)]);
        assert_eq!(mate, vec![Some(1), Some(0), Some(3), Some(2)]);
    }

    #[test]
    fn test_matcher_forms_blossom_then_matches_tail() {
        // The triangle 0-1-2 contracts into a blossom before the tail
        // vertex 3 forces the final pairing.
        let edges = [(0, 1, 8), (0, 2, 9), (1, 2, 10), (2, 3, 7)];
        let mate = run_matcher(4, &edges);
        assert_eq!(mate, vec![Some(1), Some(0), Some(3), Some(2)]);
    }

    #[test]
    fn test_matcher_augments_through_blossom() {
        // Unique maximum-cardinality answer: the pendants at 5 and 4 pin
        // both triangle exits.
        let edges = [
            (0, 1, 8),
            (0, 2, 9),
            (1, 2, 10),
            (2, 3, 7),
            (0, 5, 5),
            (3, 4, 6),
        ];
        let mate = run_matcher(6, &edges);
        assert_eq!(
            mate,
            vec![Some(5), Some(2), Some(1), Some(4), Some(3), Some(0)]
        );
    }

    #[test]
    fn test_matcher_expands_t_blossoms() {
        // Weight patterns that force a blossom to form, pick up label T in
        // a later stage and expand again mid-stage.
        let cases: [&[(usize, usize, i64)]; 3] = [
            &[
                (0, 1, 45),
                (0, 4, 45),
                (1, 2, 50),
                (2, 3, 45),
                (3, 4, 50),
                (0, 5, 30),
                (2, 8, 35),
                (3, 7, 35),
                (4, 6, 26),
                (8, 9, 5),
            ],
            &[
                (0, 1, 45),
                (0, 4, 45),
                (1, 2, 50),
                (2, 3, 45),
                (3, 4, 50),
                (0, 5, 30),
                (2, 8, 35),
                (3, 7, 26),
                (4, 6, 40),
                (8, 9, 5),
            ],
            &[
                (0, 1, 45),
                (0, 4, 45),
                (1, 2, 50),
                (2, 3, 45),
                (3, 4, 50),
                (0, 5, 30),
                (2, 8, 35),
                (3, 7, 28),
                (4, 6, 26),
                (8, 9, 5),
            ],
        ];
        for (idx, edges) in cases.iter().enumerate() {
            let mate = run_matcher(10, edges);
            assert_eq!(
                score(&mate, edges),
                brute_best(10, edges),
                "case {idx} disagrees with exhaustive search"
            );
        }
    }

    #[test]
    fn test_matcher_expands_nested_blossoms() {
        let edges = [
            (0, 1, 8),
            (0, 2, 8),
            (1, 2, 10),
            (1, 3, 12),
            (2, 4, 12),
            (3, 4, 14),
            (3, 5, 12),
            (4, 6, 12),
            (5, 6, 14),
            (6, 7, 12),
        ];
        let mate = run_matcher(8, &edges);
        assert_eq!(score(&mate, &edges), brute_best(8, &edges));
    }

    #[test]
    fn test_matcher_relabels_through_nested_expansion() {
        let edges = [
            (0, 1, 40),
            (0, 2, 40),
            (1, 2, 60),
            (1, 3, 55),
            (2, 4, 55),
            (3, 4, 50),
            (0, 7, 15),
            (4, 6, 30),
            (6, 5, 10),
            (7, 9, 10),
            (3, 8, 30),
        ];
        let mate = run_matcher(10, &edges);
        assert_eq!(score(&mate, &edges), brute_best(10, &edges));
    }

    #[test]
    fn test_matcher_leaves_isolated_vertices_unmatched() {
        let mate = run_matcher(4, &[(0, 1, 6)]);
        assert_eq!(mate, vec![Some(1), Some(0), None, None]);
    }

    #[test]
    fn test_matcher_random_graphs_agree_with_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..40 {
            let n = rng.gen_range(2..=8);
            let mut edges = Vec::new();
            for i in 0..n {
                for j in i + 1..n {
                    if rng.gen_bool(0.7) {
                        edges.push((i, j, 2 * rng.gen_range(0..=30)));
                    }
                }
            }
            let mate = run_matcher(n, &edges);
            assert_eq!(score(&mate, &edges), brute_best(n, &edges));
        }
    }

    #[test]
    fn test_decode_empty_graph() {
        let layout = CodeLayout::new(CodeFamily::RotatedSurface, 3).unwrap();
        let window = vec![syndrome_with(&[], 8)];
        let g = DecodingGraph::build(
            &window,
            StabKind::Z,
            &layout,
            &DecoderConfig::default(),
            &NoiseConfig::quiet(),
        )
        .unwrap();
        let matching = decode(&g).unwrap();
        assert!(matching.is_empty());
        assert!(matching.pairs().is_empty());
    }

    #[test]
    fn test_decode_pairs_adjacent_bulk_defects() {
        // An X error on the central qubit lights two plaquettes one hop
        // apart; pairing them directly is cheaper than two boundary exits.
        let layout = CodeLayout::new(CodeFamily::RotatedSurface, 3).unwrap();
        let window = single_error_window(&layout, 4, Pauli::X);
        let g = DecodingGraph::build(
            &window,
            StabKind::Z,
            &layout,
            &DecoderConfig::default(),
            &NoiseConfig::quiet(),
        )
        .unwrap();
        let matching = decode(&g).unwrap();
        assert_eq!(matching.len(), 4);
        assert_eq!(matching.pairs(), vec![(0, 1), (2, 3)]);
        assert_eq!(matching.partner(0), Some(1));
        assert_eq!(matching.partner(1), Some(0));
        assert_eq!(matching.partner(42), None);
    }

    #[test]
    fn test_decode_sends_far_defects_to_boundary() {
        // Defects four rounds and two hops apart: the direct edge costs 12
        // while two boundary exits cost 4.
        let layout = CodeLayout::new(CodeFamily::RotatedSurface, 3).unwrap();
        let m = layout.generators().len();
        let mut window = vec![syndrome_with(&[], m); 5];
        window[0] = syndrome_with(&[3], m);
        window[4] = syndrome_with(&[4], m);
        let g = DecodingGraph::build(
            &window,
            StabKind::Z,
            &layout,
            &DecoderConfig::default(),
            &NoiseConfig::quiet(),
        )
        .unwrap();
        let matching = decode(&g).unwrap();
        assert_eq!(matching.pairs(), vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_decode_rejects_odd_node_count() {
        // A periodic code has no boundary to absorb an odd defect.
        let layout = CodeLayout::new(CodeFamily::Toric, 2).unwrap();
        let m = layout.generators().len();
        let star = layout
            .generators()
            .iter()
            .position(|g| g.kind == StabKind::X)
            .unwrap();
        let window = vec![syndrome_with(&[star], m)];
        let g = DecodingGraph::build(
            &window,
            StabKind::X,
            &layout,
            &DecoderConfig::default(),
            &NoiseConfig::quiet(),
        )
        .unwrap();
        let err = decode(&g).unwrap_err();
        assert!(matches!(err, QecError::NoPerfectMatching { nodes: 1, .. }));
    }

    #[test]
    fn test_decode_matches_toric_pair_across_wrap() {
        // Stars (0,0) and (0,2) on a distance-3 torus touch through the
        // wrapped horizontal edge, so their defects sit one hop apart.
        let layout = CodeLayout::new(CodeFamily::Toric, 3).unwrap();
        let m = layout.generators().len();
        let stars: Vec<usize> = layout
            .generators()
            .iter()
            .enumerate()
            .filter(|(_, g)| g.kind == StabKind::X)
            .map(|(i, _)| i)
            .collect();
        let window = vec![syndrome_with(&[stars[0], stars[2]], m)];
        let g = DecodingGraph::build(
            &window,
            StabKind::X,
            &layout,
            &DecoderConfig::default(),
            &NoiseConfig::quiet(),
        )
        .unwrap();
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.edges().len(), 1);
        assert_eq!(g.edges()[0].weight, 2);
        let matching = decode(&g).unwrap();
        assert_eq!(matching.pairs(), vec![(0, 1)]);
    }

    #[test]
    fn test_decode_total_weight_is_minimal() {
        let layout = CodeLayout::new(CodeFamily::RotatedSurface, 3).unwrap();
        let m = layout.generators().len();
        let mut window = vec![syndrome_with(&[], m); 3];
        window[0] = syndrome_with(&[1, 6], m);
        window[2] = syndrome_with(&[3, 4], m);
        let noise = NoiseConfig::independent(0.08, 0.01, 0.02).with_measurement_flip(0.03);
        for weighting in [Weighting::Uniform, Weighting::LogLikelihood] {
            let config = DecoderConfig {
                weighting,
                window: None,
            };
            let g = DecodingGraph::build(&window, StabKind::Z, &layout, &config, &noise).unwrap();
            let matching = decode(&g).unwrap();
            let mut wt = HashMap::new();
            for e in g.edges() {
                wt.insert((e.a, e.b), e.weight);
            }
            let total: i64 = matching
                .pairs()
                .iter()
                .map(|&(a, b)| wt[&(a, b)])
                .sum();
            assert_eq!(
                Some(total),
                brute_min_perfect(g.num_nodes(), g.edges()),
                "{weighting:?} matching must hit the exhaustive minimum"
            );
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let layout = CodeLayout::new(CodeFamily::RotatedSurface, 3).unwrap();
        let m = layout.generators().len();
        let mut window = vec![syndrome_with(&[], m); 3];
        window[0] = syndrome_with(&[1, 6], m);
        window[1] = syndrome_with(&[4], m);
        window[2] = syndrome_with(&[3], m);
        let build = || {
            DecodingGraph::build(
                &window,
                StabKind::Z,
                &layout,
                &DecoderConfig::default(),
                &NoiseConfig::quiet(),
            )
            .unwrap()
        };
        let first = decode(&build()).unwrap();
        let second = decode(&build()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.pairs(), second.pairs());
    }
}
