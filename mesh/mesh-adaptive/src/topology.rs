//! Triangle and edge records, and the length-ordered edge queue.

use smallvec::SmallVec;

use crate::index::{EdgeIdx, MeshIdx, PositionIdx, TriangleIdx, VertexIdx};

/// A triangle tracked by the engine.
///
/// Triangles are never edited in place once inserted: a split marks the
/// parent excluded and appends its children.
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) vertices: [VertexIdx; 3],
    pub(crate) mesh: MeshIdx,
    pub(crate) visible: bool,
    pub(crate) excluded: bool,
    /// Edge of side `k`, running from corner `k` to corner `k + 1`.
    /// `None` when the side is below the length threshold or its edge died.
    pub(crate) edges: [Option<EdgeIdx>; 3],
}

impl Face {
    pub(crate) const fn new(vertices: [VertexIdx; 3], mesh: MeshIdx, visible: bool) -> Self {
        Self {
            vertices,
            mesh,
            visible,
            excluded: false,
            edges: [None; 3],
        }
    }

    /// Corner vertices in winding order.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> [VertexIdx; 3] {
        self.vertices
    }

    /// Sub-mesh this triangle is written back to.
    #[inline]
    #[must_use]
    pub const fn mesh(&self) -> MeshIdx {
        self.mesh
    }

    /// Whether the visibility oracle accepted this triangle and every ancestor.
    #[inline]
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the triangle has been superseded by a split.
    #[inline]
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Edges currently linked to the triangle's three sides.
    #[inline]
    #[must_use]
    pub const fn edges(&self) -> [Option<EdgeIdx>; 3] {
        self.edges
    }

    /// Live and visible: the only triangles that keep an edge alive.
    #[inline]
    pub(crate) const fn is_refinable(&self) -> bool {
        self.visible && !self.excluded
    }

    /// Forget `edge` on whichever side refers to it.
    pub(crate) fn unlink(&mut self, edge: EdgeIdx) {
        for slot in &mut self.edges {
            if *slot == Some(edge) {
                *slot = None;
            }
        }
    }
}

/// An unordered position pair with its cached length and sharing triangles.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Endpoints, lower position index first.
    pub(crate) positions: (PositionIdx, PositionIdx),
    pub(crate) length: f64,
    pub(crate) triangles: SmallVec<[TriangleIdx; 2]>,
}

impl Edge {
    /// Endpoints, lower position index first.
    #[inline]
    #[must_use]
    pub const fn positions(&self) -> (PositionIdx, PositionIdx) {
        self.positions
    }

    /// Length as measured by the edge metric when the edge was created.
    #[inline]
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Triangles that have referenced this edge, excluded ones included.
    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[TriangleIdx] {
        &self.triangles
    }
}

/// Order a position pair so the same edge has one key in either direction.
#[inline]
pub(crate) fn edge_key(a: PositionIdx, b: PositionIdx) -> (PositionIdx, PositionIdx) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Edge arena plus the working set sorted ascending by length.
///
/// The longest edge is always last. Arena slots are never reused; dead edges
/// stay in the arena, unqueued, until the next rebuild.
#[derive(Debug, Clone, Default)]
pub(crate) struct EdgeQueue {
    arena: Vec<Edge>,
    queued: Vec<EdgeIdx>,
}

impl EdgeQueue {
    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.queued.clear();
    }

    #[inline]
    pub(crate) fn get(&self, idx: EdgeIdx) -> &Edge {
        &self.arena[idx.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, idx: EdgeIdx) -> &mut Edge {
        &mut self.arena[idx.index()]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.queued.len()
    }

    /// Queued edges, shortest first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        self.queued.iter().copied()
    }

    /// Length of the longest queued edge, or 0 if the queue is empty.
    pub(crate) fn longest(&self) -> f64 {
        self.queued
            .last()
            .map_or(0.0, |&idx| self.arena[idx.index()].length)
    }

    /// Take the longest queued edge out of the working set.
    pub(crate) fn pop(&mut self) -> Option<EdgeIdx> {
        self.queued.pop()
    }

    /// First queue slot holding an edge of at least `length`.
    fn lower_bound(&self, length: f64) -> usize {
        self.queued
            .partition_point(|&idx| self.arena[idx.index()].length < length)
    }

    /// Link `triangle` to the edge `key` measuring `length`.
    ///
    /// An already queued edge with the same endpoints is found by scanning the
    /// run of equal-length entries; otherwise a new edge is created and queued
    /// at the end of that run. Lengths compare exactly: the metric is
    /// deterministic per pair.
    #[allow(clippy::float_cmp)]
    pub(crate) fn link(
        &mut self,
        key: (PositionIdx, PositionIdx),
        length: f64,
        triangle: TriangleIdx,
    ) -> EdgeIdx {
        let mut slot = self.lower_bound(length);
        while let Some(&idx) = self.queued.get(slot) {
            let edge = &mut self.arena[idx.index()];
            if edge.length != length {
                break;
            }
            if edge.positions == key {
                edge.triangles.push(triangle);
                return idx;
            }
            slot += 1;
        }

        let idx = EdgeIdx::from_usize(self.arena.len());
        let mut triangles = SmallVec::new();
        triangles.push(triangle);
        self.arena.push(Edge {
            positions: key,
            length,
            triangles,
        });
        self.queued.insert(slot, idx);
        idx
    }

    /// Remove one edge from the working set by locating it in its length run.
    pub(crate) fn remove(&mut self, idx: EdgeIdx) -> bool {
        let length = self.arena[idx.index()].length;
        let start = self.lower_bound(length);
        let found = self.queued[start..]
            .iter()
            .position(|&q| q == idx);
        match found {
            Some(offset) => {
                self.queued.remove(start + offset);
                true
            }
            None => false,
        }
    }

    /// Remove every edge `dead` accepts in a single pass.
    pub(crate) fn remove_where(&mut self, mut dead: impl FnMut(EdgeIdx) -> bool) {
        self.queued.retain(|&idx| !dead(idx));
    }
}
