//! The adaptive subdivision engine.

use hashbrown::HashSet;
use mesh_types::{PrimitiveType, RenderMesh, Triangle, Vertex};
use nalgebra::Point3;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::error::{AdaptiveError, AdaptiveResult};
use crate::index::{EdgeIdx, MeshIdx, PositionIdx, TriangleIdx, VertexIdx};
use crate::oracle::{EdgeMetric, VisibilityOracle};
use crate::params::{validate_edge_length, AdaptiveParams};
use crate::positions::PositionTable;
use crate::result::RefineOutcome;
use crate::topology::{edge_key, Edge, EdgeQueue, Face};

/// Edges touched by an operation, to be checked for death afterwards.
type DirtyEdges = HashSet<EdgeIdx>;

/// Midpoints created while splitting one edge.
///
/// All triangles on the edge share one new position. Each distinct vertex
/// pair gets its own midpoint vertex so attribute seams survive the split.
struct SplitMidpoints {
    edge: (PositionIdx, PositionIdx),
    position: Option<PositionIdx>,
    vertices: SmallVec<[((VertexIdx, VertexIdx), VertexIdx); 2]>,
}

/// Incremental edge-splitting subdivision over a render mesh.
///
/// The engine owns the mesh from construction until [`finalize`](Self::finalize).
/// In between it keeps four indexes over it:
///
/// - a deduplicated position table (vertices at the same place share a position),
/// - triangles referencing vertices, each with `visible` and `excluded` flags,
/// - edges between positions, each listing the triangles that share it,
/// - a queue of edges sorted by length, longest last.
///
/// Each [`divide_once`](Self::divide_once) splits the longest queued edge and
/// every live triangle on it. Edges shorter than the minimum edge length are
/// never queued, so refinement stops once every remaining edge is short.
/// Edges with no live visible triangle left are dropped from the queue.
///
/// # Example
///
/// ```
/// use mesh_adaptive::{AdaptiveParams, AdaptiveSubdivider, AlwaysVisible, EuclideanLength};
/// use mesh_types::{IndexGroup, RenderMesh, Vertex};
///
/// let mut mesh = RenderMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(10.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(5.0, 1.0, 0.0));
/// mesh.groups.push(IndexGroup::triangle_list(vec![0, 1, 2]));
///
/// let params = AdaptiveParams::with_edge_length(1.0);
/// let mut engine = AdaptiveSubdivider::new(mesh, &params, AlwaysVisible, EuclideanLength)?;
///
/// assert!((engine.longest_edge() - 10.0).abs() < 1e-12);
/// assert_eq!(engine.divide_once(), 2);
/// assert!(engine.longest_edge() < 10.0);
///
/// let mesh = engine.finalize();
/// assert_eq!(mesh.groups[0].indices.len(), 6);
/// # Ok::<(), mesh_adaptive::AdaptiveError>(())
/// ```
#[derive(Debug)]
pub struct AdaptiveSubdivider<V, L> {
    mesh: RenderMesh,
    positions: PositionTable,
    faces: Vec<Face>,
    edges: EdgeQueue,
    live_per_mesh: Vec<usize>,
    min_edge_length: f64,
    degenerate_area: f64,
    max_splits: Option<usize>,
    reindex_interval: Option<usize>,
    splits: usize,
    visibility: V,
    metric: L,
}

impl<V: VisibilityOracle, L: EdgeMetric> AdaptiveSubdivider<V, L> {
    /// Build the engine over `mesh`.
    ///
    /// Fans and strips are flattened to triangle lists first. Every triangle
    /// is then checked against the visibility oracle and inserted unless it is
    /// degenerate (two corners at one position, or area at or below
    /// `params.degenerate_area`). Edges without a visible triangle are pruned.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` fails [`AdaptiveParams::validate`] or a
    /// group references a vertex outside the mesh.
    pub fn new(
        mut mesh: RenderMesh,
        params: &AdaptiveParams,
        visibility: V,
        metric: L,
    ) -> AdaptiveResult<Self> {
        params.validate()?;
        mesh.convert_to_triangles();

        let vertex_count = mesh.vertices.len();
        for (group, g) in mesh.groups.iter().enumerate() {
            if let Some(&index) = g.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(AdaptiveError::VertexOutOfRange {
                    group,
                    index,
                    vertex_count,
                });
            }
        }

        let positions =
            PositionTable::build(&mesh.vertices, params.merge_distance_sq, params.position_lookup);
        let input: Vec<(MeshIdx, [VertexIdx; 3])> = mesh
            .groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| {
                group
                    .triangles()
                    .map(move |t| (MeshIdx::from_usize(g), t.map(VertexIdx::new)))
            })
            .collect();

        let mut engine = Self {
            live_per_mesh: vec![0; mesh.groups.len()],
            faces: Vec::with_capacity(input.len()),
            mesh,
            positions,
            edges: EdgeQueue::default(),
            min_edge_length: params.min_edge_length,
            degenerate_area: params.degenerate_area,
            max_splits: params.max_splits,
            reindex_interval: params.reindex_interval,
            splits: 0,
            visibility,
            metric,
        };

        let mut dirty = DirtyEdges::new();
        let mut rejected = 0_usize;
        for (mesh_idx, vertices) in input {
            let visible = engine.corners_visible(vertices);
            if engine.insert(vertices, mesh_idx, visible, &mut dirty).is_none() {
                rejected += 1;
            }
        }
        engine.prune(dirty);

        debug!(
            "Adaptive subdivider built: {} triangles ({} degenerate dropped), {} positions, {} queued edges",
            engine.faces.len(),
            rejected,
            engine.positions.len(),
            engine.edges.len()
        );
        Ok(engine)
    }

    /// Length of the longest queued edge, or 0 if nothing is left to split.
    #[inline]
    #[must_use]
    pub fn longest_edge(&self) -> f64 {
        self.edges.longest()
    }

    /// Split the longest queued edge.
    ///
    /// Every live triangle on the edge is excluded and replaced by the two
    /// halves on either side of the edge midpoint. A half stays visible only
    /// if its parent was visible and the oracle accepts the half itself.
    /// Degenerate halves are dropped.
    ///
    /// Returns the number of triangles created: 0 if the queue is empty or no
    /// live triangle was left on the edge.
    pub fn divide_once(&mut self) -> usize {
        let Some(target) = self.edges.pop() else {
            return 0;
        };
        let edge = self.edges.get(target);
        let sharing = edge.triangles.clone();
        let mut split = SplitMidpoints {
            edge: edge.positions,
            position: None,
            vertices: SmallVec::new(),
        };

        let mut dirty = DirtyEdges::new();
        let mut produced = 0;
        for t in sharing {
            let face = &mut self.faces[t.index()];
            if face.excluded {
                continue;
            }
            face.excluded = true;
            let parent = face.clone();
            self.live_per_mesh[parent.mesh.index()] -= 1;
            dirty.extend(parent.edges.into_iter().flatten().filter(|&e| e != target));

            let side = (0..3).find(|&k| self.side_key(&parent, k) == split.edge);
            debug_assert!(side.is_some(), "{t} is queued on {target} but has no such side");
            let Some(k) = side else {
                warn!("Triangle {} does not border edge {}; skipped", t, target);
                continue;
            };

            // Rotate so the split edge runs from corner 0 to corner 1.
            let v = parent.vertices;
            let (v0, v1, v2) = (v[k], v[(k + 1) % 3], v[(k + 2) % 3]);
            let mid = self.midpoint_vertex(v0, v1, &mut split);

            for child in [[v0, mid, v2], [mid, v1, v2]] {
                let visible = parent.visible && self.corners_visible(child);
                if self.insert(child, parent.mesh, visible, &mut dirty).is_some() {
                    produced += 1;
                }
            }
        }

        self.prune(dirty);
        self.splits += 1;
        trace!(
            "Split {} (length {:.4}): {} triangles created, {} edges queued",
            target,
            self.edges.get(target).length,
            produced,
            self.edges.len()
        );
        produced
    }

    /// Change the minimum edge length and compact.
    ///
    /// Excluded triangles are erased (surviving triangles are renumbered) and
    /// the edge queue is rebuilt from scratch under the new threshold.
    ///
    /// Returns the number of triangles erased.
    ///
    /// # Errors
    ///
    /// Returns [`AdaptiveError::InvalidEdgeLength`] if `new_min_edge_length`
    /// is not finite and positive. The engine is left untouched in that case.
    pub fn reindex(&mut self, new_min_edge_length: f64) -> AdaptiveResult<usize> {
        validate_edge_length(new_min_edge_length)?;
        self.min_edge_length = new_min_edge_length;
        Ok(self.rebuild())
    }

    /// Write the surviving triangles back into the mesh and return it.
    ///
    /// Each group becomes a triangle list holding exactly the live triangles
    /// recorded against it, in insertion order. Vertices created by splits
    /// are already appended to the mesh's vertex array.
    #[must_use]
    pub fn finalize(self) -> RenderMesh {
        let mut mesh = self.mesh;
        let mut buffers: Vec<Vec<u32>> = self
            .live_per_mesh
            .iter()
            .map(|&n| Vec::with_capacity(n * 3))
            .collect();

        for face in self.faces.iter().filter(|f| !f.excluded) {
            buffers[face.mesh.index()].extend(face.vertices.map(VertexIdx::raw));
        }

        for (group, indices) in mesh.groups.iter_mut().zip(buffers) {
            group.primitive = PrimitiveType::TriangleList;
            group.indices = indices;
        }

        debug!(
            "Finalized mesh: {} vertices, {} triangles after {} splits",
            mesh.vertices.len(),
            mesh.triangle_count(),
            self.splits
        );
        mesh
    }

    /// Split until converged or the split budget runs out.
    ///
    /// Keeps calling [`divide_once`](Self::divide_once) while
    /// [`longest_edge`](Self::longest_edge) is at least the minimum edge
    /// length, compacting every `reindex_interval` splits.
    pub fn refine(&mut self) -> RefineOutcome {
        let mut outcome = RefineOutcome::default();

        while self.longest_edge() >= self.min_edge_length {
            if self.max_splits.is_some_and(|max| outcome.splits >= max) {
                break;
            }
            outcome.triangles_created += self.divide_once();
            outcome.splits += 1;

            if let Some(interval) = self.reindex_interval {
                if outcome.splits % interval == 0 {
                    outcome.triangles_erased += self.rebuild();
                    outcome.reindexes += 1;
                }
            }
        }

        outcome.converged = self.edges.len() == 0;
        outcome.longest_edge = self.longest_edge();
        outcome
    }

    // -------------------------------------------------------------------------
    // Read-only views
    // -------------------------------------------------------------------------

    /// All triangles, excluded ones included, in insertion order.
    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[Face] {
        &self.faces
    }

    /// One triangle.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[inline]
    #[must_use]
    pub fn triangle(&self, idx: TriangleIdx) -> &Face {
        &self.faces[idx.index()]
    }

    /// Queued edges, shortest first.
    pub fn queued_edges(&self) -> impl Iterator<Item = (EdgeIdx, &Edge)> + '_ {
        self.edges.iter().map(|idx| (idx, self.edges.get(idx)))
    }

    /// One edge, queued or not.
    ///
    /// # Panics
    ///
    /// Panics if `idx` was never issued since the last reindex.
    #[inline]
    #[must_use]
    pub fn edge(&self, idx: EdgeIdx) -> &Edge {
        self.edges.get(idx)
    }

    /// Coordinates of a position.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[inline]
    #[must_use]
    pub fn position(&self, idx: PositionIdx) -> &Point3<f64> {
        self.positions.point(idx)
    }

    /// Position a vertex resolves to.
    ///
    /// # Panics
    ///
    /// Panics if `vertex` is out of range.
    #[inline]
    #[must_use]
    pub fn position_of(&self, vertex: VertexIdx) -> PositionIdx {
        self.positions.of_vertex(vertex)
    }

    /// Vertex record, including vertices created by splits.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[inline]
    #[must_use]
    pub fn vertex(&self, idx: VertexIdx) -> &Vertex {
        &self.mesh.vertices[idx.index()]
    }

    /// Number of triangles stored, excluded ones included.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of triangles not excluded.
    #[inline]
    #[must_use]
    pub fn live_triangle_count(&self) -> usize {
        self.live_per_mesh.iter().sum()
    }

    /// Number of queued edges.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of distinct positions.
    #[inline]
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of vertex records.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertices.len()
    }

    /// Current minimum edge length.
    #[inline]
    #[must_use]
    pub const fn min_edge_length(&self) -> f64 {
        self.min_edge_length
    }

    /// Number of `divide_once` calls that popped an edge.
    #[inline]
    #[must_use]
    pub const fn split_count(&self) -> usize {
        self.splits
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn corners(&self, vertices: [VertexIdx; 3]) -> [Point3<f64>; 3] {
        vertices.map(|v| *self.positions.point(self.positions.of_vertex(v)))
    }

    fn corners_visible(&self, vertices: [VertexIdx; 3]) -> bool {
        let [a, b, c] = self.corners(vertices);
        self.visibility.is_visible(&a, &b, &c)
    }

    fn side_key(&self, face: &Face, k: usize) -> (PositionIdx, PositionIdx) {
        edge_key(
            self.positions.of_vertex(face.vertices[k]),
            self.positions.of_vertex(face.vertices[(k + 1) % 3]),
        )
    }

    /// Append a triangle if it is valid and link its sides.
    fn insert(
        &mut self,
        vertices: [VertexIdx; 3],
        mesh: MeshIdx,
        visible: bool,
        dirty: &mut DirtyEdges,
    ) -> Option<TriangleIdx> {
        let [a, b, c] = vertices.map(|v| self.positions.of_vertex(v));
        if a == b || b == c || c == a {
            return None;
        }
        let [p0, p1, p2] = self.corners(vertices);
        if Triangle::new(p0, p1, p2).is_degenerate(self.degenerate_area) {
            return None;
        }

        let idx = TriangleIdx::from_usize(self.faces.len());
        self.faces.push(Face::new(vertices, mesh, visible));
        self.live_per_mesh[mesh.index()] += 1;
        self.link_sides(idx, dirty);
        Some(idx)
    }

    /// Link every side of `t` that is long enough to be tracked.
    fn link_sides(&mut self, t: TriangleIdx, dirty: &mut DirtyEdges) {
        let face = self.faces[t.index()].clone();
        for k in 0..3 {
            let key = self.side_key(&face, k);
            let length = self
                .metric
                .length(self.positions.point(key.0), self.positions.point(key.1));
            let edge = if length >= self.min_edge_length {
                let e = self.edges.link(key, length, t);
                dirty.insert(e);
                Some(e)
            } else {
                None
            };
            self.faces[t.index()].edges[k] = edge;
        }
    }

    /// Get or create the midpoint vertex between `a` and `b` for this split.
    fn midpoint_vertex(
        &mut self,
        a: VertexIdx,
        b: VertexIdx,
        split: &mut SplitMidpoints,
    ) -> VertexIdx {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&(_, mid)) = split.vertices.iter().find(|(k, _)| *k == key) {
            return mid;
        }

        let position = match split.position {
            Some(p) => p,
            None => {
                let (pa, pb) = split.edge;
                let center = nalgebra::center(self.positions.point(pa), self.positions.point(pb));
                let p = self.positions.push(center);
                split.position = Some(p);
                p
            }
        };

        let mut vertex = Vertex::midpoint(&self.mesh.vertices[a.index()], &self.mesh.vertices[b.index()]);
        vertex.position = *self.positions.point(position);
        self.mesh.vertices.push(vertex);
        let mid = self.positions.push_vertex(position);
        debug_assert_eq!(mid.index() + 1, self.mesh.vertices.len());

        split.vertices.push((key, mid));
        mid
    }

    /// Drop every candidate edge that no live visible triangle refers to.
    ///
    /// Surviving candidates also forget their excluded triangles.
    fn prune(&mut self, candidates: impl IntoIterator<Item = EdgeIdx>) {
        let mut dead: SmallVec<[EdgeIdx; 8]> = SmallVec::new();
        for e in candidates {
            let faces = &self.faces;
            let edge = self.edges.get_mut(e);
            edge.triangles.retain(|t| !faces[t.index()].excluded);
            if !edge.triangles.iter().any(|t| faces[t.index()].is_refinable()) {
                dead.push(e);
            }
        }

        match dead.as_slice() {
            [] => return,
            [single] => {
                self.edges.remove(*single);
            }
            many => {
                let set: HashSet<EdgeIdx> = many.iter().copied().collect();
                self.edges.remove_where(|e| set.contains(&e));
            }
        }

        for &e in &dead {
            for t in self.edges.get(e).triangles() {
                self.faces[t.index()].unlink(e);
            }
        }
    }

    /// Erase excluded triangles and rebuild the edge queue.
    fn rebuild(&mut self) -> usize {
        let before = self.faces.len();
        self.faces.retain(|f| !f.excluded);
        let erased = before - self.faces.len();

        self.edges.clear();
        let mut dirty = DirtyEdges::new();
        for slot in 0..self.faces.len() {
            self.faces[slot].edges = [None; 3];
            self.link_sides(TriangleIdx::from_usize(slot), &mut dirty);
        }
        self.prune(dirty);

        debug!(
            "Reindexed: {} triangles erased, {} remain, {} edges queued (min length {})",
            erased,
            self.faces.len(),
            self.edges.len(),
            self.min_edge_length
        );
        erased
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use crate::oracle::{AlwaysVisible, EuclideanLength};
    use crate::params::PositionLookup;
    use approx::assert_relative_eq;
    use mesh_types::IndexGroup;

    fn never_visible(_: &Point3<f64>, _: &Point3<f64>, _: &Point3<f64>) -> bool {
        false
    }

    fn mesh_from(coords: &[[f64; 3]], groups: &[&[u32]]) -> RenderMesh {
        RenderMesh::from_parts(
            coords.iter().map(|&c| Vertex::from(c)).collect(),
            groups
                .iter()
                .map(|g| IndexGroup::triangle_list(g.to_vec()))
                .collect(),
        )
    }

    /// One triangle whose base (10) is its only edge near its length bound.
    fn long_base_triangle() -> RenderMesh {
        mesh_from(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [5.0, 1.0, 0.0]], &[&[0, 1, 2]])
    }

    /// Two triangles on either side of the edge (0,0,0)-(4,0,0).
    fn diamond() -> RenderMesh {
        mesh_from(
            &[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [2.0, 1.0, 0.0], [2.0, -1.0, 0.0]],
            &[&[0, 1, 2, 1, 0, 3]],
        )
    }

    fn build(
        mesh: RenderMesh,
        min_len: f64,
    ) -> AdaptiveSubdivider<AlwaysVisible, EuclideanLength> {
        AdaptiveSubdivider::new(
            mesh,
            &AdaptiveParams::with_edge_length(min_len),
            AlwaysVisible,
            EuclideanLength,
        )
        .expect("construction failed")
    }

    fn assert_invariants<V: VisibilityOracle, L: EdgeMetric>(engine: &AdaptiveSubdivider<V, L>) {
        let mut last = f64::NEG_INFINITY;
        for (idx, edge) in engine.queued_edges() {
            assert!(edge.length() >= last, "queue not sorted at {idx}");
            assert!(edge.length() >= engine.min_edge_length());
            last = edge.length();
            assert!(
                edge.triangles()
                    .iter()
                    .any(|&t| engine.triangle(t).is_visible() && !engine.triangle(t).is_excluded()),
                "{idx} has no live visible triangle"
            );
        }
        for (slot, face) in engine.triangles().iter().enumerate() {
            if face.is_excluded() {
                continue;
            }
            for e in face.edges().into_iter().flatten() {
                assert!(engine
                    .edge(e)
                    .triangles()
                    .contains(&TriangleIdx::from_usize(slot)));
            }
        }
    }

    #[test]
    fn test_empty_mesh_is_a_no_op() {
        let mut engine = build(RenderMesh::new(), 1.0);
        assert_eq!(engine.triangle_count(), 0);
        assert_eq!(engine.longest_edge(), 0.0);
        assert_eq!(engine.divide_once(), 0);
        assert_eq!(engine.reindex(2.0).unwrap(), 0);
        let mesh = engine.finalize();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_vertex() {
        let mesh = mesh_from(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &[&[0, 1, 5]]);
        let result = AdaptiveSubdivider::new(
            mesh,
            &AdaptiveParams::default(),
            AlwaysVisible,
            EuclideanLength,
        );
        assert!(matches!(
            result,
            Err(AdaptiveError::VertexOutOfRange {
                group: 0,
                index: 5,
                vertex_count: 2
            })
        ));
    }

    #[test]
    fn test_rejects_invalid_params() {
        let result = AdaptiveSubdivider::new(
            long_base_triangle(),
            &AdaptiveParams::with_edge_length(0.0),
            AlwaysVisible,
            EuclideanLength,
        );
        assert!(matches!(result, Err(AdaptiveError::InvalidEdgeLength(_))));
    }

    #[test]
    fn test_rejects_zero_reindex_interval() {
        let params = AdaptiveParams::with_edge_length(0.4).with_reindex_interval(Some(0));
        let result = AdaptiveSubdivider::new(diamond(), &params, AlwaysVisible, EuclideanLength);
        assert!(matches!(result, Err(AdaptiveError::InvalidReindexInterval)));
    }

    #[test]
    fn test_invisible_triangle_keeps_no_edges() {
        let mut engine = AdaptiveSubdivider::new(
            long_base_triangle(),
            &AdaptiveParams::with_edge_length(1.0),
            never_visible,
            EuclideanLength,
        )
        .unwrap();

        assert_eq!(engine.triangle_count(), 1);
        assert!(!engine.triangle(TriangleIdx::new(0)).is_visible());
        assert_eq!(engine.triangle(TriangleIdx::new(0)).edges(), [None; 3]);
        assert_eq!(engine.longest_edge(), 0.0);
        assert_eq!(engine.divide_once(), 0);
    }

    #[test]
    fn test_short_edges_are_never_queued() {
        let mut engine = build(long_base_triangle(), 1000.0);
        assert_eq!(engine.triangle_count(), 1);
        assert_eq!(engine.edge_count(), 0);
        assert_eq!(engine.divide_once(), 0);
    }

    #[test]
    fn test_one_split_produces_two_children() {
        let mut engine = build(long_base_triangle(), 1.0);
        assert_relative_eq!(engine.longest_edge(), 10.0);
        assert_eq!(engine.position_count(), 3);

        assert_eq!(engine.divide_once(), 2);

        assert!(engine.triangle(TriangleIdx::new(0)).is_excluded());
        assert_eq!(engine.triangle_count(), 3);
        assert_eq!(engine.live_triangle_count(), 2);
        assert_eq!(engine.position_count(), 4);
        assert_eq!(engine.vertex_count(), 4);

        let mid = engine.position(PositionIdx::new(3));
        assert_relative_eq!(*mid, Point3::new(5.0, 0.0, 0.0));

        // Longest remaining edge runs from a base corner to the apex.
        assert_relative_eq!(engine.longest_edge(), 26.0_f64.sqrt());
        assert_invariants(&engine);
    }

    #[test]
    fn test_children_keep_winding_and_mesh() {
        let mut engine = build(long_base_triangle(), 1.0);
        engine.divide_once();
        let children: Vec<_> = engine.triangles()[1..]
            .iter()
            .map(|f| f.vertices().map(VertexIdx::raw))
            .collect();
        assert_eq!(children, vec![[0, 3, 2], [3, 1, 2]]);
        for face in &engine.triangles()[1..] {
            assert_eq!(face.mesh(), MeshIdx::new(0));
            assert!(face.is_visible());
        }
    }

    #[test]
    fn test_midpoint_vertex_interpolates_attributes() {
        let mut mesh = long_base_triangle();
        mesh.vertices[0].tex_coord = nalgebra::Point2::new(0.0, 0.0);
        mesh.vertices[1].tex_coord = nalgebra::Point2::new(1.0, 0.5);
        mesh.vertices[0].normal = nalgebra::Vector3::x();
        mesh.vertices[1].normal = nalgebra::Vector3::z();

        let mut engine = build(mesh, 1.0);
        engine.divide_once();
        let mid = engine.vertex(VertexIdx::new(3));
        assert_relative_eq!(mid.tex_coord, nalgebra::Point2::new(0.5, 0.25));
        assert_relative_eq!(mid.normal.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.normal.x, mid.normal.z, epsilon = 1e-12);
        assert_eq!(engine.position_of(VertexIdx::new(3)), PositionIdx::new(3));
    }

    #[test]
    fn test_shared_edge_split_once() {
        let mut engine = build(diamond(), 1.0);
        assert_relative_eq!(engine.longest_edge(), 4.0);

        assert_eq!(engine.divide_once(), 4);
        assert_eq!(engine.live_triangle_count(), 4);
        assert_eq!(engine.vertex_count(), 5);
        assert_eq!(engine.position_count(), 5);

        let mid = VertexIdx::new(4);
        let using_mid = engine
            .triangles()
            .iter()
            .filter(|f| !f.is_excluded() && f.vertices().contains(&mid))
            .count();
        assert_eq!(using_mid, 4);
        assert_invariants(&engine);
    }

    #[test]
    fn test_seam_vertices_share_the_midpoint_position() {
        // Same geometry as the diamond, but the second triangle has its own
        // vertex records (a UV seam along the shared edge).
        let mesh = mesh_from(
            &[
                [0.0, 0.0, 0.0],
                [4.0, 0.0, 0.0],
                [2.0, 1.0, 0.0],
                [4.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [2.0, -1.0, 0.0],
            ],
            &[&[0, 1, 2, 3, 4, 5]],
        );
        let mut engine = build(mesh, 1.0);
        assert_eq!(engine.position_count(), 4);
        assert_relative_eq!(engine.longest_edge(), 4.0);

        assert_eq!(engine.divide_once(), 4);
        // One midpoint vertex per vertex pair, one position for the edge.
        assert_eq!(engine.vertex_count(), 8);
        assert_eq!(engine.position_count(), 5);
        assert_eq!(
            engine.position_of(VertexIdx::new(6)),
            engine.position_of(VertexIdx::new(7))
        );
        assert_invariants(&engine);
    }

    #[test]
    fn test_visibility_is_never_gained() {
        // Visible only if every corner has x <= 5.
        let left = |a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>| {
            a.x <= 5.0 && b.x <= 5.0 && c.x <= 5.0
        };
        let mesh = mesh_from(
            &[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [2.0, 3.0, 0.0], [8.0, 0.0, 0.0]],
            &[&[0, 1, 2, 1, 3, 2]],
        );
        let mut engine =
            AdaptiveSubdivider::new(mesh, &AdaptiveParams::with_edge_length(0.5), left, EuclideanLength)
                .unwrap();

        assert!(engine.triangle(TriangleIdx::new(0)).is_visible());
        assert!(!engine.triangle(TriangleIdx::new(1)).is_visible());

        for _ in 0..200 {
            if engine.divide_once() == 0 && engine.edge_count() == 0 {
                break;
            }
            assert_invariants(&engine);
        }
        for face in engine.triangles() {
            if face.is_visible() {
                let [a, b, c] = face.vertices().map(|v| *engine.position(engine.position_of(v)));
                assert!(left(&a, &b, &c));
            }
        }
    }

    #[test]
    fn test_divide_once_returns_zero_when_exhausted() {
        let mut engine = build(long_base_triangle(), 3.0);
        let mut total = 0;
        for _ in 0..1000 {
            if engine.edge_count() == 0 {
                break;
            }
            total += engine.divide_once();
        }
        assert!(total > 0);
        assert_eq!(engine.edge_count(), 0);
        assert_eq!(engine.longest_edge(), 0.0);
        assert_eq!(engine.divide_once(), 0);
    }

    #[test]
    fn test_exclusion_is_monotonic() {
        let mut engine = build(diamond(), 0.3);
        let mut excluded: Vec<bool> = Vec::new();
        for _ in 0..50 {
            engine.divide_once();
            for (slot, face) in engine.triangles().iter().enumerate() {
                if excluded.get(slot).copied().unwrap_or(false) {
                    assert!(face.is_excluded());
                }
            }
            excluded = engine.triangles().iter().map(Face::is_excluded).collect();
        }
    }

    #[test]
    fn test_live_count_tracks_returned_counts() {
        let mut engine = build(diamond(), 0.5);
        let mut expected = engine.live_triangle_count();
        for _ in 0..40 {
            let Some((_, longest)) = engine.queued_edges().last() else {
                break;
            };
            let before = longest
                .triangles()
                .iter()
                .filter(|&&t| !engine.triangle(t).is_excluded())
                .count();
            let produced = engine.divide_once();
            expected = expected - before + produced;
            assert_eq!(engine.live_triangle_count(), expected);
        }
    }

    #[test]
    fn test_converged_queue_respects_threshold() {
        let mut engine = build(diamond(), 0.75);
        let outcome = engine.refine();
        assert!(outcome.converged);
        assert!(engine.longest_edge() < 0.75);
        assert_eq!(outcome.splits, engine.split_count());
        assert_invariants(&engine);
    }

    #[test]
    fn test_refine_stops_at_split_budget() {
        let params = AdaptiveParams::with_edge_length(0.1).with_max_splits(Some(3));
        let mut engine =
            AdaptiveSubdivider::new(diamond(), &params, AlwaysVisible, EuclideanLength).unwrap();
        let outcome = engine.refine();
        assert_eq!(outcome.splits, 3);
        assert!(!outcome.converged);
        assert!(engine.longest_edge() >= 0.1);
    }

    #[test]
    fn test_reindex_erases_excluded_and_requeues() {
        let mut engine = build(diamond(), 0.5);
        for _ in 0..5 {
            engine.divide_once();
        }
        let live = engine.live_triangle_count();
        let erased = engine.reindex(0.5).unwrap();
        assert!(erased > 0);
        assert_eq!(engine.triangle_count(), live);
        assert!(engine.triangles().iter().all(|f| !f.is_excluded()));
        assert_invariants(&engine);
    }

    #[test]
    fn test_reindex_with_larger_threshold_empties_queue() {
        let mut engine = build(diamond(), 0.5);
        engine.divide_once();
        engine.reindex(100.0).unwrap();
        assert_eq!(engine.edge_count(), 0);
        assert_eq!(engine.divide_once(), 0);
    }

    #[test]
    fn test_reindex_rejects_bad_threshold() {
        let mut engine = build(diamond(), 0.5);
        engine.divide_once();
        let count = engine.triangle_count();
        assert!(engine.reindex(-1.0).is_err());
        assert_eq!(engine.triangle_count(), count);
        assert_relative_eq!(engine.min_edge_length(), 0.5);
    }

    fn total_area(mesh: &RenderMesh) -> f64 {
        mesh.groups
            .iter()
            .flat_map(IndexGroup::triangles)
            .filter_map(|t| mesh.triangle(t))
            .map(|t| t.area())
            .sum()
    }

    #[test]
    fn test_refine_with_reindex_interval_converges_and_keeps_area() {
        let params = AdaptiveParams::with_edge_length(0.4).with_reindex_interval(Some(4));
        let mut engine =
            AdaptiveSubdivider::new(diamond(), &params, AlwaysVisible, EuclideanLength).unwrap();
        let outcome = engine.refine();

        assert!(outcome.converged);
        assert!(outcome.reindexes > 0);
        assert!(outcome.triangles_erased > 0);
        assert_invariants(&engine);

        let mesh = engine.finalize();
        assert!(mesh.triangle_count() > 2);
        assert_relative_eq!(total_area(&mesh), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_triangles_are_dropped() {
        let mesh = mesh_from(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 0.0, 1e-8],
                [0.0, 2.0, 0.0],
            ],
            // collinear, repeated position (3 merges into 0), valid
            &[&[0, 1, 2, 0, 3, 1, 0, 1, 4]],
        );
        let engine = build(mesh, 0.5);
        assert_eq!(engine.triangle_count(), 1);
        assert_eq!(engine.position_count(), 4);
    }

    #[test]
    fn test_finalize_without_splits_round_trips() {
        let mesh = mesh_from(
            &[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [2.0, 1.0, 0.0], [2.0, -1.0, 0.0]],
            &[&[0, 1, 2], &[1, 0, 3]],
        );
        let original = mesh.clone();
        let engine = build(mesh, 0.5);
        let out = engine.finalize();
        assert_eq!(out, original);
    }

    #[test]
    fn test_finalize_flattens_fans_per_group() {
        let mut mesh = mesh_from(
            &[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 4.0, 0.0], [0.0, 4.0, 0.0]],
            &[&[0, 1, 2]],
        );
        mesh.groups
            .push(IndexGroup::new(PrimitiveType::TriangleFan, vec![0, 1, 2, 3]));
        let mut engine = build(mesh, 2.0);
        engine.refine();
        let live_by_mesh = |m: u32| {
            engine
                .triangles()
                .iter()
                .filter(|f| !f.is_excluded() && f.mesh() == MeshIdx::new(m))
                .count()
        };
        let (first, second) = (live_by_mesh(0), live_by_mesh(1));

        let out = engine.finalize();
        assert_eq!(out.groups.len(), 2);
        assert!(out.is_triangulated());
        assert_eq!(out.groups[0].indices.len(), first * 3);
        assert_eq!(out.groups[1].indices.len(), second * 3);
        assert!(second > 2);
    }

    /// `n` x `n` vertices `step` apart on `z = 0`, two triangles per cell.
    fn planar_grid(n: u32, step: f64) -> RenderMesh {
        let mut coords = Vec::new();
        for y in 0..n {
            for x in 0..n {
                coords.push([f64::from(x) * step, f64::from(y) * step, 0.0]);
            }
        }
        let mut indices = Vec::new();
        for y in 0..n - 1 {
            for x in 0..n - 1 {
                let i = y * n + x;
                indices.extend_from_slice(&[i, i + 1, i + n, i + 1, i + n + 1, i + n]);
            }
        }
        mesh_from(&coords, &[&indices])
    }

    #[test]
    fn test_planar_grid_refines_with_both_lookups() {
        for lookup in [PositionLookup::Linear, PositionLookup::KdTree] {
            let params = AdaptiveParams::with_edge_length(0.5).with_position_lookup(lookup);
            let mut engine =
                AdaptiveSubdivider::new(planar_grid(21, 0.5), &params, AlwaysVisible, EuclideanLength)
                    .unwrap();
            assert_eq!(engine.position_count(), 441);
            assert_eq!(engine.triangle_count(), 800);
            assert_invariants(&engine);

            let outcome = engine.refine();
            assert!(outcome.converged);
            assert!(outcome.splits > 0);
            assert_invariants(&engine);

            let mesh = engine.finalize();
            assert_relative_eq!(total_area(&mesh), 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_construction_is_idempotent() {
        let triples = |lookup| {
            let params = AdaptiveParams::with_edge_length(0.5).with_position_lookup(lookup);
            let engine =
                AdaptiveSubdivider::new(diamond(), &params, AlwaysVisible, EuclideanLength).unwrap();
            let mut tris: Vec<[u32; 3]> = engine
                .triangles()
                .iter()
                .map(|f| f.vertices().map(|v| engine.position_of(v).raw()))
                .collect();
            tris.sort_unstable();
            let mut edges: Vec<_> = engine.queued_edges().map(|(_, e)| e.positions()).collect();
            edges.sort_unstable();
            (tris, edges)
        };
        assert_eq!(triples(PositionLookup::KdTree), triples(PositionLookup::KdTree));
        assert_eq!(triples(PositionLookup::Linear), triples(PositionLookup::KdTree));
    }
}
