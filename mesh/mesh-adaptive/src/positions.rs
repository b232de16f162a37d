//! Deduplicated position storage.

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use mesh_types::Vertex;
use nalgebra::Point3;
use tracing::debug;

use crate::index::{PositionIdx, VertexIdx};
use crate::params::PositionLookup;

/// Unique 3D points, decoupled from per-vertex attributes.
///
/// Built once from the input vertices, merging any two closer than the merge
/// distance. Afterwards it only grows: every edge split appends the edge's
/// midpoint.
#[derive(Debug, Clone, Default)]
pub(crate) struct PositionTable {
    points: Vec<Point3<f64>>,
    /// Position of every vertex, indexed by vertex.
    vertex_positions: Vec<PositionIdx>,
}

impl PositionTable {
    /// Deduplicate the positions of `vertices`.
    pub(crate) fn build(vertices: &[Vertex], merge_distance_sq: f64, lookup: PositionLookup) -> Self {
        let mut table = Self {
            points: Vec::new(),
            vertex_positions: Vec::with_capacity(vertices.len()),
        };

        match lookup {
            PositionLookup::Linear => {
                for v in vertices {
                    let found = table
                        .points
                        .iter()
                        .position(|p| nalgebra::distance_squared(p, &v.position) < merge_distance_sq);
                    let idx = match found {
                        Some(slot) => PositionIdx::from_usize(slot),
                        None => table.push(v.position),
                    };
                    table.vertex_positions.push(idx);
                }
            }
            PositionLookup::KdTree if !vertices.is_empty() => {
                // Built once over every vertex: the immutable tree accepts any
                // number of points sharing a coordinate on one axis.
                let coords: Vec<[f64; 3]> = vertices
                    .iter()
                    .map(|v| [v.position.x, v.position.y, v.position.z])
                    .collect();
                let tree: ImmutableKdTree<f64, 3> = ImmutableKdTree::new_from_slice(&coords);

                // Position created by each vertex, if it created one.
                let mut owned: Vec<Option<PositionIdx>> = Vec::with_capacity(vertices.len());
                for (i, (v, query)) in vertices.iter().zip(&coords).enumerate() {
                    // The earliest position owner in range is also the lowest
                    // position index, which is what a linear scan would find.
                    let found = tree
                        .within_unsorted::<SquaredEuclidean>(query, merge_distance_sq)
                        .into_iter()
                        .filter(|nn| nn.distance < merge_distance_sq)
                        .filter_map(|nn| usize::try_from(nn.item).ok())
                        .filter(|&j| j < i)
                        .filter_map(|j| owned[j])
                        .min();
                    let idx = match found {
                        Some(idx) => {
                            owned.push(None);
                            idx
                        }
                        None => {
                            let idx = table.push(v.position);
                            owned.push(Some(idx));
                            idx
                        }
                    };
                    table.vertex_positions.push(idx);
                }
            }
            PositionLookup::KdTree => {}
        }

        debug!(
            "Deduplicated {} vertices into {} positions",
            vertices.len(),
            table.points.len()
        );
        table
    }

    /// Append a position without merging.
    pub(crate) fn push(&mut self, point: Point3<f64>) -> PositionIdx {
        let idx = PositionIdx::from_usize(self.points.len());
        self.points.push(point);
        idx
    }

    /// Record the position of a newly appended vertex.
    pub(crate) fn push_vertex(&mut self, position: PositionIdx) -> VertexIdx {
        debug_assert!(position.index() < self.points.len());
        let idx = VertexIdx::from_usize(self.vertex_positions.len());
        self.vertex_positions.push(position);
        idx
    }

    #[inline]
    pub(crate) fn point(&self, idx: PositionIdx) -> &Point3<f64> {
        &self.points[idx.index()]
    }

    #[inline]
    pub(crate) fn of_vertex(&self, vertex: VertexIdx) -> PositionIdx {
        self.vertex_positions[vertex.index()]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }
}
