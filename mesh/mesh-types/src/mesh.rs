//! Render mesh: shared vertex records plus per-sub-mesh index groups.

use crate::{IndexGroup, PrimitiveType, Triangle, Vertex};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A renderable mesh.
///
/// All sub-meshes share one vertex array; each sub-mesh is an
/// [`IndexGroup`] whose position in `groups` is its mesh index.
///
/// # Memory Layout
///
/// - `vertices`: `Vec<Vertex>` - Positions, texture coordinates and normals
/// - `groups`: `Vec<IndexGroup>` - Primitive-tagged index lists
///
/// # Example
///
/// ```
/// use mesh_types::{IndexGroup, RenderMesh, Vertex};
///
/// let mut mesh = RenderMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.groups.push(IndexGroup::triangle_list(vec![0, 1, 2]));
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderMesh {
    /// Vertex records.
    pub vertices: Vec<Vertex>,

    /// Index groups, one per sub-mesh.
    pub groups: Vec<IndexGroup>,
}

impl RenderMesh {
    /// Create a new empty mesh.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::RenderMesh;
    ///
    /// let mesh = RenderMesh::new();
    /// assert!(mesh.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Expected number of vertices
    /// * `group_count` - Expected number of sub-meshes
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, group_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            groups: Vec::with_capacity(group_count),
        }
    }

    /// Create a mesh from vertices and groups.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, groups: Vec<IndexGroup>) -> Self {
        Self { vertices, groups }
    }

    /// Create a single-group triangle-list mesh from raw coordinate and index data.
    ///
    /// # Arguments
    ///
    /// * `positions` - Flat array of vertex positions `[x0, y0, z0, x1, y1, z1, ...]`
    /// * `indices` - Flat array of triangle indices
    ///
    /// Returns an empty mesh if `positions.len()` is not divisible by 3.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::RenderMesh;
    ///
    /// let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    /// let mesh = RenderMesh::from_raw(&positions, &[0, 1, 2]);
    /// assert_eq!(mesh.vertex_count(), 3);
    /// assert_eq!(mesh.triangle_count(), 1);
    /// ```
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        if positions.len() % 3 != 0 {
            return Self::new();
        }

        let vertices = positions
            .chunks_exact(3)
            .map(|c| Vertex::from_coords(c[0], c[1], c[2]))
            .collect();

        Self {
            vertices,
            groups: vec![IndexGroup::triangle_list(indices.to_vec())],
        }
    }

    /// Number of vertex records.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles across all groups, after primitive assembly.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(IndexGroup::triangle_count).sum()
    }

    /// True if the mesh has no vertices or assembles no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangle_count() == 0
    }

    /// True if every group is already a plain triangle list.
    #[must_use]
    pub fn is_triangulated(&self) -> bool {
        self.groups
            .iter()
            .all(|g| g.primitive == PrimitiveType::TriangleList && g.indices.len() % 3 == 0)
    }

    /// Flatten every fan and strip into a triangle list.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexGroup, PrimitiveType, RenderMesh, Vertex};
    ///
    /// let mut mesh = RenderMesh::new();
    /// for i in 0..4 {
    ///     mesh.vertices.push(Vertex::from_coords(f64::from(i), f64::from(i % 2), 0.0));
    /// }
    /// mesh.groups.push(IndexGroup::new(PrimitiveType::TriangleStrip, vec![0, 1, 2, 3]));
    ///
    /// mesh.convert_to_triangles();
    /// assert!(mesh.is_triangulated());
    /// assert_eq!(mesh.groups[0].indices, vec![0, 1, 2, 2, 1, 3]);
    /// ```
    pub fn convert_to_triangles(&mut self) {
        for group in &mut self.groups {
            group.convert_to_triangles();
        }
    }

    /// Resolve a vertex index triple into a concrete triangle.
    ///
    /// Returns `None` if any index is out of range.
    #[must_use]
    pub fn triangle(&self, face: [u32; 3]) -> Option<Triangle> {
        let p = |i: u32| self.vertices.get(i as usize).map(|v| v.position);
        Some(Triangle::new(p(face[0])?, p(face[1])?, p(face[2])?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_fan() -> RenderMesh {
        let mut mesh = RenderMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.groups
            .push(IndexGroup::new(PrimitiveType::TriangleFan, vec![0, 1, 2, 3]));
        mesh
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = RenderMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.is_triangulated());
    }

    #[test]
    fn test_triangle_count_spans_groups() {
        let mut mesh = quad_fan();
        mesh.groups.push(IndexGroup::triangle_list(vec![0, 1, 2]));
        assert_eq!(mesh.triangle_count(), 3);
        assert!(!mesh.is_triangulated());
    }

    #[test]
    fn test_convert_keeps_group_order() {
        let mut mesh = quad_fan();
        mesh.groups.push(IndexGroup::triangle_list(vec![3, 2, 1]));
        mesh.convert_to_triangles();

        assert!(mesh.is_triangulated());
        assert_eq!(mesh.groups[0].indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.groups[1].indices, vec![3, 2, 1]);
    }

    #[test]
    fn test_from_raw_rejects_ragged_positions() {
        let mesh = RenderMesh::from_raw(&[0.0, 1.0], &[0, 1, 2]);
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_triangle_lookup() {
        let mesh = quad_fan();
        let tri = mesh.triangle([0, 1, 2]);
        assert!(tri.is_some());
        assert!(mesh.triangle([0, 1, 7]).is_none());
    }
}
