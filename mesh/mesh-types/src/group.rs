//! Primitive-tagged index groups.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the indices of an [`IndexGroup`] assemble into triangles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrimitiveType {
    /// `[c, v1, v2, v3, ...]` forms `(c, v1, v2)`, `(c, v2, v3)`, ...
    TriangleFan,

    /// `[v0, v1, v2, v3, ...]` forms `(v0, v1, v2)`, `(v2, v1, v3)`, ...
    /// Every odd triangle swaps its first two corners to keep the winding.
    TriangleStrip,

    /// Independent triangles, three indices each.
    #[default]
    TriangleList,
}

/// One sub-mesh: a primitive type and the vertex indices it draws.
///
/// The position of the group inside [`RenderMesh::groups`](crate::RenderMesh)
/// identifies the sub-mesh, so material assignments keyed by group survive
/// any processing that writes back group by group.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexGroup, PrimitiveType};
///
/// let fan = IndexGroup::new(PrimitiveType::TriangleFan, vec![0, 1, 2, 3]);
/// assert_eq!(fan.triangle_count(), 2);
///
/// let tris: Vec<[u32; 3]> = fan.triangles().collect();
/// assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3]]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexGroup {
    /// Primitive assembly rule.
    pub primitive: PrimitiveType,

    /// Vertex indices into the owning mesh's vertex array.
    pub indices: Vec<u32>,
}

impl IndexGroup {
    /// Create a group from a primitive type and its indices.
    #[inline]
    #[must_use]
    pub const fn new(primitive: PrimitiveType, indices: Vec<u32>) -> Self {
        Self { primitive, indices }
    }

    /// Create a triangle-list group.
    #[inline]
    #[must_use]
    pub const fn triangle_list(indices: Vec<u32>) -> Self {
        Self::new(PrimitiveType::TriangleList, indices)
    }

    /// Number of triangles this group assembles into.
    ///
    /// Trailing list indices that do not complete a triangle are not counted.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        match self.primitive {
            PrimitiveType::TriangleList => self.indices.len() / 3,
            PrimitiveType::TriangleFan | PrimitiveType::TriangleStrip => {
                self.indices.len().saturating_sub(2)
            }
        }
    }

    /// Iterate the assembled triangles as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let idx = &self.indices;
        let primitive = self.primitive;
        (0..self.triangle_count()).map(move |i| match primitive {
            PrimitiveType::TriangleList => [idx[3 * i], idx[3 * i + 1], idx[3 * i + 2]],
            PrimitiveType::TriangleFan => [idx[0], idx[i + 1], idx[i + 2]],
            PrimitiveType::TriangleStrip => {
                if i % 2 == 0 {
                    [idx[i], idx[i + 1], idx[i + 2]]
                } else {
                    [idx[i + 1], idx[i], idx[i + 2]]
                }
            }
        })
    }

    /// Rewrite this group in place as a triangle list.
    ///
    /// Lists lose any incomplete trailing triangle; fans and strips with
    /// fewer than three indices become empty lists.
    pub fn convert_to_triangles(&mut self) {
        if self.primitive == PrimitiveType::TriangleList && self.indices.len() % 3 == 0 {
            return;
        }
        let indices: Vec<u32> = self.triangles().flatten().collect();
        self.primitive = PrimitiveType::TriangleList;
        self.indices = indices;
    }
}
