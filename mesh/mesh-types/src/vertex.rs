//! Vertex attribute records.

use nalgebra::{Point2, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A per-corner attribute record: position, texture coordinate and normal.
///
/// Several vertices may sit at the same position with different texture
/// coordinates or normals (UV seams, hard edges). Consumers that need spatial
/// identity deduplicate positions themselves.
///
/// # Example
///
/// ```
/// use mesh_types::{Vertex, Point3};
///
/// // Create a vertex with just position
/// let v1 = Vertex::new(Point3::new(1.0, 2.0, 3.0));
///
/// // Create from raw coordinates
/// let v2 = Vertex::from_coords(1.0, 2.0, 3.0);
///
/// assert_eq!(v1.position, v2.position);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,

    /// Texture coordinate (U, V).
    pub tex_coord: Point2<f64>,

    /// Vertex normal. Unit length by convention, not enforced.
    pub normal: Vector3<f64>,
}

impl Vertex {
    /// Create a vertex at `position` with a zero texture coordinate and a +Z normal.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Vertex, Point3};
    ///
    /// let v = Vertex::new(Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(v.position.x, 1.0);
    /// assert_eq!(v.normal.z, 1.0);
    /// ```
    #[inline]
    #[must_use]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            tex_coord: Point2::origin(),
            normal: Vector3::z(),
        }
    }

    /// Create a vertex from raw coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Vertex;
    ///
    /// let v = Vertex::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(v.position.x, 1.0);
    /// assert_eq!(v.position.y, 2.0);
    /// assert_eq!(v.position.z, 3.0);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Create a vertex with every attribute set.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Vertex, Point2, Point3, Vector3};
    ///
    /// let v = Vertex::with_attributes(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point2::new(0.5, 0.25),
    ///     Vector3::new(0.0, 1.0, 0.0),
    /// );
    /// assert_eq!(v.tex_coord.x, 0.5);
    /// assert_eq!(v.normal.y, 1.0);
    /// ```
    #[inline]
    #[must_use]
    pub const fn with_attributes(
        position: Point3<f64>,
        tex_coord: Point2<f64>,
        normal: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            tex_coord,
            normal,
        }
    }

    /// Interpolate the attributes halfway between two vertices.
    ///
    /// Position and texture coordinate are averaged linearly. The normal is the
    /// renormalized sum of both normals; if they cancel out, `a`'s normal is kept.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Vertex, Point2, Point3, Vector3};
    ///
    /// let a = Vertex::with_attributes(Point3::origin(), Point2::new(0.0, 0.0), Vector3::x());
    /// let b = Vertex::with_attributes(Point3::new(2.0, 0.0, 0.0), Point2::new(1.0, 0.0), Vector3::y());
    /// let m = Vertex::midpoint(&a, &b);
    ///
    /// assert_eq!(m.position.x, 1.0);
    /// assert_eq!(m.tex_coord.x, 0.5);
    /// assert!((m.normal.norm() - 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn midpoint(a: &Self, b: &Self) -> Self {
        let normal = (a.normal + b.normal)
            .try_normalize(f64::EPSILON)
            .unwrap_or(a.normal);
        Self {
            position: nalgebra::center(&a.position, &b.position),
            tex_coord: nalgebra::center(&a.tex_coord, &b.tex_coord),
            normal,
        }
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::from_coords(x, y, z)
    }
}

impl From<(f64, f64, f64)> for Vertex {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::from_coords(x, y, z)
    }
}
