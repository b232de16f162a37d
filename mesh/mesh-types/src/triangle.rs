//! Triangle type for geometric calculations.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle with concrete corner positions.
///
/// Winding is **counter-clockwise (CCW) when viewed from the front**
/// (normal points toward viewer).
///
/// # Example
///
/// ```
/// use mesh_types::{Triangle, Point3};
///
/// let tri = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
///
/// // Area of a right triangle with legs 1 and 1
/// assert!((tri.area() - 0.5).abs() < 1e-10);
///
/// // Normal points in +Z direction
/// let normal = tri.normal().unwrap();
/// assert!((normal.z - 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First corner.
    pub v0: Point3<f64>,
    /// Second corner.
    pub v1: Point3<f64>,
    /// Third corner.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Compute the (unnormalized) face normal via cross product.
    ///
    /// The magnitude equals twice the triangle's area.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Triangle, Point3};
    ///
    /// let tri = Triangle::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(2.0, 0.0, 0.0),
    ///     Point3::new(0.0, 2.0, 0.0),
    /// );
    ///
    /// let n = tri.normal_unnormalized();
    /// assert!((n.norm() - 4.0).abs() < 1e-10);
    /// ```
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    ///
    /// Returns `None` for degenerate triangles (zero area).
    #[inline]
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        self.normal_unnormalized().try_normalize(f64::EPSILON)
    }

    /// Triangle area.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Centroid (average of the three corners).
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Check if the triangle is degenerate (area at or below `epsilon`).
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Triangle, Point3};
    ///
    /// let sliver = Triangle::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(2.0, 0.0, 0.0),
    /// );
    /// assert!(sliver.is_degenerate(1e-12));
    /// ```
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.area() <= epsilon
    }

    /// Get corners as an array.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }
}
