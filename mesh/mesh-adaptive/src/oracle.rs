//! Caller-supplied predicates that steer refinement.
//!
//! A [`VisibilityOracle`] decides which triangles are worth refining and an
//! [`EdgeMetric`] measures edges. Both are plain traits with blanket impls for
//! closures, so ad-hoc predicates need no wrapper type:
//!
//! ```
//! use mesh_adaptive::{EdgeMetric, VisibilityOracle};
//! use nalgebra::Point3;
//!
//! let above_ground = |a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>| {
//!     a.z >= 0.0 || b.z >= 0.0 || c.z >= 0.0
//! };
//! let manhattan = |a: &Point3<f64>, b: &Point3<f64>| (b - a).abs().sum();
//!
//! let o = Point3::origin();
//! let x = Point3::new(1.0, 1.0, 0.0);
//! assert!(above_ground.is_visible(&o, &x, &x));
//! assert_eq!(manhattan.length(&o, &x), 2.0);
//! ```

use mesh_types::Triangle;
use nalgebra::{Matrix4, Point3, Vector2};

/// Decides whether a triangle, given by its world-space corners, is relevant.
pub trait VisibilityOracle {
    /// True if the triangle `(a, b, c)` should take part in refinement.
    fn is_visible(&self, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool;
}

impl<F> VisibilityOracle for F
where
    F: Fn(&Point3<f64>, &Point3<f64>, &Point3<f64>) -> bool,
{
    #[inline]
    fn is_visible(&self, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool {
        self(a, b, c)
    }
}

/// Measures an edge between two world-space positions.
///
/// Must be non-negative and return the same value every time it is asked
/// about the same pair during one run. It need not be Euclidean.
pub trait EdgeMetric {
    /// Length of the edge `(a, b)`.
    fn length(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64;
}

impl<F> EdgeMetric for F
where
    F: Fn(&Point3<f64>, &Point3<f64>) -> f64,
{
    #[inline]
    fn length(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self(a, b)
    }
}

/// Every triangle is visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl VisibilityOracle for AlwaysVisible {
    #[inline]
    fn is_visible(&self, _: &Point3<f64>, _: &Point3<f64>, _: &Point3<f64>) -> bool {
        true
    }
}

/// Visible iff the triangle's front face (CCW winding) faces an eye point.
#[derive(Debug, Clone, Copy)]
pub struct FacingPoint {
    /// Eye position in world space.
    pub eye: Point3<f64>,
}

impl FacingPoint {
    /// Create a back-face test against `eye`.
    #[must_use]
    pub const fn new(eye: Point3<f64>) -> Self {
        Self { eye }
    }
}

impl VisibilityOracle for FacingPoint {
    fn is_visible(&self, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool {
        let tri = Triangle::new(*a, *b, *c);
        tri.normal_unnormalized().dot(&(self.eye - tri.centroid())) > 0.0
    }
}

/// Straight-line distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanLength;

impl EdgeMetric for EuclideanLength {
    #[inline]
    fn length(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        nalgebra::distance(a, b)
    }
}

/// Projected length in pixels.
///
/// Both endpoints go through `view_projection` and the perspective divide,
/// then NDC is mapped onto a `viewport` of `width x height` pixels. An edge
/// with an endpoint at or behind the camera plane (`w <= 0`) measures 0, so it
/// is never refined.
#[derive(Debug, Clone, Copy)]
pub struct ScreenSpaceLength {
    /// Combined view and projection matrix.
    pub view_projection: Matrix4<f64>,
    /// Viewport size in pixels.
    pub viewport: Vector2<f64>,
}

impl ScreenSpaceLength {
    /// Create a screen-space metric.
    #[must_use]
    pub const fn new(view_projection: Matrix4<f64>, viewport: Vector2<f64>) -> Self {
        Self {
            view_projection,
            viewport,
        }
    }

    fn to_pixels(&self, p: &Point3<f64>) -> Option<Vector2<f64>> {
        let clip = self.view_projection * p.to_homogeneous();
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = Vector2::new(clip.x / clip.w, clip.y / clip.w);
        Some((ndc.add_scalar(1.0) * 0.5).component_mul(&self.viewport))
    }
}

impl EdgeMetric for ScreenSpaceLength {
    fn length(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        match (self.to_pixels(a), self.to_pixels(b)) {
            (Some(pa), Some(pb)) => (pb - pa).norm(),
            _ => 0.0,
        }
    }
}
