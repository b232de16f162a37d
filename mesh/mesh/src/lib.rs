//! Adaptive mesh refinement toolkit.
//!
//! This umbrella crate re-exports the mesh-* crates, providing a unified API
//! for view-dependent refinement of render meshes. All crates are Layer 0
//! (zero Bevy dependencies) and can be used in CLI tools, WASM, servers, or
//! inside any engine's asset pipeline.
//!
//! # Quick Start
//!
//! ```
//! use mesh::prelude::*;
//!
//! // A 4x4 quad as a triangle fan
//! let mut render = RenderMesh::new();
//! render.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! render.vertices.push(Vertex::from_coords(4.0, 0.0, 0.0));
//! render.vertices.push(Vertex::from_coords(4.0, 4.0, 0.0));
//! render.vertices.push(Vertex::from_coords(0.0, 4.0, 0.0));
//! render.groups.push(IndexGroup::new(PrimitiveType::TriangleFan, vec![0, 1, 2, 3]));
//!
//! // Refine only what faces the camera
//! let camera = FacingPoint::new(Point3::new(2.0, 2.0, 10.0));
//! let params = AdaptiveParams::with_edge_length(1.0);
//! let result = subdivide_mesh(render, &params, camera, EuclideanLength)?;
//!
//! assert!(result.was_subdivided());
//! assert!(result.mesh.is_triangulated());
//! # Ok::<(), AdaptiveError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Host mesh model: `RenderMesh`, `IndexGroup`, `Vertex`, `Triangle`
//! - [`adaptive`] - Adaptive edge-splitting subdivision and its predicates
//!
//! # Feature Flags
//!
//! - `serde` - Serialize and deserialize the host mesh types

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![doc(html_root_url = "https://docs.rs/mesh/0.7.0")]

// =============================================================================
// Re-exports
// =============================================================================

/// Host mesh model: `RenderMesh`, `IndexGroup`, `Vertex`, `Triangle`.
pub use mesh_types as types;

/// Adaptive edge-splitting subdivision.
pub use mesh_adaptive as adaptive;

/// Common imports for adaptive refinement.
///
/// # Usage
///
/// ```
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{IndexGroup, Point3, PrimitiveType, RenderMesh, Triangle, Vertex};

    // Refinement
    pub use mesh_adaptive::{
        AdaptiveError, AdaptiveParams, AdaptiveSubdivider, EdgeMetric, SubdivisionResult,
        VisibilityOracle, subdivide_mesh,
    };

    // Stock predicates
    pub use mesh_adaptive::{AlwaysVisible, EuclideanLength, FacingPoint, ScreenSpaceLength};
}

// =============================================================================
// Tests
// =============================================================================
