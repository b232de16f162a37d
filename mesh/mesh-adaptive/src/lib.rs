//! Adaptive edge-splitting subdivision.
//!
//! Refines a [`RenderMesh`](mesh_types::RenderMesh) by repeatedly splitting its
//! longest edge at the midpoint until every edge that matters is shorter than
//! a threshold. Two caller-supplied predicates decide what matters:
//!
//! - a [`VisibilityOracle`] rejects triangles that should never be refined
//!   (back faces, off-screen geometry). Children of an invisible triangle stay
//!   invisible.
//! - an [`EdgeMetric`] measures edges, in world units ([`EuclideanLength`]) or
//!   in pixels ([`ScreenSpaceLength`]).
//!
//! Splitting one edge splits every live triangle on it, so shared edges stay
//! conforming and no T-junctions appear. Vertices at the same place share a
//! position, but a split keeps one midpoint vertex per vertex pair, so texture
//! and normal seams survive.
//!
//! # Examples
//!
//! Refine everything in one call:
//!
//! ```
//! use mesh_adaptive::{subdivide_mesh, AdaptiveParams, AlwaysVisible, EuclideanLength};
//! use mesh_types::{IndexGroup, RenderMesh, Vertex};
//!
//! let mut mesh = RenderMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(2.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 2.0, 0.0));
//! mesh.groups.push(IndexGroup::triangle_list(vec![0, 1, 2]));
//!
//! let params = AdaptiveParams::with_edge_length(0.5);
//! let result = subdivide_mesh(mesh, &params, AlwaysVisible, EuclideanLength)?;
//!
//! assert!(result.outcome.converged);
//! println!("{result}");
//! # Ok::<(), mesh_adaptive::AdaptiveError>(())
//! ```
//!
//! Drive the engine step by step, with a closure as the visibility oracle:
//!
//! ```
//! use mesh_adaptive::{AdaptiveParams, AdaptiveSubdivider, EuclideanLength};
//! use mesh_types::{Point3, RenderMesh};
//!
//! let mesh = RenderMesh::from_raw(
//!     &[0.0, 0.0, 0.0, 8.0, 0.0, 0.0, 0.0, 8.0, 0.0],
//!     &[0, 1, 2],
//! );
//! let above_ground = |a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>| {
//!     a.z >= 0.0 && b.z >= 0.0 && c.z >= 0.0
//! };
//!
//! let params = AdaptiveParams::with_edge_length(1.0);
//! let mut engine = AdaptiveSubdivider::new(mesh, &params, above_ground, EuclideanLength)?;
//! while engine.longest_edge() >= 4.0 {
//!     engine.divide_once();
//! }
//! engine.reindex(2.0)?;
//! let outcome = engine.refine();
//! assert!(outcome.converged);
//!
//! let mesh = engine.finalize();
//! assert!(mesh.is_triangulated());
//! # Ok::<(), mesh_adaptive::AdaptiveError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod error;
mod index;
mod oracle;
mod params;
mod positions;
mod result;
mod subdivide;
mod subdivider;
mod topology;

pub use error::{AdaptiveError, AdaptiveResult};
pub use index::{EdgeIdx, MeshIdx, PositionIdx, TriangleIdx, VertexIdx};
pub use oracle::{
    AlwaysVisible, EdgeMetric, EuclideanLength, FacingPoint, ScreenSpaceLength, VisibilityOracle,
};
pub use params::{AdaptiveParams, PositionLookup, DEFAULT_DEGENERATE_AREA, DEFAULT_MERGE_DISTANCE_SQ};
pub use result::{RefineOutcome, SubdivisionResult};
pub use subdivide::subdivide_mesh;
pub use subdivider::AdaptiveSubdivider;
pub use topology::{Edge, Face};
