//! Host mesh types for the adaptive mesh toolkit.
//!
//! This crate provides the mesh data model shared by the rendering engine and
//! the mesh-processing crates:
//!
//! - [`Vertex`] - Position, texture coordinate and normal of one mesh corner
//! - [`IndexGroup`] - One sub-mesh: a [`PrimitiveType`] and its vertex indices
//! - [`RenderMesh`] - Shared vertex array plus per-sub-mesh index groups
//! - [`Triangle`] - A concrete triangle with corner positions
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//! - Other game engines
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//!
//! # Winding
//!
//! Triangle winding is **counter-clockwise (CCW) when viewed from the front**.
//! Fans and strips flattened by [`RenderMesh::convert_to_triangles`] keep it.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexGroup, PrimitiveType, RenderMesh, Vertex};
//!
//! let mut mesh = RenderMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.groups.push(IndexGroup::new(PrimitiveType::TriangleFan, vec![0, 1, 2, 3]));
//!
//! assert_eq!(mesh.triangle_count(), 2);
//! mesh.convert_to_triangles();
//! assert!(mesh.is_triangulated());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod group;
mod mesh;
mod triangle;
mod vertex;

// Re-export core types
pub use group::{IndexGroup, PrimitiveType};
pub use mesh::RenderMesh;
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};
