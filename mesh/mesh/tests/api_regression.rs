//! API Regression Tests for the Adaptive Mesh Crates
//!
//! These tests serve as a regression suite to ensure the public API remains
//! stable and consistent across the mesh crates. They are organized in 3 tiers
//! of increasing complexity:
//!
//! - Tier 1: Foundation (mesh-types: vertices, groups, render meshes)
//! - Tier 2: Configuration (parameters, errors, predicates)
//! - Tier 3: Refinement (engine stepping, driver, write-back)
//!
//! If any of these tests fail after API changes, it indicates a breaking change
//! that needs documentation in CHANGELOG.md and a version bump.

// Allow test-specific patterns
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::uninlined_format_args)]

use mesh::{adaptive, prelude::*, types};

/// Two triangles sharing the diagonal of a 4x4 square, as a strip.
fn square_strip() -> RenderMesh {
    let mut mesh = RenderMesh::new();
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(4.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(0.0, 4.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(4.0, 4.0, 0.0));
    mesh.groups
        .push(IndexGroup::new(PrimitiveType::TriangleStrip, vec![0, 1, 2, 3]));
    mesh
}

// =============================================================================
// TIER 1: Foundation - Host Mesh Types
// =============================================================================

mod tier1_foundation {
    use super::*;

    #[test]
    fn vertex_creation_and_access() {
        // Primary constructor
        let v = types::Vertex::from_coords(1.0, 2.0, 3.0);
        assert!((v.position.x - 1.0).abs() < f64::EPSILON);
        assert!((v.position.y - 2.0).abs() < f64::EPSILON);
        assert!((v.position.z - 3.0).abs() < f64::EPSILON);

        // Default attributes
        assert!((v.normal.z - 1.0).abs() < f64::EPSILON);
        assert!(v.tex_coord.x.abs() < f64::EPSILON);

        // Full attributes
        let v2 = types::Vertex::with_attributes(
            types::Point3::new(4.0, 5.0, 6.0),
            types::Point2::new(0.25, 0.75),
            types::Vector3::x(),
        );
        assert!((v2.tex_coord.y - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn render_mesh_construction() {
        // Empty mesh
        let mesh = types::RenderMesh::new();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.groups.is_empty());
        assert!(mesh.is_empty());

        // From raw buffers
        let mesh = types::RenderMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2]);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.is_triangulated());
    }

    #[test]
    fn primitive_assembly() {
        let mut mesh = square_strip();
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.is_triangulated());

        mesh.convert_to_triangles();
        assert!(mesh.is_triangulated());
        assert_eq!(mesh.groups[0].indices, vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn triangle_geometry() {
        let mesh = square_strip();
        let tri = mesh.triangle([0, 1, 2]).unwrap();
        assert!((tri.area() - 8.0).abs() < 1e-12);
        assert!(tri.normal().unwrap().z > 0.0);
        assert!(mesh.triangle([0, 1, 9]).is_none());
    }
}

// =============================================================================
// TIER 2: Configuration - Parameters, Errors, Predicates
// =============================================================================

mod tier2_configuration {
    use super::*;
    use mesh::adaptive::{PositionLookup, DEFAULT_DEGENERATE_AREA, DEFAULT_MERGE_DISTANCE_SQ};

    #[test]
    fn params_builder_pattern() {
        // Default params
        let params = AdaptiveParams::default();
        assert!(params.min_edge_length > 0.0);
        assert!((params.merge_distance_sq - DEFAULT_MERGE_DISTANCE_SQ).abs() < f64::EPSILON);
        assert!((params.degenerate_area - DEFAULT_DEGENERATE_AREA).abs() < f64::EPSILON);

        // Builder pattern
        let params = AdaptiveParams::with_edge_length(0.5)
            .with_merge_distance_sq(1e-8)
            .with_degenerate_area(1e-10)
            .with_position_lookup(PositionLookup::Linear)
            .with_max_splits(Some(100))
            .with_reindex_interval(Some(10));

        assert!((params.min_edge_length - 0.5).abs() < f64::EPSILON);
        assert_eq!(params.position_lookup, PositionLookup::Linear);
        assert_eq!(params.max_splits, Some(100));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn invalid_params_are_errors() {
        let err = AdaptiveParams::with_edge_length(f64::NAN).validate().unwrap_err();
        assert!(matches!(err, AdaptiveError::InvalidEdgeLength(_)));

        let err = AdaptiveParams::default()
            .with_merge_distance_sq(-1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AdaptiveError::InvalidMergeDistance(_)));

        // Display trait
        let display = format!("{}", err);
        assert!(display.contains("merge distance"));
    }

    #[test]
    fn stock_predicates() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        assert!(AlwaysVisible.is_visible(&a, &b, &c));
        assert!(FacingPoint::new(Point3::new(0.0, 0.0, 5.0)).is_visible(&a, &b, &c));
        assert!(!FacingPoint::new(Point3::new(0.0, 0.0, -5.0)).is_visible(&a, &b, &c));
        assert!((EuclideanLength.length(&a, &b) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn closures_are_predicates() {
        let visible = |a: &Point3<f64>, _: &Point3<f64>, _: &Point3<f64>| a.x >= 0.0;
        let manhattan = |a: &Point3<f64>, b: &Point3<f64>| (b - a).abs().sum();

        let p = Point3::new(1.0, 1.0, 0.0);
        assert!(visible.is_visible(&p, &p, &p));
        assert!((manhattan.length(&Point3::origin(), &p) - 2.0).abs() < f64::EPSILON);
    }
}

// =============================================================================
// TIER 3: Refinement - Engine, Driver, Write-back
// =============================================================================

mod tier3_refinement {
    use super::*;

    #[test]
    fn engine_step_by_step() {
        let params = AdaptiveParams::with_edge_length(1.0);
        let mut engine =
            AdaptiveSubdivider::new(square_strip(), &params, AlwaysVisible, EuclideanLength)
                .unwrap();

        assert_eq!(engine.triangle_count(), 2);
        assert_eq!(engine.position_count(), 4);
        assert!((engine.longest_edge() - 32.0_f64.sqrt()).abs() < 1e-12);

        // The diagonal is shared: one split replaces both triangles
        assert_eq!(engine.divide_once(), 4);
        assert_eq!(engine.live_triangle_count(), 4);
        assert_eq!(engine.position_count(), 5);

        let erased = engine.reindex(2.0).unwrap();
        assert_eq!(erased, 2);
        assert_eq!(engine.triangle_count(), 4);

        let outcome = engine.refine();
        assert!(outcome.converged);
        assert!(engine.longest_edge().abs() < f64::EPSILON);

        let mesh = engine.finalize();
        assert!(mesh.is_triangulated());
        assert_eq!(mesh.groups.len(), 1);
    }

    #[test]
    fn engine_views() {
        let params = AdaptiveParams::with_edge_length(1.0);
        let engine =
            AdaptiveSubdivider::new(square_strip(), &params, AlwaysVisible, EuclideanLength)
                .unwrap();

        let (idx, longest) = engine.queued_edges().last().unwrap();
        assert_eq!(engine.edge(idx).positions(), longest.positions());
        assert_eq!(longest.triangles().len(), 2);

        let face = engine.triangle(adaptive::TriangleIdx::new(0));
        assert!(face.is_visible());
        assert!(!face.is_excluded());
        let v = face.vertices()[1];
        assert!((engine.position(engine.position_of(v)).x - 4.0).abs() < f64::EPSILON);
        assert!((engine.vertex(v).position.x - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn subdivide_mesh_driver() {
        let params = AdaptiveParams::with_edge_length(1.0);
        let result = subdivide_mesh(square_strip(), &params, AlwaysVisible, EuclideanLength).unwrap();

        assert_eq!(result.original_triangles, 2);
        assert_eq!(result.original_vertices, 4);
        assert!(result.was_subdivided());
        assert!(result.triangle_ratio() > 1.0);
        assert_eq!(result.final_triangles, result.mesh.triangle_count());
        assert_eq!(result.final_vertices, result.mesh.vertex_count());

        // Display trait
        let display = format!("{}", result);
        assert!(display.contains("converged"));
    }

    #[test]
    fn subdivide_mesh_rejects_bad_indices() {
        let mut mesh = square_strip();
        mesh.groups[0].indices.push(99);
        let err = subdivide_mesh(mesh, &AdaptiveParams::default(), AlwaysVisible, EuclideanLength)
            .unwrap_err();
        assert!(matches!(err, AdaptiveError::VertexOutOfRange { index: 99, .. }));
    }

    #[test]
    fn screen_space_refinement() {
        use nalgebra::{Matrix4, Vector2};

        // Identity projection: NDC [-1, 1] spans a 100x100 pixel viewport,
        // so one world unit is 50 pixels.
        let metric = ScreenSpaceLength::new(Matrix4::identity(), Vector2::new(100.0, 100.0));
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.5, 0.0, 0.0);
        assert!((metric.length(&a, &b) - 25.0).abs() < 1e-9);

        let mesh = types::RenderMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2]);
        let params = AdaptiveParams::with_edge_length(20.0);
        let result = subdivide_mesh(mesh, &params, AlwaysVisible, metric).unwrap();

        assert!(result.outcome.converged);
        assert!(result.was_subdivided());
        for face in result.mesh.groups[0].triangles() {
            let tri = result.mesh.triangle(face).unwrap();
            assert!(metric.length(&tri.v0, &tri.v1) < 20.0);
            assert!(metric.length(&tri.v1, &tri.v2) < 20.0);
            assert!(metric.length(&tri.v2, &tri.v0) < 20.0);
        }
    }
}
