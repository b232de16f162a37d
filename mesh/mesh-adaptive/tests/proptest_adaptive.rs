//! Property-based tests for adaptive subdivision.
//!
//! These tests use proptest to generate random meshes and verify the engine's
//! invariants after construction, after every split and after refinement.
//!
//! Run with: cargo test -p mesh-adaptive -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_possible_truncation)]

use mesh_adaptive::{
    AdaptiveParams, AdaptiveSubdivider, EdgeMetric, EuclideanLength, PositionLookup,
    TriangleIdx, VisibilityOracle,
};
use mesh_types::{IndexGroup, Point3, RenderMesh, Triangle, Vertex};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating random meshes
// =============================================================================

/// Generate a random vertex position in a bounded range.
fn arb_position() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-5.0..5.0f64)
}

/// Generate a position on the integer lattice, so coordinates repeat per axis.
fn arb_lattice_position() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3((-5..5i32).prop_map(f64::from))
}

/// Generate a lattice position in the `z = 0` plane.
fn arb_planar_position() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform2((-5..5i32).prop_map(f64::from)).prop_map(|[x, y]| [x, y, 0.0])
}

/// Generate a mesh with valid indices split across one or two groups.
fn arb_mesh(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = RenderMesh> {
    arb_mesh_with(arb_position().boxed(), max_vertices, max_faces)
}

/// Like [`arb_mesh`], drawing vertex positions from `positions`.
fn arb_mesh_with(
    positions: BoxedStrategy<[f64; 3]>,
    max_vertices: usize,
    max_faces: usize,
) -> impl Strategy<Value = RenderMesh> {
    (3..=max_vertices).prop_flat_map(move |num_vertices| {
        let vertices = prop::collection::vec(positions.clone(), num_vertices);
        let n = num_vertices as u32;
        let faces = prop::collection::vec(prop::array::uniform3(0..n), 1..=max_faces);
        (vertices, faces, 0..=max_faces).prop_map(|(coords, faces, cut)| {
            let indices: Vec<u32> = faces.iter().flatten().copied().collect();
            let cut = cut.min(faces.len()) * 3;
            RenderMesh::from_parts(
                coords.into_iter().map(Vertex::from).collect(),
                vec![
                    IndexGroup::triangle_list(indices[..cut].to_vec()),
                    IndexGroup::triangle_list(indices[cut..].to_vec()),
                ],
            )
        })
    })
}

/// Visible only on the `x >= 0` side, so both visible and hidden triangles occur.
fn right_half(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool {
    a.x + b.x + c.x >= 0.0
}

fn build<V: VisibilityOracle>(
    mesh: RenderMesh,
    min_len: f64,
    visibility: V,
) -> AdaptiveSubdivider<V, EuclideanLength> {
    build_with(mesh, min_len, visibility, PositionLookup::default())
}

fn build_with<V: VisibilityOracle>(
    mesh: RenderMesh,
    min_len: f64,
    visibility: V,
    lookup: PositionLookup,
) -> AdaptiveSubdivider<V, EuclideanLength> {
    let params = AdaptiveParams::with_edge_length(min_len)
        .with_max_splits(Some(20_000))
        .with_position_lookup(lookup);
    AdaptiveSubdivider::new(mesh, &params, visibility, EuclideanLength).unwrap()
}

fn lookup(kd: bool) -> PositionLookup {
    if kd { PositionLookup::KdTree } else { PositionLookup::Linear }
}

fn face_triangle<V: VisibilityOracle, L: EdgeMetric>(
    engine: &AdaptiveSubdivider<V, L>,
    t: TriangleIdx,
) -> Triangle {
    let [a, b, c] = engine
        .triangle(t)
        .vertices()
        .map(|v| *engine.position(engine.position_of(v)));
    Triangle::new(a, b, c)
}

fn live_area<V: VisibilityOracle, L: EdgeMetric>(engine: &AdaptiveSubdivider<V, L>) -> f64 {
    (0..engine.triangle_count())
        .map(|i| TriangleIdx::new(i as u32))
        .filter(|&t| !engine.triangle(t).is_excluded())
        .map(|t| face_triangle(engine, t).area())
        .sum()
}

/// Check the queue and the triangle/edge links.
fn check_invariants<V: VisibilityOracle, L: EdgeMetric>(
    engine: &AdaptiveSubdivider<V, L>,
) -> Result<(), TestCaseError> {
    let mut last = f64::NEG_INFINITY;
    for (idx, edge) in engine.queued_edges() {
        prop_assert!(edge.length() >= last, "queue unsorted at {}", idx);
        prop_assert!(edge.length() >= engine.min_edge_length());
        last = edge.length();

        let live_visible = edge.triangles().iter().any(|&t| {
            let face = engine.triangle(t);
            face.is_visible() && !face.is_excluded()
        });
        prop_assert!(live_visible, "{} has no live visible triangle", idx);
    }

    for i in 0..engine.triangle_count() {
        let t = TriangleIdx::new(i as u32);
        let face = engine.triangle(t);
        if face.is_excluded() {
            continue;
        }
        for e in face.edges().into_iter().flatten() {
            prop_assert!(engine.edge(e).triangles().contains(&t), "{} lost {}", e, t);
        }
    }
    Ok(())
}

// =============================================================================
// Property Tests: Construction
// =============================================================================

proptest! {
    /// Construction never panics and leaves a consistent queue.
    #[test]
    fn construction_is_consistent(mesh in arb_mesh(12, 20)) {
        let engine = build(mesh, 1.0, right_half);
        check_invariants(&engine)?;
        prop_assert_eq!(engine.live_triangle_count(), engine.triangle_count());
    }

    /// Building twice from the same mesh gives the same queue.
    #[test]
    fn construction_is_deterministic(mesh in arb_mesh(12, 20)) {
        let a = build(mesh.clone(), 1.0, right_half);
        let b = build(mesh, 1.0, right_half);

        prop_assert_eq!(a.triangle_count(), b.triangle_count());
        prop_assert_eq!(a.position_count(), b.position_count());
        let lengths_a: Vec<f64> = a.queued_edges().map(|(_, e)| e.length()).collect();
        let lengths_b: Vec<f64> = b.queued_edges().map(|(_, e)| e.length()).collect();
        prop_assert_eq!(lengths_a, lengths_b);
    }

    /// Vertices within the merge distance of an earlier vertex share its position.
    #[test]
    fn near_duplicates_share_positions(
        offsets in prop::collection::vec(prop::array::uniform2(-5.0..5.0f64), 3..15),
        duplicates in prop::collection::vec((0..3usize, prop::array::uniform3(-1e-4..1e-4f64)), 0..10),
        kd in any::<bool>(),
    ) {
        // Distinct x coordinates 0.5 apart keep the originals well separated.
        let mut vertices: Vec<Vertex> = offsets
            .iter()
            .enumerate()
            .map(|(i, [y, z])| Vertex::from_coords(i as f64 * 0.5, *y, *z))
            .collect();
        let unique = vertices.len();
        for (source, [dx, dy, dz]) in &duplicates {
            let p = vertices[*source].position;
            vertices.push(Vertex::from_coords(p.x + dx, p.y + dy, p.z + dz));
        }

        let params = AdaptiveParams::default().with_position_lookup(lookup(kd));
        let mesh = RenderMesh::from_parts(vertices, vec![IndexGroup::triangle_list(vec![0, 1, 2])]);
        let engine = AdaptiveSubdivider::new(mesh, &params, right_half, EuclideanLength).unwrap();

        prop_assert_eq!(engine.position_count(), unique);
        for (k, (source, _)) in duplicates.iter().enumerate() {
            let dup = mesh_adaptive::VertexIdx::new((unique + k) as u32);
            let orig = mesh_adaptive::VertexIdx::new(*source as u32);
            prop_assert_eq!(engine.position_of(dup), engine.position_of(orig));
        }
    }
}

// =============================================================================
// Property Tests: Lattice Meshes
// =============================================================================

proptest! {
    /// Coplanar meshes with many vertices on one axis value build and stay
    /// consistent with either lookup.
    #[test]
    fn planar_lattice_is_consistent(
        mesh in arb_mesh_with(arb_planar_position().boxed(), 80, 60),
        kd in any::<bool>(),
    ) {
        let engine = build_with(mesh, 1.0, right_half, lookup(kd));
        check_invariants(&engine)?;
        prop_assert!(engine.position_count() <= 100);
    }

    /// Both lookups assign every vertex the same position.
    #[test]
    fn lookups_agree_on_lattice(mesh in arb_mesh_with(arb_lattice_position().boxed(), 80, 40)) {
        let linear = build_with(mesh.clone(), 1.0, right_half, PositionLookup::Linear);
        let kd = build_with(mesh, 1.0, right_half, PositionLookup::KdTree);

        prop_assert_eq!(linear.position_count(), kd.position_count());
        for i in 0..linear.vertex_count() {
            let v = mesh_adaptive::VertexIdx::new(i as u32);
            prop_assert_eq!(linear.position_of(v), kd.position_of(v));
        }
    }

    /// Splitting a planar lattice mesh keeps the queue consistent.
    #[test]
    fn planar_lattice_splits_preserve_invariants(
        mesh in arb_mesh_with(arb_planar_position().boxed(), 60, 30),
        steps in 1..40usize,
    ) {
        let mut engine = build(mesh, 0.75, right_half);
        for _ in 0..steps {
            engine.divide_once();
            check_invariants(&engine)?;
        }
    }
}

// =============================================================================
// Property Tests: Splitting
// =============================================================================

proptest! {
    /// Every split keeps the queue consistent and never revives a triangle.
    #[test]
    fn splits_preserve_invariants(mesh in arb_mesh(10, 12), steps in 1..40usize) {
        let mut engine = build(mesh, 0.75, right_half);
        let mut excluded: Vec<bool> = engine.triangles().iter().map(|f| f.is_excluded()).collect();

        for _ in 0..steps {
            let before = engine.triangle_count();
            engine.divide_once();
            check_invariants(&engine)?;
            prop_assert!(engine.triangle_count() >= before);

            for (slot, was) in excluded.iter().enumerate() {
                if *was {
                    prop_assert!(engine.triangles()[slot].is_excluded());
                }
            }
            excluded = engine.triangles().iter().map(|f| f.is_excluded()).collect();
        }
    }

    /// Splitting conserves the area of the live triangles.
    #[test]
    fn splits_conserve_area(mesh in arb_mesh(10, 12), steps in 1..40usize) {
        let mut engine = build(mesh, 0.75, right_half);
        let area = live_area(&engine);
        for _ in 0..steps {
            engine.divide_once();
        }
        let after = live_area(&engine);
        prop_assert!((area - after).abs() <= 1e-6 * area.max(1.0), "{} != {}", area, after);
    }

    /// Once converged, no live visible triangle has a side at or above the threshold.
    #[test]
    fn converged_meshes_meet_threshold(mesh in arb_mesh(8, 8)) {
        let mut engine = build(mesh, 1.5, right_half);
        let outcome = engine.refine();
        prop_assert!(outcome.converged);
        prop_assert_eq!(engine.edge_count(), 0);

        for i in 0..engine.triangle_count() {
            let t = TriangleIdx::new(i as u32);
            let face = engine.triangle(t);
            if face.is_excluded() || !face.is_visible() {
                continue;
            }
            let tri = face_triangle(&engine, t);
            for (a, b) in [(tri.v0, tri.v1), (tri.v1, tri.v2), (tri.v2, tri.v0)] {
                prop_assert!(nalgebra::distance(&a, &b) < 1.5);
            }
        }
    }

    /// Compacting mid-way keeps the engine consistent.
    #[test]
    fn reindex_keeps_invariants(mesh in arb_mesh(10, 12), steps in 0..20usize, len in 0.5..3.0f64) {
        let mut engine = build(mesh, 1.0, right_half);
        for _ in 0..steps {
            engine.divide_once();
        }
        let live = engine.live_triangle_count();
        engine.reindex(len).unwrap();

        check_invariants(&engine)?;
        prop_assert_eq!(engine.triangle_count(), live);
        prop_assert!(engine.triangles().iter().all(|f| !f.is_excluded()));
    }
}

// =============================================================================
// Property Tests: Finalize
// =============================================================================

proptest! {
    /// Finalize writes exactly the live triangles, and finalizing the result
    /// again without splitting changes nothing.
    #[test]
    fn finalize_is_a_fixed_point(mesh in arb_mesh(10, 12), steps in 0..20usize) {
        let mut engine = build(mesh, 1.0, right_half);
        for _ in 0..steps {
            engine.divide_once();
        }
        let live = engine.live_triangle_count();
        let vertices = engine.vertex_count();
        let once = engine.finalize();

        prop_assert_eq!(once.triangle_count(), live);
        prop_assert_eq!(once.vertex_count(), vertices);
        prop_assert!(once.is_triangulated());

        let twice = build(once.clone(), 1.0, right_half).finalize();
        prop_assert_eq!(twice, once);
    }
}
