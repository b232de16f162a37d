//! One-call refinement driver.

use mesh_types::RenderMesh;
use tracing::info;

use crate::error::AdaptiveResult;
use crate::oracle::{EdgeMetric, VisibilityOracle};
use crate::params::AdaptiveParams;
use crate::result::SubdivisionResult;
use crate::subdivider::AdaptiveSubdivider;

/// Refine `mesh` until every visible edge is shorter than
/// `params.min_edge_length` or the split budget runs out.
///
/// Builds an [`AdaptiveSubdivider`], runs
/// [`refine`](AdaptiveSubdivider::refine) and writes the result back with
/// [`finalize`](AdaptiveSubdivider::finalize).
///
/// # Errors
///
/// Returns an error if the parameters are invalid or the mesh references a
/// vertex that does not exist.
///
/// # Examples
///
/// ```
/// use mesh_adaptive::{subdivide_mesh, AdaptiveParams, AlwaysVisible, EuclideanLength};
/// use mesh_types::{IndexGroup, RenderMesh, Vertex};
///
/// let mut mesh = RenderMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(4.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 4.0, 0.0));
/// mesh.groups.push(IndexGroup::triangle_list(vec![0, 1, 2]));
///
/// let params = AdaptiveParams::with_edge_length(1.0);
/// let result = subdivide_mesh(mesh, &params, AlwaysVisible, EuclideanLength)?;
///
/// assert!(result.outcome.converged);
/// assert!(result.final_triangles > result.original_triangles);
/// # Ok::<(), mesh_adaptive::AdaptiveError>(())
/// ```
pub fn subdivide_mesh<V, L>(
    mesh: RenderMesh,
    params: &AdaptiveParams,
    visibility: V,
    metric: L,
) -> AdaptiveResult<SubdivisionResult>
where
    V: VisibilityOracle,
    L: EdgeMetric,
{
    let original_triangles = mesh.triangle_count();
    let original_vertices = mesh.vertex_count();

    info!(
        triangles = original_triangles,
        vertices = original_vertices,
        min_edge_length = params.min_edge_length,
        "Starting adaptive subdivision"
    );

    let mut engine = AdaptiveSubdivider::new(mesh, params, visibility, metric)?;
    let outcome = engine.refine();
    let mesh = engine.finalize();

    info!(
        splits = outcome.splits,
        reindexes = outcome.reindexes,
        converged = outcome.converged,
        triangles = mesh.triangle_count(),
        "Adaptive subdivision finished"
    );

    Ok(SubdivisionResult {
        original_triangles,
        final_triangles: mesh.triangle_count(),
        original_vertices,
        final_vertices: mesh.vertex_count(),
        mesh,
        outcome,
    })
}
