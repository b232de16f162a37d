//! Result types for adaptive subdivision.

// Triangle counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]

use mesh_types::RenderMesh;

/// What one [`refine`](crate::AdaptiveSubdivider::refine) call did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RefineOutcome {
    /// Edges split.
    pub splits: usize,

    /// Triangles created by those splits.
    pub triangles_created: usize,

    /// Compaction passes run.
    pub reindexes: usize,

    /// Excluded triangles erased by compaction.
    pub triangles_erased: usize,

    /// True if the edge queue ran empty (rather than the split budget).
    pub converged: bool,

    /// Longest queued edge when refinement stopped, 0 if converged.
    pub longest_edge: f64,
}

/// Result of [`subdivide_mesh`](crate::subdivide_mesh).
#[derive(Debug, Clone)]
pub struct SubdivisionResult {
    /// The refined mesh.
    pub mesh: RenderMesh,

    /// Triangles in the input mesh after primitive assembly.
    pub original_triangles: usize,

    /// Triangles in the refined mesh.
    pub final_triangles: usize,

    /// Vertices in the input mesh.
    pub original_vertices: usize,

    /// Vertices in the refined mesh.
    pub final_vertices: usize,

    /// Refinement statistics.
    pub outcome: RefineOutcome,
}

impl SubdivisionResult {
    /// Get the triangle multiplication factor.
    #[must_use]
    pub fn triangle_ratio(&self) -> f64 {
        if self.original_triangles == 0 {
            1.0
        } else {
            self.final_triangles as f64 / self.original_triangles as f64
        }
    }

    /// Check if any edge was split.
    #[must_use]
    pub const fn was_subdivided(&self) -> bool {
        self.outcome.splits > 0
    }
}

impl std::fmt::Display for SubdivisionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Adaptive subdivision: {} → {} triangles ({:.1}x), {} splits, {} reindexes, {}",
            self.original_triangles,
            self.final_triangles,
            self.triangle_ratio(),
            self.outcome.splits,
            self.outcome.reindexes,
            if self.outcome.converged {
                "converged".to_string()
            } else {
                format!("stopped at edge length {:.3}", self.outcome.longest_edge)
            }
        )
    }
}
