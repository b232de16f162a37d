//! Error types for adaptive subdivision.

use thiserror::Error;

/// Errors that can occur while configuring an adaptive subdivider.
///
/// Only construction and [`reindex`](crate::AdaptiveSubdivider::reindex) can
/// fail. Splitting cannot: empty queues, degenerate children and dead edges
/// are handled as part of normal flow.
#[derive(Debug, Error)]
pub enum AdaptiveError {
    /// Minimum edge length is not a positive finite number.
    #[error("Invalid minimum edge length: {0} (must be finite and > 0)")]
    InvalidEdgeLength(f64),

    /// Position merge distance is negative or not finite.
    #[error("Invalid merge distance squared: {0} (must be finite and >= 0)")]
    InvalidMergeDistance(f64),

    /// Degenerate-area threshold is negative or not finite.
    #[error("Invalid degenerate area threshold: {0} (must be finite and >= 0)")]
    InvalidDegenerateArea(f64),

    /// Periodic compaction was requested every 0 splits.
    #[error("Invalid reindex interval: 0 (use None to disable compaction)")]
    InvalidReindexInterval,

    /// A group references a vertex that does not exist.
    #[error("Group {group} references vertex {index}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        /// Index of the offending group.
        group: usize,
        /// The out-of-range vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}

/// Result type for adaptive subdivision operations.
pub type AdaptiveResult<T> = std::result::Result<T, AdaptiveError>;
