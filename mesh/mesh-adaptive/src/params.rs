//! Adaptive subdivision parameters.

use crate::error::{AdaptiveError, AdaptiveResult};

/// Squared distance below which two input vertices share one position.
pub const DEFAULT_MERGE_DISTANCE_SQ: f64 = 1e-6;

/// Area at or below which a triangle is treated as degenerate.
pub const DEFAULT_DEGENERATE_AREA: f64 = 1e-12;

/// Strategy used to deduplicate input vertex positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionLookup {
    /// Compare against every position seen so far. Quadratic, but no setup
    /// cost; fine for small meshes.
    Linear,

    /// Range query against a KD-tree built once over all input vertices.
    /// Merges exactly the same vertices as [`Linear`](Self::Linear).
    #[default]
    KdTree,
}

/// Parameters for adaptive subdivision.
#[derive(Debug, Clone)]
pub struct AdaptiveParams {
    /// Edges measuring below this length are never tracked or split.
    pub min_edge_length: f64,

    /// Squared merge distance for position deduplication.
    pub merge_distance_sq: f64,

    /// Triangles with area at or below this are dropped.
    pub degenerate_area: f64,

    /// Deduplication strategy.
    pub position_lookup: PositionLookup,

    /// Split budget for [`AdaptiveSubdivider::refine`](crate::AdaptiveSubdivider::refine).
    /// `None` refines until convergence.
    pub max_splits: Option<usize>,

    /// Compact excluded triangles every this many splits during refinement.
    /// `None` never compacts; `Some(0)` is rejected by [`validate`](Self::validate).
    pub reindex_interval: Option<usize>,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            min_edge_length: 1.0,
            merge_distance_sq: DEFAULT_MERGE_DISTANCE_SQ,
            degenerate_area: DEFAULT_DEGENERATE_AREA,
            position_lookup: PositionLookup::default(),
            max_splits: Some(1_000_000),
            reindex_interval: None,
        }
    }
}

impl AdaptiveParams {
    /// Create new parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create parameters that refine until every edge is shorter than `length`.
    #[must_use]
    pub fn with_edge_length(length: f64) -> Self {
        Self {
            min_edge_length: length,
            ..Self::default()
        }
    }

    /// Set the minimum tracked edge length.
    #[must_use]
    pub const fn with_min_edge_length(mut self, length: f64) -> Self {
        self.min_edge_length = length;
        self
    }

    /// Set the squared position merge distance.
    #[must_use]
    pub const fn with_merge_distance_sq(mut self, distance_sq: f64) -> Self {
        self.merge_distance_sq = distance_sq;
        self
    }

    /// Set the degenerate-area threshold.
    #[must_use]
    pub const fn with_degenerate_area(mut self, area: f64) -> Self {
        self.degenerate_area = area;
        self
    }

    /// Set the position deduplication strategy.
    #[must_use]
    pub const fn with_position_lookup(mut self, lookup: PositionLookup) -> Self {
        self.position_lookup = lookup;
        self
    }

    /// Set the split budget.
    #[must_use]
    pub const fn with_max_splits(mut self, max_splits: Option<usize>) -> Self {
        self.max_splits = max_splits;
        self
    }

    /// Set the compaction interval.
    #[must_use]
    pub const fn with_reindex_interval(mut self, interval: Option<usize>) -> Self {
        self.reindex_interval = interval;
        self
    }

    /// Check that every threshold is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the minimum edge length is not finite and positive,
    /// if the merge distance or degenerate area is negative or not finite, or
    /// if the reindex interval is `Some(0)`.
    pub fn validate(&self) -> AdaptiveResult<()> {
        validate_edge_length(self.min_edge_length)?;
        if !self.merge_distance_sq.is_finite() || self.merge_distance_sq < 0.0 {
            return Err(AdaptiveError::InvalidMergeDistance(self.merge_distance_sq));
        }
        if !self.degenerate_area.is_finite() || self.degenerate_area < 0.0 {
            return Err(AdaptiveError::InvalidDegenerateArea(self.degenerate_area));
        }
        if self.reindex_interval == Some(0) {
            return Err(AdaptiveError::InvalidReindexInterval);
        }
        Ok(())
    }
}

pub(crate) fn validate_edge_length(length: f64) -> AdaptiveResult<()> {
    if length.is_finite() && length > 0.0 {
        Ok(())
    } else {
        Err(AdaptiveError::InvalidEdgeLength(length))
    }
}
