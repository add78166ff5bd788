use crate::params::VoronoiParams;

/// What made a set of Voronoi inputs unusable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigIssue {
    /// No labels to assign to sites.
    EmptyLabelSet,
    /// Chunk side length is zero, negative or not finite.
    NonPositiveScale(f64),
    /// Region sampling step is zero, negative or not finite.
    NonPositiveStep(f64),
    /// Query position is not finite, or its chunk neighbourhood leaves the
    /// `i32` chunk grid.
    PositionOutOfRange { x: f64, y: f64 },
    /// The cache already holds sites generated with other parameters.
    ParamsMismatch {
        bound: VoronoiParams,
        requested: VoronoiParams,
    },
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLabelSet => write!(f, "label set is empty"),
            Self::NonPositiveScale(scale) => write!(f, "chunk scale must be positive, got {}", scale),
            Self::NonPositiveStep(step) => write!(f, "sample step must be positive, got {}", step),
            Self::PositionOutOfRange { x, y } => {
                write!(f, "position ({}, {}) is outside the chunk grid", x, y)
            }
            Self::ParamsMismatch { bound, requested } => write!(
                f,
                "cache is bound to scale {} with {} sites per chunk, got scale {} with {}",
                bound.scale, bound.sites_per_chunk, requested.scale, requested.sites_per_chunk
            ),
        }
    }
}

/// Error type for Voronoi cache operations.
///
/// A query that finds no sites is not an error; it yields `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoronoiError {
    InvalidConfiguration(ConfigIssue),
}

impl From<ConfigIssue> for VoronoiError {
    fn from(issue: ConfigIssue) -> Self {
        Self::InvalidConfiguration(issue)
    }
}

impl std::fmt::Display for VoronoiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration(issue) => write!(f, "invalid Voronoi configuration: {}", issue),
        }
    }
}

impl std::error::Error for VoronoiError {}
