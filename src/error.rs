//! Unified error handling for the clustering pipeline.
//!
//! Only malformed input is an error. Numeric degeneracies (zero-length
//! vectors, zero rotated extents) have defined fallbacks, and clusters that
//! fail a gate are dropped silently.

use thiserror::Error;

/// Errors produced by the pipeline and the trajectory loader.
#[derive(Debug, Error)]
pub enum TraclusError {
    /// A trajectory does not have enough points to be partitioned.
    #[error(
        "trajectory '{trajectory_id}' has {point_count} points, at least {minimum_required} required"
    )]
    InsufficientPoints {
        trajectory_id: String,
        point_count: usize,
        minimum_required: usize,
    },

    /// Segment and label arrays passed to the representative builder differ in length.
    #[error("got {labels} cluster labels for {segments} segments")]
    LabelCountMismatch { segments: usize, labels: usize },

    /// An integer cluster code that is neither noise nor a cluster id.
    #[error("invalid cluster label {0}")]
    InvalidLabel(i32),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A trajectory record could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, TraclusError>;

/// Turn missing values into descriptive errors.
pub trait OptionExt<T> {
    /// Map `None` to a [`TraclusError::Parse`] at the given line.
    fn ok_or_parse(self, line: usize, message: &str) -> Result<T>;

    /// Map `None` to a [`TraclusError::InsufficientPoints`].
    fn ok_or_insufficient_points(
        self,
        trajectory_id: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, line: usize, message: &str) -> Result<T> {
        self.ok_or_else(|| TraclusError::Parse {
            line,
            message: message.to_string(),
        })
    }

    fn ok_or_insufficient_points(
        self,
        trajectory_id: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T> {
        self.ok_or_else(|| TraclusError::InsufficientPoints {
            trajectory_id: trajectory_id.to_string(),
            point_count,
            minimum_required,
        })
    }
}
