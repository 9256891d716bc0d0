//! # TRACLUS
//!
//! Trajectory clustering with the partition-and-group framework.
//!
//! This library provides:
//! - MDL-based trajectory partitioning into characteristic line segments
//! - Density-based (DBSCAN-style) clustering of line segments
//! - Representative trajectory construction by sweep-line averaging
//! - A whitespace trajectory record loader
//! - Parallel processing for batch operations
//!
//! ## Features
//!
//! - **`parallel`** - Partition trajectories and build representatives with rayon
//! - **`synthetic`** - Seeded synthetic corridor generator for tests and benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use traclus::{Point, Traclus, TraclusConfig, Trajectory};
//!
//! let line = |id: &str, y: f64| {
//!     let points = (0..=20).map(|i| Point::new(i as f64 * 50.0, y)).collect();
//!     Trajectory::new(id, points)
//! };
//! let trajectories = vec![line("a", 0.0), line("b", 100.0)];
//!
//! let config = TraclusConfig {
//!     eps: 150.0,
//!     min_neighbors: 2,
//!     min_trajectories: 2,
//!     min_segment_coverage: 2,
//!     ..TraclusConfig::default()
//! };
//!
//! let result = Traclus::new(config).unwrap().run(&trajectories).unwrap();
//! assert_eq!(result.representatives.len(), 1);
//! ```

use geo::Coord;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, TraclusError};

// Geometric distance functions shared by partitioning and clustering
pub mod distance;

// Stage 1: MDL partitioning
pub mod partition;
pub use partition::{PartitionConfig, TrajectoryPartitioner, partition, partition_trajectory};

// R-tree over segment envelopes
pub mod index;
pub use index::SegmentIndex;

// Stage 2: segment DBSCAN
pub mod clustering;
pub use clustering::{ClusterConfig, ClusterLabel, SegmentClusterer, cluster};

// Stage 3: representative trajectories
pub mod representative;
pub use representative::{RepresentativeBuilder, RepresentativeConfig, build_representatives};

// Orchestration of all three stages
pub mod pipeline;
pub use pipeline::{PipelineStats, Traclus, TraclusResult};

pub mod progress;
pub use progress::{AtomicProgressTracker, NoopProgress, PipelineStage, ProgressCallback};

// Trajectory record reader/writer
pub mod loader;

#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A planar coordinate. `x` is longitude and `y` latitude for geographic data.
///
/// Also used as a 2-D vector (segment directions, averages).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length when read as a vector.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Check that both coordinates are finite.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl From<Coord<f64>> for Point {
    fn from(c: Coord<f64>) -> Self {
        Point::new(c.x, c.y)
    }
}

impl From<Point> for Coord<f64> {
    fn from(p: Point) -> Self {
        Coord { x: p.x, y: p.y }
    }
}

/// A directed line segment cut from one trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    /// Identifier of the trajectory this segment was cut from
    pub trajectory_id: String,
}

impl Segment {
    pub fn new(start: Point, end: Point, trajectory_id: impl Into<String>) -> Self {
        Self {
            start,
            end,
            trajectory_id: trajectory_id.into(),
        }
    }

    /// Euclidean distance between the endpoints.
    pub fn length(&self) -> f64 {
        distance::point_distance(&self.start, &self.end)
    }

    /// Direction vector `end - start`.
    pub fn direction(&self) -> Point {
        self.end - self.start
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// Bounding box of the two endpoints.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_point(&self.start).including(&self.end)
    }
}

/// An ordered sequence of points with an identifier.
///
/// Raw inputs carry the recording's id; representative trajectories carry
/// their dense cluster index (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub id: String,
    pub points: Vec<Point>,
}

impl Trajectory {
    /// Create a trajectory. Point count is checked by [`Trajectory::validate`].
    pub fn new(id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fail with [`TraclusError::InsufficientPoints`] unless there are at least 2 points.
    pub fn validate(&self) -> Result<()> {
        self.points
            .get(1)
            .map(|_| ())
            .ok_or_insufficient_points(&self.id, self.points.len(), 2)
    }

    /// Sum of consecutive point distances.
    pub fn total_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| distance::point_distance(&w[0], &w[1]))
            .sum()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Zero-area box at a single point.
    pub fn from_point(p: &Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Smallest box holding both `self` and `p`.
    pub fn including(&self, p: &Point) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    /// Grow the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Largest absolute coordinate of any corner.
    pub fn magnitude(&self) -> f64 {
        self.min_x
            .abs()
            .max(self.min_y.abs())
            .max(self.max_x.abs())
            .max(self.max_y.abs())
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Parameters for the whole pipeline.
///
/// Defaults match the settings commonly used for the elk 1993 telemetry set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraclusConfig {
    /// Partition segments shorter than this are dropped.
    /// Default: 50.0
    pub min_segment_length: f64,

    /// Bits added to the no-partition MDL cost before comparing.
    /// Larger values yield fewer, longer partitions. Default: 0
    pub mdl_cost_advantage: u32,

    /// Neighborhood radius for segment DBSCAN.
    /// Default: 25.0
    pub eps: f64,

    /// Minimum neighborhood size (self included) for a core segment.
    /// Default: 5
    pub min_neighbors: usize,

    /// Minimum spacing along the sweep axis between representative points.
    /// Default: 30.0
    pub min_smoothing_length: f64,

    /// Clusters drawing on fewer distinct trajectories emit no representative.
    /// Default: 10
    pub min_trajectories: usize,

    /// Minimum number of segments covering a sweep position.
    /// Default: 10
    pub min_segment_coverage: usize,
}

impl Default for TraclusConfig {
    fn default() -> Self {
        Self {
            min_segment_length: 50.0,
            mdl_cost_advantage: 0,
            eps: 25.0,
            min_neighbors: 5,
            min_smoothing_length: 30.0,
            min_trajectories: 10,
            min_segment_coverage: 10,
        }
    }
}

impl TraclusConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("minSegmentLength", self.min_segment_length),
            ("eps", self.eps),
            ("minSmoothingLength", self.min_smoothing_length),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(TraclusError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        let counts = [
            ("minNeighbors", self.min_neighbors),
            ("minTrajectories", self.min_trajectories),
            ("minSegmentCoverage", self.min_segment_coverage),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(TraclusError::InvalidConfig(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_length_and_direction() {
        let s = Segment::new(Point::new(1.0, 1.0), Point::new(4.0, 5.0), "t");
        assert_eq!(s.length(), 5.0);
        assert_eq!(s.direction(), Point::new(3.0, 4.0));
        assert!(!s.is_degenerate());
    }

    #[test]
    fn test_trajectory_validate() {
        let ok = Trajectory::new("a", vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(ok.validate().is_ok());

        let short = Trajectory::new("b", vec![Point::new(0.0, 0.0)]);
        assert!(matches!(
            short.validate(),
            Err(TraclusError::InsufficientPoints { point_count: 1, .. })
        ));
    }

    #[test]
    fn test_bounds() {
        let b = Bounds::from_point(&Point::new(2.0, -1.0)).including(&Point::new(-3.0, 4.0));
        assert_eq!(b.min_x, -3.0);
        assert_eq!(b.max_y, 4.0);
        assert_eq!(b.magnitude(), 4.0);

        let seg = Segment::new(Point::new(5.0, 1.0), Point::new(-1.0, 2.0), "t");
        assert_eq!(
            seg.bounds(),
            Bounds {
                min_x: -1.0,
                min_y: 1.0,
                max_x: 5.0,
                max_y: 2.0
            }
        );
        assert_eq!(seg.bounds().expand(0.5).min_y, 0.5);
    }

    #[test]
    fn test_coord_conversions() {
        let p = Point::new(-105.27, 40.01);
        let c: Coord<f64> = p.into();
        assert_eq!(c, Coord { x: -105.27, y: 40.01 });
        assert_eq!(Point::from(geo::Point::from(c).0), p);
    }

    #[test]
    fn test_config_validate() {
        assert!(TraclusConfig::default().validate().is_ok());

        let bad_eps = TraclusConfig {
            eps: f64::NAN,
            ..TraclusConfig::default()
        };
        assert!(matches!(
            bad_eps.validate(),
            Err(TraclusError::InvalidConfig(_))
        ));

        let bad_count = TraclusConfig {
            min_neighbors: 0,
            ..TraclusConfig::default()
        };
        assert!(bad_count.validate().is_err());
    }

    #[test]
    fn test_config_json_partial() {
        let config: TraclusConfig = serde_json::from_str(r#"{"eps": 40.0}"#).unwrap();
        assert_eq!(config.eps, 40.0);
        assert_eq!(config.min_neighbors, 5);
    }
}
