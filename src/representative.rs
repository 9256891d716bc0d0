//! Representative trajectory construction.
//!
//! For every cluster:
//! 1. Average the member segments' direction vectors
//! 2. Rotate the plane so that average points along the x-axis
//! 3. Drop the cluster if too few distinct trajectories contribute
//! 4. Sweep a vertical line over the rotated endpoint x-coordinates; where
//!    enough segments cover the line, average their y-values there
//! 5. Rotate each averaged point back and keep the cluster if at least two
//!    points were produced
//!
//! Output trajectories are numbered densely from 0 in cluster id order.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clustering::ClusterLabel;
use crate::progress::{NoopProgress, PipelineStage, ProgressCallback};
use crate::{Point, Result, Segment, TraclusConfig, TraclusError, Trajectory};

/// Representative construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentativeConfig {
    /// Minimum distance along the rotated x-axis between consecutive points
    pub min_smoothing_length: f64,
    /// Minimum distinct trajectories contributing to a cluster
    pub min_trajectories: usize,
    /// Minimum segments covering a sweep position
    pub min_segment_coverage: usize,
}

impl Default for RepresentativeConfig {
    fn default() -> Self {
        Self::from(&TraclusConfig::default())
    }
}

impl From<&TraclusConfig> for RepresentativeConfig {
    fn from(config: &TraclusConfig) -> Self {
        Self {
            min_smoothing_length: config.min_smoothing_length,
            min_trajectories: config.min_trajectories,
            min_segment_coverage: config.min_segment_coverage,
        }
    }
}

/// Rotation by the angle between a direction and the x-axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub cos: f64,
    pub sin: f64,
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation { cos: 1.0, sin: 0.0 };

    /// Rotation that maps `direction` onto the positive x-axis.
    ///
    /// A zero or non-finite direction gives the identity.
    pub fn from_direction(direction: &Point) -> Self {
        let length = direction.norm();
        if !(length > 0.0 && length.is_finite()) {
            return Self::IDENTITY;
        }
        let cos = (direction.x / length).clamp(-1.0, 1.0);
        let mut sin = (1.0 - cos * cos).sqrt();
        if direction.y < 0.0 {
            sin = -sin;
        }
        Self { cos, sin }
    }

    /// Original frame -> rotated frame.
    #[inline]
    pub fn rotate(&self, p: &Point) -> Point {
        Point::new(
            p.x * self.cos + p.y * self.sin,
            -p.x * self.sin + p.y * self.cos,
        )
    }

    /// Rotated frame -> original frame.
    #[inline]
    pub fn unrotate(&self, p: &Point) -> Point {
        Point::new(
            p.x * self.cos - p.y * self.sin,
            p.x * self.sin + p.y * self.cos,
        )
    }
}

/// The members of one cluster and its rotated frame.
#[derive(Debug, Clone)]
pub struct SegmentCluster<'a> {
    /// Cluster id assigned by the clusterer
    pub cluster_id: usize,
    /// Ascending indices into the segment collection
    pub segment_indices: Vec<usize>,
    /// Distinct owning trajectories
    pub trajectory_ids: BTreeSet<&'a str>,
    /// Mean of the members' `end - start` vectors
    pub average_direction: Point,
    pub rotation: Rotation,
}

impl SegmentCluster<'_> {
    pub fn trajectory_count(&self) -> usize {
        self.trajectory_ids.len()
    }
}

/// Group segment indices by cluster id and derive each cluster's frame.
///
/// Noise is skipped. Clusters come back in ascending id order.
pub fn segment_clusters<'a>(
    segments: &'a [Segment],
    labels: &[ClusterLabel],
) -> Vec<SegmentCluster<'a>> {
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        if let Some(id) = label.cluster_id() {
            members.entry(id).or_default().push(i);
        }
    }

    members
        .into_iter()
        .map(|(cluster_id, segment_indices)| {
            let mut sum = Point::default();
            let mut trajectory_ids = BTreeSet::new();
            for &i in &segment_indices {
                let d = segments[i].direction();
                sum.x += d.x;
                sum.y += d.y;
                trajectory_ids.insert(segments[i].trajectory_id.as_str());
            }
            let count = segment_indices.len() as f64;
            let average_direction = Point::new(sum.x / count, sum.y / count);

            SegmentCluster {
                cluster_id,
                segment_indices,
                trajectory_ids,
                average_direction,
                rotation: Rotation::from_direction(&average_direction),
            }
        })
        .collect()
}

/// A member segment in the cluster's rotated frame.
#[derive(Debug, Clone, Copy)]
struct RotatedSegment {
    start: Point,
    end: Point,
}

impl RotatedSegment {
    fn lo(&self) -> f64 {
        self.start.x.min(self.end.x)
    }

    fn hi(&self) -> f64 {
        self.start.x.max(self.end.x)
    }

    /// y on this segment at rotated position `x`.
    fn y_at(&self, x: f64) -> f64 {
        let t = (x - self.start.x) / (self.end.x - self.start.x);
        self.start.y + t * (self.end.y - self.start.y)
    }
}

/// Builds representative trajectories from labelled segments.
#[derive(Debug, Clone, Default)]
pub struct RepresentativeBuilder {
    config: RepresentativeConfig,
}

impl RepresentativeBuilder {
    pub fn new(config: RepresentativeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RepresentativeConfig {
        &self.config
    }

    /// One representative per qualifying cluster.
    ///
    /// Fails only if `segments` and `labels` differ in length.
    pub fn build(&self, segments: &[Segment], labels: &[ClusterLabel]) -> Result<Vec<Trajectory>> {
        self.build_with_progress(segments, labels, &NoopProgress)
    }

    /// [`RepresentativeBuilder::build`], reporting one progress item per cluster.
    pub fn build_with_progress(
        &self,
        segments: &[Segment],
        labels: &[ClusterLabel],
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<Trajectory>> {
        if segments.len() != labels.len() {
            return Err(TraclusError::LabelCountMismatch {
                segments: segments.len(),
                labels: labels.len(),
            });
        }

        let clusters = segment_clusters(segments, labels);
        progress.on_stage(
            PipelineStage::Representatives,
            u32::try_from(clusters.len()).unwrap_or(u32::MAX),
        );

        let sweep_one = |c: &SegmentCluster<'_>| {
            let points = self.representative_points(segments, c);
            progress.on_progress();
            points
        };

        #[cfg(feature = "parallel")]
        let point_sets: Vec<Option<Vec<Point>>> = clusters.par_iter().map(sweep_one).collect();

        #[cfg(not(feature = "parallel"))]
        let point_sets: Vec<Option<Vec<Point>>> = clusters.iter().map(sweep_one).collect();

        let representatives: Vec<Trajectory> = point_sets
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(i, points)| Trajectory::new(i.to_string(), points))
            .collect();

        info!(
            "[Representative] {} clusters -> {} representatives (min trajectories {}, min coverage {})",
            clusters.len(),
            representatives.len(),
            self.config.min_trajectories,
            self.config.min_segment_coverage
        );

        Ok(representatives)
    }

    /// Sweep one cluster. `None` if the cluster is gated out or yields fewer than 2 points.
    pub fn representative_points(
        &self,
        segments: &[Segment],
        cluster: &SegmentCluster<'_>,
    ) -> Option<Vec<Point>> {
        if cluster.trajectory_count() < self.config.min_trajectories {
            debug!(
                "[Representative] cluster {} dropped: {} trajectories < {}",
                cluster.cluster_id,
                cluster.trajectory_count(),
                self.config.min_trajectories
            );
            return None;
        }

        let rotation = cluster.rotation;
        let members: Vec<RotatedSegment> = cluster
            .segment_indices
            .iter()
            .map(|&i| RotatedSegment {
                start: rotation.rotate(&segments[i].start),
                end: rotation.rotate(&segments[i].end),
            })
            .collect();

        // Every member endpoint is a sweep position
        let mut sweep_xs: Vec<f64> = members.iter().flat_map(|r| [r.lo(), r.hi()]).collect();
        sweep_xs.sort_by(f64::total_cmp);
        sweep_xs.dedup();

        // Zero rotated extent cannot be interpolated and never covers the sweep line
        let rotated: Vec<RotatedSegment> = members
            .into_iter()
            .filter(|r| r.end.x - r.start.x != 0.0)
            .collect();

        let mut by_lo: Vec<usize> = (0..rotated.len()).collect();
        by_lo.sort_by(|&a, &b| rotated[a].lo().total_cmp(&rotated[b].lo()));
        let mut by_hi: Vec<usize> = (0..rotated.len()).collect();
        by_hi.sort_by(|&a, &b| rotated[a].hi().total_cmp(&rotated[b].hi()));

        // Positions in `rotated`, which follows ascending segment index
        let mut active: BTreeSet<usize> = BTreeSet::new();
        let mut next_start = 0;
        let mut next_end = 0;
        let mut previous_x: Option<f64> = None;
        let mut points = Vec::new();

        for x in sweep_xs {
            while next_start < by_lo.len() && rotated[by_lo[next_start]].lo() <= x {
                active.insert(by_lo[next_start]);
                next_start += 1;
            }
            while next_end < by_hi.len() && rotated[by_hi[next_end]].hi() < x {
                active.remove(&by_hi[next_end]);
                next_end += 1;
            }

            if active.len() < self.config.min_segment_coverage {
                continue;
            }
            if previous_x.is_some_and(|prev| x - prev < self.config.min_smoothing_length) {
                continue;
            }

            let y_sum: f64 = active.iter().map(|&k| rotated[k].y_at(x)).sum();
            let average = Point::new(x, y_sum / active.len() as f64);
            points.push(rotation.unrotate(&average));
            previous_x = Some(x);
        }

        if points.len() < 2 {
            debug!(
                "[Representative] cluster {} dropped: {} sweep points",
                cluster.cluster_id,
                points.len()
            );
            return None;
        }

        Some(points)
    }
}

/// Build representative trajectories with the given thresholds.
pub fn build_representatives(
    segments: &[Segment],
    labels: &[ClusterLabel],
    min_smoothing_length: f64,
    min_trajectories: usize,
    min_segment_coverage: usize,
) -> Result<Vec<Trajectory>> {
    RepresentativeBuilder::new(RepresentativeConfig {
        min_smoothing_length,
        min_trajectories,
        min_segment_coverage,
    })
    .build(segments, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64, id: &str) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2), id)
    }

    #[test]
    fn test_rotation_round_trip() {
        let rotation = Rotation::from_direction(&Point::new(3.0, -4.0));
        assert!(approx_eq(rotation.cos, 0.6, 1e-12));
        assert!(approx_eq(rotation.sin, -0.8, 1e-12));

        let aligned = rotation.rotate(&Point::new(3.0, -4.0));
        assert!(approx_eq(aligned.x, 5.0, 1e-12));
        assert!(approx_eq(aligned.y, 0.0, 1e-12));

        let p = Point::new(-7.5, 12.25);
        let back = rotation.unrotate(&rotation.rotate(&p));
        assert!(approx_eq(back.x, p.x, 1e-12));
        assert!(approx_eq(back.y, p.y, 1e-12));
    }

    #[test]
    fn test_rotation_of_zero_direction_is_identity() {
        assert_eq!(Rotation::from_direction(&Point::new(0.0, 0.0)), Rotation::IDENTITY);
    }

    #[test]
    fn test_segment_clusters_group_and_average() {
        let segments = vec![
            seg(0.0, 0.0, 10.0, 0.0, "a"),
            seg(0.0, 0.0, 0.0, 10.0, "a"),
            seg(5.0, 5.0, 15.0, 5.0, "b"),
        ];
        let labels = vec![
            ClusterLabel::Cluster(1),
            ClusterLabel::Noise,
            ClusterLabel::Cluster(1),
        ];
        let clusters = segment_clusters(&segments, &labels);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_id, 1);
        assert_eq!(clusters[0].segment_indices, vec![0, 2]);
        assert_eq!(clusters[0].trajectory_count(), 2);
        assert_eq!(clusters[0].average_direction, Point::new(10.0, 0.0));
        assert_eq!(clusters[0].rotation, Rotation::IDENTITY);
    }

    #[test]
    fn test_sweep_respects_coverage_and_spacing() {
        // Staggered horizontal segments from three trajectories
        let segments = vec![
            seg(0.0, 0.0, 100.0, 0.0, "a"),
            seg(10.0, 6.0, 110.0, 6.0, "b"),
            seg(20.0, 3.0, 120.0, 3.0, "c"),
        ];
        let labels = vec![ClusterLabel::Cluster(0); 3];
        let builder = RepresentativeBuilder::new(RepresentativeConfig {
            min_smoothing_length: 15.0,
            min_trajectories: 3,
            min_segment_coverage: 2,
        });
        let clusters = segment_clusters(&segments, &labels);
        let points = builder.representative_points(&segments, &clusters[0]).unwrap();

        // Sweep xs: 0 (1 seg), 10 (2), 20 (3), 100 (3), 110 (2), 120 (1).
        // x=20 and x=110 are each only 10 past an accepted position.
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![10.0, 100.0]);
        assert!(approx_eq(points[0].y, 3.0, 1e-12));
        assert!(approx_eq(points[1].y, 3.0, 1e-12));

        let dense = RepresentativeBuilder::new(RepresentativeConfig {
            min_smoothing_length: 0.0,
            ..*builder.config()
        });
        let points = dense.representative_points(&segments, &clusters[0]).unwrap();
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![10.0, 20.0, 100.0, 110.0]);
        assert!(approx_eq(points[3].y, 4.5, 1e-12));
    }

    #[test]
    fn test_vertical_endpoints_are_sweep_positions() {
        // The verticals cancel out, so the average direction stays on the x-axis
        let segments = vec![
            seg(0.0, 0.0, 100.0, 0.0, "a"),
            seg(0.0, 10.0, 100.0, 10.0, "b"),
            seg(50.0, -20.0, 50.0, 20.0, "c"),
            seg(60.0, 20.0, 60.0, -20.0, "d"),
        ];
        let labels = vec![ClusterLabel::Cluster(0); 4];

        // The verticals never count toward coverage
        let reps = build_representatives(&segments, &labels, 0.0, 2, 3).unwrap();
        assert!(reps.is_empty());

        // but their x positions are still visited
        let reps = build_representatives(&segments, &labels, 0.0, 2, 2).unwrap();
        assert_eq!(reps.len(), 1);
        let xs: Vec<f64> = reps[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 50.0, 60.0, 100.0]);
        for p in &reps[0].points {
            assert!(approx_eq(p.y, 5.0, 1e-12), "{:?}", p);
        }
    }

    #[test]
    fn test_shared_endpoint_counts_both_segments() {
        // Consecutive segments of "a" both cover x=50
        let segments = vec![
            seg(0.0, 0.0, 50.0, 0.0, "a"),
            seg(50.0, 0.0, 100.0, 0.0, "a"),
            seg(0.0, 10.0, 100.0, 10.0, "b"),
        ];
        let labels = vec![ClusterLabel::Cluster(0); 3];
        let reps = build_representatives(&segments, &labels, 0.0, 2, 2).unwrap();

        let points = &reps[0].points;
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 50.0, 100.0]);
        assert!(approx_eq(points[0].y, 5.0, 1e-12));
        assert!(approx_eq(points[1].y, 10.0 / 3.0, 1e-12));
        assert!(approx_eq(points[2].y, 5.0, 1e-12));

        // Only the shared endpoint reaches three
        let reps = build_representatives(&segments, &labels, 0.0, 2, 3).unwrap();
        assert!(reps.is_empty());
    }

    #[test]
    fn test_label_count_mismatch() {
        let segments = vec![seg(0.0, 0.0, 1.0, 0.0, "a")];
        let result = build_representatives(&segments, &[], 0.0, 1, 1);
        assert!(matches!(
            result,
            Err(TraclusError::LabelCountMismatch {
                segments: 1,
                labels: 0
            })
        ));
    }
}
