//! MDL trajectory partitioning.
//!
//! Each trajectory is reduced to its characteristic points: the places where
//! describing the path by a single chord stops being cheaper than describing
//! every original edge. Costs are in whole bits:
//!
//! - `L(H)`, no partition: `Σ ⌈log2 |p_k p_k+1|⌉` over the window's edges
//! - `L(H)`, partition: `⌈log2 |p_start p_curr|⌉` for the chord
//! - `L(D|H)`: `Σ ⌈log2 d_perp⌉ + ⌈log2 d_angle⌉` between the chord and each edge
//!
//! Every distance is floored at 1.0 before taking the logarithm.

use log::info;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::distance::{angle_distance, perpendicular_distance, point_distance};
use crate::progress::{NoopProgress, PipelineStage, ProgressCallback};
use crate::{Result, Segment, TraclusConfig, Trajectory};

/// Partitioning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionConfig {
    /// Segments shorter than this are dropped
    pub min_segment_length: f64,
    /// Bits added to the no-partition cost before comparing
    pub mdl_cost_advantage: u32,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self::from(&TraclusConfig::default())
    }
}

impl From<&TraclusConfig> for PartitionConfig {
    fn from(config: &TraclusConfig) -> Self {
        Self {
            min_segment_length: config.min_segment_length,
            mdl_cost_advantage: config.mdl_cost_advantage,
        }
    }
}

/// Bits needed to encode a length: `⌈log2(max(1, d))⌉`.
#[inline]
fn encoding_bits(distance: f64) -> u64 {
    distance.max(1.0).log2().ceil() as u64
}

/// Splits trajectories into characteristic line segments.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryPartitioner {
    config: PartitionConfig,
}

impl TrajectoryPartitioner {
    pub fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Indices of the characteristic points of one trajectory.
    ///
    /// Always starts with 0 and ends with `len - 1`; strictly increasing.
    pub fn characteristic_points(&self, trajectory: &Trajectory) -> Result<Vec<usize>> {
        trajectory.validate()?;
        Ok(self.characteristic_indices(trajectory))
    }

    fn characteristic_indices(&self, trajectory: &Trajectory) -> Vec<usize> {
        let points = &trajectory.points;
        let n = points.len();
        let advantage = u64::from(self.config.mdl_cost_advantage);

        let mut indices = vec![0];
        let mut start = 0;
        let mut length = 1;

        while start + length < n {
            let curr = start + length;
            let partition_cost =
                model_cost(trajectory, start, curr) + encoding_cost(trajectory, start, curr);
            let no_partition_cost = no_partition_cost(trajectory, start, curr);

            if partition_cost > no_partition_cost + advantage {
                indices.push(curr - 1);
                start = curr - 1;
                length = 1;
            } else {
                length += 1;
            }
        }

        indices.push(n - 1);
        indices
    }

    /// Partition one trajectory into segments, dropping short ones.
    pub fn partition_trajectory(&self, trajectory: &Trajectory) -> Result<Vec<Segment>> {
        trajectory.validate()?;
        Ok(self.segments_of(trajectory))
    }

    fn segments_of(&self, trajectory: &Trajectory) -> Vec<Segment> {
        let points = &trajectory.points;
        self.characteristic_indices(trajectory)
            .windows(2)
            .map(|w| Segment::new(points[w[0]], points[w[1]], trajectory.id.as_str()))
            .filter(|s| s.length() >= self.config.min_segment_length)
            .collect()
    }

    /// Partition a batch of trajectories.
    ///
    /// Every trajectory is validated before any work starts. Output segments
    /// are grouped by trajectory in input order.
    pub fn partition(&self, trajectories: &[Trajectory]) -> Result<Vec<Segment>> {
        self.partition_with_progress(trajectories, &NoopProgress)
    }

    /// [`TrajectoryPartitioner::partition`], reporting one progress item per trajectory.
    pub fn partition_with_progress(
        &self,
        trajectories: &[Trajectory],
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<Segment>> {
        for trajectory in trajectories {
            trajectory.validate()?;
        }

        progress.on_stage(
            PipelineStage::Partitioning,
            u32::try_from(trajectories.len()).unwrap_or(u32::MAX),
        );

        let partition_one = |t: &Trajectory| {
            let segments = self.segments_of(t);
            progress.on_progress();
            segments
        };

        #[cfg(feature = "parallel")]
        let per_trajectory: Vec<Vec<Segment>> =
            trajectories.par_iter().map(partition_one).collect();

        #[cfg(not(feature = "parallel"))]
        let per_trajectory: Vec<Vec<Segment>> =
            trajectories.iter().map(partition_one).collect();

        let segments: Vec<Segment> = per_trajectory.into_iter().flatten().collect();

        info!(
            "[Partition] {} trajectories -> {} segments (min length {})",
            trajectories.len(),
            segments.len(),
            self.config.min_segment_length
        );

        Ok(segments)
    }
}

/// `L(H)` when `i` and `j` are the only characteristic points.
fn model_cost(trajectory: &Trajectory, i: usize, j: usize) -> u64 {
    encoding_bits(point_distance(&trajectory.points[i], &trajectory.points[j]))
}

/// `L(H)` when there is no characteristic point between `i` and `j`.
fn no_partition_cost(trajectory: &Trajectory, i: usize, j: usize) -> u64 {
    trajectory.points[i..=j]
        .windows(2)
        .map(|w| encoding_bits(point_distance(&w[0], &w[1])))
        .sum()
}

/// `L(D|H)` when `i` and `j` are the only characteristic points.
fn encoding_cost(trajectory: &Trajectory, i: usize, j: usize) -> u64 {
    let points = &trajectory.points;
    let chord = Segment::new(points[i], points[j], trajectory.id.as_str());
    points[i..=j]
        .windows(2)
        .map(|w| {
            let edge = Segment::new(w[0], w[1], trajectory.id.as_str());
            encoding_bits(perpendicular_distance(&chord, &edge))
                + encoding_bits(angle_distance(&chord, &edge))
        })
        .sum()
}

/// Partition every trajectory with the given minimum segment length.
pub fn partition(trajectories: &[Trajectory], min_segment_length: f64) -> Result<Vec<Segment>> {
    TrajectoryPartitioner::new(PartitionConfig {
        min_segment_length,
        mdl_cost_advantage: 0,
    })
    .partition(trajectories)
}

/// Partition a single trajectory with the given minimum segment length.
pub fn partition_trajectory(trajectory: &Trajectory, min_segment_length: f64) -> Result<Vec<Segment>> {
    TrajectoryPartitioner::new(PartitionConfig {
        min_segment_length,
        mdl_cost_advantage: 0,
    })
    .partition_trajectory(trajectory)
}
