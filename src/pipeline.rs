//! The three-stage pipeline: partition, cluster, build representatives.

use log::info;
use serde::{Deserialize, Serialize};

use crate::clustering::{ClusterLabel, SegmentClusterer, cluster_count};
use crate::partition::TrajectoryPartitioner;
use crate::progress::{NoopProgress, ProgressCallback};
use crate::representative::RepresentativeBuilder;
use crate::{Result, Segment, TraclusConfig, Trajectory};

/// Summary counts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub trajectory_count: usize,
    pub segment_count: usize,
    pub cluster_count: usize,
    pub noise_count: usize,
    pub representative_count: usize,
}

/// Everything a run produces.
///
/// `labels[i]` is the label of `segments[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraclusResult {
    pub segments: Vec<Segment>,
    pub labels: Vec<ClusterLabel>,
    pub representatives: Vec<Trajectory>,
    pub stats: PipelineStats,
}

/// Configured pipeline.
#[derive(Debug, Clone)]
pub struct Traclus {
    config: TraclusConfig,
    partitioner: TrajectoryPartitioner,
    clusterer: SegmentClusterer,
    builder: RepresentativeBuilder,
}

impl Traclus {
    /// Validate `config` and set up the three stages.
    pub fn new(config: TraclusConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            partitioner: TrajectoryPartitioner::new((&config).into()),
            clusterer: SegmentClusterer::new((&config).into()),
            builder: RepresentativeBuilder::new((&config).into()),
            config,
        })
    }

    pub fn config(&self) -> &TraclusConfig {
        &self.config
    }

    /// Run all three stages.
    pub fn run(&self, trajectories: &[Trajectory]) -> Result<TraclusResult> {
        self.run_with_progress(trajectories, &NoopProgress)
    }

    /// Run all three stages, reporting stage transitions and per-item progress.
    pub fn run_with_progress(
        &self,
        trajectories: &[Trajectory],
        progress: &dyn ProgressCallback,
    ) -> Result<TraclusResult> {
        let segments = self
            .partitioner
            .partition_with_progress(trajectories, progress)?;
        let labels = self.clusterer.cluster_with_progress(&segments, progress);
        let representatives = self
            .builder
            .build_with_progress(&segments, &labels, progress)?;

        let stats = PipelineStats {
            trajectory_count: trajectories.len(),
            segment_count: segments.len(),
            cluster_count: cluster_count(&labels),
            noise_count: labels.iter().filter(|l| l.is_noise()).count(),
            representative_count: representatives.len(),
        };

        info!(
            "[Traclus] {} trajectories, {} segments, {} clusters, {} noise, {} representatives",
            stats.trajectory_count,
            stats.segment_count,
            stats.cluster_count,
            stats.noise_count,
            stats.representative_count
        );

        Ok(TraclusResult {
            segments,
            labels,
            representatives,
            stats,
        })
    }
}
