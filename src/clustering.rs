//! Density-based clustering of line segments.
//!
//! DBSCAN over the composite segment distance. Each segment ends up either
//! noise or a member of exactly one cluster; cluster ids are assigned in
//! seed order starting at 0.
//!
//! Expansion uses a FIFO worklist and ascending-index neighborhoods, so the
//! labelling is fully determined by segment order.

use std::collections::VecDeque;
use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::index::SegmentIndex;
use crate::progress::{NoopProgress, PipelineStage, ProgressCallback};
use crate::{Segment, TraclusConfig, TraclusError};

/// Final label of a segment after clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ClusterLabel {
    /// Not density-reachable from any core segment
    Noise,
    /// Member of the cluster with this id
    Cluster(usize),
}

impl ClusterLabel {
    /// Integer code for noise.
    pub const NOISE_ID: i32 = -1;
    /// Integer code for a segment not yet visited. Never produced by [`SegmentClusterer`].
    pub const UNCLASSIFIED_ID: i32 = -2;

    /// `-1` for noise, the cluster id otherwise. Ids above `i32::MAX`
    /// saturate to `i32::MAX`.
    pub fn as_i32(&self) -> i32 {
        match self {
            ClusterLabel::Noise => Self::NOISE_ID,
            ClusterLabel::Cluster(id) => i32::try_from(*id).unwrap_or(i32::MAX),
        }
    }

    /// Parse the integer code. Returns `None` for the unclassified sentinel
    /// and any other negative value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            Self::NOISE_ID => Some(ClusterLabel::Noise),
            v if v >= 0 => Some(ClusterLabel::Cluster(v as usize)),
            _ => None,
        }
    }

    pub fn cluster_id(&self) -> Option<usize> {
        match self {
            ClusterLabel::Noise => None,
            ClusterLabel::Cluster(id) => Some(*id),
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }
}

impl From<ClusterLabel> for i32 {
    fn from(label: ClusterLabel) -> Self {
        label.as_i32()
    }
}

impl TryFrom<i32> for ClusterLabel {
    type Error = TraclusError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        ClusterLabel::from_i32(value).ok_or(TraclusError::InvalidLabel(value))
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterLabel::Noise => f.write_str("noise"),
            ClusterLabel::Cluster(id) => write!(f, "{}", id),
        }
    }
}

/// Number of distinct cluster ids (`max id + 1`), ignoring noise.
pub fn cluster_count(labels: &[ClusterLabel]) -> usize {
    labels
        .iter()
        .filter_map(ClusterLabel::cluster_id)
        .max()
        .map_or(0, |max| max + 1)
}

/// Clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Neighborhood radius in composite segment distance
    pub eps: f64,
    /// Minimum neighborhood size, self included, for a core segment
    pub min_neighbors: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self::from(&TraclusConfig::default())
    }
}

impl From<&TraclusConfig> for ClusterConfig {
    fn from(config: &TraclusConfig) -> Self {
        Self {
            eps: config.eps,
            min_neighbors: config.min_neighbors,
        }
    }
}

/// Working state of one segment during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unclassified,
    Noise,
    Cluster(usize),
}

/// Segment DBSCAN.
#[derive(Debug, Clone, Default)]
pub struct SegmentClusterer {
    config: ClusterConfig,
}

impl SegmentClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Label every segment. The result has the same length and order as `segments`.
    pub fn cluster(&self, segments: &[Segment]) -> Vec<ClusterLabel> {
        self.cluster_with_progress(segments, &NoopProgress)
    }

    /// [`SegmentClusterer::cluster`], reporting one progress item per seed visited.
    pub fn cluster_with_progress(
        &self,
        segments: &[Segment],
        progress: &dyn ProgressCallback,
    ) -> Vec<ClusterLabel> {
        progress.on_stage(
            PipelineStage::Clustering,
            u32::try_from(segments.len()).unwrap_or(u32::MAX),
        );

        let index = SegmentIndex::new(segments);
        let mut states = vec![State::Unclassified; segments.len()];
        let mut current_id = 0;

        for i in 0..segments.len() {
            if states[i] == State::Unclassified && self.expand(&index, i, current_id, &mut states)
            {
                current_id += 1;
            }
            progress.on_progress();
        }

        let labels: Vec<ClusterLabel> = states
            .into_iter()
            .map(|state| match state {
                State::Cluster(id) => ClusterLabel::Cluster(id),
                // Every index was visited by the loop above
                State::Noise | State::Unclassified => ClusterLabel::Noise,
            })
            .collect();

        info!(
            "[Cluster] {} segments -> {} clusters, {} noise (eps {}, min neighbors {})",
            segments.len(),
            current_id,
            labels.iter().filter(|l| l.is_noise()).count(),
            self.config.eps,
            self.config.min_neighbors
        );

        labels
    }

    /// Try to grow a new cluster from `seed`. Returns false if `seed` is not core.
    fn expand(
        &self,
        index: &SegmentIndex<'_>,
        seed: usize,
        cluster_id: usize,
        states: &mut [State],
    ) -> bool {
        let seeds = index.neighborhood(seed, self.config.eps);
        if seeds.len() < self.config.min_neighbors {
            states[seed] = State::Noise;
            return false;
        }

        for &j in &seeds {
            states[j] = State::Cluster(cluster_id);
        }

        let mut queue: VecDeque<usize> = seeds.into_iter().filter(|&j| j != seed).collect();
        while let Some(curr) = queue.pop_front() {
            let neighbors = index.neighborhood(curr, self.config.eps);
            if neighbors.len() < self.config.min_neighbors {
                continue;
            }
            for j in neighbors {
                match states[j] {
                    State::Unclassified => {
                        states[j] = State::Cluster(cluster_id);
                        queue.push_back(j);
                    }
                    State::Noise => states[j] = State::Cluster(cluster_id),
                    State::Cluster(_) => {}
                }
            }
        }

        true
    }
}

/// Cluster segments with the given radius and minimum neighborhood size.
pub fn cluster(segments: &[Segment], eps: f64, min_neighbors: usize) -> Vec<ClusterLabel> {
    SegmentClusterer::new(ClusterConfig { eps, min_neighbors }).cluster(segments)
}
