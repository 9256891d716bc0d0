//! Progress reporting for pipeline stages.
//!
//! Implementations receive stage transitions and per-item progress updates.
//! Partitioning and representative construction report from rayon threads
//! when the `parallel` feature is on, so implementations must be `Send + Sync`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Pipeline stages, ordered by execution sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// MDL partitioning, one item per trajectory
    Partitioning,
    /// Segment DBSCAN, one item per segment
    Clustering,
    /// Sweep-line averaging, one item per cluster
    Representatives,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Partitioning => "partitioning",
            PipelineStage::Clustering => "clustering",
            PipelineStage::Representatives => "representatives",
        }
    }
}

/// Receives progress updates while the pipeline runs.
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a stage. `total` is the number of items in it.
    fn on_stage(&self, stage: PipelineStage, total: u32);
    /// Called after completing one item in the current stage.
    fn on_progress(&self);
}

/// Ignores every update.
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_stage(&self, _stage: PipelineStage, _total: u32) {}
    fn on_progress(&self) {}
}

/// Progress tracker that can be polled from another thread.
pub struct AtomicProgressTracker {
    pub stage: Mutex<String>,
    pub completed: AtomicU32,
    pub total: AtomicU32,
}

impl Default for AtomicProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgressTracker {
    pub fn new() -> Self {
        Self {
            stage: Mutex::new(String::new()),
            completed: AtomicU32::new(0),
            total: AtomicU32::new(0),
        }
    }

    /// Name of the current stage, empty before the first one starts.
    pub fn current_stage(&self) -> String {
        self.stage
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ProgressCallback for AtomicProgressTracker {
    fn on_stage(&self, stage: PipelineStage, total: u32) {
        let mut current = self
            .stage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = stage.as_str().to_string();
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_progress(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_resets_on_stage() {
        let tracker = AtomicProgressTracker::new();
        assert_eq!(tracker.current_stage(), "");

        tracker.on_stage(PipelineStage::Partitioning, 3);
        tracker.on_progress();
        tracker.on_progress();
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 2);

        tracker.on_stage(PipelineStage::Clustering, 10);
        assert_eq!(tracker.current_stage(), "clustering");
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.total.load(Ordering::SeqCst), 10);
    }
}
