//! R-tree over segment bounding boxes for epsilon-neighborhood queries.
//!
//! If two segments are within composite distance `D`, some endpoint of the
//! shorter one lies within `2·D` of an endpoint of the longer one: the
//! perpendicular term is at least half the sum of the endpoint-to-line
//! distances, and the parallel term closes the triangle to the nearer end.
//! Querying boxes grown by `2·eps` therefore never misses a true neighbor,
//! and every candidate is re-checked with the exact distance.

use rstar::{AABB, RTree, RTreeObject};

use crate::{Bounds, Segment};
use crate::distance::segment_to_segment_distance;

/// Relative margin on top of `2·eps` to absorb floating point rounding.
const ENVELOPE_SLACK: f64 = 1e-9;

/// A segment's position in the collection plus its bounding box.
#[derive(Debug, Clone, Copy)]
pub struct IndexedSegment {
    pub idx: usize,
    pub bounds: Bounds,
}

impl IndexedSegment {
    fn new(idx: usize, segment: &Segment) -> Self {
        Self {
            idx,
            bounds: segment.bounds(),
        }
    }
}

fn to_aabb(b: &Bounds) -> AABB<[f64; 2]> {
    AABB::from_corners([b.min_x, b.min_y], [b.max_x, b.max_y])
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        to_aabb(&self.bounds)
    }
}

/// Spatial index over a borrowed segment collection.
pub struct SegmentIndex<'a> {
    segments: &'a [Segment],
    tree: RTree<IndexedSegment>,
}

impl<'a> SegmentIndex<'a> {
    /// Bulk-load an index. Segments with non-finite coordinates are left out,
    /// they can never be within a finite distance of anything.
    pub fn new(segments: &'a [Segment]) -> Self {
        let indexed: Vec<IndexedSegment> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.start.is_valid() && s.end.is_valid())
            .map(|(i, s)| IndexedSegment::new(i, s))
            .collect();
        Self {
            segments,
            tree: RTree::bulk_load(indexed),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &'a [Segment] {
        self.segments
    }

    /// Indices of segments whose bounding box could hold a neighbor of `idx`.
    pub fn candidates(&self, idx: usize, eps: f64) -> Vec<usize> {
        let bounds = self.segments[idx].bounds();
        let margin = 2.0 * eps + ENVELOPE_SLACK * (1.0 + eps + bounds.magnitude());
        let query = to_aabb(&bounds.expand(margin));
        self.tree
            .locate_in_envelope_intersecting(&query)
            .map(|s| s.idx)
            .collect()
    }

    /// All `j` with `segment_to_segment_distance(idx, j) <= eps` in ascending
    /// index order. `idx` itself is always included; its self-distance can
    /// round to a tiny positive value through the angle term. A NaN `eps`
    /// matches nothing else.
    pub fn neighborhood(&self, idx: usize, eps: f64) -> Vec<usize> {
        let target = &self.segments[idx];
        if eps.is_nan() || !(target.start.is_valid() && target.end.is_valid()) {
            return vec![idx];
        }
        let mut neighbors: Vec<usize> = self
            .candidates(idx, eps)
            .into_iter()
            .filter(|&j| j == idx || segment_to_segment_distance(target, &self.segments[j]) <= eps)
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Same result as [`SegmentIndex::neighborhood`] by scanning every segment.
    pub fn neighborhood_brute_force(&self, idx: usize, eps: f64) -> Vec<usize> {
        let target = &self.segments[idx];
        (0..self.segments.len())
            .filter(|&j| j == idx || segment_to_segment_distance(target, &self.segments[j]) <= eps)
            .collect()
    }
}
