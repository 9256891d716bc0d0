//! Geometric distance functions over points and line segments.
//!
//! The segment distance is the weighted sum used by TRACLUS:
//! - perpendicular distance (how far apart the lines are)
//! - parallel distance (how far one segment slides along the other)
//! - angle distance (how much the directions disagree)
//!
//! All functions are pure. Segment pairs are reordered so the longer one is
//! the reference; equal lengths keep argument order, so the composite
//! distance is not guaranteed symmetric for equal-length segments.

use crate::{Point, Segment};

/// Projection coefficients below this measure the parallel offset from the
/// reference segment's start, otherwise from its end.
const PARALLEL_SPLIT: f64 = 0.5;

/// Orthogonal projection of a point onto the infinite line through a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Position along the line: 0 at the segment start, 1 at its end. Not clamped.
    pub coefficient: f64,
    /// The projected point.
    pub point: Point,
    /// Distance from the original point to `point`.
    pub distance: f64,
}

/// Euclidean distance between two points.
#[inline]
pub fn point_distance(p1: &Point, p2: &Point) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    (dx * dx + dy * dy).sqrt()
}

/// Project `p` onto the line through `s`.
///
/// A zero-length segment projects everything onto its start point.
pub fn project_onto_line(p: &Point, s: &Segment) -> Projection {
    let v = s.direction();
    let denominator = v.dot(&v);
    let coefficient = if denominator > 0.0 {
        (*p - s.start).dot(&v) / denominator
    } else {
        0.0
    };
    let point = Point::new(
        s.start.x + coefficient * v.x,
        s.start.y + coefficient * v.y,
    );
    Projection {
        coefficient,
        point,
        distance: point_distance(p, &point),
    }
}

/// Distance from `p` to the infinite line through `s`.
pub fn point_to_segment_distance(p: &Point, s: &Segment) -> f64 {
    project_onto_line(p, s).distance
}

/// Order a pair so the longer segment comes first. Ties keep argument order.
#[inline]
fn longer_first<'a>(s1: &'a Segment, s2: &'a Segment) -> (&'a Segment, &'a Segment) {
    if s1.length() < s2.length() {
        (s2, s1)
    } else {
        (s1, s2)
    }
}

/// Combine the endpoint distances `d1`, `d2` into `(d1² + d2²) / (d1 + d2)`.
#[inline]
fn combine_perpendicular(d1: f64, d2: f64) -> f64 {
    if d1 == 0.0 && d2 == 0.0 {
        return 0.0;
    }
    (d1 * d1 + d2 * d2) / (d1 + d2)
}

/// Perpendicular distance between two segments.
pub fn perpendicular_distance(s1: &Segment, s2: &Segment) -> f64 {
    let (long, short) = longer_first(s1, s2);
    let d1 = point_to_segment_distance(&short.start, long);
    let d2 = point_to_segment_distance(&short.end, long);
    combine_perpendicular(d1, d2)
}

/// Angle distance: the length of `s2` orthogonal to the direction of `s1`.
///
/// Returns 0 if either segment has zero length. Not reordered.
pub fn angle_distance(s1: &Segment, s2: &Segment) -> f64 {
    let v1 = s1.direction();
    let v2 = s2.direction();
    let len1 = v1.norm();
    let len2 = v2.norm();
    if len1 == 0.0 || len2 == 0.0 {
        return 0.0;
    }

    let cos_theta = (v1.dot(&v2) / (len1 * len2)).clamp(-1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    len2 * sin_theta
}

/// Offset from the nearer end of `long` to a projected point.
#[inline]
fn parallel_offset(long: &Segment, projection: &Projection) -> f64 {
    let anchor = if projection.coefficient < PARALLEL_SPLIT {
        &long.start
    } else {
        &long.end
    };
    point_distance(anchor, &projection.point)
}

/// Parallel distance between two segments.
///
/// The shorter segment's endpoints are projected onto the longer one's
/// line; the result is the smaller offset of a projection from the nearer
/// end of the longer segment.
pub fn parallel_distance(s1: &Segment, s2: &Segment) -> f64 {
    let (long, short) = longer_first(s1, s2);
    let p1 = project_onto_line(&short.start, long);
    let p2 = project_onto_line(&short.end, long);
    parallel_offset(long, &p1).min(parallel_offset(long, &p2))
}

/// Composite segment distance: perpendicular + parallel + angle.
///
/// This is the clustering similarity score. It is not a metric: there is
/// no triangle inequality, and equal-length segments may give
/// `d(a, b) != d(b, a)`.
pub fn segment_to_segment_distance(s1: &Segment, s2: &Segment) -> f64 {
    let (long, short) = longer_first(s1, s2);

    let p1 = project_onto_line(&short.start, long);
    let p2 = project_onto_line(&short.end, long);

    let perpendicular = combine_perpendicular(p1.distance, p2.distance);
    let parallel = parallel_offset(long, &p1).min(parallel_offset(long, &p2));
    let angle = angle_distance(long, short);

    perpendicular + parallel + angle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2), "t")
    }

    #[test]
    fn test_projection_is_not_clamped() {
        let s = seg(0.0, 0.0, 10.0, 0.0);
        let proj = project_onto_line(&Point::new(25.0, 3.0), &s);
        assert_eq!(proj.coefficient, 2.5);
        assert_eq!(proj.point, Point::new(25.0, 0.0));
        assert_eq!(proj.distance, 3.0);
    }

    #[test]
    fn test_projection_onto_degenerate_segment() {
        let s = seg(1.0, 1.0, 1.0, 1.0);
        let proj = project_onto_line(&Point::new(4.0, 5.0), &s);
        assert_eq!(proj.coefficient, 0.0);
        assert_eq!(proj.distance, 5.0);
    }

    #[test]
    fn test_combine_perpendicular() {
        assert_eq!(combine_perpendicular(0.0, 0.0), 0.0);
        assert_eq!(combine_perpendicular(3.0, 3.0), 3.0);
        // (1 + 9) / 4
        assert_eq!(combine_perpendicular(1.0, 3.0), 2.5);
    }

    #[test]
    fn test_parallel_offset_uses_nearer_end() {
        let long = seg(0.0, 0.0, 100.0, 0.0);
        let near_start = project_onto_line(&Point::new(-10.0, 5.0), &long);
        let near_end = project_onto_line(&Point::new(120.0, 5.0), &long);
        assert_eq!(parallel_offset(&long, &near_start), 10.0);
        assert_eq!(parallel_offset(&long, &near_end), 20.0);
    }
}
