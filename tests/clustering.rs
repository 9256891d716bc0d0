//! Tests for clustering module

use traclus::clustering::*;
use traclus::{Point, Segment, SegmentIndex};

/// Horizontal segment from x=0 to x=100 at height `y`.
fn horizontal(y: f64, id: &str) -> Segment {
    Segment::new(Point::new(0.0, y), Point::new(100.0, y), id)
}

fn stack(ys: &[f64]) -> Vec<Segment> {
    ys.iter()
        .enumerate()
        .map(|(i, &y)| horizontal(y, &format!("t{}", i)))
        .collect()
}

#[test]
fn test_two_bundles_and_noise() {
    let mut segments = vec![Segment::new(
        Point::new(5_000.0, 5_000.0),
        Point::new(5_100.0, 5_100.0),
        "lonely",
    )];
    segments.extend(stack(&[0.0, 2.0, 4.0, 6.0, 8.0]));
    segments.extend(stack(&[1_000.0, 1_002.0, 1_004.0, 1_006.0, 1_008.0]));

    let labels = cluster(&segments, 10.0, 3);
    assert_eq!(labels.len(), segments.len());
    assert_eq!(labels[0], ClusterLabel::Noise);
    assert!(labels[1..6].iter().all(|&l| l == ClusterLabel::Cluster(0)));
    assert!(labels[6..].iter().all(|&l| l == ClusterLabel::Cluster(1)));
    assert_eq!(cluster_count(&labels), 2);
}

#[test]
fn test_min_neighbors_one_makes_everything_core() {
    let mut segments = vec![horizontal(-500.0, "lonely")];
    segments.extend(stack(&[0.0, 2.0, 4.0]));

    let labels = cluster(&segments, 5.0, 1);
    assert_eq!(
        labels,
        vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(1),
            ClusterLabel::Cluster(1),
            ClusterLabel::Cluster(1),
        ]
    );
}

#[test]
fn test_zero_eps_leaves_distinct_segments_as_noise() {
    let segments = stack(&[0.0, 1.0, 2.0, 3.0]);
    let labels = cluster(&segments, 0.0, 2);
    assert!(labels.iter().all(ClusterLabel::is_noise));
    assert_eq!(cluster_count(&labels), 0);
}

#[test]
fn test_nan_eps_leaves_each_segment_alone() {
    let segments = stack(&[0.0, 0.0, 0.0]);
    let index = SegmentIndex::new(&segments);
    assert_eq!(index.neighborhood(1, f64::NAN), vec![1]);

    assert!(cluster(&segments, f64::NAN, 2).iter().all(ClusterLabel::is_noise));
    assert_eq!(
        cluster(&segments, f64::NAN, 1),
        vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(1),
            ClusterLabel::Cluster(2)
        ]
    );
}

#[test]
fn test_density_reachable_chain() {
    // Ends of the chain are not core but are reachable through it
    let segments = stack(&[0.0, 5.0, 10.0, 15.0, 20.0, 25.0]);
    let labels = cluster(&segments, 5.0, 3);
    assert!(labels.iter().all(|&l| l == ClusterLabel::Cluster(0)), "{:?}", labels);
}

#[test]
fn test_border_segment_goes_to_later_seed() {
    // "b" borders both groups. The first group absorbs it during expansion;
    // the second group's seed neighborhood contains it and claims it.
    let segments = vec![
        horizontal(0.0, "a0"),
        horizontal(1.0, "a1"),
        horizontal(2.0, "a2"),
        horizontal(3.0, "a3"),
        horizontal(6.0, "b"),
        horizontal(9.0, "c"),
        horizontal(10.0, "d"),
        horizontal(11.0, "e"),
        horizontal(12.0, "f"),
    ];
    let labels = cluster(&segments, 3.0, 4);
    let ids: Vec<i32> = labels.iter().map(ClusterLabel::as_i32).collect();
    assert_eq!(ids, vec![0, 0, 0, 0, 1, 1, 1, 1, 1]);
}

#[test]
fn test_empty_input() {
    assert!(cluster(&[], 25.0, 5).is_empty());
}

#[test]
fn test_clusterer_uses_config() {
    let clusterer = SegmentClusterer::new(ClusterConfig {
        eps: 10.0,
        min_neighbors: 3,
    });
    assert_eq!(clusterer.config().min_neighbors, 3);

    let segments = stack(&[0.0, 2.0, 4.0]);
    assert_eq!(clusterer.cluster(&segments), cluster(&segments, 10.0, 3));
}

#[test]
fn test_mixed_orientations_match_brute_force() {
    let mut segments = Vec::new();
    for i in 0..15 {
        let t = i as f64;
        segments.push(Segment::new(
            Point::new(t * 13.0, t * 4.0),
            Point::new(t * 13.0 + 60.0, t * 4.0 + 20.0),
            "p",
        ));
        segments.push(Segment::new(
            Point::new(100.0 - t * 6.0, t * 9.0),
            Point::new(90.0 - t * 6.0, t * 9.0 + 45.0),
            "q",
        ));
    }

    let index = SegmentIndex::new(&segments);
    for eps in [1.0, 15.0, 40.0] {
        for i in 0..segments.len() {
            assert_eq!(
                index.neighborhood(i, eps),
                index.neighborhood_brute_force(i, eps)
            );
        }
    }
}

#[cfg(feature = "synthetic")]
#[test]
fn test_synthetic_labels_are_total() {
    use traclus::partition;
    use traclus::synthetic::SyntheticScenario;

    let dataset = SyntheticScenario::with_trajectory_count(30, 2_000.0, 0.8).generate();
    let segments = partition(&dataset.trajectories, 30.0).unwrap();
    let labels = cluster(&segments, 30.0, 5);

    assert_eq!(labels.len(), segments.len());
    assert!(
        labels
            .iter()
            .all(|l| ClusterLabel::from_i32(l.as_i32()) == Some(*l))
    );
    assert!(cluster_count(&labels) > 0);

    let index = SegmentIndex::new(&segments);
    for i in (0..segments.len()).step_by(7) {
        assert_eq!(
            index.neighborhood(i, 30.0),
            index.neighborhood_brute_force(i, 30.0)
        );
    }
}
