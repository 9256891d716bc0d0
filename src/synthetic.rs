//! Synthetic trajectory generator for stress testing and benchmarking.
//!
//! Generates trajectory sets that share known corridors, providing ground
//! truth for validating that clustering finds them. Coordinates are planar
//! units (think metres).
//!
//! Feature-gated behind `synthetic`.
//!
//! # Example
//!
//! ```rust
//! use traclus::Point;
//! use traclus::synthetic::{CorridorConfig, CorridorPattern, SyntheticScenario};
//!
//! let scenario = SyntheticScenario {
//!     origin: Point::new(0.0, 0.0),
//!     trajectory_count: 50,
//!     corridors: vec![CorridorConfig {
//!         length: 2_000.0,
//!         overlap_fraction: 0.8,
//!         pattern: CorridorPattern::Winding,
//!         approach_length: 300.0,
//!     }],
//!     noise_sigma: 3.0,
//!     point_spacing: 20.0,
//!     seed: 42,
//! };
//!
//! let dataset = scenario.generate();
//! assert_eq!(dataset.trajectories.len(), 50);
//! ```

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Point, Trajectory};

// ============================================================================
// Types
// ============================================================================

/// Pattern for generating corridor polylines.
#[derive(Debug, Clone, Copy)]
pub enum CorridorPattern {
    /// Straight line with minor drift.
    Straight,
    /// Winding path, at most ~0.45 rad heading change per step.
    Winding,
}

/// Configuration for a shared corridor.
#[derive(Debug, Clone)]
pub struct CorridorConfig {
    /// Length of the shared corridor.
    pub length: f64,
    /// Fraction of trajectories that traverse this corridor (0.0-1.0).
    pub overlap_fraction: f64,
    /// Shape pattern of the corridor.
    pub pattern: CorridorPattern,
    /// Length of the random approach and departure legs.
    pub approach_length: f64,
}

/// A generated corridor and the trajectories that follow it.
#[derive(Debug, Clone)]
pub struct ExpectedCorridor {
    /// Noise-free corridor polyline.
    pub polyline: Vec<Point>,
    pub length: f64,
    /// Ids of trajectories traversing this corridor.
    pub trajectory_ids: Vec<String>,
    pub name: String,
}

/// A complete synthetic dataset with ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub trajectories: Vec<Trajectory>,
    pub corridors: Vec<ExpectedCorridor>,
    /// Total points across all trajectories.
    pub total_points: usize,
}

/// Scenario configuration for generating synthetic data.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Origin for all generated data.
    pub origin: Point,
    /// Number of trajectories to generate.
    pub trajectory_count: usize,
    /// Shared corridors (ground truth).
    pub corridors: Vec<CorridorConfig>,
    /// Standard deviation of the Gaussian noise added to corridor points.
    pub noise_sigma: f64,
    /// Distance between consecutive generated points.
    pub point_spacing: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

// ============================================================================
// Path Generation
// ============================================================================

/// Walk `steps` points from `start`, turning by `turn(step, rng)` before each step.
fn walk(
    start: Point,
    heading: f64,
    steps: usize,
    spacing: f64,
    rng: &mut StdRng,
    mut turn: impl FnMut(usize, &mut StdRng) -> f64,
) -> Vec<Point> {
    let mut points = Vec::with_capacity(steps + 1);
    let mut heading = heading;
    let mut current = start;
    points.push(current);

    for i in 0..steps {
        heading += turn(i, rng);
        current = Point::new(
            current.x + spacing * heading.cos(),
            current.y + spacing * heading.sin(),
        );
        points.push(current);
    }

    points
}

/// Generate a corridor polyline; each corridor heads off in a different direction.
fn generate_corridor(
    origin: &Point,
    config: &CorridorConfig,
    corridor_index: usize,
    spacing: f64,
    rng: &mut StdRng,
) -> Vec<Point> {
    let steps = (config.length / spacing).ceil() as usize;
    let heading = (corridor_index as f64) * (2.0 * PI / 8.0) + PI / 6.0;

    let offset = 200.0 * (corridor_index as f64 + 1.0);
    let start = Point::new(
        origin.x + offset * heading.cos(),
        origin.y + offset * heading.sin(),
    );

    let pattern = config.pattern;
    walk(start, heading, steps, spacing, rng, |i, rng| match pattern {
        CorridorPattern::Straight => rng.gen_range(-0.02..0.02),
        CorridorPattern::Winding => {
            let base_turn = (i as f64 * 0.01).sin() * 0.3;
            let random_turn: f64 = rng.gen_range(-0.15..0.15);
            base_turn + random_turn
        }
    })
}

/// Random approach/departure leg.
fn generate_random_leg(
    start: &Point,
    length: f64,
    heading: f64,
    spacing: f64,
    rng: &mut StdRng,
) -> Vec<Point> {
    let steps = (length / spacing).ceil() as usize;
    walk(*start, heading, steps, spacing, rng, |_, rng| {
        rng.gen_range(-0.3..0.3)
    })
}

/// Add Gaussian noise to a polyline.
fn add_noise(points: &[Point], sigma: f64, rng: &mut StdRng) -> Vec<Point> {
    if sigma <= 0.0 {
        return points.to_vec();
    }

    points
        .iter()
        .map(|p| {
            // Box-Muller transform
            let u1: f64 = rng.gen_range(0.0001..1.0);
            let u2: f64 = rng.r#gen();
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            let z1 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();
            Point::new(p.x + z0 * sigma, p.y + z1 * sigma)
        })
        .collect()
}

fn polyline_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| crate::distance::point_distance(&w[0], &w[1]))
        .sum()
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticScenario {
    /// Generate a complete synthetic dataset from this scenario.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let spacing = self.point_spacing.max(f64::EPSILON);

        let polylines: Vec<Vec<Point>> = self
            .corridors
            .iter()
            .enumerate()
            .map(|(i, c)| generate_corridor(&self.origin, c, i, spacing, &mut rng))
            .collect();

        let mut corridor_ids: Vec<Vec<String>> = vec![Vec::new(); self.corridors.len()];
        let mut trajectories = Vec::with_capacity(self.trajectory_count);

        for idx in 0..self.trajectory_count {
            let id = format!("synth_{:04}", idx);
            let mut path: Vec<Point> = Vec::new();

            for (ci, config) in self.corridors.iter().enumerate() {
                let roll: f64 = rng.r#gen();
                if roll >= config.overlap_fraction {
                    continue;
                }
                corridor_ids[ci].push(id.clone());

                let corridor = &polylines[ci];
                let (Some(first), Some(last)) = (corridor.first(), corridor.last()) else {
                    continue;
                };

                // Approach from a random direction, heading toward the corridor
                let approach_heading: f64 = rng.gen_range(0.0..(2.0 * PI));
                let approach_start = Point::new(
                    first.x + config.approach_length * approach_heading.cos(),
                    first.y + config.approach_length * approach_heading.sin(),
                );
                if let Some(&previous) = path.last() {
                    let connector_heading = rng.gen_range(0.0..(2.0 * PI));
                    path.extend(generate_random_leg(
                        &previous,
                        200.0,
                        connector_heading,
                        spacing,
                        &mut rng,
                    ));
                }
                path.extend(generate_random_leg(
                    &approach_start,
                    config.approach_length * 0.8,
                    approach_heading + PI,
                    spacing,
                    &mut rng,
                ));

                path.extend(add_noise(corridor, self.noise_sigma, &mut rng));

                let departure_heading: f64 = rng.gen_range(0.0..(2.0 * PI));
                path.extend(generate_random_leg(
                    last,
                    config.approach_length * 0.8,
                    departure_heading,
                    spacing,
                    &mut rng,
                ));
            }

            if path.len() < 2 {
                // No corridor: purely random route
                let length: f64 = rng.gen_range(1_000.0..5_000.0);
                let heading: f64 = rng.gen_range(0.0..(2.0 * PI));
                path = generate_random_leg(&self.origin, length, heading, spacing, &mut rng);
            }

            trajectories.push(Trajectory::new(id, path));
        }

        let corridors = polylines
            .into_iter()
            .zip(corridor_ids)
            .enumerate()
            .map(|(ci, (polyline, trajectory_ids))| ExpectedCorridor {
                length: polyline_length(&polyline),
                polyline,
                trajectory_ids,
                name: format!("corridor_{}", ci),
            })
            .collect();

        let total_points = trajectories.iter().map(Trajectory::len).sum();

        SyntheticDataset {
            trajectories,
            corridors,
            total_points,
        }
    }
}

// ============================================================================
// Predefined Scenarios
// ============================================================================

impl SyntheticScenario {
    /// 100 trajectories along one 5 km winding corridor with 80% overlap.
    pub fn standard() -> Self {
        Self::with_trajectory_count(100, 5_000.0, 0.8)
    }

    /// 300 trajectories over four corridors from 500 m to 10 km.
    pub fn multi_corridor() -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            trajectory_count: 300,
            corridors: vec![
                CorridorConfig {
                    length: 500.0,
                    overlap_fraction: 0.7,
                    pattern: CorridorPattern::Straight,
                    approach_length: 200.0,
                },
                CorridorConfig {
                    length: 2_000.0,
                    overlap_fraction: 0.6,
                    pattern: CorridorPattern::Winding,
                    approach_length: 400.0,
                },
                CorridorConfig {
                    length: 5_000.0,
                    overlap_fraction: 0.5,
                    pattern: CorridorPattern::Winding,
                    approach_length: 600.0,
                },
                CorridorConfig {
                    length: 10_000.0,
                    overlap_fraction: 0.3,
                    pattern: CorridorPattern::Straight,
                    approach_length: 800.0,
                },
            ],
            noise_sigma: 5.0,
            point_spacing: 20.0,
            seed: 46,
        }
    }

    /// `count` trajectories over one winding corridor.
    pub fn with_trajectory_count(count: usize, corridor_length: f64, overlap: f64) -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            trajectory_count: count,
            corridors: vec![CorridorConfig {
                length: corridor_length,
                overlap_fraction: overlap,
                pattern: CorridorPattern::Winding,
                approach_length: 500.0,
            }],
            noise_sigma: 3.0,
            point_spacing: 20.0,
            seed: 42,
        }
    }

    /// `count` random routes with no shared corridor.
    pub fn with_no_overlap(count: usize) -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            trajectory_count: count,
            corridors: vec![],
            noise_sigma: 3.0,
            point_spacing: 20.0,
            seed: 45,
        }
    }
}
