//! traclus CLI - run trajectory clustering on files
//!
//! Usage:
//!   traclus-cli run <input> [--config <file.json>] [--output <dir>] [--eps <f64>] ...
//!   traclus-cli partition <input> [--min-segment-length <f64>]
//!
//! `<input>` is either a whitespace record file (`id count x1 y1 x2 y2 ...`
//! per line) or a folder of GPX files, one trajectory per file with
//! x = longitude and y = latitude.

use std::error::Error;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use traclus::{
    Point, Traclus, TraclusConfig, TraclusResult, Trajectory, TrajectoryPartitioner, loader,
};

type CliResult<T> = std::result::Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "traclus-cli")]
#[command(about = "Partition, cluster and summarise trajectories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print a summary
    Run {
        /// Record file or folder of GPX files
        input: PathBuf,

        /// JSON file with a TraclusConfig (camelCase keys, missing keys use defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for representatives and the full result
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Partition only and print segment counts per trajectory
    Partition {
        /// Record file or folder of GPX files
        input: PathBuf,

        /// Partition segments shorter than this are dropped
        #[arg(long, default_value = "50")]
        min_segment_length: f64,
    },
}

/// Flags that override individual config values.
#[derive(clap::Args)]
struct ConfigOverrides {
    #[arg(long)]
    eps: Option<f64>,
    #[arg(long)]
    min_neighbors: Option<usize>,
    #[arg(long)]
    min_segment_length: Option<f64>,
    #[arg(long)]
    min_smoothing_length: Option<f64>,
    #[arg(long)]
    min_trajectories: Option<usize>,
    #[arg(long)]
    min_segment_coverage: Option<usize>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut TraclusConfig) {
        if let Some(v) = self.eps {
            config.eps = v;
        }
        if let Some(v) = self.min_neighbors {
            config.min_neighbors = v;
        }
        if let Some(v) = self.min_segment_length {
            config.min_segment_length = v;
        }
        if let Some(v) = self.min_smoothing_length {
            config.min_smoothing_length = v;
        }
        if let Some(v) = self.min_trajectories {
            config.min_trajectories = v;
        }
        if let Some(v) = self.min_segment_coverage {
            config.min_segment_coverage = v;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let outcome = match cli.command {
        Commands::Run {
            input,
            config,
            output,
            overrides,
        } => run_pipeline(&input, config.as_deref(), output.as_deref(), &overrides),
        Commands::Partition {
            input,
            min_segment_length,
        } => run_partition(&input, min_segment_length),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Input
// ============================================================================

/// Load trajectories from a record file or a folder of GPX files.
fn load_input(input: &Path) -> CliResult<Vec<Trajectory>> {
    println!("\n{}", "=".repeat(60));
    println!("Loading trajectories from: {}", input.display());
    println!("{}", "=".repeat(60));

    let trajectories = if input.is_dir() {
        load_gpx_folder(input)?
    } else {
        loader::read_trajectories(input)?
    };

    let points: usize = trajectories.iter().map(Trajectory::len).sum();
    println!(
        "\nLoaded {} trajectories ({} points)",
        trajectories.len(),
        points
    );
    Ok(trajectories)
}

fn load_gpx_folder(folder: &Path) -> CliResult<Vec<Trajectory>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(folder)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "gpx"))
        .collect();
    paths.sort();

    let mut trajectories = Vec::with_capacity(paths.len());
    for path in paths {
        match parse_gpx_file(&path) {
            Ok(t) => {
                log::debug!("[Loader] {} - {} points", t.id, t.len());
                trajectories.push(t);
            }
            Err(e) => eprintln!("  [ERR] Failed to parse {}: {}", path.display(), e),
        }
    }
    Ok(trajectories)
}

/// All track points of one GPX file as a trajectory named after the file.
fn parse_gpx_file(path: &Path) -> CliResult<Trajectory> {
    let gpx: Gpx = gpx::read(BufReader::new(File::open(path)?))?;

    let points: Vec<Point> = gpx
        .tracks
        .iter()
        .flat_map(|track| &track.segments)
        .flat_map(|segment| &segment.points)
        .map(|pt| Point::from(pt.point().0))
        .collect();

    if points.is_empty() {
        return Err("no track points found".into());
    }

    let id = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(Trajectory::new(id, points))
}

// ============================================================================
// Commands
// ============================================================================

fn run_pipeline(
    input: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    overrides: &ConfigOverrides,
) -> CliResult<()> {
    let mut config = match config_path {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => TraclusConfig::default(),
    };
    overrides.apply(&mut config);

    let trajectories = load_input(input)?;

    println!("\n{}", "=".repeat(60));
    println!("TRACLUS");
    println!("{}", "=".repeat(60));
    println!(
        "  eps {}, minNeighbors {}, minSegmentLength {}",
        config.eps, config.min_neighbors, config.min_segment_length
    );
    println!(
        "  minSmoothingLength {}, minTrajectories {}, minSegmentCoverage {}",
        config.min_smoothing_length, config.min_trajectories, config.min_segment_coverage
    );

    let result = Traclus::new(config)?.run(&trajectories)?;
    let stats = &result.stats;

    println!("\n  Segments:        {}", stats.segment_count);
    println!("  Clusters:        {}", stats.cluster_count);
    println!("  Noise segments:  {}", stats.noise_count);
    println!("  Representatives: {}", stats.representative_count);

    for rep in &result.representatives {
        println!(
            "\n  Representative {}: {} points, length {:.1}",
            rep.id,
            rep.len(),
            rep.total_length()
        );
    }

    if let Some(output_dir) = output {
        export_result(&result, output_dir)?;
    }
    Ok(())
}

fn run_partition(input: &Path, min_segment_length: f64) -> CliResult<()> {
    let trajectories = load_input(input)?;
    let partitioner = TrajectoryPartitioner::new(traclus::PartitionConfig {
        min_segment_length,
        mdl_cost_advantage: 0,
    });

    println!("\n{}", "=".repeat(60));
    println!("PARTITION");
    println!("{}", "=".repeat(60));

    let mut total = 0;
    for trajectory in &trajectories {
        let segments = partitioner.partition_trajectory(trajectory)?;
        println!(
            "  {}: {} points -> {} segments",
            trajectory.id,
            trajectory.len(),
            segments.len()
        );
        total += segments.len();
    }
    println!("\n  Total: {} segments", total);
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn export_result(result: &TraclusResult, output_dir: &Path) -> CliResult<()> {
    println!("\n[Export] Writing results to: {}", output_dir.display());
    fs::create_dir_all(output_dir)?;

    loader::write_trajectories(output_dir.join("representatives.txt"), &result.representatives)?;
    println!("  Written: representatives.txt");

    write_gpx_file(&output_dir.join("representatives.gpx"), &result.representatives)?;
    println!(
        "  Written: representatives.gpx ({} tracks)",
        result.representatives.len()
    );

    let writer = BufWriter::new(File::create(output_dir.join("result.json"))?);
    serde_json::to_writer_pretty(writer, result)?;
    println!("  Written: result.json");
    Ok(())
}

/// One GPX track per trajectory, x written as longitude and y as latitude.
fn write_gpx_file(path: &Path, trajectories: &[Trajectory]) -> CliResult<()> {
    let tracks = trajectories
        .iter()
        .map(|t| {
            let mut segment = TrackSegment::new();
            segment.points = t
                .points
                .iter()
                .map(|&p| Waypoint::new(geo::Point::from(geo::Coord::from(p))))
                .collect();
            let mut track = Track::new();
            track.name = Some(format!("Representative {}", t.id));
            track.segments.push(segment);
            track
        })
        .collect();

    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("traclus-cli".to_string()),
        tracks,
        ..Gpx::default()
    };

    gpx::write(&gpx, BufWriter::new(File::create(path)?))?;
    Ok(())
}
