//! Reader and writer for whitespace-delimited trajectory records.
//!
//! One trajectory per line:
//!
//! ```text
//! <id> <point_count> <x1> <y1> <x2> <y2> ...
//! ```
//!
//! Blank lines are skipped. Line numbers in errors are 1-based.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;

use crate::error::OptionExt;
use crate::{Point, Result, TraclusError, Trajectory};

/// Parse one non-blank record.
fn parse_record(line_number: usize, line: &str) -> Result<Trajectory> {
    let mut fields = line.split_whitespace();

    let id = fields
        .next()
        .ok_or_parse(line_number, "missing trajectory id")?;
    let count_field = fields
        .next()
        .ok_or_parse(line_number, "missing point count")?;
    let declared: usize = count_field.parse().map_err(|_| TraclusError::Parse {
        line: line_number,
        message: format!("invalid point count '{}'", count_field),
    })?;

    let coordinates = fields
        .map(|field| {
            field.parse::<f64>().map_err(|_| TraclusError::Parse {
                line: line_number,
                message: format!("invalid coordinate '{}'", field),
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    if coordinates.len() % 2 != 0 {
        return Err(TraclusError::Parse {
            line: line_number,
            message: format!("odd number of coordinates ({})", coordinates.len()),
        });
    }

    let points: Vec<Point> = coordinates
        .chunks_exact(2)
        .map(|xy| Point::new(xy[0], xy[1]))
        .collect();

    if points.len() != declared {
        return Err(TraclusError::Parse {
            line: line_number,
            message: format!("declared {} points, found {}", declared, points.len()),
        });
    }

    Ok(Trajectory::new(id, points))
}

/// Parse trajectory records from a string.
pub fn parse_trajectories(input: &str) -> Result<Vec<Trajectory>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_record(i + 1, line))
        .collect()
}

/// Read trajectory records from any reader.
pub fn read_from<R: Read>(reader: R) -> Result<Vec<Trajectory>> {
    let mut trajectories = Vec::new();
    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        trajectories.push(parse_record(i + 1, &line)?);
    }
    Ok(trajectories)
}

/// Read trajectory records from a file.
pub fn read_trajectories(path: impl AsRef<Path>) -> Result<Vec<Trajectory>> {
    let path = path.as_ref();
    let trajectories = read_from(File::open(path)?)?;
    info!(
        "[Loader] Read {} trajectories from {}",
        trajectories.len(),
        path.display()
    );
    Ok(trajectories)
}

/// Write trajectories in the record format.
pub fn write_to<W: Write>(writer: W, trajectories: &[Trajectory]) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for trajectory in trajectories {
        write!(writer, "{} {}", trajectory.id, trajectory.points.len())?;
        for p in &trajectory.points {
            write!(writer, " {} {}", p.x, p.y)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write trajectories to a file, replacing it.
pub fn write_trajectories(path: impl AsRef<Path>, trajectories: &[Trajectory]) -> Result<()> {
    write_to(File::create(path.as_ref())?, trajectories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let t = parse_record(1, "7 3 0 0 10.5 0 20 -1e2").unwrap();
        assert_eq!(t.id, "7");
        assert_eq!(
            t.points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.5, 0.0),
                Point::new(20.0, -100.0)
            ]
        );
    }

    #[test]
    fn test_error_line_numbers_skip_blank_lines() {
        let err = parse_trajectories("a 1 0 0\n\nb 2 0 0 1\n").unwrap_err();
        assert!(matches!(err, TraclusError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_write_format() {
        let t = Trajectory::new("r", vec![Point::new(1.5, 2.0), Point::new(-3.0, 4.25)]);
        let mut out = Vec::new();
        write_to(&mut out, &[t]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "r 2 1.5 2 -3 4.25\n");
    }
}
