//! Plain-text interchange formats.
//!
//! The explainer pipeline communicates with downstream tooling through
//! flat text files, and those formats are a contract: per-run masks are
//! written with 3 decimal places, the aggregated mean edge mask with 5,
//! community scores with 3. Readers accept exactly what the writers
//! produce.

use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write a vector of scores, one fixed-point value per line.
pub fn write_scores(path: impl AsRef<Path>, values: &[f32], decimals: usize) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    for v in values {
        writeln!(w, "{v:.decimals$}")?;
    }
    Ok(())
}

/// Read a one-value-per-line score file.
pub fn read_scores(path: impl AsRef<Path>) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut values = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let v: f32 = line.parse().map_err(|_| Error::Parse {
            path: path.display().to_string(),
            line: lineno + 1,
            msg: format!("expected a number, got `{line}`"),
        })?;
        values.push(v);
    }

    Ok(values)
}

/// Write community memberships: one line per community, comma-joined
/// node indices.
pub fn write_communities(path: impl AsRef<Path>, communities: &[Vec<u32>]) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    for com in communities {
        let row = com
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        writeln!(w, "{row}")?;
    }
    Ok(())
}

/// Read the community membership format written by [`write_communities`].
pub fn read_communities(path: impl AsRef<Path>) -> Result<Vec<Vec<u32>>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut com = Vec::new();
        for part in line.split(',') {
            let idx: u32 = part.trim().parse().map_err(|_| Error::Parse {
                path: path.display().to_string(),
                line: lineno + 1,
                msg: format!("expected a node index, got `{part}`"),
            })?;
            com.push(idx);
        }
        out.push(com);
    }

    Ok(out)
}
