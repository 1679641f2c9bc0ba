//! # Raw record readers for the dataset files
//!
//! Readers return raw rows or JSON values. Header rows are not interpreted here, the
//! processors decide which rows to skip.

use crate::common::error::FinetuneError;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn open(path: &Path) -> Result<File, FinetuneError> {
    File::open(path).map_err(|error| match error.kind() {
        std::io::ErrorKind::NotFound => {
            FinetuneError::FileNotFound(format!("{} could not be found", path.display()))
        }
        _ => FinetuneError::IOError(format!("{}: {}", path.display(), error)),
    })
}

/// Reads a tab separated file into rows of cells.
///
/// Quote characters are not interpreted and rows may have varying widths. Every line is
/// returned, including a potential header.
pub fn read_tsv<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>, FinetuneError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(false)
        .flexible(true)
        .from_reader(open(path)?);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| {
            FinetuneError::ParseError(format!("{}: {}", path.display(), error))
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Reads a JSON lines file, one JSON value per non-empty line.
///
/// A malformed line fails with a `ParseError` naming the file and the 1-based line number.
pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<Value>, FinetuneError> {
    let path = path.as_ref();
    let reader = BufReader::new(open(path)?);

    let mut records = Vec::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|error| {
            FinetuneError::ParseError(format!(
                "{} line {}: {}",
                path.display(),
                line_index + 1,
                error
            ))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Writes records as compact JSON, one per line
pub fn write_jsonl<P: AsRef<Path>, T: Serialize>(
    path: P,
    records: &[T],
) -> Result<(), FinetuneError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
