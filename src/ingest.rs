//! Peptide table to single-sequence FASTA query files.

use csv::{ByteRecord, ReaderBuilder};
use log::{info, warn};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::MalformedRowPolicy;
use crate::{numbered_path, PipelineError, QUERY_EXTENSION, QUERY_PREFIX};

/// Extract the peptide column from every data row.
///
/// The first line is a header and is skipped. Fields are split on bare commas
/// and every byte is decoded as one Latin-1 character, so arbitrary input
/// bytes never fail decoding. Read errors name `origin`.
pub fn read_peptides<R: Read>(
    reader: R,
    origin: &Path,
    column: usize,
    policy: MalformedRowPolicy,
) -> Result<Vec<String>, PipelineError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut peptides = Vec::new();
    let mut record = ByteRecord::new();
    let csv_error = |source: csv::Error| PipelineError::Csv {
        path: origin.to_path_buf(),
        source,
    };
    while rdr.read_byte_record(&mut record).map_err(csv_error)? {
        match record.get(column) {
            Some(field) => peptides.push(latin1(field)),
            None => {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                match policy {
                    MalformedRowPolicy::Skip => {
                        warn!(
                            "Skipping line {line}: {} fields, need column {column}",
                            record.len()
                        );
                    }
                    MalformedRowPolicy::Abort => {
                        return Err(PipelineError::MalformedRow {
                            line,
                            fields: record.len(),
                            column,
                        });
                    }
                }
            }
        }
    }
    Ok(peptides)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Write `>pep<i>` / sequence pairs as `pep<i>.fasta`, `i` counting from 1.
pub fn write_query_files(peptides: &[String], dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    peptides
        .iter()
        .enumerate()
        .map(|(i, peptide)| {
            let index = i + 1;
            let path = numbered_path(dir, QUERY_PREFIX, index, QUERY_EXTENSION);
            fs::write(&path, format!(">{QUERY_PREFIX}{index}\n{peptide}"))
                .map_err(|e| PipelineError::io(&path, e))?;
            Ok(path)
        })
        .collect()
}

pub fn ingest_peptides(
    input: &Path,
    dir: &Path,
    column: usize,
    policy: MalformedRowPolicy,
) -> Result<Vec<PathBuf>, PipelineError> {
    let file = fs::File::open(input).map_err(|e| PipelineError::io(input, e))?;
    let peptides = read_peptides(file, input, column, policy)?;
    info!(
        "Read {} peptides from {}",
        peptides.len(),
        input.display()
    );
    write_query_files(&peptides, dir)
}
