use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub mod alignment;
pub mod config;
pub mod database;
pub mod ingest;
pub mod pipeline;
pub mod process;
pub mod reformat;
pub mod viewer;

pub use crate::alignment::run_alignments;
pub use crate::config::{
    DatabaseConfig, MalformedRowPolicy, PipelineConfig, ToolPaths, ViewerConfig,
};
pub use crate::database::{BlastDatabase, DatabaseStatus};
pub use crate::ingest::{ingest_peptides, read_peptides, write_query_files};
pub use crate::pipeline::{Pipeline, PipelineReport, Progress, Silent};
pub use crate::process::{Shell, SystemRunner, ToolCommand, ToolOutput, ToolRunner};
pub use crate::reformat::reformat_results;
pub use crate::viewer::{launch_viewer, locate_viewer, ViewerOutcome};

// Column of the peptide sequence in the exported table (0-based)
pub const PEPTIDE_COLUMN: usize = 25;

pub const QUERY_PREFIX: &str = "pep";
pub const QUERY_EXTENSION: &str = "fasta";
pub const RESULT_PREFIX: &str = "result";
pub const RESULT_EXTENSION: &str = "txt";
pub const VIEW_PREFIX: &str = "mv";
pub const VIEW_EXTENSION: &str = "fa";

pub const DEFAULT_DATABASE_NAME: &str = "HCMV";
pub const DEFAULT_REFERENCE_FASTA: &str = "HCMVProteins.fasta";
pub const DEFAULT_DATABASE_TITLE: &str = "HCMV genome";
pub const DEFAULT_BLASTDB_VERSION: u8 = 4;
pub const DEFAULT_MIN_IDENTITY: u8 = 100;
/// Upper bound on a single tool invocation.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not read peptide table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Line {line} has {fields} fields, peptide column {column} is missing")]
    MalformedRow {
        line: u64,
        fields: usize,
        column: usize,
    },
    #[error("Input file {0} has no parent directory")]
    NoParentDirectory(PathBuf),
    #[error("Reference FASTA {0} not found")]
    ReferenceMissing(PathBuf),
    #[error("Could not find executable '{program}'; install it or set its GCSV_* override")]
    ToolNotFound { program: String },
    #[error("Could not run '{program}': {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Command failed: {command} (status={status:?}, stderr='{stderr}')")]
    ToolFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("Command timed out after {timeout:?}: {command}")]
    ToolTimeout { command: String, timeout: Duration },
    #[error("Command finished but did not produce {path}: {command}")]
    MissingOutput { command: String, path: PathBuf },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// `<dir>/<prefix><index><.ext>`, where `index` is 1-based.
pub fn numbered_path(dir: &Path, prefix: &str, index: usize, extension: &str) -> PathBuf {
    dir.join(format!("{prefix}{index}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_path_is_one_based_name() {
        let dir = Path::new("/data/run");
        assert_eq!(
            numbered_path(dir, QUERY_PREFIX, 1, QUERY_EXTENSION),
            PathBuf::from("/data/run/pep1.fasta")
        );
        assert_eq!(
            numbered_path(dir, RESULT_PREFIX, 12, RESULT_EXTENSION),
            PathBuf::from("/data/run/result12.txt")
        );
        assert_eq!(
            numbered_path(dir, VIEW_PREFIX, 3, VIEW_EXTENSION),
            PathBuf::from("/data/run/mv3.fa")
        );
    }

    #[test]
    fn tool_errors_render_command_line() {
        let err = PipelineError::ToolFailed {
            command: "blastp -db HCMV".to_string(),
            status: Some(2),
            stderr: "BLAST Database error\n".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("blastp -db HCMV"));
        assert!(msg.contains("Some(2)"));
    }
}
