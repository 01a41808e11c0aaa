use log::info;
use std::path::{Path, PathBuf};

use crate::alignment::run_alignments;
use crate::config::PipelineConfig;
use crate::database::{BlastDatabase, DatabaseStatus};
use crate::ingest::ingest_peptides;
use crate::process::ToolRunner;
use crate::reformat::reformat_results;
use crate::viewer::{launch_viewer, ViewerOutcome};
use crate::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub query_files: Vec<PathBuf>,
    pub database: DatabaseStatus,
    pub result_files: Vec<PathBuf>,
    pub alignment_files: Vec<PathBuf>,
    pub viewer: ViewerOutcome,
}

/// Stage hooks; lets the binary print progress without the library writing to stdout.
pub trait Progress {
    fn stage(&self, _message: &str) {}
}

pub struct Silent;

impl Progress for Silent {}

pub struct Pipeline<R: ToolRunner> {
    config: PipelineConfig,
    runner: R,
}

impl<R: ToolRunner> Pipeline<R> {
    pub fn new(config: PipelineConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn run(&self, input: &Path) -> Result<PipelineReport, PipelineError> {
        self.run_with_progress(input, &Silent)
    }

    /// All generated files land next to `input`. Any failure before the viewer
    /// stage stops the run.
    pub fn run_with_progress(
        &self,
        input: &Path,
        progress: &dyn Progress,
    ) -> Result<PipelineReport, PipelineError> {
        let dir = working_dir(input)?;
        let cfg = &self.config;

        let query_files = ingest_peptides(input, &dir, cfg.peptide_column, cfg.malformed_rows)?;

        progress.stage("Building DB.");
        let db = BlastDatabase::new(cfg.database_path(&dir));
        let database = db.ensure(
            &cfg.reference_path(&dir),
            &cfg.database,
            &cfg.tools,
            &self.runner,
        )?;

        progress.stage("Building results");
        let result_files = run_alignments(&db, &query_files, &dir, &cfg.tools, &self.runner)?;

        let alignment_files = reformat_results(
            &result_files,
            &dir,
            cfg.min_identity,
            &cfg.tools,
            cfg.shell_redirect,
            &self.runner,
        )?;

        progress.stage("Opening Genome Workbench...");
        let viewer = launch_viewer(&alignment_files, &cfg.viewer, &self.runner);
        if viewer == ViewerOutcome::NotFound {
            progress.stage("Genome Workbench not found");
        }
        info!(
            "Pipeline finished: {} queries, {} alignment views",
            query_files.len(),
            alignment_files.len()
        );

        Ok(PipelineReport {
            query_files,
            database,
            result_files,
            alignment_files,
            viewer,
        })
    }
}

// A bare file name has an empty parent; that means the current directory.
fn working_dir(input: &Path) -> Result<PathBuf, PipelineError> {
    match input.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(PathBuf::from(".")),
        Some(parent) => Ok(parent.to_path_buf()),
        None => Err(PipelineError::NoParentDirectory(input.to_path_buf())),
    }
}
