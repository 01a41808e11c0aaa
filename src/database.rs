use log::info;
use std::path::{Path, PathBuf};

use crate::config::{DatabaseConfig, ToolPaths};
use crate::process::{ToolCommand, ToolRunner};
use crate::PipelineError;

// Files makeblastdb leaves next to `-out`: a single-volume index, or an alias
// file when the database spans several volumes.
const MARKER_EXTENSIONS: [&str; 2] = ["pin", "pal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Reused,
    Built,
}

/// A protein BLAST database addressed by its `-out` base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlastDatabase {
    path: PathBuf,
}

impl BlastDatabase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn marker_paths(&self) -> Vec<PathBuf> {
        MARKER_EXTENSIONS
            .iter()
            .map(|ext| {
                let mut name = self.path.as_os_str().to_os_string();
                name.push(".");
                name.push(ext);
                PathBuf::from(name)
            })
            .collect()
    }

    pub fn exists(&self) -> bool {
        self.marker_paths().iter().any(|p| p.is_file())
    }

    pub fn build_command(
        &self,
        reference: &Path,
        config: &DatabaseConfig,
        tools: &ToolPaths,
    ) -> ToolCommand {
        ToolCommand::new(&tools.makeblastdb)
            .arg("-in")
            .path_arg(reference)
            .args(["-dbtype", "prot", "-out"])
            .path_arg(&self.path)
            .arg("-title")
            .arg(&config.title)
            .arg("-parse_seqids")
            .arg("-blastdb_version")
            .arg(config.blastdb_version.to_string())
    }

    /// Build the database from `reference` unless it is already on disk.
    pub fn ensure<R: ToolRunner>(
        &self,
        reference: &Path,
        config: &DatabaseConfig,
        tools: &ToolPaths,
        runner: &R,
    ) -> Result<DatabaseStatus, PipelineError> {
        if self.exists() {
            info!("Reusing database {}", self.path.display());
            return Ok(DatabaseStatus::Reused);
        }
        if !reference.is_file() {
            return Err(PipelineError::ReferenceMissing(reference.to_path_buf()));
        }

        let command = self.build_command(reference, config, tools);
        runner.run(&command)?;
        if !self.exists() {
            return Err(PipelineError::MissingOutput {
                command: command.command_line(),
                path: self.marker_paths().remove(0),
            });
        }
        info!("Built database {}", self.path.display());
        Ok(DatabaseStatus::Built)
    }
}
