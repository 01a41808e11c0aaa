use log::info;
use std::path::{Path, PathBuf};

use crate::config::ToolPaths;
use crate::database::BlastDatabase;
use crate::process::{ToolCommand, ToolRunner};
use crate::{numbered_path, PipelineError, RESULT_EXTENSION, RESULT_PREFIX};

pub fn blastp_command(
    db: &BlastDatabase,
    query: &Path,
    result: &Path,
    tools: &ToolPaths,
) -> ToolCommand {
    ToolCommand::new(&tools.blastp)
        .arg("-db")
        .path_arg(db.path())
        .arg("-query")
        .path_arg(query)
        .args(["-outfmt", "0", "-out"])
        .path_arg(result)
}

/// Align every query against `db`; `result<i>.txt` belongs to `queries[i - 1]`.
pub fn run_alignments<R: ToolRunner>(
    db: &BlastDatabase,
    queries: &[PathBuf],
    dir: &Path,
    tools: &ToolPaths,
    runner: &R,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut results = Vec::with_capacity(queries.len());
    for (i, query) in queries.iter().enumerate() {
        let result = numbered_path(dir, RESULT_PREFIX, i + 1, RESULT_EXTENSION);
        let command = blastp_command(db, query, &result, tools);
        runner.run(&command)?;
        if !result.is_file() {
            return Err(PipelineError::MissingOutput {
                command: command.command_line(),
                path: result,
            });
        }
        results.push(result);
    }
    info!("Aligned {} queries", results.len());
    Ok(results)
}
