use log::info;
use std::path::{Path, PathBuf};

use crate::config::ToolPaths;
use crate::process::{Shell, ToolCommand, ToolRunner};
use crate::{numbered_path, PipelineError, VIEW_EXTENSION, VIEW_PREFIX};

/// `mview -in blast <result> -hsp discrete -minident <n> -out fasta > <view>`
pub fn mview_command(
    result: &Path,
    view: &Path,
    min_identity: u8,
    tools: &ToolPaths,
    shell_redirect: bool,
) -> ToolCommand {
    let command = ToolCommand::new(&tools.mview)
        .args(["-in", "blast"])
        .path_arg(result)
        .args(["-hsp", "discrete", "-minident"])
        .arg(min_identity.to_string())
        .args(["-out", "fasta"])
        .stdout_to(view);
    if shell_redirect {
        command.through_shell(Shell::native())
    } else {
        command
    }
}

pub fn reformat_results<R: ToolRunner>(
    results: &[PathBuf],
    dir: &Path,
    min_identity: u8,
    tools: &ToolPaths,
    shell_redirect: bool,
    runner: &R,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut views = Vec::with_capacity(results.len());
    for (i, result) in results.iter().enumerate() {
        let view = numbered_path(dir, VIEW_PREFIX, i + 1, VIEW_EXTENSION);
        let command = mview_command(result, &view, min_identity, tools, shell_redirect);
        runner.run(&command)?;
        if !view.is_file() {
            return Err(PipelineError::MissingOutput {
                command: command.command_line(),
                path: view,
            });
        }
        views.push(view);
    }
    info!("Reformatted {} alignment reports", views.len());
    Ok(views)
}
