use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::ViewerConfig;
use crate::process::{ToolCommand, ToolRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerOutcome {
    Launched(PathBuf),
    NotFound,
    Disabled,
    LaunchFailed(String),
}

/// First configured viewer install location that exists.
pub fn locate_viewer(config: &ViewerConfig) -> Option<PathBuf> {
    config
        .candidates()
        .find(|candidate| candidate.is_file())
        .map(Path::to_path_buf)
}

/// Open `files` in the desktop viewer. Never fails the pipeline.
pub fn launch_viewer<R: ToolRunner>(
    files: &[PathBuf],
    config: &ViewerConfig,
    runner: &R,
) -> ViewerOutcome {
    if !config.enabled {
        return ViewerOutcome::Disabled;
    }
    let Some(viewer) = locate_viewer(config) else {
        info!("No viewer at any configured location");
        return ViewerOutcome::NotFound;
    };

    let command = ToolCommand::new(viewer.as_os_str()).args(files.iter().map(|f| f.as_os_str()));
    match runner.launch(&command) {
        Ok(()) => ViewerOutcome::Launched(viewer),
        Err(err) => {
            warn!("Could not start viewer: {err}");
            ViewerOutcome::LaunchFailed(err.to_string())
        }
    }
}
