use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    DEFAULT_BLASTDB_VERSION, DEFAULT_DATABASE_NAME, DEFAULT_DATABASE_TITLE, DEFAULT_MIN_IDENTITY,
    DEFAULT_REFERENCE_FASTA, DEFAULT_TOOL_TIMEOUT, PEPTIDE_COLUMN,
};

pub const MAKEBLASTDB_ENV_BIN: &str = "GCSV_MAKEBLASTDB";
pub const BLASTP_ENV_BIN: &str = "GCSV_BLASTP";
pub const MVIEW_ENV_BIN: &str = "GCSV_MVIEW";
pub const VIEWER_ENV_BIN: &str = "GCSV_VIEWER";

const DEFAULT_MAKEBLASTDB_BIN: &str = "makeblastdb";
const DEFAULT_BLASTP_BIN: &str = "blastp";
const DEFAULT_MVIEW_BIN: &str = "mview";

const WINDOWS_VIEWER: &str = r"C:\Program Files\Genome Workbench x64\bin\gbench.exe";
const MACOS_VIEWER: &str = "/Applications/Genome Workbench.app/Contents/MacOS/Genome Workbench";

/// What to do with a data row that is too short to hold the peptide column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedRowPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub name: String,
    pub reference_fasta: String,
    pub title: String,
    pub blastdb_version: u8,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DATABASE_NAME.to_string(),
            reference_fasta: DEFAULT_REFERENCE_FASTA.to_string(),
            title: DEFAULT_DATABASE_TITLE.to_string(),
            blastdb_version: DEFAULT_BLASTDB_VERSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub makeblastdb: String,
    pub blastp: String,
    pub mview: String,
}

impl ToolPaths {
    /// Environment overrides first, then a PATH lookup by the plain tool name.
    pub fn from_env() -> Self {
        Self {
            makeblastdb: resolve_tool_executable(MAKEBLASTDB_ENV_BIN, DEFAULT_MAKEBLASTDB_BIN),
            blastp: resolve_tool_executable(BLASTP_ENV_BIN, DEFAULT_BLASTP_BIN),
            mview: resolve_tool_executable(MVIEW_ENV_BIN, DEFAULT_MVIEW_BIN),
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            makeblastdb: DEFAULT_MAKEBLASTDB_BIN.to_string(),
            blastp: DEFAULT_BLASTP_BIN.to_string(),
            mview: DEFAULT_MVIEW_BIN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub enabled: bool,
    pub windows: Vec<PathBuf>,
    pub macos: Vec<PathBuf>,
    pub env_override: Option<PathBuf>,
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self {
            env_override: env_value(VIEWER_ENV_BIN).map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Candidates in lookup order: the override, then Windows, then macOS.
    pub fn candidates(&self) -> impl Iterator<Item = &Path> {
        self.env_override
            .iter()
            .chain(self.windows.iter())
            .chain(self.macos.iter())
            .map(PathBuf::as_path)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            windows: vec![PathBuf::from(WINDOWS_VIEWER)],
            macos: vec![PathBuf::from(MACOS_VIEWER)],
            env_override: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub peptide_column: usize,
    pub malformed_rows: MalformedRowPolicy,
    pub database: DatabaseConfig,
    pub min_identity: u8,
    pub tools: ToolPaths,
    pub tool_timeout: Duration,
    pub shell_redirect: bool,
    pub viewer: ViewerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            peptide_column: PEPTIDE_COLUMN,
            malformed_rows: MalformedRowPolicy::default(),
            database: DatabaseConfig::default(),
            min_identity: DEFAULT_MIN_IDENTITY,
            tools: ToolPaths::default(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            shell_redirect: cfg!(windows),
            viewer: ViewerConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self {
            tools: ToolPaths::from_env(),
            viewer: ViewerConfig::from_env(),
            ..Self::default()
        }
    }

    pub fn with_malformed_rows(mut self, policy: MalformedRowPolicy) -> Self {
        self.malformed_rows = policy;
        self
    }

    pub fn with_peptide_column(mut self, column: usize) -> Self {
        self.peptide_column = column;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_shell_redirect(mut self, shell_redirect: bool) -> Self {
        self.shell_redirect = shell_redirect;
        self
    }

    pub fn with_viewer(mut self, viewer: ViewerConfig) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn without_viewer(mut self) -> Self {
        self.viewer.enabled = false;
        self
    }

    pub fn database_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.database.name)
    }

    pub fn reference_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.database.reference_fasta)
    }
}

fn env_value(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve_tool_executable(env_var: &str, default_bin: &str) -> String {
    env_value(env_var).unwrap_or_else(|| default_bin.to_string())
}
