#![allow(dead_code)]

use gcsv::{PipelineError, ToolCommand, ToolOutput, ToolRunner, ViewerConfig};
use std::cell::RefCell;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

pub const PEPTIDE_COLUMN: usize = 25;

/// CSV with a 27-column header and the given peptides in column 25.
pub fn write_table(path: &Path, peptides: &[&str]) {
    let header = (0..27)
        .map(|i| format!("col{i}"))
        .collect::<Vec<_>>()
        .join(",");
    let mut text = header;
    for (i, peptide) in peptides.iter().enumerate() {
        let mut fields: Vec<String> = (0..PEPTIDE_COLUMN).map(|c| format!("r{i}c{c}")).collect();
        fields.push(peptide.to_string());
        fields.push("0.99".to_string());
        text.push('\n');
        text.push_str(&fields.join(","));
    }
    text.push('\n');
    fs::write(path, text).unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}

pub fn write_reference(dir: &Path) -> PathBuf {
    let path = dir.join("HCMVProteins.fasta");
    fs::write(&path, ">UL83 pp65\nMESRGRRCPEMISVLGPISGHVLK\n")
        .expect("reference fasta should be writable");
    path
}

/// Viewer locations that cannot exist.
pub fn absent_viewer(dir: &Path) -> ViewerConfig {
    ViewerConfig {
        enabled: true,
        windows: vec![dir.join("no-such").join("gbench.exe")],
        macos: vec![dir.join("no-such").join("Genome Workbench")],
        env_override: None,
    }
}

pub fn arg_after<'a>(command: &'a ToolCommand, flag: &str) -> Option<&'a OsStr> {
    let args = command.get_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(OsString::as_os_str)
}

/// Records every command and fakes the files each tool would write.
#[derive(Default)]
pub struct RecordingRunner {
    pub runs: RefCell<Vec<ToolCommand>>,
    pub launches: RefCell<Vec<ToolCommand>>,
    pub fail_program: Option<String>,
    pub skip_outputs: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(program: &str) -> Self {
        Self {
            fail_program: Some(program.to_string()),
            ..Self::default()
        }
    }

    pub fn without_outputs() -> Self {
        Self {
            skip_outputs: true,
            ..Self::default()
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.runs
            .borrow()
            .iter()
            .map(|c| c.program().to_string_lossy().into_owned())
            .collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.runs
            .borrow()
            .iter()
            .filter(|c| c.program() == program)
            .count()
    }

    fn fabricate(&self, command: &ToolCommand) {
        match command.program().to_str() {
            Some("makeblastdb") => {
                let mut out = arg_after(command, "-out")
                    .expect("makeblastdb needs -out")
                    .to_os_string();
                out.push(".pin");
                fs::write(out, b"").expect("index should be writable");
            }
            Some("blastp") => {
                let out = arg_after(command, "-out").expect("blastp needs -out");
                let query = arg_after(command, "-query").expect("blastp needs -query");
                fs::write(out, format!("BLASTP report for {}\n", Path::new(query).display()))
                    .expect("report should be writable");
            }
            Some("mview") => {
                let out = command.stdout_path().expect("mview output is redirected");
                let input = Path::new(&command.get_args()[2]);
                fs::write(out, format!(">{}\nPEP\n", input.display()))
                    .expect("view should be writable");
            }
            _ => panic!("unexpected tool {}", command.command_line()),
        }
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PipelineError> {
        self.runs.borrow_mut().push(command.clone());
        if self.fail_program.as_deref().is_some_and(|p| command.program() == p) {
            return Err(PipelineError::ToolFailed {
                command: command.command_line(),
                status: Some(1),
                stderr: "simulated failure".to_string(),
            });
        }
        if !self.skip_outputs {
            self.fabricate(command);
        }
        Ok(ToolOutput {
            status: Some(0),
            ..ToolOutput::default()
        })
    }

    fn launch(&self, command: &ToolCommand) -> Result<(), PipelineError> {
        self.launches.borrow_mut().push(command.clone());
        Ok(())
    }
}

/// Shell scripts that stand in for makeblastdb, blastp and mview.
#[cfg(unix)]
pub fn install_fake_tools(dir: &Path) -> [(&'static str, PathBuf); 3] {
    let makeblastdb = write_script(
        dir,
        "fake-makeblastdb",
        r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-out" ]; then shift; out="$1"; fi
  shift
done
: > "$out.pin"
"#,
    );
    let blastp = write_script(
        dir,
        "fake-blastp",
        r#"out=""
query=""
while [ $# -gt 0 ]; do
  case "$1" in
    -out) shift; out="$1" ;;
    -query) shift; query="$1" ;;
  esac
  shift
done
echo "BLASTP report for $query" > "$out"
"#,
    );
    let mview = write_script(
        dir,
        "fake-mview",
        r#"echo "$@" >> "$(dirname "$0")/mview.calls"
echo ">$3"
echo "PEP"
"#,
    );
    [
        ("GCSV_MAKEBLASTDB", makeblastdb),
        ("GCSV_BLASTP", blastp),
        ("GCSV_MVIEW", mview),
    ]
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("script should be writable");
    let mut perms = fs::metadata(&path)
        .expect("script metadata should be readable")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("script should be made executable");
    path
}
