//! Blocking invocation of external command-line tools.
//!
//! Every tool the pipeline drives goes through [`ToolRunner`]: the call waits
//! for the process to exit (bounded by a timeout), captures its output and
//! turns a non-zero exit status into an error.

use log::{debug, warn};
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::{PipelineError, DEFAULT_TOOL_TIMEOUT};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shell interpreter used when stdout redirection has to be spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Cmd,
    Sh,
}

impl Shell {
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Cmd
        } else {
            Self::Sh
        }
    }
}

/// Program and arguments kept as OS strings, so paths reach the tool byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
    stdout_path: Option<PathBuf>,
    // Arguments already quoted for cmd.exe; passed through untouched on Windows.
    verbatim: bool,
}

impl ToolCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_path: None,
            verbatim: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Send the process's stdout into `path` instead of capturing it.
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn stdout_path(&self) -> Option<&Path> {
        self.stdout_path.as_deref()
    }

    pub fn is_verbatim(&self) -> bool {
        self.verbatim
    }

    /// Human readable form used in logs and error messages.
    pub fn command_line(&self) -> String {
        let mut line = std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| display_word(&word.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(path) = &self.stdout_path {
            line.push_str(" > ");
            line.push_str(&display_word(&path.to_string_lossy()));
        }
        line
    }

    /// Rewrite the command so that `shell` performs the stdout redirection.
    ///
    /// Without a redirection target the command is returned unchanged.
    pub fn through_shell(mut self, shell: Shell) -> Self {
        let Some(out) = self.stdout_path.take() else {
            return self;
        };
        let words = std::iter::once(&self.program).chain(self.args.iter());
        match shell {
            Shell::Cmd => {
                // `/S /C "<line>"`: cmd drops exactly the outer pair of quotes.
                let mut line = OsString::from("\"");
                for (i, word) in words.enumerate() {
                    if i > 0 {
                        line.push(" ");
                    }
                    line.push(cmd_quote(word));
                }
                line.push(" > ");
                line.push(cmd_quote(out.as_os_str()));
                line.push("\"");
                Self {
                    program: OsString::from("cmd"),
                    args: vec![OsString::from("/S"), OsString::from("/C"), line],
                    stdout_path: None,
                    verbatim: true,
                }
            }
            Shell::Sh => {
                let mut script = OsString::new();
                for (i, word) in words.enumerate() {
                    if i > 0 {
                        script.push(" ");
                    }
                    script.push(sh_quote(word));
                }
                script.push(" > ");
                script.push(sh_quote(out.as_os_str()));
                Self {
                    program: OsString::from("sh"),
                    args: vec![OsString::from("-c"), script],
                    stdout_path: None,
                    verbatim: false,
                }
            }
        }
    }
}

fn display_word(word: &str) -> String {
    if word.is_empty() || word.contains(char::is_whitespace) {
        format!("\"{word}\"")
    } else {
        word.to_string()
    }
}

fn cmd_quote(word: &OsStr) -> OsString {
    let needs_quotes = word.is_empty()
        || word
            .to_string_lossy()
            .contains(|c: char| c.is_whitespace() || matches!(c, '&' | '|' | '<' | '>' | '^'));
    if needs_quotes {
        let mut quoted = OsString::from("\"");
        quoted.push(word);
        quoted.push("\"");
        quoted
    } else {
        word.to_os_string()
    }
}

fn sh_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/' | b':' | b'=')
}

#[cfg(unix)]
fn sh_quote(word: &OsStr) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let bytes = word.as_bytes();
    if !bytes.is_empty() && bytes.iter().all(|&b| sh_safe(b)) {
        return word.to_os_string();
    }
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'\'');
    for &b in bytes {
        if b == b'\'' {
            quoted.extend_from_slice(br"'\''");
        } else {
            quoted.push(b);
        }
    }
    quoted.push(b'\'');
    OsString::from_vec(quoted)
}

#[cfg(not(unix))]
fn sh_quote(word: &OsStr) -> OsString {
    let word = word.to_string_lossy();
    if !word.is_empty() && word.bytes().all(sh_safe) {
        return OsString::from(word.into_owned());
    }
    OsString::from(format!("'{}'", word.replace('\'', r"'\''")))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait ToolRunner {
    /// Run to completion. Non-zero exit is an error.
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PipelineError>;

    /// Start without waiting; for long-lived desktop applications.
    fn launch(&self, command: &ToolCommand) -> Result<(), PipelineError>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PipelineError> {
        (**self).run(command)
    }

    fn launch(&self, command: &ToolCommand) -> Result<(), PipelineError> {
        (**self).launch(command)
    }
}

/// Runs commands as real OS processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
    poll_interval: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn wait_with_timeout(
        &self,
        child: &mut Child,
        command: &ToolCommand,
    ) -> Result<ExitStatus, PipelineError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    return Err(PipelineError::ToolLaunch {
                        program: command.program().to_string_lossy().into_owned(),
                        source,
                    })
                }
            }
            if started.elapsed() >= self.timeout {
                warn!(
                    "Killing '{}' after {:?}",
                    command.command_line(),
                    self.timeout
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(PipelineError::ToolTimeout {
                    command: command.command_line(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PipelineError> {
        debug!("Running {}", command.command_line());
        let stdout = match command.stdout_path() {
            Some(path) => Stdio::from(File::create(path).map_err(|e| PipelineError::io(path, e))?),
            None => Stdio::piped(),
        };
        let mut child = os_command(command)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(command.program(), e))?;

        let stdout_reader = child.stdout.take().map(read_pipe);
        let stderr_reader = child.stderr.take().map(read_pipe);
        let status = self.wait_with_timeout(&mut child, command)?;
        let stdout = join_pipe(stdout_reader);
        let stderr = join_pipe(stderr_reader);

        if !status.success() {
            return Err(PipelineError::ToolFailed {
                command: command.command_line(),
                status: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(ToolOutput {
            status: status.code(),
            stdout,
            stderr,
        })
    }

    fn launch(&self, command: &ToolCommand) -> Result<(), PipelineError> {
        debug!("Launching {}", command.command_line());
        os_command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
            .map_err(|e| spawn_error(command.program(), e))
    }
}

#[cfg(windows)]
fn os_command(command: &ToolCommand) -> Command {
    use std::os::windows::process::CommandExt;

    let mut cmd = Command::new(command.program());
    if command.is_verbatim() {
        for arg in command.get_args() {
            cmd.raw_arg(arg);
        }
    } else {
        cmd.args(command.get_args());
    }
    cmd
}

#[cfg(not(windows))]
fn os_command(command: &ToolCommand) -> Command {
    let mut cmd = Command::new(command.program());
    cmd.args(command.get_args());
    cmd
}

fn spawn_error(program: &OsStr, source: std::io::Error) -> PipelineError {
    let program = program.to_string_lossy().into_owned();
    if source.kind() == ErrorKind::NotFound {
        PipelineError::ToolNotFound { program }
    } else {
        PipelineError::ToolLaunch { program, source }
    }
}

fn read_pipe<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_pipe(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
