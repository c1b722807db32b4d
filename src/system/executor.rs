// src/system/executor.rs

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{command}' could not be executed: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command '{command}' exited with code {code}.")]
    NonZeroExitStatus { command: String, code: i32 },
    #[error("Could not pass input to command '{command}': {source}")]
    Stdin {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot add '{0}' to PATH: it contains a path separator.")]
    InvalidPathEntry(String),
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl ExecutionError {
    /// The child's exit code, if the child ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExitStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the program itself could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CommandFailed { source, .. } if source.kind() == ErrorKind::NotFound)
    }
}

/// What to launch: a program with its arguments, or a string for the host shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    Argv(Vec<String>),
    Shell(String),
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argv(argv) => write!(f, "{}", argv.join(" ")),
            Self::Shell(line) => write!(f, "{}", line),
        }
    }
}

/// Where the child's standard output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StdoutMode {
    Inherit,
    /// Forwarded to our stderr so that our own stdout stays clean.
    Stderr,
    Capture,
}

/// A fully described child process.
///
/// The child inherits the host environment; `env` entries are layered on top. A `PATH`
/// entry in `env` is also used to resolve the program of an argv-style command.
#[derive(Debug, Clone)]
pub struct Invocation {
    command: CommandLine,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
    input: Option<String>,
}

impl Invocation {
    pub fn new(command: CommandLine) -> Self {
        Self {
            command,
            cwd: None,
            env: BTreeMap::new(),
            input: None,
        }
    }

    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CommandLine::Argv(args.into_iter().map(Into::into).collect()))
    }

    pub fn shell(line: impl Into<String>) -> Self {
        Self::new(CommandLine::Shell(line.into()))
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Text written to the child's stdin.
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn command(&self) -> &CommandLine {
        &self.command
    }

    /// Runs the command with its output streamed to the terminal.
    pub fn run(&self) -> Result<(), ExecutionError> {
        self.wait(StdoutMode::Inherit).map(|_| ())
    }

    /// Runs the command with its stdout forwarded to our stderr.
    pub fn run_to_stderr(&self) -> Result<(), ExecutionError> {
        self.wait(StdoutMode::Stderr).map(|_| ())
    }

    /// Runs the command and captures its standard output. Stderr is passed through.
    pub fn capture(&self) -> Result<String, ExecutionError> {
        let stdout = self.wait(StdoutMode::Capture)?;
        String::from_utf8(stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
            command: self.command.to_string(),
            source: e,
        })
    }

    fn wait(&self, mode: StdoutMode) -> Result<Vec<u8>, ExecutionError> {
        let display = self.command.to_string();
        let mut child = self.spawn(mode)?;

        if let Some(input) = &self.input
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin
                .write_all(input.as_bytes())
                .map_err(|e| ExecutionError::Stdin {
                    command: display.clone(),
                    source: e,
                })?;
            // Dropping the handle closes the pipe so the child sees EOF.
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ExecutionError::CommandFailed {
                command: display.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let code = exit_code(output.status);
            log::debug!("Command '{}' exited with code {}", display, code);
            return Err(ExecutionError::NonZeroExitStatus {
                command: display,
                code,
            });
        }
        Ok(output.stdout)
    }

    fn spawn(&self, mode: StdoutMode) -> Result<Child, ExecutionError> {
        let mut command = self.build()?;
        command
            .stdin(if self.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stdout(match mode {
                StdoutMode::Inherit => Stdio::inherit(),
                StdoutMode::Stderr => Stdio::from(std::io::stderr()),
                StdoutMode::Capture => Stdio::piped(),
            })
            .stderr(Stdio::inherit());

        log::debug!("Final command to run: {}", self.command);
        log::trace!("Environment overrides for command: {:?}", self.env);
        log::debug!("Cwd for running command: {:?}", self.cwd);

        command.spawn().map_err(|e| ExecutionError::CommandFailed {
            command: self.command.to_string(),
            source: e,
        })
    }

    fn build(&self) -> Result<StdCommand, ExecutionError> {
        let mut command = match &self.command {
            CommandLine::Argv(argv) => {
                let (program, args) = argv.split_first().ok_or(ExecutionError::EmptyCommand)?;
                let mut command = StdCommand::new(self.resolve_program(program));
                command.args(args);
                command
            }
            CommandLine::Shell(line) => {
                if line.trim().is_empty() {
                    return Err(ExecutionError::EmptyCommand);
                }
                host_shell_command(line)
            }
        };
        if let Some(cwd) = &self.cwd {
            command.current_dir(dunce::simplified(cwd));
        }
        command.envs(&self.env);
        Ok(command)
    }

    /// Looks the program up in the overridden `PATH`, falling back to the bare name.
    fn resolve_program(&self, program: &str) -> OsString {
        let Some(path) = self.env.get("PATH") else {
            return OsString::from(program);
        };
        let cwd = self
            .cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        match which::which_in(program, Some(path), &cwd) {
            Ok(found) => found.into_os_string(),
            Err(_) => OsString::from(program),
        }
    }
}

fn host_shell_command(line: &str) -> StdCommand {
    if cfg!(target_os = "windows") {
        let mut command = StdCommand::new("cmd");
        command.arg("/C").arg(line);
        command
    } else {
        let mut command = StdCommand::new("sh");
        command.arg("-c").arg(line);
        command
    }
}

/// Maps an exit status to a process exit code. A child killed by a signal maps to
/// `128 + signal`, like a POSIX shell does.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Prepends a directory to a `PATH`-style value.
pub fn prepend_to_path(dir: &Path, current: Option<OsString>) -> Result<String, ExecutionError> {
    let mut entries = vec![dir.to_path_buf()];
    if let Some(current) = current {
        entries.extend(std::env::split_paths(&current));
    }
    let joined = std::env::join_paths(entries)
        .map_err(|_| ExecutionError::InvalidPathEntry(dir.display().to_string()))?;
    Ok(joined.to_string_lossy().into_owned())
}
