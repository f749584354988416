//! PowerShell process execution
//!
//! Every external command this tool runs (the upgrade script, npm queries,
//! the execution-policy probe) goes through a single [`Shell`] seam so the
//! orchestration logic can be exercised against a scripted double.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Upper bound on any spawned helper. npm installs can be slow, but a child
/// that is still running after this long is considered hung and killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Cached PowerShell command detection result
#[cfg(windows)]
use std::sync::OnceLock;

#[cfg(windows)]
static POWERSHELL_CMD: OnceLock<&'static str> = OnceLock::new();

/// Get the best available PowerShell command.
///
/// On Windows, prefers `pwsh` (PowerShell Core) when available and falls
/// back to `powershell` (Windows PowerShell). The result is cached.
#[cfg(windows)]
pub fn powershell_command() -> &'static str {
    POWERSHELL_CMD.get_or_init(|| {
        if Command::new("pwsh").arg("--version").output().is_ok() {
            "pwsh"
        } else {
            "powershell"
        }
    })
}

/// On non-Windows systems only PowerShell Core exists.
#[cfg(not(windows))]
pub fn powershell_command() -> &'static str {
    "pwsh"
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?} and was terminated")]
    TimedOut { program: String, timeout: Duration },

    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Buffered output of a finished child process.
///
/// Lines are kept in arrival order per stream. The exit code is deliberately
/// not part of this type: the external scripts this tool drives do not
/// report status through it, so callers verify outcomes out of band.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ProcessOutput {
    /// All output lines, stdout first, then stderr.
    pub fn all_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .iter()
            .chain(self.stderr.iter())
            .map(String::as_str)
    }
}

/// Seam for running commands through the system shell.
pub trait Shell: Send + Sync {
    /// Run a command line and collect its output.
    fn run(&self, command: &str) -> Result<ProcessOutput, ShellError>;
}

/// The real shell: wraps every command in `powershell -NoProfile -NoLogo`.
pub struct PowerShell {
    timeout: Duration,
}

impl PowerShell {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PowerShell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell for PowerShell {
    fn run(&self, command: &str) -> Result<ProcessOutput, ShellError> {
        let program = powershell_command();
        run_process(program, &interpreter_args(command), self.timeout)
    }
}

/// Arguments for one command-line invocation. `-Command` must be explicit:
/// Windows PowerShell binds a bare positional argument to it, but pwsh
/// binds positionals to `-File` and would reject the command text as a
/// missing script.
fn interpreter_args(command: &str) -> [&str; 4] {
    ["-NoProfile", "-NoLogo", "-Command", command]
}

/// Spawn a process, drain both output streams, and wait for it to exit.
///
/// Stdin is closed immediately; none of the spawned programs read input.
/// The child is killed if it outlives `timeout`.
pub fn run_process(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<ProcessOutput, ShellError> {
    log::debug!("Shell: running {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ShellError::Spawn {
            program: program.to_string(),
            source,
        })?;

    // Drain the pipes on their own threads so a chatty child can't fill a
    // pipe buffer and deadlock against our wait loop.
    let stdout_reader = spawn_line_reader(child.stdout.take());
    let stderr_reader = spawn_line_reader(child.stderr.take());

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_status)) => break,
            Ok(None) => {}
            Err(source) => {
                return Err(ShellError::Wait {
                    program: program.to_string(),
                    source,
                })
            }
        }

        if start.elapsed() >= timeout {
            log::warn!("Shell: {} exceeded {:?}, killing it", program, timeout);
            let _ = child.kill();
            let _ = child.wait();
            return Err(ShellError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }

        thread::sleep(Duration::from_millis(50));
    }

    let stdout = join_lines(stdout_reader);
    let stderr = join_lines(stderr_reader);

    log::debug!(
        "Shell: {} exited with {} stdout / {} stderr line(s)",
        program,
        stdout.len(),
        stderr.len()
    );

    Ok(ProcessOutput { stdout, stderr })
}

fn spawn_line_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<String>>> {
    pipe.map(|reader| {
        thread::spawn(move || {
            BufReader::new(reader)
                .lines()
                .map_while(Result::ok)
                .collect()
        })
    })
}

fn join_lines(handle: Option<JoinHandle<Vec<String>>>) -> Vec<String> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
