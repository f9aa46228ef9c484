use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

use super::error::ProcessError;
use crate::stream::{ChunkKind, OutputStreams, StreamWriter};

/// Size of each read from a child's output pipe
const RELAY_BUFFER_SIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl ProcessCommand {
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }

    fn from_std(status: std::process::ExitStatus) -> Self {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::from_signal(status)
        }
    }

    #[cfg(unix)]
    fn from_signal(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;
        match status.signal() {
            Some(signal) => ExitStatus::Signal(signal),
            None => ExitStatus::Error(1),
        }
    }

    #[cfg(not(unix))]
    fn from_signal(_status: std::process::ExitStatus) -> Self {
        ExitStatus::Error(1)
    }
}

/// Result of a process whose output was relayed into streams
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub status: ExitStatus,
    pub duration: Duration,
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
}

/// Run `command`, relaying its stdout and stderr into `streams` as the bytes
/// arrive.
///
/// Each pipe is drained by its own task, so the two writers receive writes
/// concurrently. A failing writer fails the run with [`ProcessError::Relay`]
/// once the process has exited.
pub async fn run_with_streams(
    command: &ProcessCommand,
    streams: &dyn OutputStreams,
) -> Result<StepOutcome, ProcessError> {
    let start = Instant::now();
    tracing::debug!("Executing subprocess: {}", command.command_line());
    if let Some(ref dir) = command.working_dir {
        tracing::trace!("Working directory: {:?}", dir);
    }

    let mut child = configure_command(command)
        .spawn()
        .map_err(|e| map_spawn_error(e, &command.program))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| missing_pipe(ChunkKind::Stdout))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| missing_pipe(ChunkKind::Stderr))?;

    let stdout_relay = tokio::spawn(relay(stdout, streams.stdout(), ChunkKind::Stdout));
    let stderr_relay = tokio::spawn(relay(stderr, streams.stderr(), ChunkKind::Stderr));

    let waited = match command.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(waited) => waited,
            Err(_) => {
                tracing::warn!(
                    "Subprocess timed out after {:?}: {}",
                    limit,
                    command.command_line()
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill timed out subprocess: {}", e);
                }
                stdout_relay.abort();
                stderr_relay.abort();
                return Err(ProcessError::Timeout(limit));
            }
        },
        None => child.wait().await,
    };
    let status = ExitStatus::from_std(waited?);

    let stdout_bytes = join_relay(stdout_relay).await?;
    let stderr_bytes = join_relay(stderr_relay).await?;

    let outcome = StepOutcome {
        status,
        duration: start.elapsed(),
        stdout_bytes,
        stderr_bytes,
    };
    log_outcome(&outcome, command);
    Ok(outcome)
}

fn configure_command(command: &ProcessCommand) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(&command.program);
    cmd.args(&command.args)
        .envs(&command.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &command.working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

fn map_spawn_error(error: io::Error, program: &str) -> ProcessError {
    if error.kind() == io::ErrorKind::NotFound {
        ProcessError::CommandNotFound(program.to_string())
    } else {
        ProcessError::Io(error)
    }
}

fn missing_pipe(stream: ChunkKind) -> ProcessError {
    ProcessError::Relay {
        stream,
        source: io::Error::other("pipe was not captured"),
    }
}

/// Copy one pipe into one writer. Writers may block, so each write runs on
/// the blocking pool. A UTF-8 sequence cut off at the end of a read is held
/// back and written with the next one.
async fn relay<R>(mut pipe: R, writer: StreamWriter, kind: ChunkKind) -> Result<u64, ProcessError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; RELAY_BUFFER_SIZE];
    let mut writer = writer;
    let mut pending = Vec::new();
    let mut total = 0u64;

    loop {
        let n = pipe.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;

        pending.extend_from_slice(&buf[..n]);
        let held = incomplete_utf8_tail(&pending);
        let tail = pending.split_off(pending.len() - held);
        if !pending.is_empty() {
            writer = write_chunk(writer, pending, kind).await?;
        }
        pending = tail;
    }

    if !pending.is_empty() {
        write_chunk(writer, pending, kind).await?;
    }
    Ok(total)
}

async fn write_chunk(
    writer: StreamWriter,
    chunk: Vec<u8>,
    kind: ChunkKind,
) -> Result<StreamWriter, ProcessError> {
    tokio::task::spawn_blocking(move || {
        let mut writer = writer;
        writer.write_all(&chunk).map(|()| writer)
    })
    .await
    .map_err(|e| ProcessError::Io(io::Error::other(e)))?
    .map_err(|source| ProcessError::Relay {
        stream: kind,
        source,
    })
}

/// Length of the unfinished UTF-8 sequence ending `bytes`, or 0
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    for i in (start..bytes.len()).rev() {
        if bytes[i] & 0xC0 != 0x80 {
            return match std::str::from_utf8(&bytes[i..]) {
                Err(e) if e.error_len().is_none() => bytes.len() - i,
                _ => 0,
            };
        }
    }
    0
}

async fn join_relay(handle: JoinHandle<Result<u64, ProcessError>>) -> Result<u64, ProcessError> {
    handle
        .await
        .map_err(|e| ProcessError::Io(io::Error::other(e)))?
}

fn log_outcome(outcome: &StepOutcome, command: &ProcessCommand) {
    match &outcome.status {
        ExitStatus::Success => tracing::debug!(
            "Subprocess completed successfully in {:?}: {}",
            outcome.duration,
            command.command_line()
        ),
        ExitStatus::Error(code) => tracing::debug!(
            "Subprocess failed with exit code {} in {:?}: {}",
            code,
            outcome.duration,
            command.command_line()
        ),
        ExitStatus::Signal(signal) => tracing::warn!(
            "Subprocess terminated by signal {} in {:?}: {}",
            signal,
            outcome.duration,
            command.command_line()
        ),
    }
    tracing::trace!(
        "Relayed {} stdout bytes and {} stderr bytes",
        outcome.stdout_bytes,
        outcome.stderr_bytes
    );
}

#[cfg(test)]
mod utf8_tail_tests {
    use super::incomplete_utf8_tail;

    #[test]
    fn test_complete_text_has_no_tail() {
        assert_eq!(incomplete_utf8_tail(b""), 0);
        assert_eq!(incomplete_utf8_tail(b"plain\n"), 0);
        assert_eq!(incomplete_utf8_tail("caf\u{e9}".as_bytes()), 0);
    }

    #[test]
    fn test_cut_sequences_are_held_back() {
        assert_eq!(incomplete_utf8_tail(b"caf\xc3"), 1);
        assert_eq!(incomplete_utf8_tail(b"x\xe2\x82"), 2);
        assert_eq!(incomplete_utf8_tail(b"\xf0\x9f\x98"), 3);
    }

    #[test]
    fn test_invalid_bytes_are_not_held_back() {
        assert_eq!(incomplete_utf8_tail(b"bad\xff"), 0);
        assert_eq!(incomplete_utf8_tail(b"\xa9\xa9\xa9\xa9"), 0);
    }
}
