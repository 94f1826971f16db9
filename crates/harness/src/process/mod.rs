// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Child process handles and results.

mod answers;
mod capture;
mod signal;
mod terminate;

pub use answers::AnswerQueue;
pub use capture::{capture, CaptureBuffer};
pub use signal::{CompletionSignal, SignalScanner, VERSION_BANNER_PATTERN};
#[cfg(unix)]
pub use terminate::SignalTerminator;
#[cfg(windows)]
pub use terminate::TaskkillTerminator;
pub use terminate::{KillSwitch, PlatformTerminator, Terminate};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::error::{HarnessError, Result};

/// Lifecycle of a spawned process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ProcessStatus {
    Running,
    /// Exited on its own with a code
    Exited(i32),
    /// Ended by a signal
    Killed(i32),
}

impl ProcessStatus {
    /// Shell-style exit code: signal deaths map to `128 + signal`.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            Self::Killed(signal) => Some(128 + signal),
            Self::Running => None,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl From<std::process::ExitStatus> for ProcessStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Killed(signal);
            }
        }
        Self::Exited(1)
    }
}

/// Result of a fire-and-capture or watch run.
#[derive(Clone, Debug, Serialize)]
pub struct RunOutput {
    pub status: ProcessStatus,
    pub stdout: String,
    pub stderr: String,
    /// The harness timeout expired and the process was killed
    pub timed_out: bool,
}

impl RunOutput {
    pub fn exit_code(&self) -> Option<i32> {
        self.status.exit_code()
    }
}

/// Result of a scripted dialogue.
#[derive(Clone, Debug, Serialize)]
pub struct PromptOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ProcessStatus,
    pub timed_out: bool,
}

/// What to connect to the child's standard streams.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StdioPlan {
    /// Pipe stdout/stderr back to us (otherwise inherit ours)
    pub capture: bool,
    /// Give the child a writable stdin (otherwise `/dev/null`)
    pub stdin: bool,
}

/// Everything needed to start one child.
#[derive(Debug)]
pub(crate) struct SpawnRequest<'a> {
    pub program: &'a Path,
    pub args: Vec<OsString>,
    pub cwd: &'a Path,
    pub env: &'a [(OsString, OsString)],
    pub stdio: StdioPlan,
}

/// One spawned child and the pipes still attached to it.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    program: PathBuf,
    status: ProcessStatus,
    kill: Arc<KillSwitch>,
}

impl ProcessHandle {
    pub(crate) fn spawn(request: SpawnRequest<'_>, terminator: Arc<dyn Terminate>) -> Result<Self> {
        let SpawnRequest {
            program,
            args,
            cwd,
            env,
            stdio,
        } = request;

        debug!(
            program = %program.display(),
            ?args,
            cwd = %cwd.display(),
            capture = stdio.capture,
            "spawning"
        );

        let output = || {
            if stdio.capture {
                Stdio::piped()
            } else {
                Stdio::inherit()
            }
        };

        let mut command = Command::new(program);
        command
            .args(&args)
            .current_dir(cwd)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(if stdio.stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(output())
            .stderr(output())
            .kill_on_drop(true);

        // Own group, so a group signal reaches everything the tool forks
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|source| HarnessError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

        let pid = child.id().ok_or_else(|| HarnessError::Spawn {
            program: program.to_path_buf(),
            source: std::io::Error::other("process exited before its pid was read"),
        })?;

        Ok(Self {
            child,
            program: program.to_path_buf(),
            status: ProcessStatus::Running,
            kill: Arc::new(KillSwitch::new(pid, terminator)),
        })
    }

    pub fn pid(&self) -> u32 {
        self.kill.pid()
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Current status, polling the child if it may have exited.
    pub fn status(&mut self) -> ProcessStatus {
        if self.status == ProcessStatus::Running {
            if let Ok(Some(status)) = self.child.try_wait() {
                self.status = status.into();
            }
        }
        self.status
    }

    /// Shared termination guard for this process.
    pub fn kill_switch(&self) -> Arc<KillSwitch> {
        Arc::clone(&self.kill)
    }

    /// Request termination (once).
    pub fn terminate(&self) -> bool {
        self.kill.terminate()
    }

    /// Force kill (once).
    pub fn force_kill(&self) -> bool {
        self.kill.force_kill()
    }

    /// Wait for the process to exit.
    pub async fn wait(&mut self) -> Result<ProcessStatus> {
        let status = self.child.wait().await?;
        self.status = status.into();
        debug!(pid = self.pid(), status = ?self.status, "process exited");
        Ok(self.status)
    }
}

/// Write `bytes` to the child's stdin. On failure the pipe is dropped and
/// false is returned; later writes become no-ops.
pub(crate) async fn write_stdin(stdin: &mut Option<ChildStdin>, bytes: &[u8]) -> bool {
    let Some(pipe) = stdin.as_mut() else {
        return false;
    };
    let written = match pipe.write_all(bytes).await {
        Ok(()) => pipe.flush().await,
        Err(e) => Err(e),
    };
    match written {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "stdin write failed");
            *stdin = None;
            false
        }
    }
}

/// Write `input` then close stdin so the child sees EOF.
pub(crate) async fn feed_input(mut stdin: Option<ChildStdin>, input: Option<&[u8]>) {
    if let Some(input) = input {
        write_stdin(&mut stdin, input).await;
    }
    drop(stdin);
}
