// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Platform process termination.
//!
//! On unix every child is spawned as the leader of its own process group, so
//! signals go to the group and take down anything the tool forked (dev
//! servers, watchers). Windows has no signals; `taskkill /T /F` kills the
//! process tree by pid instead.

use std::fmt::Debug;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

/// Ends a running process identified by pid.
pub trait Terminate: Debug + Send + Sync {
    /// Ask the process to stop.
    fn terminate(&self, pid: u32) -> io::Result<()>;

    /// Kill the process unconditionally.
    fn force_kill(&self, pid: u32) -> io::Result<()>;
}

/// Terminator for the build target.
#[cfg(unix)]
pub type PlatformTerminator = SignalTerminator;

/// Terminator for the build target.
#[cfg(windows)]
pub type PlatformTerminator = TaskkillTerminator;

/// SIGTERM / SIGKILL to the child's process group.
#[cfg(unix)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SignalTerminator;

#[cfg(unix)]
impl Terminate for SignalTerminator {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        signal_group(pid, nix::sys::signal::Signal::SIGTERM)
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        signal_group(pid, nix::sys::signal::Signal::SIGKILL)
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    match nix::sys::signal::killpg(Pid::from_raw(raw), signal) {
        // Already gone
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// `taskkill /pid <pid> /T /F`.
#[cfg(windows)]
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskkillTerminator;

#[cfg(windows)]
impl Terminate for TaskkillTerminator {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        taskkill(pid)
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        taskkill(pid)
    }
}

#[cfg(windows)]
fn taskkill(pid: u32) -> io::Result<()> {
    use std::process::{Command, Stdio};

    Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/T", "/F"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
}

/// One invocation's termination budget: a single app-level terminate request
/// and a single force kill. Repeat calls are no-ops.
#[derive(Debug)]
pub struct KillSwitch {
    pid: u32,
    terminator: Arc<dyn Terminate>,
    terminated: AtomicBool,
    forced: AtomicBool,
}

impl KillSwitch {
    pub fn new(pid: u32, terminator: Arc<dyn Terminate>) -> Self {
        Self {
            pid,
            terminator,
            terminated: AtomicBool::new(false),
            forced: AtomicBool::new(false),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Request termination. Returns true only for the call that sent it.
    pub fn terminate(&self) -> bool {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(pid = self.pid, "terminating process");
        if let Err(e) = self.terminator.terminate(self.pid) {
            warn!(pid = self.pid, error = %e, "terminate failed");
        }
        true
    }

    /// Force kill. Returns true only for the call that sent it.
    pub fn force_kill(&self) -> bool {
        if self.forced.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(pid = self.pid, "killing process");
        if let Err(e) = self.terminator.force_kill(self.pid) {
            warn!(pid = self.pid, error = %e, "force kill failed");
        }
        true
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn is_forced(&self) -> bool {
        self.forced.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "terminate_tests.rs"]
mod tests;
