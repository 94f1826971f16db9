// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The process harness: runs the tool under one of three interaction modes.
//!
//! - [`Harness::run`] spawns, waits for a natural exit and captures output.
//! - [`Harness::run_watch`] stops a long-running process once its stdout
//!   shows a [`CompletionSignal`].
//! - [`Harness::run_prompt_with_answers`] drives an interactive prompt by
//!   writing scripted answers to stdin, either after each quiet period on
//!   stdout or on a fixed interval.
//!
//! A non-zero exit is never an error. Only failing to spawn is.

use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use cli_harness_snapshot::SnapshotResolver;
use tokio::process::ChildStdin;
use tokio::sync::mpsc;
use tokio::time::Sleep;
use tracing::{debug, warn};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::process::{
    capture, feed_input, write_stdin, AnswerQueue, CompletionSignal, KillSwitch,
    PlatformTerminator, ProcessHandle, PromptOutput, RunOutput, SignalScanner, SpawnRequest,
    StdioPlan, Terminate,
};

/// Per-call options for [`Harness::run`] and [`Harness::run_watch`].
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Extra environment for the child
    pub env: Vec<(OsString, OsString)>,
    /// Written to stdin, which is then closed
    pub input: Option<Vec<u8>>,
    /// Override the configured stdio inheritance
    pub inherit_output: Option<bool>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set stdin input
    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Force stdio inheritance on or off
    pub fn with_inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = Some(inherit);
        self
    }
}

/// Options for [`Harness::spawn_watch_process`].
#[derive(Clone, Debug)]
pub struct WatchProcessOptions {
    /// Append `--output-path <case>/<output_dir>` to the arguments
    pub set_output: bool,
    /// Written to stdin, which is then closed. Empty input is ignored.
    pub input: Option<String>,
    /// Capture output even when inheritance is configured
    pub force_pipe: bool,
}

impl Default for WatchProcessOptions {
    fn default() -> Self {
        Self {
            set_output: true,
            input: None,
            force_pipe: false,
        }
    }
}

/// Options for [`Harness::run_prompt_with_answers`].
#[derive(Clone, Debug)]
pub struct PromptOptions {
    /// `None` or an empty list echoes the last output back and terminates
    /// the process
    pub answers: Option<Vec<String>>,
    /// Wait for a quiet period on stdout before each answer (otherwise send
    /// answers on a fixed interval)
    pub wait_for_output: bool,
    /// Append the `--output-path` argument pair
    pub set_output: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            answers: None,
            wait_for_output: true,
            set_output: false,
        }
    }
}

impl PromptOptions {
    /// Scripted answers, sent after quiet periods.
    pub fn answers<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Some(answers.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Choose between quiet-period and fixed-interval answering
    pub fn with_wait_for_output(mut self, wait: bool) -> Self {
        self.wait_for_output = wait;
        self
    }

    /// Append the `--output-path` argument pair
    pub fn with_output_path(mut self, set: bool) -> Self {
        self.set_output = set;
        self
    }
}

/// Spawns and supervises the tool under test.
#[derive(Clone, Debug)]
pub struct Harness {
    config: HarnessConfig,
    terminator: Arc<dyn Terminate>,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self::with_terminator(config, Arc::new(PlatformTerminator::default()))
    }

    /// Use a custom termination strategy.
    pub fn with_terminator(config: HarnessConfig, terminator: Arc<dyn Terminate>) -> Self {
        Self { config, terminator }
    }

    /// Harness configured from `CLI_HARNESS_*` variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(HarnessConfig::resolve(None)?))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Snapshot resolver for the configured tool versions.
    pub fn snapshot_resolver(&self) -> Option<SnapshotResolver> {
        self.config.versions.as_ref().map(SnapshotResolver::new)
    }

    /// Mode A: spawn, wait for exit, return exit status and full output.
    pub async fn run<S: AsRef<OsStr>>(
        &self,
        test_case: &Path,
        args: &[S],
        options: &RunOptions,
    ) -> Result<RunOutput> {
        let inherit = options
            .inherit_output
            .unwrap_or(self.config.inherit_output);
        let mut handle = self.spawn(
            test_case,
            collect_args(args),
            &options.env,
            StdioPlan {
                capture: !inherit,
                stdin: options.input.is_some(),
            },
        )?;

        let stdin = handle.take_stdin();
        let input = feed_input(stdin, options.input.as_deref());
        self.collect(handle, input, |_| {}).await
    }

    /// Mode B: spawn and terminate the process the first time stdout shows
    /// `signal` (default: the version banner). Never writes to stdin.
    pub async fn run_watch<S: AsRef<OsStr>>(
        &self,
        test_case: &Path,
        args: &[S],
        options: &RunOptions,
        signal: Option<CompletionSignal>,
    ) -> Result<RunOutput> {
        let mut scanner = SignalScanner::new(signal.unwrap_or_default());
        let handle = self.spawn(
            test_case,
            collect_args(args),
            &options.env,
            StdioPlan {
                capture: true,
                stdin: false,
            },
        )?;

        let kill = handle.kill_switch();
        self.collect(handle, std::future::ready(()), move |chunk| {
            if scanner.scan(chunk) && kill.terminate() {
                debug!(pid = kill.pid(), signal = %scanner.signal(), "completion signal seen");
            }
        })
        .await
    }

    /// Spawn the tool and hand back the live process.
    ///
    /// Appends `--output-path <case>/<output_dir>` unless `set_output` is
    /// false. Stdin is always piped; non-empty `input` is written to it and
    /// the pipe closed.
    pub async fn spawn_watch_process<S: AsRef<OsStr>>(
        &self,
        test_case: &Path,
        args: &[S],
        options: WatchProcessOptions,
    ) -> Result<ProcessHandle> {
        let case = absolute(test_case)?;
        let mut args = collect_args(args);
        if options.set_output {
            args.push("--output-path".into());
            args.push(case.join(&self.config.output_dir).into_os_string());
        }

        let capture = options.force_pipe || !self.config.inherit_output;
        let mut handle = self.spawn(
            &case,
            args,
            &[],
            StdioPlan {
                capture,
                stdin: true,
            },
        )?;

        if let Some(input) = options.input.filter(|i| !i.is_empty()) {
            let stdin = handle.take_stdin();
            feed_input(stdin, Some(input.as_bytes())).await;
        }
        Ok(handle)
    }

    /// Mode C: answer an interactive prompt.
    ///
    /// With `wait_for_output`, each answer is written once stdout has been
    /// quiet for the configured period; without answers the last output is
    /// echoed back and the process terminated. Otherwise every answer is
    /// written after a fixed interval regardless of output. Resolves once
    /// both stdout and stderr have closed, then force-kills any straggler.
    pub async fn run_prompt_with_answers<S: AsRef<OsStr>>(
        &self,
        location: &Path,
        args: &[S],
        options: PromptOptions,
    ) -> Result<PromptOutput> {
        let mut handle = self
            .spawn_watch_process(
                location,
                args,
                WatchProcessOptions {
                    set_output: options.set_output,
                    input: None,
                    force_pipe: true,
                },
            )
            .await?;

        let kill = handle.kill_switch();
        let mut stdin = handle.take_stdin();
        let stdout = handle.take_stdout();
        let stderr = handle.take_stderr();
        let mut answers = AnswerQueue::new(options.answers);

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        // The sender is moved in and dropped at EOF, which ends the dialogue.
        let stdout_done = async move {
            let chunk_tx = chunk_tx;
            capture(stdout, |chunk| {
                if !chunk.is_empty() {
                    let _ = chunk_tx.send(chunk.to_vec());
                }
            })
            .await
        };
        let stderr_done = capture(stderr, |_| {});

        let quiet_period = self.config.quiet_period();
        let interval = self.config.answer_interval();
        let dialogue = async {
            if options.wait_for_output {
                answer_when_quiet(&mut stdin, &mut answers, chunk_rx, quiet_period, &kill).await;
            } else {
                drop(chunk_rx);
                answer_on_interval(&mut stdin, &mut answers, interval).await;
            }
        };

        let streams = async {
            let (stdout, stderr, ()) = tokio::join!(stdout_done, stderr_done, dialogue);
            Ok::<_, HarnessError>((stdout?, stderr?))
        };
        let ((stdout, stderr), timed_out) = self.bounded(streams, &kill).await?;

        // Both streams closed: make sure nothing is left running.
        drop(stdin);
        kill.force_kill();
        let status = handle.wait().await?;
        debug!(sent = answers.sent(), ?status, "dialogue finished");

        Ok(PromptOutput {
            stdout,
            stderr,
            status,
            timed_out,
        })
    }

    fn tool(&self) -> Result<&Path> {
        self.config.tool.as_deref().ok_or(HarnessError::MissingTool)
    }

    fn spawn(
        &self,
        test_case: &Path,
        args: Vec<OsString>,
        env: &[(OsString, OsString)],
        stdio: StdioPlan,
    ) -> Result<ProcessHandle> {
        let cwd = absolute(test_case)?;
        let mut full_args: Vec<OsString> = self.config.tool_args.iter().map(OsString::from).collect();
        full_args.extend(args);

        ProcessHandle::spawn(
            SpawnRequest {
                program: self.tool()?,
                args: full_args,
                cwd: &cwd,
                env,
                stdio,
            },
            Arc::clone(&self.terminator),
        )
    }

    /// Drain both streams and wait for exit, feeding stdout chunks to
    /// `on_stdout` as they arrive.
    async fn collect<I, F>(&self, mut handle: ProcessHandle, input: I, on_stdout: F) -> Result<RunOutput>
    where
        I: Future<Output = ()>,
        F: FnMut(&[u8]),
    {
        let kill = handle.kill_switch();
        let stdout = handle.take_stdout();
        let stderr = handle.take_stderr();

        let work = async {
            let (stdout, stderr, status, ()) = tokio::join!(
                capture(stdout, on_stdout),
                capture(stderr, |_| {}),
                handle.wait(),
                input
            );
            Ok::<_, HarnessError>((stdout?, stderr?, status?))
        };
        let ((stdout, stderr, status), timed_out) = self.bounded(work, &kill).await?;

        Ok(RunOutput {
            status,
            stdout,
            stderr,
            timed_out,
        })
    }

    /// Run `work` under the configured timeout. On expiry the process is
    /// force-killed and `work` is allowed to finish collecting output.
    async fn bounded<T, W>(&self, work: W, kill: &KillSwitch) -> Result<(T, bool)>
    where
        W: Future<Output = Result<T>>,
    {
        let Some(limit) = self.config.timeout() else {
            return Ok((work.await?, false));
        };

        tokio::pin!(work);
        match tokio::time::timeout(limit, work.as_mut()).await {
            Ok(result) => Ok((result?, false)),
            Err(_) => {
                warn!(pid = kill.pid(), ?limit, "timed out, killing process");
                kill.force_kill();
                Ok((work.await?, true))
            }
        }
    }
}

/// Quiet-period discipline: every stdout chunk (re)arms a single timer; when
/// it fires, the next answer is written. Without answers, the last chunk is
/// echoed back and the process terminated. Returns once stdout closes.
async fn answer_when_quiet(
    stdin: &mut Option<ChildStdin>,
    answers: &mut AnswerQueue,
    mut chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    quiet_period: Duration,
    kill: &KillSwitch,
) {
    let mut timer: Option<Pin<Box<Sleep>>> = None;
    let mut last_output = Vec::new();

    loop {
        tokio::select! {
            chunk = chunks.recv() => match chunk {
                Some(chunk) => {
                    last_output = chunk;
                    // Replacing the slot cancels the pending timer
                    timer = Some(Box::pin(tokio::time::sleep(quiet_period)));
                }
                None => break,
            },
            () = fire(&mut timer) => {
                timer = None;
                if !answers.is_scripted() {
                    write_stdin(stdin, &last_output).await;
                    kill.terminate();
                } else if let Some(answer) = answers.advance() {
                    debug!(?answer, "writing answer");
                    write_stdin(stdin, answer.as_bytes()).await;
                }
            }
        }
    }
}

/// Fixed-interval discipline: wait `interval`, write the next answer, repeat.
async fn answer_on_interval(
    stdin: &mut Option<ChildStdin>,
    answers: &mut AnswerQueue,
    interval: Duration,
) {
    while let Some(answer) = answers.advance() {
        tokio::time::sleep(interval).await;
        debug!(?answer, "writing answer");
        if !write_stdin(stdin, answer.as_bytes()).await {
            break;
        }
    }
}

/// Resolves when the armed timer fires; never resolves while disarmed.
async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

fn collect_args<S: AsRef<OsStr>>(args: &[S]) -> Vec<OsString> {
    args.iter().map(|a| a.as_ref().to_os_string()).collect()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

#[cfg(test)]
#[path = "harness_tests.rs"]
mod tests;
