// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Integration tests for the process harness.
//!
//! Each test writes a small shell script standing in for the tool and drives
//! it through one of the harness modes.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cli_harness::process::PlatformTerminator;
use cli_harness::{
    CompletionSignal, Harness, HarnessConfig, HarnessError, ProcessStatus, PromptOptions,
    RunOptions, Terminate, WatchProcessOptions,
};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

const SIGTERM: i32 = 15;
const SIGKILL: i32 = 9;

/// A test case directory holding `tool.sh`.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(script: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tool.sh"), script).unwrap();
        Self { dir }
    }

    fn case(&self) -> &Path {
        self.dir.path()
    }

    /// Runs the script through `sh` so nothing is exec'd straight after write.
    fn config(&self) -> HarnessConfig {
        HarnessConfig::new("/bin/sh")
            .with_tool_args([self.case().join("tool.sh").to_string_lossy().into_owned()])
            .with_quiet_period(Duration::from_millis(200))
            .with_answer_interval(Duration::from_millis(150))
            .with_timeout(Some(Duration::from_secs(20)))
    }

    fn harness(&self) -> Harness {
        Harness::new(self.config())
    }
}

/// Counts requests and forwards them to the real terminator.
#[derive(Debug, Default)]
struct CountingTerminator {
    inner: PlatformTerminator,
    terminations: AtomicUsize,
    kills: AtomicUsize,
}

impl Terminate for CountingTerminator {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        self.inner.terminate(pid)
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.inner.force_kill(pid)
    }
}

const NO_ARGS: &[&str] = &[];

// =========================================================================
// run
// =========================================================================

#[tokio::test]
async fn test_run_captures_output_and_exit_code() {
    let fixture = Fixture::new("echo \"out $*\"\necho oops >&2\nexit 3\n");

    let output = fixture
        .harness()
        .run(fixture.case(), &["build", "--mode", "none"], &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(output.status, ProcessStatus::Exited(3));
    assert_eq!(output.exit_code(), Some(3));
    assert_eq!(output.stdout, "out build --mode none\n");
    assert_eq!(output.stderr, "oops\n");
    assert!(!output.timed_out);
}

#[tokio::test]
async fn test_run_unknown_command_is_data_not_error() {
    let fixture = Fixture::new(
        "if [ \"$1\" != build ]; then echo \"Unknown command '$1'\" >&2; exit 2; fi\n",
    );

    let output = fixture
        .harness()
        .run(fixture.case(), &["nonexistent"], &RunOptions::default())
        .await
        .unwrap();

    assert_ne!(output.exit_code(), Some(0));
    assert!(output.stderr.contains("Unknown command 'nonexistent'"));
}

#[tokio::test]
async fn test_run_writes_input_and_env() {
    let fixture = Fixture::new("read line\necho \"got $line $GREETING\"\n");

    let options = RunOptions::new()
        .with_env("GREETING", "hello")
        .with_input("hi\n");
    let output = fixture.harness().run(fixture.case(), NO_ARGS, &options).await.unwrap();

    assert_eq!(output.status, ProcessStatus::Exited(0));
    assert_eq!(output.stdout, "got hi hello\n");
}

#[tokio::test]
async fn test_run_uses_test_case_as_working_directory() {
    let fixture = Fixture::new("pwd -P\n");

    let output = fixture
        .harness()
        .run(fixture.case(), NO_ARGS, &RunOptions::default())
        .await
        .unwrap();

    let expected = fixture.case().canonicalize().unwrap();
    assert_eq!(Path::new(output.stdout.trim_end()), expected);
}

#[tokio::test]
async fn test_run_inherited_output_is_not_captured() {
    let fixture = Fixture::new("echo visible\n");

    let options = RunOptions::new().with_inherit_output(true);
    let output = fixture.harness().run(fixture.case(), NO_ARGS, &options).await.unwrap();

    assert!(output.status.success());
    assert_eq!(output.stdout, "");
    assert_eq!(output.stderr, "");
}

#[tokio::test]
async fn test_run_missing_program_is_spawn_error() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::new(HarnessConfig::new(dir.path().join("no-such-tool")));

    let err = harness
        .run(dir.path(), NO_ARGS, &RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Spawn { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_run_timeout_kills_and_keeps_partial_output() {
    let fixture = Fixture::new("echo start\nsleep 30\necho never\n");
    let harness = Harness::new(
        fixture
            .config()
            .with_timeout(Some(Duration::from_millis(300))),
    );

    let started = Instant::now();
    let output = harness
        .run(fixture.case(), NO_ARGS, &RunOptions::default())
        .await
        .unwrap();

    assert!(output.timed_out);
    assert_eq!(output.status, ProcessStatus::Killed(SIGKILL));
    assert_eq!(output.stdout, "start\n");
    assert!(started.elapsed() < Duration::from_secs(10));
}

// =========================================================================
// run_watch
// =========================================================================

#[tokio::test]
async fn test_run_watch_terminates_on_version_banner() {
    let fixture = Fixture::new("echo 'webpack 5.1.0 compiled successfully'\nsleep 30\necho never\n");

    let started = Instant::now();
    let output = fixture
        .harness()
        .run_watch(fixture.case(), &["--watch"], &RunOptions::default(), None)
        .await
        .unwrap();

    assert!(!output.timed_out);
    assert_eq!(output.status, ProcessStatus::Killed(SIGTERM));
    assert!(output.stdout.contains("webpack 5.1.0"));
    assert!(!output.stdout.contains("never"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_run_watch_custom_literal_signal() {
    let fixture = Fixture::new(
        "echo 'webpack 5.1.0'\nsleep 0.2\necho 'Compiled with warnings.'\nsleep 30\n",
    );

    let output = fixture
        .harness()
        .run_watch(
            fixture.case(),
            NO_ARGS,
            &RunOptions::default(),
            Some(CompletionSignal::literal("Compiled with")),
        )
        .await
        .unwrap();

    assert_eq!(output.status, ProcessStatus::Killed(SIGTERM));
    assert!(output.stdout.contains("webpack 5.1.0"));
    assert!(output.stdout.contains("Compiled with warnings."));
}

#[tokio::test]
async fn test_run_watch_requests_termination_once() {
    // On TERM the script prints the banner again before leaving.
    let fixture = Fixture::new(
        "trap 'echo \"webpack 5.0.2\"; exit 0' TERM\n\
         echo 'webpack 5.0.0'\n\
         while true; do sleep 0.1; done\n",
    );
    let terminator = Arc::new(CountingTerminator::default());
    let harness = Harness::with_terminator(fixture.config(), terminator.clone());

    let output = harness
        .run_watch(fixture.case(), NO_ARGS, &RunOptions::default(), None)
        .await
        .unwrap();

    assert!(output.stdout.contains("webpack 5.0.0"));
    assert!(output.stdout.contains("webpack 5.0.2"));
    assert_eq!(output.status, ProcessStatus::Exited(0));
    assert_eq!(terminator.terminations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_watch_collects_stderr() {
    let fixture = Fixture::new("echo 'warning: slow' >&2\necho 'webpack 5.1.0'\nsleep 30\n");

    let output = fixture
        .harness()
        .run_watch(fixture.case(), NO_ARGS, &RunOptions::default(), None)
        .await
        .unwrap();

    assert_eq!(output.stderr, "warning: slow\n");
}

// =========================================================================
// spawn_watch_process
// =========================================================================

#[tokio::test]
async fn test_spawn_watch_process_appends_output_path() {
    let fixture = Fixture::new("echo \"$@\"\n");

    let mut handle = fixture
        .harness()
        .spawn_watch_process(fixture.case(), &["build"], WatchProcessOptions::default())
        .await
        .unwrap();

    let mut stdout = String::new();
    handle
        .take_stdout()
        .unwrap()
        .read_to_string(&mut stdout)
        .await
        .unwrap();
    assert_eq!(handle.wait().await.unwrap(), ProcessStatus::Exited(0));

    let expected = format!("build --output-path {}\n", fixture.case().join("bin").display());
    assert_eq!(stdout, expected);
}

#[tokio::test]
async fn test_spawn_watch_process_writes_input() {
    let fixture = Fixture::new("cat\n");

    let options = WatchProcessOptions {
        set_output: false,
        input: Some("piped text".to_string()),
        force_pipe: true,
    };
    let mut handle = fixture
        .harness()
        .spawn_watch_process(fixture.case(), NO_ARGS, options)
        .await
        .unwrap();

    let mut stdout = String::new();
    handle
        .take_stdout()
        .unwrap()
        .read_to_string(&mut stdout)
        .await
        .unwrap();
    handle.wait().await.unwrap();

    assert_eq!(stdout, "piped text");
}

#[tokio::test]
async fn test_spawn_watch_process_reports_status() {
    let fixture = Fixture::new("sleep 30\n");

    let mut handle = fixture
        .harness()
        .spawn_watch_process(fixture.case(), NO_ARGS, WatchProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(handle.program(), Path::new("/bin/sh"));
    assert_eq!(handle.status(), ProcessStatus::Running);

    assert!(handle.force_kill());
    assert!(!handle.force_kill());
    assert_eq!(handle.wait().await.unwrap(), ProcessStatus::Killed(SIGKILL));
    assert_eq!(handle.status(), ProcessStatus::Killed(SIGKILL));
}

// =========================================================================
// run_prompt_with_answers
// =========================================================================

const TWO_QUESTIONS: &str = "printf 'Name? '\nread name\nprintf 'Age? '\nread age\necho \"$name/$age\"\n";

/// Prints one prompt line, then idles. On TERM it records the first line
/// found on stdin, so the file shows what was echoed back.
const ECHO_RECORDER: &str = "\
trap 'read -r line; printf \"%s\\n\" \"$line\" > got.txt; exit 0' TERM
printf 'Project name?\\n'
while true; do sleep 0.1; done
";

async fn prompt_echo(options: PromptOptions) -> (String, String) {
    let fixture = Fixture::new(ECHO_RECORDER);
    let output = fixture
        .harness()
        .run_prompt_with_answers(fixture.case(), NO_ARGS, options)
        .await
        .unwrap();

    assert!(!output.timed_out);
    let got = std::fs::read_to_string(fixture.case().join("got.txt")).unwrap();
    (output.stdout, got)
}

#[tokio::test]
async fn test_prompt_without_answers_echoes_and_terminates() {
    let (stdout, got) = prompt_echo(PromptOptions::default()).await;

    assert_eq!(stdout, "Project name?\n");
    assert_eq!(got, "Project name?\n");
}

#[tokio::test]
async fn test_prompt_with_empty_answers_echoes_and_terminates() {
    let (stdout, got) = prompt_echo(PromptOptions::answers(Vec::<String>::new())).await;

    assert_eq!(stdout, "Project name?\n");
    assert_eq!(got, "Project name?\n");
}

#[tokio::test]
async fn test_prompt_echo_keeps_multibyte_output_intact() {
    let fixture = Fixture::new(
        "trap 'read -r line; printf \"%s\\n\" \"$line\" > got.txt; exit 0' TERM\n\
         printf 'Projektname für Café?\\n'\n\
         while true; do sleep 0.1; done\n",
    );

    fixture
        .harness()
        .run_prompt_with_answers(fixture.case(), NO_ARGS, PromptOptions::default())
        .await
        .unwrap();

    let got = std::fs::read_to_string(fixture.case().join("got.txt")).unwrap();
    assert_eq!(got, "Projektname für Café?\n");
}

#[tokio::test]
async fn test_prompt_answers_after_quiet_periods() {
    let fixture = Fixture::new(TWO_QUESTIONS);

    let output = fixture
        .harness()
        .run_prompt_with_answers(fixture.case(), NO_ARGS, PromptOptions::answers(["alice\n", "42\n"]))
        .await
        .unwrap();

    assert!(output.stdout.contains("Name? "));
    assert!(output.stdout.contains("Age? "));
    assert!(output.stdout.contains("alice/42"));
    assert!(!output.timed_out);
}

#[tokio::test]
async fn test_prompt_answers_on_fixed_interval() {
    let fixture = Fixture::new(TWO_QUESTIONS);

    let started = Instant::now();
    let output = fixture
        .harness()
        .run_prompt_with_answers(
            fixture.case(),
            NO_ARGS,
            PromptOptions::answers(["bob\n", "7\n"]).with_wait_for_output(false),
        )
        .await
        .unwrap();

    assert!(output.stdout.contains("bob/7"));
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_prompt_forwards_output_path_when_requested() {
    let fixture = Fixture::new("echo \"$@\"\n");

    let output = fixture
        .harness()
        .run_prompt_with_answers(
            fixture.case(),
            &["init"],
            PromptOptions::default().with_output_path(true),
        )
        .await
        .unwrap();

    let expected = format!("init --output-path {}\n", fixture.case().join("bin").display());
    assert_eq!(output.stdout, expected);
}

#[tokio::test]
async fn test_prompt_always_force_kills_at_the_end() {
    let fixture = Fixture::new("echo done\n");
    let terminator = Arc::new(CountingTerminator::default());
    let harness = Harness::with_terminator(fixture.config(), terminator.clone());

    let output = harness
        .run_prompt_with_answers(fixture.case(), NO_ARGS, PromptOptions::answers(["unused\n"]))
        .await
        .unwrap();

    assert_eq!(output.stdout, "done\n");
    assert_eq!(terminator.kills.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_prompt_timeout_marks_output() {
    let fixture = Fixture::new("printf 'Waiting'\nsleep 30\n");
    let harness = Harness::new(
        fixture
            .config()
            .with_timeout(Some(Duration::from_millis(500))),
    );

    let started = Instant::now();
    let output = harness
        .run_prompt_with_answers(fixture.case(), NO_ARGS, PromptOptions::answers(["ignored\n"]))
        .await
        .unwrap();

    assert!(output.timed_out);
    assert_eq!(output.stdout, "Waiting");
    assert!(started.elapsed() < Duration::from_secs(10));
}
