// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cli-harness entry point: run the tool under a harness mode by hand and
//! print the result as JSON.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use cli_harness::normalize::{normalize_stderr, normalize_stdout, NormalizeContext};
use cli_harness::{CompletionSignal, Harness, HarnessConfig, PromptOptions, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "cli-harness", about = "Drive a build-tool CLI the way its tests do")]
struct Cli {
    /// Harness config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tool executable (overrides config and CLI_HARNESS_TOOL)
    #[arg(long, global = true)]
    tool: Option<PathBuf>,

    /// Kill the tool if it runs longer than this
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Normalize captured output before printing
    #[arg(long, global = true)]
    normalize: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run to completion and capture output
    Run {
        /// Test case directory (working directory for the tool)
        case: PathBuf,

        /// Arguments for the tool
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Run until stdout shows a completion pattern, then stop the tool
    Watch {
        case: PathBuf,

        /// Completion pattern (default: the version banner)
        #[arg(long)]
        kill_pattern: Option<String>,

        /// Treat --kill-pattern as plain text
        #[arg(long, requires = "kill_pattern")]
        literal: bool,

        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Answer an interactive prompt. Without --answer the last output is
    /// echoed back and the tool terminated.
    Prompt {
        case: PathBuf,

        /// Answer to send, verbatim (repeatable, in order)
        #[arg(long = "answer")]
        answers: Vec<String>,

        /// Send answers on a fixed interval instead of after quiet periods
        #[arg(long)]
        fixed_interval: bool,

        /// Append --output-path <case>/bin
        #[arg(long)]
        output_path: bool,

        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the snapshot path for a test file
    SnapshotPath { test_path: PathBuf },

    /// Print the test file for a snapshot path
    TestPath { snapshot_path: PathBuf },

    /// Normalize text read from stdin
    Normalize {
        #[arg(long, value_enum, default_value_t = Stream::Stderr)]
        stream: Stream,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Stream {
    Stdout,
    Stderr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = HarnessConfig::resolve(cli.config.as_deref())?;
    if let Some(tool) = cli.tool {
        config.tool = Some(tool);
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout_ms = Some(ms);
    }
    let harness = Harness::new(config);
    let normalize = cli.normalize;

    let exit_code = match cli.command {
        Commands::Run { case, args } => {
            let mut output = harness.run(&case, &args, &RunOptions::default()).await?;
            if normalize {
                output.stdout = normalize_stdout(&output.stdout);
                output.stderr = normalize_stderr(&output.stderr, &NormalizeContext::detect());
            }
            print_json(&output)?;
            output.exit_code().unwrap_or(1)
        }
        Commands::Watch {
            case,
            kill_pattern,
            literal,
            args,
        } => {
            let signal = match kill_pattern {
                Some(text) if literal => Some(CompletionSignal::literal(text)),
                Some(pattern) => Some(CompletionSignal::pattern(&pattern)?),
                None => None,
            };
            let mut output = harness
                .run_watch(&case, &args, &RunOptions::default(), signal)
                .await?;
            if normalize {
                output.stdout = normalize_stdout(&output.stdout);
                output.stderr = normalize_stderr(&output.stderr, &NormalizeContext::detect());
            }
            print_json(&output)?;
            0
        }
        Commands::Prompt {
            case,
            answers,
            fixed_interval,
            output_path,
            args,
        } => {
            let options = PromptOptions::answers(answers)
                .with_wait_for_output(!fixed_interval)
                .with_output_path(output_path);
            let mut output = harness.run_prompt_with_answers(&case, &args, options).await?;
            if normalize {
                output.stdout = normalize_stdout(&output.stdout);
                output.stderr = normalize_stderr(&output.stderr, &NormalizeContext::detect());
            }
            print_json(&output)?;
            0
        }
        Commands::SnapshotPath { test_path } => {
            let resolver = harness
                .snapshot_resolver()
                .context("no tool versions configured (set CLI_HARNESS_BUILD_TOOL_VERSION)")?;
            print_path(&resolver.resolve_snapshot_path(&test_path)?);
            0
        }
        Commands::TestPath { snapshot_path } => {
            let resolver = harness
                .snapshot_resolver()
                .context("no tool versions configured (set CLI_HARNESS_BUILD_TOOL_VERSION)")?;
            print_path(&resolver.resolve_test_path(&snapshot_path)?);
            0
        }
        Commands::Normalize { stream } => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            let output = match stream {
                Stream::Stdout => normalize_stdout(&input),
                Stream::Stderr => normalize_stderr(&input, &NormalizeContext::detect()),
            };
            print!("{output}");
            0
        }
    };

    std::process::exit(exit_code);
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_path(path: &Path) {
    println!("{}", path.display());
}
