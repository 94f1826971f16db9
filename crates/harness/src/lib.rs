// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess harness for driving a build-tool CLI from tests.
//!
//! Spawns the tool, feeds it arguments and stdin, captures stdout/stderr and
//! tears it down deterministically. See [`Harness`] for the three interaction
//! modes, [`normalize`] for machine-independent output, [`fixture`] for
//! fixture mutation helpers and [`snapshot`] for snapshot path resolution.

pub mod config;
pub mod env;
mod error;
pub mod fixture;
mod harness;
pub mod normalize;
pub mod process;

/// Re-exported snapshot types from the cli-harness-snapshot crate.
pub mod snapshot {
    pub use cli_harness_snapshot::{
        SnapshotError, SnapshotResolver, ToolVersions, CONSISTENCY_CHECK_TEST_PATH, SNAPSHOT_DIR,
    };
}

pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use harness::{Harness, PromptOptions, RunOptions, WatchProcessOptions};
pub use process::{
    CompletionSignal, ProcessHandle, ProcessStatus, PromptOutput, RunOutput, Terminate,
};
pub use snapshot::ToolVersions;
