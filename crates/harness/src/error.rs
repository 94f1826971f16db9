// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Harness error taxonomy.
//!
//! A non-zero exit or a signal death is never an error; those come back as
//! data in [`RunOutput`](crate::RunOutput). Errors are reserved for failures
//! of the harness itself and for violated fixture preconditions.

use std::path::PathBuf;

use cli_harness_snapshot::SnapshotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Oops! {} does not exist!", path.display())]
    MissingFixture { path: PathBuf },

    #[error("install in '{}' failed (code: {code:?}): {stderr}", cwd.display())]
    InstallFailed {
        cwd: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("invalid completion pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("no tool executable configured (set CLI_HARNESS_TOOL or `tool` in the config file)")]
    MissingTool,

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
