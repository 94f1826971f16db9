// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test path <-> snapshot path mapping.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::versions::ToolVersions;

/// Directory that holds snapshots, sibling to the test file.
pub const SNAPSHOT_DIR: &str = "__snapshots__";

/// Test path used by snapshot runners to validate a resolver.
pub const CONSISTENCY_CHECK_TEST_PATH: &str = "consistency_check/__tests__/example.test.js";

/// Marker in a test path that selects the dev server suffix.
const SERVE_MARKER: &str = "serve";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("no file name in path: {0}")]
    NoFileName(PathBuf),

    #[error("'{0}' is a serve test but no dev server version is configured")]
    MissingDevServerVersion(PathBuf),

    #[error("'{0}' does not end with a known snapshot extension")]
    UnrecognizedSuffix(PathBuf),

    #[error("'{0}' is not inside a {SNAPSHOT_DIR} directory")]
    NotInSnapshotDir(PathBuf),
}

/// Maps test files to versioned snapshot files and back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotResolver {
    extension: String,
    serve_extension: Option<String>,
}

impl SnapshotResolver {
    pub fn new(versions: &ToolVersions) -> Self {
        let build = versions.build_tool_major();
        Self {
            extension: format!(".snap.webpack{build}"),
            serve_extension: versions
                .dev_server_major()
                .map(|dev| format!(".snap.devServer{dev}.webpack{build}")),
        }
    }

    /// Extension appended to non-serve snapshots.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Extension appended to serve snapshots, if a dev server version is known.
    pub fn serve_extension(&self) -> Option<&str> {
        self.serve_extension.as_deref()
    }

    /// `dir/name.test.js` -> `dir/__snapshots__/name.test.js<extension>`.
    pub fn resolve_snapshot_path(&self, test_path: &Path) -> Result<PathBuf, SnapshotError> {
        let name = file_name(test_path)?;

        let extension = if test_path.to_string_lossy().contains(SERVE_MARKER) {
            self.serve_extension
                .as_deref()
                .ok_or_else(|| SnapshotError::MissingDevServerVersion(test_path.to_path_buf()))?
        } else {
            self.extension.as_str()
        };

        let dir = test_path.parent().unwrap_or_else(|| Path::new(""));
        Ok(dir.join(SNAPSHOT_DIR).join(format!("{name}{extension}")))
    }

    /// Inverse of [`resolve_snapshot_path`](Self::resolve_snapshot_path).
    pub fn resolve_test_path(&self, snapshot_path: &Path) -> Result<PathBuf, SnapshotError> {
        let name = file_name(snapshot_path)?;

        let stripped = self
            .serve_extension
            .as_deref()
            .and_then(|ext| name.strip_suffix(ext))
            .or_else(|| name.strip_suffix(self.extension.as_str()))
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| SnapshotError::UnrecognizedSuffix(snapshot_path.to_path_buf()))?;

        let snapshot_dir = snapshot_path
            .parent()
            .filter(|dir| dir.file_name() == Some(OsStr::new(SNAPSHOT_DIR)))
            .ok_or_else(|| SnapshotError::NotInSnapshotDir(snapshot_path.to_path_buf()))?;

        let dir = snapshot_dir.parent().unwrap_or_else(|| Path::new(""));
        Ok(dir.join(stripped))
    }
}

fn file_name(path: &Path) -> Result<String, SnapshotError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| SnapshotError::NoFileName(path.to_path_buf()))
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
