// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem helpers for preparing and mutating test fixtures.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{HarnessError, Result};

/// Append `data` to `<test_case>/<file>`. The file must already exist.
pub fn append_data_if_file_exists(test_case: &Path, file: &str, data: &[u8]) -> Result<()> {
    let path = test_case.join(file);
    if !path.is_file() {
        return Err(HarnessError::MissingFixture { path });
    }

    let mut handle = std::fs::OpenOptions::new().append(true).open(&path)?;
    handle.write_all(data)?;
    Ok(())
}

/// Copy `<test_case>/<file>` to `<test_case>/<stem>_copy<.ext>` and return the
/// new path.
pub fn copy_file(test_case: &Path, file: &str) -> Result<PathBuf> {
    let source = test_case.join(file);
    if !source.is_file() {
        return Err(HarnessError::MissingFixture { path: source });
    }

    let file = Path::new(file);
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let copy_name = match file.extension() {
        Some(ext) => format!("{stem}_copy.{}", ext.to_string_lossy()),
        None => format!("{stem}_copy"),
    };

    let target = test_case.join(copy_name);
    std::fs::copy(&source, &target)?;
    Ok(target)
}

/// Create `path` unless it already exists.
pub fn mkdir(path: &Path) -> Result<PathBuf> {
    match std::fs::create_dir(path) {
        Ok(()) => Ok(path.to_path_buf()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(path.to_path_buf()),
        Err(e) => Err(e.into()),
    }
}

/// Create a fresh directory under `assets`, named by the current timestamp
/// in milliseconds. A name already taken moves on to the next millisecond.
pub fn unique_directory_for_test(assets: &Path) -> Result<PathBuf> {
    let mut stamp = chrono::Utc::now().timestamp_millis();
    loop {
        let candidate = assets.join(stamp.to_string());
        match std::fs::create_dir(&candidate) {
            Ok(()) => {
                debug!(dir = %candidate.display(), "created test directory");
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

pub async fn read_file(path: &Path) -> Result<Vec<u8>> {
    Ok(tokio::fs::read(path).await?)
}

/// File names in `path`, sorted.
pub async fn read_dir(path: &Path) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// `foo-bar-baz` -> `fooBarBaz`. Only a hyphen followed by a lowercase ASCII
/// letter is folded.
pub fn hyphen_to_upper_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('-', Some(next)) if next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Install fixture dependencies by running `program` in `cwd`.
///
/// Unlike the harness modes, a failing installer is an error.
pub async fn run_install(cwd: &Path, program: &str) -> Result<()> {
    debug!(program, cwd = %cwd.display(), "installing fixture dependencies");
    let output = Command::new(program)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| HarnessError::Spawn {
            program: PathBuf::from(program),
            source,
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(HarnessError::InstallFailed {
            cwd: cwd.to_path_buf(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
#[path = "fixture_tests.rs"]
mod tests;
