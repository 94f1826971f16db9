// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All environment variables read by the harness are defined here.
//! Use these accessors instead of calling `std::env::var()` directly.

/// Generated env var name constants.
mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

pub use names::*;

use std::path::PathBuf;

/// `CLI_HARNESS_ENABLE_PIPE` — Pass child output straight through to the
/// test runner's own stdout/stderr instead of capturing it.
pub fn enable_pipe() -> bool {
    var_flag(names::CLI_HARNESS_ENABLE_PIPE)
}

/// `CLI_HARNESS_TOOL` — Path to the tool executable under test.
pub fn tool() -> Option<PathBuf> {
    var_non_empty(names::CLI_HARNESS_TOOL).map(PathBuf::from)
}

/// `CLI_HARNESS_CONFIG` — Path to a TOML harness config file.
pub fn config_path() -> Option<PathBuf> {
    var_non_empty(names::CLI_HARNESS_CONFIG).map(PathBuf::from)
}

/// `CLI_HARNESS_BUILD_TOOL_VERSION` — Installed build tool version.
pub fn build_tool_version() -> Option<String> {
    var_non_empty(names::CLI_HARNESS_BUILD_TOOL_VERSION)
}

/// `CLI_HARNESS_DEV_SERVER_VERSION` — Installed dev server version.
pub fn dev_server_version() -> Option<String> {
    var_non_empty(names::CLI_HARNESS_DEV_SERVER_VERSION)
}

fn var_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn var_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| parse_flag(&v))
}

/// Interpret a boolean-like env value. Unset, empty, `0` and `false` are off.
pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
