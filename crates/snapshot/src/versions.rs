// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Installed tool versions, supplied explicitly by the caller.

use serde::{Deserialize, Serialize};

/// Versions of the build tool and (optionally) its dev server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolVersions {
    /// Full build tool version, e.g. `"5.74.0"`.
    pub build_tool: String,

    /// Full dev server version, e.g. `"4.11.1"`. `None` when not installed.
    #[serde(default)]
    pub dev_server: Option<String>,
}

impl ToolVersions {
    pub fn new(build_tool: impl Into<String>) -> Self {
        Self {
            build_tool: build_tool.into(),
            dev_server: None,
        }
    }

    /// Set the dev server version
    pub fn with_dev_server(mut self, version: impl Into<String>) -> Self {
        self.dev_server = Some(version.into());
        self
    }

    /// Major component of the build tool version.
    pub fn build_tool_major(&self) -> &str {
        major(&self.build_tool)
    }

    /// Major component of the dev server version, if known.
    pub fn dev_server_major(&self) -> Option<&str> {
        self.dev_server.as_deref().map(major)
    }

    /// Whether the build tool's major version is `major`.
    pub fn is_build_tool(&self, major_version: &str) -> bool {
        self.build_tool_major() == major_version
    }

    /// Whether the dev server is installed with major version `major`.
    pub fn is_dev_server(&self, major_version: &str) -> bool {
        self.dev_server_major() == Some(major_version)
    }
}

fn major(version: &str) -> &str {
    let version = version.trim().trim_start_matches('v');
    version.split('.').next().unwrap_or(version)
}

#[cfg(test)]
#[path = "versions_tests.rs"]
mod tests;
