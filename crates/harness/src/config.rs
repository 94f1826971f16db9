// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Harness configuration.
//!
//! Loaded from an optional TOML file and resolved with the chain
//! explicit setter > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{HarnessError, Result};
use crate::ToolVersions;

/// Quiet period / answer interval used when nothing is configured.
pub const DEFAULT_DELAY_MS: u64 = 2000;

/// Directory name passed with `--output-path` for watch processes.
pub const DEFAULT_OUTPUT_DIR: &str = "bin";

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

/// Everything the harness needs to know about the tool and its timing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Tool executable
    #[serde(default)]
    pub tool: Option<PathBuf>,

    /// Arguments placed before the per-call arguments (e.g. a script path
    /// when `tool` is an interpreter)
    #[serde(default)]
    pub tool_args: Vec<String>,

    /// Installed tool versions, used for snapshot suffixes
    #[serde(default)]
    pub versions: Option<ToolVersions>,

    /// Pass child output through to our own stdio instead of capturing it
    #[serde(default)]
    pub inherit_output: bool,

    /// Silence on stdout required before the next answer is sent
    #[serde(default = "default_delay_ms")]
    pub quiet_period_ms: u64,

    /// Delay between answers when not waiting for output
    #[serde(default = "default_delay_ms")]
    pub answer_interval_ms: u64,

    /// Upper bound on any single invocation (default: unbounded)
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Output directory name, relative to the test case
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tool: None,
            tool_args: Vec::new(),
            versions: None,
            inherit_output: false,
            quiet_period_ms: DEFAULT_DELAY_MS,
            answer_interval_ms: DEFAULT_DELAY_MS,
            timeout_ms: None,
            output_dir: default_output_dir(),
        }
    }
}

impl HarnessConfig {
    /// Config for `tool` with default timing.
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: Some(tool.into()),
            ..Self::default()
        }
    }

    /// Parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Resolve from an optional explicit file, `CLI_HARNESS_CONFIG`, and the
    /// remaining `CLI_HARNESS_*` variables.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let file = explicit.map(Path::to_path_buf).or_else(env::config_path);
        let config = match file {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Overlay values set in the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(tool) = env::tool() {
            self.tool = Some(tool);
        }
        if env::enable_pipe() {
            self.inherit_output = true;
        }
        if let Some(build) = env::build_tool_version() {
            let dev_server = env::dev_server_version()
                .or_else(|| self.versions.as_ref().and_then(|v| v.dev_server.clone()));
            self.versions = Some(ToolVersions {
                build_tool: build,
                dev_server,
            });
        } else if let (Some(versions), Some(dev)) =
            (self.versions.as_mut(), env::dev_server_version())
        {
            versions.dev_server = Some(dev);
        }
        self
    }

    /// Set leading tool arguments
    pub fn with_tool_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tool_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set tool versions
    pub fn with_versions(mut self, versions: ToolVersions) -> Self {
        self.versions = Some(versions);
        self
    }

    /// Set output inheritance
    pub fn with_inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }

    /// Set quiet period
    pub fn with_quiet_period(mut self, period: Duration) -> Self {
        self.quiet_period_ms = duration_ms(period);
        self
    }

    /// Set answer interval
    pub fn with_answer_interval(mut self, interval: Duration) -> Self {
        self.answer_interval_ms = duration_ms(interval);
        self
    }

    /// Set invocation timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_ms = timeout.map(duration_ms);
        self
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn answer_interval(&self) -> Duration {
        Duration::from_millis(self.answer_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
