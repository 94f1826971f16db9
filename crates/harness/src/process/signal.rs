// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Completion signals for watch-mode processes.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

/// Version banner the tool prints when a compilation finishes.
pub const VERSION_BANNER_PATTERN: &str = r"webpack \d+\.\d+\.\d";

static VERSION_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(VERSION_BANNER_PATTERN).expect("version banner pattern is invalid")
});

/// Output that, once seen, means the watched process should be stopped.
#[derive(Clone, Debug)]
pub enum CompletionSignal {
    /// Plain substring
    Literal(String),
    /// Regular expression
    Pattern(Regex),
}

impl CompletionSignal {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Compile `pattern` as a regular expression.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// The default: a `webpack X.Y.Z` banner.
    pub fn version_banner() -> Self {
        Self::Pattern(VERSION_BANNER.clone())
    }

    /// Whether `output` contains the signal.
    pub fn matches(&self, output: &str) -> bool {
        match self {
            Self::Literal(text) => output.contains(text.as_str()),
            Self::Pattern(regex) => regex.is_match(output),
        }
    }
}

/// Earlier output kept so a signal split across two reads still matches.
const CARRY_BYTES: usize = 1024;

/// Checks raw stdout chunks against a [`CompletionSignal`].
#[derive(Clone, Debug)]
pub struct SignalScanner {
    signal: CompletionSignal,
    tail: Vec<u8>,
}

impl SignalScanner {
    pub fn new(signal: CompletionSignal) -> Self {
        Self {
            signal,
            tail: Vec::new(),
        }
    }

    pub fn signal(&self) -> &CompletionSignal {
        &self.signal
    }

    /// Whether the signal appears in `chunk` joined to the carried tail.
    /// Output that matched is not carried forward.
    pub fn scan(&mut self, chunk: &[u8]) -> bool {
        self.tail.extend_from_slice(chunk);
        let found = self.signal.matches(&String::from_utf8_lossy(&self.tail));
        if found {
            self.tail.clear();
        } else if self.tail.len() > CARRY_BYTES {
            self.tail.drain(..self.tail.len() - CARRY_BYTES);
        }
        found
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::version_banner()
    }
}

impl std::fmt::Display for CompletionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "{text:?}"),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
