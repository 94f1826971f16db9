// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted stdin answers.

/// Answers handed to a prompting process, strictly in order.
///
/// A queue with nothing in it, whether `None` or an empty list, puts the
/// dialogue in echo-and-kill mode: the last output is written back and the
/// process is terminated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnswerQueue {
    answers: Option<Vec<String>>,
    cursor: usize,
}

impl AnswerQueue {
    pub fn new(answers: Option<Vec<String>>) -> Self {
        Self { answers, cursor: 0 }
    }

    /// Whether at least one answer was supplied.
    pub fn is_scripted(&self) -> bool {
        self.answers.as_ref().is_some_and(|a| !a.is_empty())
    }

    /// Take the next answer. Each answer is handed out once.
    pub fn advance(&mut self) -> Option<&str> {
        let answer = self.answers.as_ref()?.get(self.cursor)?;
        self.cursor += 1;
        Some(answer.as_str())
    }

    /// Answers handed out so far.
    pub fn sent(&self) -> usize {
        self.cursor
    }

    /// Answers still queued.
    pub fn remaining(&self) -> usize {
        self.answers
            .as_ref()
            .map_or(0, |a| a.len().saturating_sub(self.cursor))
    }
}

impl<S: Into<String>> FromIterator<S> for AnswerQueue {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(Some(iter.into_iter().map(Into::into).collect()))
    }
}

#[cfg(test)]
#[path = "answers_tests.rs"]
mod tests;
