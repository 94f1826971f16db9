// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot path resolution for cli-harness tests.
//!
//! Snapshots live in a `__snapshots__` directory next to the test file and
//! carry a suffix naming the major versions of the tools they were recorded
//! against, so snapshots from different tool versions never collide.

mod path;
mod versions;

pub use path::{SnapshotError, SnapshotResolver, CONSISTENCY_CHECK_TEST_PATH, SNAPSHOT_DIR};
pub use versions::ToolVersions;
