// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Build scripts are expected to panic on failure.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io::Write;

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let path = std::path::Path::new(&out_dir).join("env_names.rs");
    let mut f = std::fs::File::create(path).unwrap();

    let vars = [
        ("CLI_HARNESS_ENABLE_PIPE", "CLI_HARNESS_ENABLE_PIPE"),
        ("CLI_HARNESS_TOOL", "CLI_HARNESS_TOOL"),
        ("CLI_HARNESS_CONFIG", "CLI_HARNESS_CONFIG"),
        (
            "CLI_HARNESS_BUILD_TOOL_VERSION",
            "CLI_HARNESS_BUILD_TOOL_VERSION",
        ),
        (
            "CLI_HARNESS_DEV_SERVER_VERSION",
            "CLI_HARNESS_DEV_SERVER_VERSION",
        ),
    ];

    for (const_name, env_name) in vars {
        writeln!(f, "pub const {const_name}: &str = \"{env_name}\";").unwrap();
    }
}
