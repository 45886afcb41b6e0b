// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # switchyard-observability
//!
//! Logging setup shared by the switchyard binaries.
//!
//! Provides consistent logging across all switchyard crates with per-crate
//! debug flag support (`--debug-switchyard-devices`, `SWITCHYARD_DEBUG=all`)
//! and optional JSON log files in a timestamped run folder.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known switchyard crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "switchyard",
    "switchyard-transports",
    "switchyard-devices",
    "switchyard-config",
    "switchyard-observability",
];
