// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

/// All possible errors that can occur in the bd-core library.
///
/// Errors provide user-friendly messages with hints for common issues.
/// The library never terminates the process; every failure surfaces as a
/// variant here and is left to the caller to render.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not in a bodega repository\n  hint: run 'bodega init' first")]
    NotInitialized,

    #[error("bodega repository already exists at {0}")]
    AlreadyInitialized(String),

    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error("ticket already exists: {0}")]
    TicketExists(String),

    #[error("ambiguous ticket ID '{prefix}' matches: {}", matches.join(", "))]
    AmbiguousId {
        prefix: String,
        matches: Vec<String>,
    },

    #[error("would create a dependency cycle\n  hint: this would create a circular dependency chain")]
    CycleDetected,

    #[error("ticket cannot depend on or link to itself")]
    SelfDependency,

    #[error("invalid ticket type: '{0}'\n  hint: valid types are: bug, feature, task, epic, chore")]
    InvalidTicketType(String),

    #[error("invalid status: '{0}'\n  hint: valid statuses are: open, in-progress, closed")]
    InvalidStatus(String),

    #[error("invalid sync strategy: '{0}'\n  hint: valid strategies are: theirs, ours, manual")]
    InvalidStrategy(String),

    #[error("invalid priority: {0}\n  hint: priority must be 0-4")]
    InvalidPriority(u8),

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("invalid ticket ID: '{0}'\n  hint: IDs look like 'bg-a1b2c3'")]
    InvalidId(String),

    #[error("malformed ticket file: {0}")]
    MalformedTicket(String),

    #[error("not currently on a branch (detached HEAD state)")]
    DetachedHead,

    #[error("could not acquire lock on {}", path.display())]
    LockTimeout { path: PathBuf },

    #[error("{command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("ticket header error: {0}")]
    Header(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
