// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.bodega/config.toml` and includes:
//! - defaults for new tickets (type, priority, assignee)
//! - `id_prefix`: the prefix for generated ticket IDs (e.g., "bg" → "bg-a1b2c3")
//! - git integration: the isolated storage branch, auto-commit, and the
//!   conflict resolution strategy for sync/push
//!
//! The core consumes the resolved [`Config`] value object; layered
//! precedence (global config, environment overrides) lives in the CLI
//! layer, not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::id::DEFAULT_PREFIX;
use crate::ticket::TicketType;

/// Name of the repository-local storage directory.
pub const BODEGA_DIR_NAME: &str = ".bodega";
/// Name of the config file inside the storage directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Name of the nested worktree directory in branch-isolated mode.
pub const WORKTREE_DIR_NAME: &str = "worktree";
/// File extension of ticket files.
pub const TICKET_EXT: &str = "md";

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# Bodega configuration

# Default values for new tickets
[defaults]
type = \"task\"
priority = 2
# assignee = \"\"  # Empty = use git user.name

# ID prefix for generated ticket IDs; derived from the project folder
# name when unset.
# id_prefix = \"bg\"

# Git integration (optional)
# [git]
# Branch name for worktree-based ticket storage. Leave unset to store
# tickets in the current branch.
# branch = \"bodega\"
# Auto-commit ticket changes to the storage branch (worktree mode only).
# auto_commit = true
# Conflict resolution strategy: theirs, ours, manual
# sync_strategy = \"theirs\"
";

/// Named policy selecting which side wins during an automatic merge or
/// rebase, or whether to abort instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// Storage-branch content wins on conflict.
    #[default]
    Theirs,
    /// Main-branch (or remote, for push) content wins on conflict.
    Ours,
    /// Any conflict aborts for manual resolution.
    Manual,
}

impl SyncStrategy {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStrategy::Theirs => "theirs",
            SyncStrategy::Ours => "ours",
            SyncStrategy::Manual => "manual",
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "theirs" => Ok(SyncStrategy::Theirs),
            "ours" => Ok(SyncStrategy::Ours),
            "manual" => Ok(SyncStrategy::Manual),
            _ => Err(Error::InvalidStrategy(s.to_string())),
        }
    }
}

/// Resolved bodega configuration, threaded explicitly into the store and
/// the replication engines. No global mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the `.bodega` directory.
    pub bodega_dir: PathBuf,
    /// Prefix for generated ticket IDs.
    pub id_prefix: String,
    /// Default type for new tickets.
    pub default_type: TicketType,
    /// Default priority for new tickets.
    pub default_priority: u8,
    /// Default assignee for new tickets; empty = use git user.name.
    pub default_assignee: String,
    /// Isolated storage branch name; empty = store tickets in the
    /// current branch (direct mode).
    pub branch: String,
    /// Auto-commit ticket changes to the storage branch (worktree mode
    /// only).
    pub auto_commit: bool,
    /// Conflict resolution strategy for sync and push.
    pub strategy: SyncStrategy,
}

/// On-disk shape of `.bodega/config.toml`. Raw strings are parsed into
/// the closed enums here, at the single parsing boundary.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    id_prefix: Option<String>,
    #[serde(default)]
    defaults: DefaultsSection,
    #[serde(default)]
    git: GitSection,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultsSection {
    #[serde(rename = "type")]
    ticket_type: Option<String>,
    priority: Option<u8>,
    assignee: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GitSection {
    branch: Option<String>,
    auto_commit: Option<bool>,
    sync_strategy: Option<String>,
}

impl Config {
    /// Loads the configuration for a `.bodega` directory. A missing
    /// config file yields the built-in defaults.
    pub fn load(bodega_dir: &Path) -> Result<Config> {
        let path = bodega_dir.join(CONFIG_FILE_NAME);
        let file: FileConfig = if path.exists() {
            toml::from_str(&fs::read_to_string(&path)?)?
        } else {
            FileConfig::default()
        };

        let id_prefix = match file.id_prefix {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => derive_id_prefix(bodega_dir),
        };
        let default_type = match file.defaults.ticket_type {
            Some(raw) => raw.parse::<TicketType>()?,
            None => TicketType::Task,
        };
        let strategy = match file.git.sync_strategy {
            Some(raw) => raw.parse::<SyncStrategy>()?,
            None => SyncStrategy::default(),
        };

        Ok(Config {
            bodega_dir: bodega_dir.to_path_buf(),
            id_prefix,
            default_type,
            default_priority: file.defaults.priority.unwrap_or(2),
            default_assignee: file.defaults.assignee.unwrap_or_default(),
            branch: file.git.branch.unwrap_or_default(),
            auto_commit: file.git.auto_commit.unwrap_or(false),
            strategy,
        })
    }

    /// True when tickets live on an isolated storage branch reached
    /// through the nested worktree.
    pub fn uses_worktree(&self) -> bool {
        !self.branch.is_empty()
    }

    /// Directory holding the ticket files for the active mode.
    pub fn tickets_dir(&self) -> PathBuf {
        if self.uses_worktree() {
            self.bodega_dir.join(WORKTREE_DIR_NAME).join(BODEGA_DIR_NAME)
        } else {
            self.bodega_dir.clone()
        }
    }

    /// Root of the nested worktree, when branch-isolated.
    pub fn worktree_path(&self) -> Option<PathBuf> {
        self.uses_worktree()
            .then(|| self.bodega_dir.join(WORKTREE_DIR_NAME))
    }
}

/// Derive an id prefix from the project folder name: lowercase
/// alphanumeric only, falling back to [`DEFAULT_PREFIX`] when empty or
/// starting with a digit.
fn derive_id_prefix(bodega_dir: &Path) -> String {
    let project_name = bodega_dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let prefix: String = project_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    match prefix.chars().next() {
        Some(c) if c.is_ascii_digit() => DEFAULT_PREFIX.to_string(),
        Some(_) => prefix,
        None => DEFAULT_PREFIX.to_string(),
    }
}

/// Writes the commented default config template.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
    Ok(())
}

/// Finds the `.bodega` directory by searching upward from `start`,
/// similar to how git finds `.git`.
pub fn find_bodega_dir(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(BODEGA_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
