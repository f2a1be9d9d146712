// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed ticket storage.
//!
//! Each ticket is one file in the storage directory; the store is the
//! sole source of truth. Mutations are serialized per ticket with an
//! advisory lock on a sibling lock file; there is no process-wide lock.
//! In branch-isolated mode with auto-commit enabled, every mutation is
//! also committed on the storage branch.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use fs2::FileExt;

use crate::codec;
use crate::config::{Config, BODEGA_DIR_NAME, CONFIG_FILE_NAME, TICKET_EXT};
use crate::error::{Error, Result};
use crate::git::{GitRunner, SystemGit};
use crate::id::{generate_id, resolve_id};
use crate::ticket::{Ticket, TicketStatus, TicketType};
use crate::worktree::{auto_commit_ticket, CommitOp};

/// Hard ceiling on waiting for a per-ticket lock.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
/// Pause between lock acquisition attempts.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Initializes a new bodega repository: creates `.bodega/` with the
/// default config template.
pub fn init_repository(base: &Path, force: bool) -> Result<PathBuf> {
    let bodega_dir = base.join(BODEGA_DIR_NAME);
    if bodega_dir.exists() && !force {
        return Err(Error::AlreadyInitialized(
            bodega_dir.display().to_string(),
        ));
    }
    fs::create_dir_all(&bodega_dir)?;
    crate::config::write_default_config(&bodega_dir.join(CONFIG_FILE_NAME))?;
    Ok(bodega_dir)
}

/// Filters for [`TicketStore::query`]. Unset fields match everything;
/// closed tickets are excluded unless `include_closed` is set, regardless
/// of the status filter.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub ticket_type: Option<TicketType>,
    pub tag: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<u8>,
    pub include_closed: bool,
}

impl TicketFilter {
    fn matches(&self, ticket: &Ticket) -> bool {
        if !self.include_closed && ticket.is_closed() {
            return false;
        }
        if let Some(status) = self.status {
            if ticket.status != status {
                return false;
            }
        }
        if let Some(ticket_type) = self.ticket_type {
            if ticket.ticket_type != ticket_type {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !ticket.tags.contains(tag) {
                return false;
            }
        }
        if let Some(assignee) = &self.assignee {
            if ticket.assignee.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if ticket.priority != priority {
                return false;
            }
        }
        true
    }
}

/// Handles reading and writing tickets to the filesystem.
pub struct TicketStore {
    tickets_dir: PathBuf,
    worktree_path: Option<PathBuf>,
    auto_commit: bool,
    id_prefix: String,
    git: Box<dyn GitRunner>,
}

impl TicketStore {
    /// Creates a store for the given configuration, invoking the system
    /// git for auto-commits.
    pub fn new(config: &Config) -> Self {
        Self::with_git(config, Box::new(SystemGit))
    }

    /// Creates a store with an injected git runner.
    pub fn with_git(config: &Config, git: Box<dyn GitRunner>) -> Self {
        TicketStore {
            tickets_dir: config.tickets_dir(),
            worktree_path: config.worktree_path(),
            auto_commit: config.auto_commit,
            id_prefix: config.id_prefix.clone(),
            git,
        }
    }

    /// Directory holding the ticket files.
    pub fn tickets_dir(&self) -> &Path {
        &self.tickets_dir
    }

    fn ticket_path(&self, ticket_id: &str) -> PathBuf {
        self.tickets_dir
            .join(format!("{}.{}", ticket_id, TICKET_EXT))
    }

    /// Creates a new ticket. Generates an id when blank; an existing file
    /// for the target id is [`Error::TicketExists`].
    pub fn create(&self, mut ticket: Ticket) -> Result<Ticket> {
        if ticket.id.is_empty() {
            ticket.id = generate_id(&self.id_prefix, &ticket.title, &ticket.created);
        }
        ticket.validate()?;

        let path = self.ticket_path(&ticket.id);
        if path.exists() {
            return Err(Error::TicketExists(ticket.id));
        }

        ticket.updated = Utc::now();
        self.write_locked(&path, &ticket)?;
        tracing::debug!(id = %ticket.id, "created ticket");
        self.maybe_auto_commit(&path, CommitOp::Create, &ticket.id, Some(&ticket.title))?;
        Ok(ticket)
    }

    /// Saves an existing ticket, bumping `updated`.
    pub fn save(&self, ticket: &mut Ticket) -> Result<PathBuf> {
        self.save_with_op(ticket, CommitOp::Update)
    }

    /// Saves with a specific auto-commit operation (e.g. `Close`).
    pub(crate) fn save_with_op(&self, ticket: &mut Ticket, op: CommitOp) -> Result<PathBuf> {
        ticket.updated = Utc::now();
        self.write_ticket(ticket, op)
    }

    /// Saves without touching `updated`. Only used for deterministic
    /// fixtures.
    pub fn save_preserving_updated(&self, ticket: &Ticket) -> Result<PathBuf> {
        self.write_ticket(ticket, CommitOp::Update)
    }

    fn write_ticket(&self, ticket: &Ticket, op: CommitOp) -> Result<PathBuf> {
        if ticket.id.is_empty() {
            return Err(Error::Storage(
                "cannot save a ticket without an id".to_string(),
            ));
        }
        ticket.validate()?;

        let path = self.ticket_path(&ticket.id);
        self.write_locked(&path, ticket)?;
        self.maybe_auto_commit(&path, op, &ticket.id, None)?;
        Ok(path)
    }

    fn write_locked(&self, path: &Path, ticket: &Ticket) -> Result<()> {
        let content = codec::serialize(ticket)?;
        let _lock = FileLock::acquire(path, LOCK_TIMEOUT)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Gets a ticket by full or partial id.
    pub fn get(&self, id_or_prefix: &str) -> Result<Ticket> {
        let full_id = resolve_id(id_or_prefix, &self.list_ids()?)?;
        let path = self.ticket_path(&full_id);
        let content = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::TicketNotFound(full_id.clone())
            } else {
                Error::Io(err)
            }
        })?;
        codec::parse(&content)
    }

    /// Deletes a ticket by full or partial id. No tombstone is kept.
    pub fn delete(&self, id_or_prefix: &str) -> Result<()> {
        let full_id = resolve_id(id_or_prefix, &self.list_ids()?)?;
        let path = self.ticket_path(&full_id);
        fs::remove_file(&path)?;
        tracing::debug!(id = %full_id, "deleted ticket");
        self.maybe_auto_commit(&path, CommitOp::Delete, &full_id, None)?;
        Ok(())
    }

    /// All ticket ids in the storage directory, sorted.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.tickets_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::Io(err)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TICKET_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// All tickets, sorted by id.
    pub fn list_all(&self) -> Result<Vec<Ticket>> {
        let mut tickets = Vec::new();
        for id in self.list_ids()? {
            let content = fs::read_to_string(self.ticket_path(&id))?;
            tickets.push(codec::parse(&content)?);
        }
        Ok(tickets)
    }

    /// Filters tickets. Closed tickets are excluded unless the filter
    /// says otherwise.
    pub fn query(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|ticket| filter.matches(ticket))
            .collect())
    }

    fn maybe_auto_commit(
        &self,
        path: &Path,
        op: CommitOp,
        ticket_id: &str,
        title: Option<&str>,
    ) -> Result<()> {
        if !self.auto_commit {
            return Ok(());
        }
        let Some(worktree_path) = &self.worktree_path else {
            return Ok(());
        };
        auto_commit_ticket(self.git.as_ref(), worktree_path, path, op, ticket_id, title)?;
        Ok(())
    }
}

/// Exclusive advisory lock on a sibling `.lock` file, released (and the
/// lock file removed) on drop, on every exit path.
#[derive(Debug)]
struct FileLock {
    file: fs::File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(ticket_path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = ticket_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_path = ticket_path.with_extension("lock");
        let deadline = Instant::now() + timeout;

        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)?;
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file, lock_path }),
                Err(_) if Instant::now() < deadline => {
                    tracing::debug!(path = %lock_path.display(), "lock contended, retrying");
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(_) => {
                    return Err(Error::LockTimeout {
                        path: ticket_path.to_path_buf(),
                    })
                }
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
