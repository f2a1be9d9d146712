// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree management for branch-isolated ticket storage.
//!
//! In branch-isolated mode, tickets live on a dedicated branch checked
//! out into a secondary working tree nested at `.bodega/worktree/`. The
//! nested path is excluded from the main branch via `.bodega/.gitignore`;
//! git prevents deletion of branches with active worktrees, which also
//! protects the storage branch.

use std::fs;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::config::{BODEGA_DIR_NAME, CONFIG_FILE_NAME, TICKET_EXT, WORKTREE_DIR_NAME};
use crate::error::{Error, Result};
use crate::git::{find_repo_root, run_checked, GitRunner};

/// Relative path staged/committed by the batch operations.
const STORAGE_SUBDIR: &str = ".bodega/";

/// The ticket mutation being recorded by an auto-commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOp {
    Create,
    Update,
    Delete,
    Close,
}

impl CommitOp {
    /// Commit message for this operation. The title is only used for
    /// `Create`.
    pub fn message(&self, ticket_id: &str, title: Option<&str>) -> String {
        match (self, title) {
            (CommitOp::Create, Some(title)) => format!("Create ticket {}: {}", ticket_id, title),
            (CommitOp::Create, None) => format!("Create ticket {}", ticket_id),
            (CommitOp::Update, _) => format!("Update ticket {}", ticket_id),
            (CommitOp::Delete, _) => format!("Delete ticket {}", ticket_id),
            (CommitOp::Close, _) => format!("Close ticket {}", ticket_id),
        }
    }
}

/// Gets the current branch name, failing on a detached HEAD.
pub fn get_current_branch(git: &dyn GitRunner, repo_root: &Path) -> Result<String> {
    let stdout = run_checked(git, repo_root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    let branch = stdout.trim().to_string();
    if branch == "HEAD" {
        return Err(Error::DetachedHead);
    }
    Ok(branch)
}

/// Initializes the git worktree for ticket storage.
///
/// Creates the storage branch if needed (from `origin/<branch>` when it
/// only exists remotely, otherwise from the current HEAD), registers the
/// worktree at `.bodega/worktree/`, writes `.bodega/.gitignore`, copies
/// the config file into the worktree storage directory when absent, and
/// commits the initial storage directory on a fresh branch.
///
/// Returns the worktree's ticket directory (`.bodega/worktree/.bodega/`).
pub fn init_worktree(
    git: &dyn GitRunner,
    repo_root: &Path,
    bodega_dir: &Path,
    branch: &str,
) -> Result<PathBuf> {
    let worktree_path = bodega_dir.join(WORKTREE_DIR_NAME);

    fs::create_dir_all(bodega_dir)?;
    fs::write(
        bodega_dir.join(".gitignore"),
        format!("{}/\n", WORKTREE_DIR_NAME),
    )?;

    let exists_locally = git
        .run(repo_root, &["rev-parse", "--verify", branch])?
        .success();
    let remote_ref = format!("origin/{}", branch);
    let exists_remotely = git
        .run(repo_root, &["rev-parse", "--verify", &remote_ref])?
        .success();

    let worktree_str = worktree_path.to_string_lossy().to_string();
    if exists_locally {
        tracing::info!(branch, "checking out existing storage branch");
        run_checked(git, repo_root, &["worktree", "add", &worktree_str, branch])?;
    } else if exists_remotely {
        tracing::info!(branch, "creating local tracking branch from remote");
        run_checked(
            git,
            repo_root,
            &["worktree", "add", "-b", branch, &worktree_str, &remote_ref],
        )?;
    } else {
        tracing::info!(branch, "creating storage branch from HEAD");
        run_checked(
            git,
            repo_root,
            &["worktree", "add", "-b", branch, &worktree_str, "HEAD"],
        )?;
    }

    let worktree_bodega_dir = worktree_path.join(BODEGA_DIR_NAME);
    fs::create_dir_all(&worktree_bodega_dir)?;

    let main_config = bodega_dir.join(CONFIG_FILE_NAME);
    let worktree_config = worktree_bodega_dir.join(CONFIG_FILE_NAME);
    if main_config.exists() && !worktree_config.exists() {
        fs::copy(&main_config, &worktree_config)?;
    }

    let head = git.run(&worktree_path, &["rev-list", "-n", "1", "HEAD"])?;
    let has_commits = head.success() && !head.stdout.trim().is_empty();

    // Seed the branch with the storage directory. Committing nothing is
    // tolerated, which also makes re-initialization idempotent.
    if !has_commits || !exists_locally {
        run_checked(git, &worktree_path, &["add", STORAGE_SUBDIR])?;
        git.run(
            &worktree_path,
            &["commit", "-m", "Initialize bodega ticket tracking"],
        )?;
    }

    Ok(worktree_bodega_dir)
}

/// Ensures the worktree exists and is healthy.
///
/// A missing worktree is re-initialized. A directory that exists but is
/// not a registered git worktree fails with remediation guidance rather
/// than being silently repaired. A valid worktree with a missing nested
/// ticket directory gets just that directory recreated.
pub fn ensure_worktree(git: &dyn GitRunner, bodega_dir: &Path, branch: &str) -> Result<PathBuf> {
    let worktree_path = bodega_dir.join(WORKTREE_DIR_NAME);
    let worktree_bodega_dir = worktree_path.join(BODEGA_DIR_NAME);

    if !worktree_path.exists() {
        let start = bodega_dir
            .parent()
            .ok_or_else(|| Error::Storage("storage directory has no parent".to_string()))?;
        let repo_root = find_repo_root(git, start)
            .ok_or_else(|| Error::Storage("not in a git repository".to_string()))?;
        return init_worktree(git, &repo_root, bodega_dir, branch);
    }

    if !worktree_path.join(".git").exists() {
        return Err(Error::Storage(format!(
            "worktree directory exists but is not a valid git worktree: {}\n\
             Remove the directory and run 'bodega init --force' to reinitialize",
            worktree_path.display()
        )));
    }

    if !worktree_bodega_dir.exists() {
        fs::create_dir_all(&worktree_bodega_dir)?;
    }

    Ok(worktree_bodega_dir)
}

/// Stages and commits a single ticket change on the storage branch.
///
/// Returns the commit SHA, or `None` when there was nothing to commit
/// (which is not an error).
pub fn auto_commit_ticket(
    git: &dyn GitRunner,
    worktree_path: &Path,
    ticket_file: &Path,
    op: CommitOp,
    ticket_id: &str,
    title: Option<&str>,
) -> Result<Option<String>> {
    let relative = ticket_file
        .strip_prefix(worktree_path)
        .map_err(|_| {
            Error::Storage(format!(
                "ticket file {} is outside the worktree {}",
                ticket_file.display(),
                worktree_path.display()
            ))
        })?
        .to_string_lossy()
        .to_string();

    if op == CommitOp::Delete {
        git.run(worktree_path, &["rm", &relative])?;
    } else {
        run_checked(git, worktree_path, &["add", &relative])?;
    }

    let message = op.message(ticket_id, title);
    let committed = git.run(worktree_path, &["commit", "-m", &message])?;
    if !committed.success() {
        tracing::debug!(ticket_id, "nothing to commit");
        return Ok(None);
    }

    let sha = run_checked(git, worktree_path, &["rev-parse", "HEAD"])?;
    Ok(Some(sha.trim().to_string()))
}

/// Checks for uncommitted changes, optionally restricted to a
/// subdirectory.
pub fn has_uncommitted_changes(
    git: &dyn GitRunner,
    path: &Path,
    subdir: Option<&str>,
) -> Result<bool> {
    let mut args = vec!["status", "--porcelain"];
    if let Some(subdir) = subdir {
        args.push(subdir);
    }
    let stdout = run_checked(git, path, &args)?;
    Ok(!stdout.trim().is_empty())
}

/// Number of commits `branch` is ahead of `base`. Unknown refs count as
/// zero rather than failing.
pub fn commits_ahead(git: &dyn GitRunner, dir: &Path, branch: &str, base: &str) -> Result<u32> {
    let range = format!("{}..{}", base, branch);
    let output = git.run(dir, &["rev-list", "--count", &range])?;
    if !output.success() {
        return Ok(0);
    }
    Ok(output.stdout.trim().parse().unwrap_or(0))
}

/// Generates a descriptive commit message for batched storage changes,
/// listing staged ticket ids/titles and any other files separately.
pub fn batch_commit_message(
    git: &dyn GitRunner,
    worktree_path: &Path,
    prefix: &str,
) -> Result<String> {
    let diff = git.run(
        worktree_path,
        &["diff", "--cached", "--name-only", STORAGE_SUBDIR],
    )?;
    if !diff.success() {
        return Ok(prefix.to_string());
    }

    let changed: Vec<&str> = diff
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if changed.is_empty() {
        return Ok(prefix.to_string());
    }

    let ticket_ext = format!(".{}", TICKET_EXT);
    let mut tickets: Vec<(String, String)> = Vec::new();
    let mut other_files: Vec<&str> = Vec::new();

    for file in changed {
        if !file.ends_with(&ticket_ext) || !file.contains(STORAGE_SUBDIR) {
            other_files.push(file);
            continue;
        }
        let full_path = worktree_path.join(file);
        let stem = Path::new(file)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string());
        let entry = match fs::read_to_string(&full_path) {
            Ok(content) => match codec::parse(&content) {
                Ok(ticket) => (ticket.id, ticket.title),
                Err(_) => (stem, "(unable to read title)".to_string()),
            },
            // Staged deletion: the file is already gone.
            Err(_) => (stem, "(deleted)".to_string()),
        };
        tickets.push(entry);
    }

    let mut lines = vec![prefix.to_string()];
    if !tickets.is_empty() {
        lines.push(String::new());
        lines.push("Tickets:".to_string());
        for (id, title) in &tickets {
            lines.push(format!("  {}: {}", id, title));
        }
    }
    if !other_files.is_empty() {
        lines.push(String::new());
        lines.push("Other files:".to_string());
        for file in &other_files {
            lines.push(format!("  {}", file));
        }
    }

    Ok(lines.join("\n"))
}

/// Removes the worktree registration and directory, keeping the storage
/// branch intact. For troubleshooting/cleanup.
pub fn cleanup_worktree(git: &dyn GitRunner, worktree_path: &Path, repo_root: &Path) -> Result<()> {
    let worktree_str = worktree_path.to_string_lossy().to_string();
    git.run(repo_root, &["worktree", "remove", &worktree_str])?;

    if worktree_path.exists() {
        fs::remove_dir_all(worktree_path)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
