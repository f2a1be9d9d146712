// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Two-way reconciliation between the main branch and the isolated
//! storage branch.
//!
//! The engine is strictly sequential: each step assumes the repository
//! was left in a single consistent state by the previous one, relying on
//! git's own index/ref locking rather than adding any of its own. The
//! final merge deliberately leaves ticket files uncommitted in the main
//! working tree; committing into the user's active branch is never done
//! automatically.

use std::path::Path;

use crate::config::SyncStrategy;
use crate::error::{Error, Result};
use crate::git::{run_checked, GitRunner};
use crate::worktree::{
    batch_commit_message, commits_ahead, get_current_branch, has_uncommitted_changes,
};

const STORAGE_SUBDIR: &str = ".bodega/";

/// Status of sync between branches. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    /// Commits on main not yet on the storage branch.
    pub commits_ahead_main: u32,
    /// Commits on the storage branch not yet on main.
    pub commits_ahead_storage: u32,
    pub uncommitted_in_main: bool,
    pub uncommitted_in_worktree: bool,
}

/// Result of a sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncResult {
    /// Commits merged main → storage.
    pub commits_from_main: u32,
    /// Commits merged storage → main.
    pub commits_from_storage: u32,
    /// Ticket files left modified in the main working tree.
    pub files_changed: usize,
    /// True when a merge exited non-zero under an automatic strategy.
    pub had_conflicts: bool,
}

/// Reads the sync status without mutating anything.
pub fn get_sync_status(
    git: &dyn GitRunner,
    repo_root: &Path,
    worktree_path: &Path,
    main_branch: &str,
    storage_branch: &str,
) -> Result<SyncStatus> {
    Ok(SyncStatus {
        commits_ahead_main: commits_ahead(git, repo_root, main_branch, storage_branch)?,
        commits_ahead_storage: commits_ahead(git, repo_root, storage_branch, main_branch)?,
        uncommitted_in_main: has_uncommitted_changes(git, repo_root, Some(STORAGE_SUBDIR))?,
        uncommitted_in_worktree: has_uncommitted_changes(git, worktree_path, Some(STORAGE_SUBDIR))?,
    })
}

/// Two-way sync between the main and storage branches.
///
/// 1. Fails fast when `.bodega/` on main has uncommitted changes.
/// 2. Batch-commits any uncommitted worktree changes.
/// 3. Merges main → storage inside the worktree.
/// 4. Merges storage → main in the main working tree (skippable).
///
/// Conflicts under `theirs`/`ours` are auto-resolved and recorded in the
/// result; under `manual` they abort with the worktree path.
pub fn sync_branches(
    git: &dyn GitRunner,
    repo_root: &Path,
    worktree_path: &Path,
    main_branch: &str,
    storage_branch: &str,
    strategy: SyncStrategy,
    skip_merge_to_main: bool,
) -> Result<SyncResult> {
    if has_uncommitted_changes(git, repo_root, Some(STORAGE_SUBDIR))? {
        return Err(Error::Storage(format!(
            "uncommitted changes in {}. Commit or stash before syncing.\n\n\
             Run: git status {}",
            STORAGE_SUBDIR, STORAGE_SUBDIR
        )));
    }

    if has_uncommitted_changes(git, worktree_path, Some(STORAGE_SUBDIR))? {
        run_checked(git, worktree_path, &["add", STORAGE_SUBDIR])?;
        let message = batch_commit_message(git, worktree_path, "Auto-commit before sync")?;
        git.run(worktree_path, &["commit", "-m", &message])?;
        tracing::info!("auto-committed worktree changes before sync");
    }

    // Commit counts are captured once, up front.
    let commits_from_main = commits_ahead(git, repo_root, main_branch, storage_branch)?;
    let commits_from_storage = commits_ahead(git, repo_root, storage_branch, main_branch)?;

    let mut had_conflicts = false;

    // Step 1: merge main → storage, inside the worktree. From the
    // worktree's perspective the storage branch is "ours".
    let mut args = vec!["merge", main_branch, "--no-edit"];
    match strategy {
        SyncStrategy::Theirs => args.extend(["-X", "ours"]),
        SyncStrategy::Ours => args.extend(["-X", "theirs"]),
        SyncStrategy::Manual => {}
    }
    let merged = git.run(worktree_path, &args)?;
    if !merged.success() {
        if strategy == SyncStrategy::Manual {
            return Err(Error::Storage(format!(
                "merge conflict detected. Please resolve manually in {}",
                worktree_path.display()
            )));
        }
        had_conflicts = true;
    }
    tracing::info!(commits = commits_from_main, "merged {} into {}", main_branch, storage_branch);

    if skip_merge_to_main {
        return Ok(SyncResult {
            commits_from_main,
            commits_from_storage: 0,
            files_changed: 0,
            had_conflicts,
        });
    }

    // Step 2: merge storage → main, in the main working tree.
    let current_branch = get_current_branch(git, repo_root)?;
    if current_branch != main_branch {
        run_checked(git, repo_root, &["checkout", main_branch])?;
    }

    let mut args = vec!["merge", storage_branch, "--no-edit"];
    match strategy {
        SyncStrategy::Theirs => args.extend(["-X", "theirs"]),
        SyncStrategy::Ours => args.extend(["-X", "ours"]),
        SyncStrategy::Manual => {}
    }
    let merged = git.run(repo_root, &args)?;
    if !merged.success() {
        if strategy == SyncStrategy::Manual {
            return Err(Error::Storage(
                "merge conflict detected. Please resolve manually.".to_string(),
            ));
        }
        had_conflicts = true;
    }
    tracing::info!(commits = commits_from_storage, "merged {} into {}", storage_branch, main_branch);

    let diff = git.run(
        repo_root,
        &["diff", "--name-only", "HEAD", STORAGE_SUBDIR],
    )?;
    let files_changed = diff.stdout.lines().filter(|l| !l.trim().is_empty()).count();

    Ok(SyncResult {
        commits_from_main,
        commits_from_storage,
        files_changed,
        had_conflicts,
    })
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
