// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation of the storage branch against its remote tracking
//! branch: rebase first, fall back to a merge, then push.
//!
//! The strategy names are local-centric: `theirs` means the local storage
//! branch wins on conflict, `ours` means the remote wins, `manual` aborts
//! on any conflict that survives the fallback merge.

use std::path::Path;

use crate::config::SyncStrategy;
use crate::error::{Error, Result};
use crate::git::{run_checked, GitRunner};
use crate::worktree::{batch_commit_message, commits_ahead, has_uncommitted_changes};

const STORAGE_SUBDIR: &str = ".bodega/";

/// Status of the storage branch relative to its remote. Derived, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushStatus {
    pub has_remote: bool,
    pub commits_to_push: u32,
    pub commits_to_pull: u32,
    pub uncommitted_changes: bool,
}

/// Result of a push operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushResult {
    /// True when local changes were batch-committed first.
    pub auto_committed: bool,
    /// Commits integrated from the remote.
    pub pulled_commits: u32,
    /// Commits sent to the remote.
    pub pushed_commits: u32,
    /// True when a rebase/merge exited non-zero under an automatic
    /// strategy.
    pub had_conflicts: bool,
}

fn remote_ref(storage_branch: &str) -> String {
    format!("origin/{}", storage_branch)
}

fn remote_branch_exists(
    git: &dyn GitRunner,
    worktree_path: &Path,
    storage_branch: &str,
) -> Result<bool> {
    let listed = git.run(
        worktree_path,
        &["ls-remote", "--heads", "origin", storage_branch],
    )?;
    Ok(listed.success() && !listed.stdout.trim().is_empty())
}

/// Total commit count on HEAD; used when no remote branch exists yet.
fn total_commits(git: &dyn GitRunner, worktree_path: &Path) -> Result<u32> {
    let counted = git.run(worktree_path, &["rev-list", "--count", "HEAD"])?;
    if !counted.success() {
        return Ok(0);
    }
    Ok(counted.stdout.trim().parse().unwrap_or(0))
}

/// Reads the push status without mutating anything (the fetch refreshing
/// the remote ref is best-effort).
pub fn get_push_status(
    git: &dyn GitRunner,
    worktree_path: &Path,
    storage_branch: &str,
) -> Result<PushStatus> {
    let has_remote = remote_branch_exists(git, worktree_path, storage_branch)?;

    let (commits_to_push, commits_to_pull) = if has_remote {
        git.run(worktree_path, &["fetch", "origin", storage_branch])?;
        let remote = remote_ref(storage_branch);
        (
            commits_ahead(git, worktree_path, storage_branch, &remote)?,
            commits_ahead(git, worktree_path, &remote, storage_branch)?,
        )
    } else {
        (total_commits(git, worktree_path)?, 0)
    };

    Ok(PushStatus {
        has_remote,
        commits_to_push,
        commits_to_pull,
        uncommitted_changes: has_uncommitted_changes(git, worktree_path, Some(STORAGE_SUBDIR))?,
    })
}

/// Pushes the storage branch to the remote with conflict resolution.
///
/// 1. Batch-commits any uncommitted worktree changes.
/// 2. Fetches the remote branch (best-effort).
/// 3. When behind, rebases onto the remote with the strategy-mapped
///    option; a failed rebase is aborted and retried as a plain merge.
/// 4. Establishes upstream tracking if unset, then pushes (`-u` on the
///    first push).
///
/// A push failure after all fallbacks is fatal and carries the git error
/// text.
pub fn push_to_remote(
    git: &dyn GitRunner,
    worktree_path: &Path,
    storage_branch: &str,
    strategy: SyncStrategy,
) -> Result<PushResult> {
    let mut auto_committed = false;
    let mut pulled_commits = 0;
    let mut had_conflicts = false;

    if has_uncommitted_changes(git, worktree_path, Some(STORAGE_SUBDIR))? {
        run_checked(git, worktree_path, &["add", STORAGE_SUBDIR])?;
        let message = batch_commit_message(git, worktree_path, "Auto-commit before push")?;
        let committed = git.run(worktree_path, &["commit", "-m", &message])?;
        auto_committed = committed.success();
    }

    // Best-effort: a fetch failure must not abort the push.
    git.run(worktree_path, &["fetch", "origin", storage_branch])?;

    let has_remote = remote_branch_exists(git, worktree_path, storage_branch)?;
    let remote = remote_ref(storage_branch);

    // Counts are captured before any history rewriting.
    let pushed_commits = if has_remote {
        commits_ahead(git, worktree_path, storage_branch, &remote)?
    } else {
        total_commits(git, worktree_path)?
    };

    if has_remote {
        pulled_commits = commits_ahead(git, worktree_path, &remote, storage_branch)?;

        if pulled_commits > 0 {
            let strategy_args: &[&str] = match strategy {
                SyncStrategy::Theirs => &["-X", "ours"],
                SyncStrategy::Ours => &["-X", "theirs"],
                SyncStrategy::Manual => &[],
            };

            let mut rebase_args = vec!["rebase", remote.as_str()];
            rebase_args.extend_from_slice(strategy_args);
            let rebased = git.run(worktree_path, &rebase_args)?;

            if !rebased.success() {
                tracing::info!("rebase failed, falling back to merge");
                git.run(worktree_path, &["rebase", "--abort"])?;

                let mut merge_args = vec!["merge", remote.as_str(), "--no-edit"];
                merge_args.extend_from_slice(strategy_args);
                let merged = git.run(worktree_path, &merge_args)?;

                if !merged.success() {
                    if strategy == SyncStrategy::Manual {
                        return Err(Error::Storage(format!(
                            "merge conflict detected. Please resolve manually in {}",
                            worktree_path.display()
                        )));
                    }
                    had_conflicts = true;
                }
            }
        }
    }

    // Establish upstream tracking if unset.
    let upstream = git.run(
        worktree_path,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
    )?;
    if !upstream.success() || upstream.stdout.trim().is_empty() {
        git.run(
            worktree_path,
            &["branch", "--set-upstream-to", &remote, storage_branch],
        )?;
    }

    let pushed = if has_remote {
        git.run(worktree_path, &["push"])?
    } else {
        git.run(worktree_path, &["push", "-u", "origin", storage_branch])?
    };
    if !pushed.success() {
        return Err(Error::Git {
            command: "git push".to_string(),
            stderr: pushed.stderr,
        });
    }
    tracing::info!(pushed = pushed_commits, pulled = pulled_commits, "pushed storage branch");

    Ok(PushResult {
        auto_committed,
        pulled_commits,
        pushed_commits,
        had_conflicts,
    })
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
