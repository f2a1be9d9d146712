// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Git subprocess port.
//!
//! All git-touching components depend on the [`GitRunner`] trait rather
//! than on process execution directly; [`SystemGit`] is the real
//! implementation, and tests script a fake. A runner reports the exit
//! status and both captured streams; callers decide which non-zero exits
//! are errors and which are expected, handled outcomes.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Captured outcome of one git invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Process exit code (-1 when terminated by a signal).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// True for a zero exit.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs a git command in a working directory.
pub trait GitRunner {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<GitOutput>;
}

/// The real runner: invokes the `git` binary via `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        tracing::debug!(dir = %dir.display(), ?args, "running git");

        let mut cmd = Command::new("git");
        cmd.current_dir(dir).args(args);
        setup_git_env(&mut cmd);

        let output = cmd.output().map_err(Error::Io)?;
        Ok(GitOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Sets up default git author/committer environment variables.
/// This ensures git commands work even when no user is configured
/// (e.g., in CI environments or when HOME points to an empty directory).
fn setup_git_env(cmd: &mut Command) {
    if std::env::var("GIT_AUTHOR_NAME")
        .map(|v| v.is_empty())
        .unwrap_or(true)
    {
        cmd.env("GIT_AUTHOR_NAME", "bodega");
    }
    if std::env::var("GIT_AUTHOR_EMAIL")
        .map(|v| v.is_empty())
        .unwrap_or(true)
    {
        cmd.env("GIT_AUTHOR_EMAIL", "bodega@localhost");
    }
    if std::env::var("GIT_COMMITTER_NAME")
        .map(|v| v.is_empty())
        .unwrap_or(true)
    {
        cmd.env("GIT_COMMITTER_NAME", "bodega");
    }
    if std::env::var("GIT_COMMITTER_EMAIL")
        .map(|v| v.is_empty())
        .unwrap_or(true)
    {
        cmd.env("GIT_COMMITTER_EMAIL", "bodega@localhost");
    }
}

/// Runs a git command and requires a zero exit; a non-zero exit becomes
/// [`Error::Git`] with the command and captured stderr attached.
pub fn run_checked(git: &dyn GitRunner, dir: &Path, args: &[&str]) -> Result<String> {
    let output = git.run(dir, args)?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(Error::Git {
            command: format!("git {}", args.join(" ")),
            stderr: output.stderr,
        })
    }
}

/// Gets git `user.name` for the repository containing `dir`, or None if
/// not configured.
pub fn git_user_name(git: &dyn GitRunner, dir: &Path) -> Option<String> {
    let output = git.run(dir, &["config", "user.name"]).ok()?;
    if !output.success() {
        return None;
    }
    let name = output.stdout.trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Finds the git repository root containing `dir`, or None when `dir` is
/// not inside a repository.
pub fn find_repo_root(git: &dyn GitRunner, dir: &Path) -> Option<PathBuf> {
    let output = git.run(dir, &["rev-parse", "--show-toplevel"]).ok()?;
    if !output.success() {
        return None;
    }
    let root = output.stdout.trim();
    (!root.is_empty()).then(|| PathBuf::from(root))
}


#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
