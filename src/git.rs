//! Git collaborator.
//!
//! The sync engine talks to version control only through the [`Vcs`]
//! trait. [`GitCli`] is the production implementation: every call spawns
//! the `git` binary with an explicit argument list, bounded by a timeout,
//! with terminal prompts disabled so a credential request fails instead of
//! hanging the sync.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::GitConfig;

/// Length of commit hashes shown to users.
pub const SHORT_HASH_LEN: usize = 7;

/// Failure of a git invocation.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to execute '{command}': {source}. Is git installed?")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },
    #[error("'{command}' failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// `git reset` modes used by the update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    Hard,
    Soft,
}

impl ResetMode {
    fn flag(&self) -> &'static str {
        match self {
            ResetMode::Hard => "--hard",
            ResetMode::Soft => "--soft",
        }
    }
}

/// Commit at `HEAD` of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    /// Committer timestamp, seconds since the epoch.
    pub timestamp: Option<i64>,
}

impl CommitInfo {
    pub fn short(&self) -> String {
        short_hash(&self.hash)
    }
}

/// Version-control operations consumed by the clone/update engine.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// `git clone <flags> <url> <dest>`.
    async fn clone_repo(&self, url: &str, dest: &Path, flags: &[&str]) -> Result<(), GitError>;

    /// `git fetch <args>` inside `repo`.
    async fn fetch(&self, repo: &Path, args: &[&str]) -> Result<(), GitError>;

    async fn reset(&self, repo: &Path, mode: ResetMode, target: &str) -> Result<(), GitError>;

    async fn pull(&self, repo: &Path) -> Result<(), GitError>;

    async fn checkout(&self, repo: &Path, reference: &str) -> Result<(), GitError>;

    /// Arbitrary subcommand; returns stdout. Used for `sparse-checkout`
    /// and `ls-tree`.
    async fn raw(&self, repo: &Path, args: &[&str]) -> Result<String, GitError>;

    /// `git log -1` at `HEAD`.
    async fn head_commit(&self, repo: &Path) -> Result<CommitInfo, GitError>;
}

/// [`Vcs`] backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &GitConfig) -> Self {
        Self::new(&config.binary, Duration::from_secs(config.timeout_secs))
    }

    async fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String, GitError> {
        let command = format!("git {}", args.join(" "));
        debug!(command = %command, cwd = ?cwd, "running git");

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| GitError::Spawn {
            command: command.clone(),
            source,
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| GitError::Timeout {
                command: command.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| GitError::Io {
                context: format!("failed to wait for '{}'", command),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::Failed {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn clone_repo(&self, url: &str, dest: &Path, flags: &[&str]) -> Result<(), GitError> {
        let dest = dest.to_string_lossy();
        let mut args = vec!["clone"];
        args.extend_from_slice(flags);
        args.push(url);
        args.push(dest.as_ref());
        self.run(None, &args).await.map(|_| ())
    }

    async fn fetch(&self, repo: &Path, args: &[&str]) -> Result<(), GitError> {
        let mut full = vec!["fetch"];
        full.extend_from_slice(args);
        self.run(Some(repo), &full).await.map(|_| ())
    }

    async fn reset(&self, repo: &Path, mode: ResetMode, target: &str) -> Result<(), GitError> {
        self.run(Some(repo), &["reset", mode.flag(), target])
            .await
            .map(|_| ())
    }

    async fn pull(&self, repo: &Path) -> Result<(), GitError> {
        self.run(Some(repo), &["pull"]).await.map(|_| ())
    }

    async fn checkout(&self, repo: &Path, reference: &str) -> Result<(), GitError> {
        self.run(Some(repo), &["checkout", reference]).await.map(|_| ())
    }

    async fn raw(&self, repo: &Path, args: &[&str]) -> Result<String, GitError> {
        self.run(Some(repo), args).await
    }

    async fn head_commit(&self, repo: &Path) -> Result<CommitInfo, GitError> {
        let out = self
            .run(Some(repo), &["log", "-1", "--format=%H %ct"])
            .await?;
        parse_log_line(&out).ok_or_else(|| GitError::Failed {
            command: "git log -1".to_string(),
            status: "unparseable output".to_string(),
            stderr: out.trim().to_string(),
        })
    }
}

fn parse_log_line(out: &str) -> Option<CommitInfo> {
    let mut parts = out.split_whitespace();
    let hash = parts.next()?.to_string();
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let timestamp = parts.next().and_then(|ts| ts.parse::<i64>().ok());
    Some(CommitInfo { hash, timestamp })
}

/// Truncate a commit hash for display.
pub fn short_hash(hash: &str) -> String {
    hash.trim().chars().take(SHORT_HASH_LEN).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_is_seven_chars() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn log_line_parses_hash_and_time() {
        let info = parse_log_line("0123456789abcdef0123456789abcdef01234567 1700000000\n").unwrap();
        assert_eq!(info.short(), "0123456");
        assert_eq!(info.timestamp, Some(1_700_000_000));
        assert!(parse_log_line("").is_none());
        assert!(parse_log_line("fatal: not a git repository").is_none());
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let git = GitCli::new("/nonexistent/git-binary", Duration::from_secs(5));
        let err = git.pull(Path::new(".")).await.unwrap_err();
        assert!(matches!(err, GitError::Spawn { .. }));
    }
}
