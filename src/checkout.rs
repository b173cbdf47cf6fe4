//! Clone/update engine.
//!
//! Decides, for one repository descriptor, whether to clone, update, or
//! re-clone, and runs the minimal git sequence for the case at hand.
//!
//! Whether a repository is cloned is never cached: it is the presence of
//! `root/<name>/.git`, checked through [`is_cloned`] only.
//!
//! | Checkout | Ref | Sequence |
//! |----------|-----|----------|
//! | sparse | tag | clone (blob filter, sparse, no checkout) → sparse-checkout set → fetch tag → checkout tag |
//! | sparse | commit | clone (blob filter, sparse, no checkout) → sparse-checkout set → fetch commit → checkout commit |
//! | sparse | branch | shallow sparse clone of the branch → sparse-checkout set |
//! | full | tag | clone (no checkout) → fetch tag → checkout tag |
//! | full | commit | shallow clone (no checkout) → fetch commit → checkout commit |
//! | full | branch | shallow clone of the branch |

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::git::{GitError, ResetMode, Vcs};
use crate::models::{RefSpec, RepositoryDescriptor, SyncAction};

/// Reset target of the update path.
const REMOTE_DEFAULT: &str = "origin/HEAD";

/// Directory holding the checkout of `name`.
pub fn checkout_path(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

/// Returns `true` if `path` holds a git checkout.
pub fn is_cloned(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Result of materializing one descriptor.
#[derive(Debug, Clone)]
pub struct MaterializeOutcome {
    pub action: SyncAction,
    pub reference: RefSpec,
    pub message: String,
    pub error: Option<String>,
}

impl MaterializeOutcome {
    pub fn success(&self) -> bool {
        self.action != SyncAction::Failed
    }
}

/// Runs clone/update sequences against a [`Vcs`] under a mirror root.
pub struct CloneEngine<'a> {
    vcs: &'a dyn Vcs,
    root: PathBuf,
}

impl<'a> CloneEngine<'a> {
    pub fn new(vcs: &'a dyn Vcs, root: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            root: root.into(),
        }
    }

    pub fn path_for(&self, desc: &RepositoryDescriptor) -> PathBuf {
        checkout_path(&self.root, &desc.name)
    }

    /// Clone, update, or (with `force`) re-clone `desc`.
    ///
    /// Update failures are reported in the returned outcome. An `Err` means
    /// the clone itself could not be completed; the half-made checkout has
    /// already been removed.
    pub async fn materialize(
        &self,
        desc: &RepositoryDescriptor,
        force: bool,
    ) -> Result<MaterializeOutcome, GitError> {
        let path = self.path_for(desc);

        if force && is_cloned(&path) {
            info!(repo = %desc.name, "forced re-clone, removing existing checkout");
            remove_dir(&path).await?;
        }

        if is_cloned(&path) {
            return Ok(self.update(desc, &path).await);
        }

        self.clone_fresh(desc, &path).await
    }

    /// Shallow fetch of the remote default branch, then a hard reset to its
    /// tip. The configured ref only shapes the initial clone.
    async fn update(&self, desc: &RepositoryDescriptor, path: &Path) -> MaterializeOutcome {
        let reference = desc.clone_ref();

        let fetched = async {
            self.vcs.fetch(path, &["--depth", "1", "origin"]).await?;
            self.vcs.reset(path, ResetMode::Hard, REMOTE_DEFAULT).await
        }
        .await;

        match fetched {
            Ok(()) => {
                info!(repo = %desc.name, target = REMOTE_DEFAULT, "updated");
                MaterializeOutcome {
                    action: SyncAction::Updated,
                    message: format!("Updated {} to {}", desc.name, REMOTE_DEFAULT),
                    reference,
                    error: None,
                }
            }
            Err(fetch_err) => {
                warn!(repo = %desc.name, error = %fetch_err, "fetch/reset failed, falling back to pull");
                match self.vcs.pull(path).await {
                    Ok(()) => MaterializeOutcome {
                        action: SyncAction::Updated,
                        message: format!("Updated {} via pull", desc.name),
                        reference,
                        error: None,
                    },
                    Err(pull_err) => {
                        warn!(repo = %desc.name, error = %pull_err, "pull failed");
                        MaterializeOutcome {
                            action: SyncAction::Failed,
                            message: format!("Error updating {}: {}", desc.name, pull_err),
                            reference,
                            error: Some(format!("fetch: {}; pull: {}", fetch_err, pull_err)),
                        }
                    }
                }
            }
        }
    }

    async fn clone_fresh(
        &self,
        desc: &RepositoryDescriptor,
        path: &Path,
    ) -> Result<MaterializeOutcome, GitError> {
        if path.exists() {
            // Leftover directory without git metadata; clone refuses non-empty targets.
            warn!(repo = %desc.name, path = %path.display(), "removing stale directory before clone");
            remove_dir(path).await?;
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| GitError::Io {
                    context: format!("failed to create {}", parent.display()),
                    source,
                })?;
        }

        let reference = match self.clone_steps(desc, path).await {
            Ok(reference) => reference,
            Err(err) => {
                warn!(repo = %desc.name, error = %err, "clone failed");
                if path.exists() {
                    let _ = tokio::fs::remove_dir_all(path).await;
                }
                return Err(err);
            }
        };

        let mut message = format!("Cloned {} at {}", desc.name, reference);
        if let Some(paths) = desc.sparse_set() {
            message.push_str(&format!(", sparse: {}", paths.join(", ")));
        }
        info!(repo = %desc.name, "{}", message);

        Ok(MaterializeOutcome {
            action: SyncAction::Cloned,
            reference,
            message,
            error: None,
        })
    }

    async fn clone_steps(
        &self,
        desc: &RepositoryDescriptor,
        path: &Path,
    ) -> Result<RefSpec, GitError> {
        let reference = desc.clone_ref();
        let initial = desc.initial_ref();
        let url = desc.url.as_str();

        let mut branch_flags: Vec<&str> = Vec::new();
        if let RefSpec::Branch(branch) = &initial {
            branch_flags.extend(["--branch", branch.as_str()]);
        }

        match (desc.sparse_set(), &reference) {
            (Some(paths), RefSpec::Tag(tag)) => {
                self.vcs
                    .clone_repo(url, path, &[
                        "--filter=blob:none",
                        "--sparse",
                        "--no-checkout",
                        "--depth",
                        "1",
                    ])
                    .await?;
                self.set_sparse_paths(path, paths).await?;
                self.fetch_tag(path, tag).await?;
                self.vcs.checkout(path, tag).await?;
            }
            (Some(paths), RefSpec::Commit(commit)) => {
                let mut flags = vec![
                    "--filter=blob:none",
                    "--sparse",
                    "--no-checkout",
                    "--depth",
                    "1",
                ];
                flags.extend_from_slice(&branch_flags);
                self.vcs.clone_repo(url, path, &flags).await?;
                self.set_sparse_paths(path, paths).await?;
                self.fetch_commit(path, commit).await?;
                self.vcs.checkout(path, commit).await?;
            }
            (Some(paths), _) => {
                let mut flags = vec!["--filter=blob:none", "--sparse", "--depth", "1"];
                flags.extend_from_slice(&branch_flags);
                self.vcs.clone_repo(url, path, &flags).await?;
                self.set_sparse_paths(path, paths).await?;
            }
            (None, RefSpec::Tag(tag)) => {
                self.vcs
                    .clone_repo(url, path, &["--no-checkout", "--depth", "1"])
                    .await?;
                self.fetch_tag(path, tag).await?;
                self.vcs.checkout(path, tag).await?;
            }
            (None, RefSpec::Commit(commit)) => {
                let mut flags = vec!["--no-checkout", "--depth", "1"];
                flags.extend_from_slice(&branch_flags);
                self.vcs.clone_repo(url, path, &flags).await?;
                self.fetch_commit(path, commit).await?;
                self.vcs.checkout(path, commit).await?;
            }
            (None, _) => {
                let mut flags = vec!["--depth", "1"];
                flags.extend_from_slice(&branch_flags);
                self.vcs.clone_repo(url, path, &flags).await?;
            }
        }

        Ok(reference)
    }

    async fn set_sparse_paths(&self, path: &Path, paths: &[String]) -> Result<(), GitError> {
        let mut args = vec!["sparse-checkout", "set"];
        args.extend(paths.iter().map(String::as_str));
        self.vcs.raw(path, &args).await.map(|_| ())
    }

    async fn fetch_tag(&self, path: &Path, tag: &str) -> Result<(), GitError> {
        let refspec = tag_refspec(tag);
        self.vcs
            .fetch(path, &["--depth", "1", "origin", refspec.as_str()])
            .await
    }

    async fn fetch_commit(&self, path: &Path, commit: &str) -> Result<(), GitError> {
        self.vcs
            .fetch(path, &["--depth", "1", "origin", commit])
            .await
    }
}

fn tag_refspec(tag: &str) -> String {
    format!("+refs/tags/{tag}:refs/tags/{tag}")
}

async fn remove_dir(path: &Path) -> Result<(), GitError> {
    tokio::fs::remove_dir_all(path)
        .await
        .map_err(|source| GitError::Io {
            context: format!("failed to remove {}", path.display()),
            source,
        })
}
