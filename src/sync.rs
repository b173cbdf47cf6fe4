//! Sync orchestration.
//!
//! Runs the clone/update engine over the configured repositories in a
//! fixed order, because the companion interpreter's revision is read from
//! the monorepo's own gitlink:
//!
//! ```text
//! 1. resolve + filter descriptors
//! 2. monorepo                      (outcome recorded even on failure)
//! 3. ls-tree HEAD <pin_path>       (pin = Some(commit) | None)
//! 4. companion namespace           (interpreter pinned to `pin` if any)
//! 5. everything else, in order
//! ```
//!
//! Repositories are materialized one at a time. Dropping the future
//! mid-batch leaves completed checkouts as they are.

use std::path::Path;
use tracing::{info, warn};

use crate::checkout::{is_cloned, CloneEngine, MaterializeOutcome};
use crate::config::Config;
use crate::git::{short_hash, Vcs};
use crate::models::{RepositoryDescriptor, SyncOutcome, SyncReport};
use crate::progress::{SyncProgressEvent, SyncProgressReporter};
use crate::registry::Registry;

/// Options for [`sync_all`].
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Remove and re-clone existing checkouts.
    pub force: bool,
    /// Restrict the sync to these repository names.
    pub repositories: Option<Vec<String>>,
    /// Release tag for primary-namespace repositories.
    pub version: Option<String>,
}

/// Sync every selected repository and aggregate the outcomes.
pub async fn sync_all(
    config: &Config,
    vcs: &dyn Vcs,
    options: &SyncOptions,
    progress: &dyn SyncProgressReporter,
) -> SyncReport {
    let registry = Registry::from_config(config);
    let version = options
        .version
        .clone()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| registry.default_version().to_string());

    let mut selected = registry.list_descriptors(Some(&version));
    if let Some(names) = &options.repositories {
        for name in names {
            if registry.lookup_by_name(name).is_none() {
                warn!(repo = %name, "unknown repository in sync filter, ignoring");
            }
        }
        selected.retain(|desc| names.iter().any(|n| n == &desc.name));
    }

    if selected.is_empty() {
        return SyncReport {
            success: false,
            message: "No matching repositories to sync".to_string(),
            version,
            repositories: Vec::new(),
        };
    }

    let (monorepo, companions, rest) = partition(&registry, &config.mirror.monorepo, selected);
    let total = usize::from(monorepo.is_some()) + companions.len() + rest.len();
    let engine = CloneEngine::new(vcs, &config.mirror.root);
    let mut outcomes = Vec::with_capacity(total);
    let mut n = 0;

    if let Some(desc) = &monorepo {
        n += 1;
        outcomes.push(run_one(&engine, vcs, desc, options.force, n, total, progress).await);
    }

    // The pin is looked up even if the monorepo step failed; an existing
    // checkout from an earlier sync is still authoritative.
    let monorepo_path = config.repo_path(&config.mirror.monorepo);
    let pin = read_dependency_pin(vcs, &monorepo_path, &config.mirror.pin_path).await;
    if let Some(commit) = &pin {
        info!(commit = %commit, path = %config.mirror.pin_path, "found pinned interpreter commit");
    }

    for desc in &companions {
        n += 1;
        match &pin {
            Some(commit) if desc.name == config.mirror.companion_interpreter => {
                let pinned = desc.pinned_to_commit(commit);
                let mut outcome =
                    run_one(&engine, vcs, &pinned, options.force, n, total, progress).await;
                outcome.message = format!(
                    "{} (commit {} pinned by {})",
                    outcome.message,
                    short_hash(commit),
                    config.mirror.monorepo
                );
                outcomes.push(outcome);
            }
            _ => {
                outcomes.push(run_one(&engine, vcs, desc, options.force, n, total, progress).await)
            }
        }
    }

    for desc in &rest {
        n += 1;
        outcomes.push(run_one(&engine, vcs, desc, options.force, n, total, progress).await);
    }

    summarize(version, outcomes)
}

fn partition(
    registry: &Registry,
    monorepo_name: &str,
    selected: Vec<RepositoryDescriptor>,
) -> (
    Option<RepositoryDescriptor>,
    Vec<RepositoryDescriptor>,
    Vec<RepositoryDescriptor>,
) {
    let mut monorepo = None;
    let mut companions = Vec::new();
    let mut rest = Vec::new();

    for desc in selected {
        if desc.name == monorepo_name && monorepo.is_none() {
            monorepo = Some(desc);
        } else if registry.is_companion(&desc) {
            companions.push(desc);
        } else {
            rest.push(desc);
        }
    }

    (monorepo, companions, rest)
}

async fn run_one(
    engine: &CloneEngine<'_>,
    vcs: &dyn Vcs,
    desc: &RepositoryDescriptor,
    force: bool,
    n: usize,
    total: usize,
    progress: &dyn SyncProgressReporter,
) -> SyncOutcome {
    progress.report(SyncProgressEvent::Started {
        repo: desc.name.clone(),
        n,
        total,
    });

    let mut outcome = match engine.materialize(desc, force).await {
        Ok(result) => from_materialized(desc, result),
        Err(err) => {
            warn!(repo = %desc.name, error = %err, "sync failed");
            SyncOutcome::failed(
                &desc.name,
                format!("Error cloning {}: {}", desc.name, err),
                err.to_string(),
            )
        }
    };

    if outcome.success {
        let path = engine.path_for(desc);
        outcome.commit = match vcs.head_commit(&path).await {
            Ok(info) => Some(info.short()),
            Err(err) => {
                warn!(repo = %desc.name, error = %err, "could not resolve HEAD");
                None
            }
        };
    }

    progress.report(SyncProgressEvent::Finished {
        repo: desc.name.clone(),
        ok: outcome.success,
        detail: outcome.message.clone(),
    });
    outcome
}

fn from_materialized(desc: &RepositoryDescriptor, result: MaterializeOutcome) -> SyncOutcome {
    SyncOutcome {
        name: desc.name.clone(),
        success: result.success(),
        action: result.action,
        message: result.message,
        error: result.error,
        reference: Some(result.reference.to_string()),
        commit: None,
    }
}

fn summarize(version: String, outcomes: Vec<SyncOutcome>) -> SyncReport {
    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.success)
        .map(|o| o.name.as_str())
        .collect();

    let message = if failed.is_empty() {
        format!("Synced {} repositories", outcomes.len())
    } else {
        format!(
            "Synced {} of {} repositories; failed: {}",
            outcomes.len() - failed.len(),
            outcomes.len(),
            failed.join(", ")
        )
    };

    SyncReport {
        success: failed.is_empty(),
        message,
        version,
        repositories: outcomes,
    }
}

/// Commit recorded in the monorepo for the gitlink at `pin_path`.
///
/// Returns `None` when the checkout is missing, git fails, or the entry is
/// not a gitlink.
pub async fn read_dependency_pin(vcs: &dyn Vcs, repo: &Path, pin_path: &str) -> Option<String> {
    if !is_cloned(repo) {
        return None;
    }
    match vcs.raw(repo, &["ls-tree", "HEAD", pin_path]).await {
        Ok(out) => parse_gitlink(&out),
        Err(err) => {
            warn!(error = %err, "dependency pin lookup failed");
            None
        }
    }
}

/// Parse `160000 commit <sha>\t<path>` from `git ls-tree`.
pub fn parse_gitlink(ls_tree_output: &str) -> Option<String> {
    let line = ls_tree_output.lines().next()?;
    let (meta, _path) = line.split_once('\t')?;
    let mut fields = meta.split_whitespace();
    let _mode = fields.next()?;
    if fields.next()? != "commit" {
        return None;
    }
    let sha = fields.next()?;
    let valid = sha.len() >= 7 && sha.chars().all(|c| c.is_ascii_hexdigit());
    valid.then(|| sha.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::RecordingVcs;
    use crate::models::SyncAction;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    const PIN: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f9012345678";

    fn config(root: &Path) -> Config {
        let mut config = Config::with_root(root);
        config.repositories = vec![
            RepositoryDescriptor::new("tooling", "https://github.com/someone/tooling").branch("main"),
            RepositoryDescriptor::new("noir", "https://github.com/noir-lang/noir")
                .branch("master")
                .sparse(["docs"]),
            RepositoryDescriptor::new("aztec-starter", "https://github.com/AztecProtocol/aztec-starter"),
            RepositoryDescriptor::new(
                "aztec-packages",
                "https://github.com/AztecProtocol/aztec-packages",
            )
            .sparse(["docs"]),
        ];
        config
    }

    fn names(report: &SyncReport) -> Vec<&str> {
        report.repositories.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn gitlink_parsing() {
        let out = format!("160000 commit {}\tnoir/noir-repo\n", PIN);
        assert_eq!(parse_gitlink(&out).as_deref(), Some(PIN));
        assert_eq!(parse_gitlink(""), None);
        assert_eq!(
            parse_gitlink("100644 blob 0123456789abcdef\tnoir/noir-repo"),
            None
        );
        assert_eq!(parse_gitlink("garbage"), None);
        assert_eq!(parse_gitlink("160000 commit not-a-sha\tx"), None);
    }

    #[tokio::test]
    async fn monorepo_first_then_companions_then_rest() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new();
        let report = sync_all(&config(tmp.path()), &vcs, &SyncOptions::default(), &NoProgress).await;

        assert!(report.success, "{}", report.message);
        assert_eq!(
            names(&report),
            vec!["aztec-packages", "noir", "tooling", "aztec-starter"]
        );
        assert_eq!(report.version, crate::config::DEFAULT_VERSION);
    }

    #[tokio::test]
    async fn pin_overrides_interpreter_branch() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new().with_pin(PIN);
        let report = sync_all(&config(tmp.path()), &vcs, &SyncOptions::default(), &NoProgress).await;

        let noir = &report.repositories[1];
        assert_eq!(noir.name, "noir");
        assert_eq!(noir.reference.as_deref(), Some(&format!("{} (commit)", PIN)[..]));
        assert!(noir.message.contains("pinned by aztec-packages"), "{}", noir.message);
        assert!(vcs
            .calls()
            .contains(&format!("noir: fetch --depth 1 origin {}", PIN)));
        assert!(!vcs.calls().iter().any(|c| c.contains("--branch master")));
    }

    #[tokio::test]
    async fn failed_pinned_clone_still_names_the_pin() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new()
            .with_pin(PIN)
            .fail_when(&format!("noir: fetch --depth 1 origin {}", PIN));
        let report = sync_all(&config(tmp.path()), &vcs, &SyncOptions::default(), &NoProgress).await;

        assert!(!report.success);
        let noir = &report.repositories[1];
        assert_eq!(noir.action, SyncAction::Failed);
        assert!(noir.message.starts_with("Error cloning noir"), "{}", noir.message);
        assert!(
            noir.message.ends_with("(commit a1b2c3d pinned by aztec-packages)"),
            "{}",
            noir.message
        );
        assert!(report.message.contains("failed: noir"));
    }

    #[tokio::test]
    async fn no_pin_keeps_configured_branch() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new();
        let report = sync_all(&config(tmp.path()), &vcs, &SyncOptions::default(), &NoProgress).await;

        let noir = &report.repositories[1];
        assert_eq!(noir.reference.as_deref(), Some("master (branch)"));
        assert!(!noir.message.contains("pinned"));
    }

    #[tokio::test]
    async fn version_override_stamps_primary_repositories() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new();
        let options = SyncOptions {
            version: Some("v2".to_string()),
            ..Default::default()
        };
        let report = sync_all(&config(tmp.path()), &vcs, &options, &NoProgress).await;

        assert_eq!(report.version, "v2");
        let by_name = |n: &str| {
            report
                .repositories
                .iter()
                .find(|o| o.name == n)
                .and_then(|o| o.reference.clone())
        };
        assert_eq!(by_name("aztec-packages").as_deref(), Some("v2 (tag)"));
        assert_eq!(by_name("aztec-starter").as_deref(), Some("v2 (tag)"));
        assert_eq!(by_name("noir").as_deref(), Some("master (branch)"));
        assert_eq!(by_name("tooling").as_deref(), Some("main (branch)"));
        for outcome in &report.repositories {
            assert_eq!(outcome.commit.as_deref(), Some("0123456"));
        }
    }

    #[tokio::test]
    async fn filter_keeps_ordering_contract() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new();
        let options = SyncOptions {
            repositories: Some(vec![
                "noir".to_string(),
                "noir".to_string(),
                "aztec-packages".to_string(),
                "missing".to_string(),
            ]),
            ..Default::default()
        };
        let report = sync_all(&config(tmp.path()), &vcs, &options, &NoProgress).await;

        assert_eq!(names(&report), vec!["aztec-packages", "noir"]);
    }

    #[tokio::test]
    async fn empty_filter_result_is_failure() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new();
        let options = SyncOptions {
            repositories: Some(vec!["nope".to_string()]),
            ..Default::default()
        };
        let report = sync_all(&config(tmp.path()), &vcs, &options, &NoProgress).await;

        assert!(!report.success);
        assert!(report.repositories.is_empty());
        assert!(vcs.calls().is_empty());
    }

    #[tokio::test]
    async fn monorepo_failure_does_not_abort_batch() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new().fail_when("aztec-packages aztec-packages");
        let report = sync_all(&config(tmp.path()), &vcs, &SyncOptions::default(), &NoProgress).await;

        assert!(!report.success);
        assert_eq!(report.repositories.len(), 4);
        let mono = &report.repositories[0];
        assert_eq!(mono.action, SyncAction::Failed);
        assert!(mono.error.is_some());
        assert!(report.repositories[1..].iter().all(|o| o.success));
        assert!(report.message.contains("failed: aztec-packages"));
    }

    #[tokio::test]
    async fn resync_updates_everything() {
        let tmp = TempDir::new().unwrap();
        let vcs = RecordingVcs::new();
        let cfg = config(tmp.path());
        sync_all(&cfg, &vcs, &SyncOptions::default(), &NoProgress).await;
        let report = sync_all(&cfg, &vcs, &SyncOptions::default(), &NoProgress).await;

        assert!(report
            .repositories
            .iter()
            .all(|o| o.action == SyncAction::Updated));
    }
}
