//! Repository status listing.
//!
//! Reports, for every configured repository, whether it has been cloned
//! and which commit it is at. Used by both the `aztec-mirror status` CLI
//! command and the `status` tool.

use serde::Serialize;

use crate::checkout::{checkout_path, is_cloned};
use crate::config::Config;
use crate::git::Vcs;
use crate::registry::Registry;

/// Status of a single mirrored repository.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryStatus {
    pub name: String,
    pub description: String,
    pub path: String,
    pub cloned: bool,
    /// Configured ref, e.g. `v2.0.2 (tag)`.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Short (7 character) hash of `HEAD`.
    pub commit: Option<String>,
    /// Commit time of `HEAD` (ISO 8601).
    pub committed_at: Option<String>,
}

/// Status of every configured repository, in registry order.
pub async fn repository_status(config: &Config, vcs: &dyn Vcs) -> Vec<RepositoryStatus> {
    let registry = Registry::from_config(config);
    let mut statuses = Vec::with_capacity(registry.len());

    for desc in registry.list_descriptors(None) {
        let path = checkout_path(&config.mirror.root, &desc.name);
        let cloned = is_cloned(&path);

        let (commit, committed_at) = if cloned {
            match vcs.head_commit(&path).await {
                Ok(info) => (
                    Some(info.short()),
                    info.timestamp.and_then(format_ts_iso),
                ),
                Err(_) => (None, None),
            }
        } else {
            (None, None)
        };

        statuses.push(RepositoryStatus {
            reference: desc.clone_ref().to_string(),
            name: desc.name,
            description: desc.description,
            path: path.display().to_string(),
            cloned,
            commit,
            committed_at,
        });
    }

    statuses
}

/// Names of configured repositories that currently have a checkout.
pub fn cloned_names(config: &Config) -> Vec<String> {
    Registry::from_config(config)
        .list_names()
        .into_iter()
        .filter(|name| is_cloned(&checkout_path(&config.mirror.root, name)))
        .collect()
}

fn format_ts_iso(ts: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}
