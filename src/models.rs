//! Core data models shared by the sync and search engines.
//!
//! Descriptors are immutable values: version stamping and pin propagation
//! produce new descriptors via [`RepositoryDescriptor::with_tag`] and
//! [`RepositoryDescriptor::pinned_to_commit`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static configuration of one mirrored repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse_paths: Option<Vec<String>>,
    #[serde(default)]
    pub description: String,
}

/// The ref a clone or update resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSpec {
    Tag(String),
    Commit(String),
    Branch(String),
    DefaultBranch,
}

impl RefSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            RefSpec::Tag(_) => "tag",
            RefSpec::Commit(_) => "commit",
            RefSpec::Branch(_) => "branch",
            RefSpec::DefaultBranch => "default branch",
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            RefSpec::Tag(v) | RefSpec::Commit(v) | RefSpec::Branch(v) => Some(v),
            RefSpec::DefaultBranch => None,
        }
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefSpec::DefaultBranch => write!(f, "default branch"),
            other => write!(f, "{} ({})", other.value().unwrap_or_default(), other.kind()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RepositoryDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            tag: None,
            branch: None,
            commit: None,
            sparse_paths: None,
            description: String::new(),
        }
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn sparse<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sparse_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// How to clone: tag > commit > branch.
    pub fn clone_ref(&self) -> RefSpec {
        if let Some(tag) = non_empty(&self.tag) {
            RefSpec::Tag(tag.to_string())
        } else if let Some(commit) = non_empty(&self.commit) {
            RefSpec::Commit(commit.to_string())
        } else if let Some(branch) = non_empty(&self.branch) {
            RefSpec::Branch(branch.to_string())
        } else {
            RefSpec::DefaultBranch
        }
    }

    /// What the initial clone names: tag > branch. Commits are never
    /// resolvable by `clone --branch`.
    pub fn initial_ref(&self) -> RefSpec {
        if let Some(tag) = non_empty(&self.tag) {
            RefSpec::Tag(tag.to_string())
        } else if let Some(branch) = non_empty(&self.branch) {
            RefSpec::Branch(branch.to_string())
        } else {
            RefSpec::DefaultBranch
        }
    }

    /// Non-empty sparse path list, if this descriptor uses a narrowed checkout.
    pub fn sparse_set(&self) -> Option<&[String]> {
        self.sparse_paths
            .as_deref()
            .filter(|paths| !paths.is_empty())
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse_set().is_some()
    }

    pub fn with_tag(&self, tag: Option<&str>) -> Self {
        let mut next = self.clone();
        next.tag = tag.map(str::to_string);
        next
    }

    /// Re-derive this descriptor pinned to an exact commit.
    pub fn pinned_to_commit(&self, commit: &str) -> Self {
        let mut next = self.clone();
        next.commit = Some(commit.to_string());
        next.branch = None;
        next.tag = None;
        next
    }
}

/// What the engine did for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Cloned,
    Updated,
    Failed,
}

/// One repository's result after a sync attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub name: String,
    pub success: bool,
    pub action: SyncAction,
    /// Display text; never inspected to decide success.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl SyncOutcome {
    pub fn failed(name: &str, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            action: SyncAction::Failed,
            message: message.into(),
            error: Some(error.into()),
            reference: None,
            commit: None,
        }
    }
}

/// Batch result of a sync call.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub success: bool,
    pub message: String,
    pub version: String,
    pub repositories: Vec<SyncOutcome>,
}

/// One search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Path relative to the mirror root.
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    pub content: String,
    pub repository: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Contract,
    Test,
    Source,
    Documentation,
    Other,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Contract => "contract",
            FileCategory::Test => "test",
            FileCategory::Source => "source",
            FileCategory::Documentation => "documentation",
            FileCategory::Other => "other",
        }
    }
}

/// A discovered example or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Path relative to the mirror root.
    pub path: String,
    pub name: String,
    pub repository: String,
    pub category: FileCategory,
}

/// First path segment of a mirror-relative path.
pub fn repository_of(relative_path: &str) -> String {
    relative_path
        .trim_start_matches("./")
        .split(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_wins_for_both_precedences() {
        let mut desc = RepositoryDescriptor::new("r", "u").branch("main");
        desc.tag = Some("v1".into());
        desc.commit = Some("abc".into());
        assert_eq!(desc.clone_ref(), RefSpec::Tag("v1".into()));
        assert_eq!(desc.initial_ref(), RefSpec::Tag("v1".into()));
    }

    #[test]
    fn commit_beats_branch_only_for_clone_strategy() {
        let mut desc = RepositoryDescriptor::new("r", "u").branch("main");
        desc.commit = Some("abc1234".into());
        assert_eq!(desc.clone_ref(), RefSpec::Commit("abc1234".into()));
        assert_eq!(desc.initial_ref(), RefSpec::Branch("main".into()));
    }

    #[test]
    fn blank_refs_are_ignored() {
        let mut desc = RepositoryDescriptor::new("r", "u");
        desc.tag = Some(" ".into());
        assert_eq!(desc.clone_ref(), RefSpec::DefaultBranch);
    }

    #[test]
    fn empty_sparse_list_is_full_checkout() {
        let desc = RepositoryDescriptor::new("r", "u").sparse(Vec::<String>::new());
        assert!(!desc.is_sparse());
        let desc = desc.sparse(["docs"]);
        assert!(desc.is_sparse());
    }

    #[test]
    fn pinning_clears_branch_and_tag() {
        let mut desc = RepositoryDescriptor::new("noir", "u").branch("master");
        desc.tag = Some("v1".into());
        let pinned = desc.pinned_to_commit("deadbeef");
        assert_eq!(pinned.clone_ref(), RefSpec::Commit("deadbeef".into()));
        assert!(pinned.branch.is_none());
        assert_eq!(desc.branch.as_deref(), Some("master"));
    }

    #[test]
    fn ref_display_names_kind() {
        assert_eq!(RefSpec::Tag("v2".into()).to_string(), "v2 (tag)");
        assert_eq!(RefSpec::DefaultBranch.to_string(), "default branch");
    }

    #[test]
    fn repository_is_first_segment() {
        assert_eq!(repository_of("aztec-packages/docs/a.md"), "aztec-packages");
        assert_eq!(repository_of("./noir/x.nr"), "noir");
        assert_eq!(repository_of(""), "");
    }
}
