//! Repository registry.
//!
//! Holds the static list of repository descriptors and derives
//! version-stamped copies of it. Only repositories owned by the primary
//! organization follow release tags; companion and tooling repositories
//! keep whatever branch or commit they were configured with.
//!
//! ```text
//! github.com/AztecProtocol/*  → tag = version (override or default)
//! github.com/noir-lang/*      → tag cleared, branch/commit kept
//! anything else               → tag cleared, branch/commit kept
//! ```

use std::collections::HashSet;

use crate::config::Config;
use crate::models::RepositoryDescriptor;

/// Static set of mirrored repositories plus the namespace rules used for
/// version stamping and sync ordering.
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: Vec<RepositoryDescriptor>,
    primary_org: String,
    companion_org: String,
    default_version: String,
}

impl Registry {
    /// Build the registry from `[[repositories]]`, or the built-in set when
    /// the config lists none.
    pub fn from_config(config: &Config) -> Self {
        let descriptors = if config.repositories.is_empty() {
            default_repositories()
        } else {
            config.repositories.clone()
        };

        Self {
            descriptors,
            primary_org: config.mirror.primary_org.clone(),
            companion_org: config.mirror.companion_org.clone(),
            default_version: config.mirror.default_version.clone(),
        }
    }

    /// All descriptors, version-stamped.
    ///
    /// Primary-namespace descriptors get `tag = version_override` (or the
    /// default version); every other descriptor is returned with no tag.
    pub fn list_descriptors(&self, version_override: Option<&str>) -> Vec<RepositoryDescriptor> {
        let version = version_override
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_version);

        self.descriptors
            .iter()
            .map(|desc| {
                if self.is_primary(desc) {
                    desc.with_tag(Some(version))
                } else {
                    desc.with_tag(None)
                }
            })
            .collect()
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&RepositoryDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Configured names, in order, without duplicates.
    pub fn list_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.descriptors
            .iter()
            .filter(|d| seen.insert(d.name.as_str()))
            .map(|d| d.name.clone())
            .collect()
    }

    pub fn is_primary(&self, desc: &RepositoryDescriptor) -> bool {
        in_namespace(&desc.url, &self.primary_org)
    }

    pub fn is_companion(&self, desc: &RepositoryDescriptor) -> bool {
        in_namespace(&desc.url, &self.companion_org)
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Owner segment of a git remote URL.
///
/// Handles `https://host/owner/repo(.git)`, `ssh://git@host/owner/repo`,
/// `git@host:owner/repo.git` and local `file://` paths (owner is the parent
/// directory name).
pub fn url_owner(url: &str) -> Option<&str> {
    let url = url.trim().trim_end_matches('/');

    let path = if let Some((_, rest)) = url.split_once("://") {
        // Drop the authority part.
        rest.split_once('/').map(|(_, p)| p)?
    } else if let Some((_, rest)) = url.split_once(':') {
        // scp-like syntax: git@github.com:owner/repo.git
        rest
    } else {
        url
    };

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.pop()?;
    segments.pop()
}

fn in_namespace(url: &str, org: &str) -> bool {
    url_owner(url)
        .map(|owner| owner.eq_ignore_ascii_case(org))
        .unwrap_or(false)
}

/// The repositories mirrored when the config does not list any.
pub fn default_repositories() -> Vec<RepositoryDescriptor> {
    vec![
        RepositoryDescriptor::new(
            "aztec-packages",
            "https://github.com/AztecProtocol/aztec-packages",
        )
        .sparse([
            "docs",
            "noir-projects/aztec-nr",
            "noir-projects/noir-contracts",
            "yarn-project/aztec.js/src",
            "yarn-project/end-to-end/src",
        ])
        .describe("Aztec monorepo: docs, Aztec.nr, contracts and aztec.js"),
        RepositoryDescriptor::new(
            "aztec-examples",
            "https://github.com/AztecProtocol/aztec-examples",
        )
        .describe("Example Aztec contracts and apps"),
        RepositoryDescriptor::new(
            "aztec-starter",
            "https://github.com/AztecProtocol/aztec-starter",
        )
        .describe("Starter project for Aztec contract development"),
        RepositoryDescriptor::new("noir", "https://github.com/noir-lang/noir")
            .branch("master")
            .sparse(["docs", "noir_stdlib", "examples"])
            .describe("Noir language: compiler docs and standard library"),
        RepositoryDescriptor::new("noir-examples", "https://github.com/noir-lang/noir-examples")
            .branch("master")
            .describe("Noir example circuits"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::from_config(&Config::minimal())
    }

    #[test]
    fn url_owner_parses_common_forms() {
        assert_eq!(
            url_owner("https://github.com/AztecProtocol/aztec-packages"),
            Some("AztecProtocol")
        );
        assert_eq!(
            url_owner("https://github.com/noir-lang/noir.git/"),
            Some("noir-lang")
        );
        assert_eq!(
            url_owner("git@github.com:AztecProtocol/aztec-starter.git"),
            Some("AztecProtocol")
        );
        assert_eq!(url_owner("file:///tmp/remotes/noir-lang/noir"), Some("noir-lang"));
        assert_eq!(url_owner("https://github.com"), None);
    }

    #[test]
    fn override_stamps_only_primary_namespace() {
        let reg = registry();
        for desc in reg.list_descriptors(Some("v2")) {
            if reg.is_primary(&desc) {
                assert_eq!(desc.tag.as_deref(), Some("v2"), "{}", desc.name);
            } else {
                assert!(desc.tag.is_none(), "{}", desc.name);
            }
        }
    }

    #[test]
    fn no_override_uses_default_version() {
        let reg = registry();
        let descs = reg.list_descriptors(None);
        let monorepo = descs.iter().find(|d| d.name == "aztec-packages").unwrap();
        assert_eq!(monorepo.tag.as_deref(), Some(reg.default_version()));
        let noir = descs.iter().find(|d| d.name == "noir").unwrap();
        assert!(noir.tag.is_none());
        assert_eq!(noir.branch.as_deref(), Some("master"));
    }

    #[test]
    fn stamping_does_not_mutate_registry() {
        let reg = registry();
        let _ = reg.list_descriptors(Some("v9"));
        assert!(reg.lookup_by_name("aztec-packages").unwrap().tag.is_none());
    }

    #[test]
    fn companion_tag_is_cleared_even_if_configured() {
        let mut config = Config::minimal();
        let mut noir = RepositoryDescriptor::new("noir", "https://github.com/noir-lang/noir");
        noir.tag = Some("v1.0.0".into());
        config.repositories = vec![noir];
        let reg = Registry::from_config(&config);
        assert!(reg.list_descriptors(Some("v3"))[0].tag.is_none());
    }

    #[test]
    fn names_keep_order() {
        let names = registry().list_names();
        assert_eq!(names.first().map(String::as_str), Some("aztec-packages"));
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn namespace_matching_is_case_insensitive() {
        let reg = registry();
        let desc = RepositoryDescriptor::new("x", "https://github.com/aztecprotocol/x");
        assert!(reg.is_primary(&desc));
        assert!(!reg.is_companion(&desc));
    }
}
