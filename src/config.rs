//! Configuration parsing and validation.
//!
//! The configuration is read once at process start from a TOML file, then
//! two environment overrides are applied (`AZTEC_MIRROR_ROOT` and
//! `AZTEC_MIRROR_VERSION`). The resulting [`Config`] is treated as immutable
//! for the lifetime of the process and handed to every component
//! explicitly; nothing below `main` reads the environment.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::models::RepositoryDescriptor;

/// Environment variable overriding `[mirror].root`.
pub const ROOT_ENV: &str = "AZTEC_MIRROR_ROOT";
/// Environment variable overriding `[mirror].default_version`.
pub const VERSION_ENV: &str = "AZTEC_MIRROR_VERSION";

/// Release tag checked out for primary-namespace repositories when no
/// version is requested.
pub const DEFAULT_VERSION: &str = "v2.0.2";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Repositories to mirror. Empty means the built-in set.
    #[serde(default)]
    pub repositories: Vec<RepositoryDescriptor>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MirrorConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_version")]
    pub default_version: String,
    #[serde(default = "default_primary_org")]
    pub primary_org: String,
    #[serde(default = "default_companion_org")]
    pub companion_org: String,
    #[serde(default = "default_monorepo")]
    pub monorepo: String,
    #[serde(default = "default_companion_interpreter")]
    pub companion_interpreter: String,
    /// Gitlink path inside the monorepo that pins the interpreter commit.
    #[serde(default = "default_pin_path")]
    pub pin_path: String,
    #[serde(default = "default_docs_path")]
    pub docs_path: String,
    /// Directories (relative to `root`) scanned for `main.nr` examples.
    #[serde(default = "default_example_roots")]
    pub example_roots: Vec<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            default_version: default_version(),
            primary_org: default_primary_org(),
            companion_org: default_companion_org(),
            monorepo: default_monorepo(),
            companion_interpreter: default_companion_interpreter(),
            pin_path: default_pin_path(),
            docs_path: default_docs_path(),
            example_roots: default_example_roots(),
        }
    }
}

fn default_root() -> PathBuf {
    directories::ProjectDirs::from("", "", "aztec-mirror")
        .map(|dirs| dirs.data_dir().join("repos"))
        .unwrap_or_else(|| PathBuf::from("./repos"))
}
fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}
fn default_primary_org() -> String {
    "AztecProtocol".to_string()
}
fn default_companion_org() -> String {
    "noir-lang".to_string()
}
fn default_monorepo() -> String {
    "aztec-packages".to_string()
}
fn default_companion_interpreter() -> String {
    "noir".to_string()
}
fn default_pin_path() -> String {
    "noir/noir-repo".to_string()
}
fn default_docs_path() -> String {
    "docs".to_string()
}
fn default_example_roots() -> Vec<String> {
    vec![
        "aztec-packages/noir-projects/noir-contracts/contracts".to_string(),
        "aztec-examples".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitConfig {
    #[serde(default = "default_git_binary")]
    pub binary: String,
    #[serde(default = "default_git_timeout")]
    pub timeout_secs: u64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
            timeout_secs: default_git_timeout(),
        }
    }
}

fn default_git_binary() -> String {
    "git".to_string()
}
fn default_git_timeout() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_ripgrep_binary")]
    pub ripgrep_binary: String,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: u64,
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ripgrep_binary: default_ripgrep_binary(),
            timeout_secs: default_search_timeout(),
            max_output_bytes: default_max_output_bytes(),
            default_max_results: default_max_results(),
        }
    }
}

fn default_ripgrep_binary() -> String {
    "rg".to_string()
}
fn default_search_timeout() -> u64 {
    30
}
fn default_max_output_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_max_results() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Built-in configuration used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            mirror: MirrorConfig::default(),
            git: GitConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
            repositories: Vec::new(),
        }
    }

    /// Same as [`Config::minimal`] but rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::minimal();
        config.mirror.root = root.into();
        config
    }

    /// Apply the process-level overrides. Called once by [`load_config`].
    pub fn apply_overrides(&mut self, root: Option<String>, version: Option<String>) {
        if let Some(root) = root.filter(|r| !r.trim().is_empty()) {
            self.mirror.root = PathBuf::from(root);
        }
        if let Some(version) = version.filter(|v| !v.trim().is_empty()) {
            self.mirror.default_version = version;
        }
    }

    /// Absolute checkout directory for a repository name.
    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.mirror.root.join(name)
    }
}

/// Load the config file at `path`, falling back to built-in defaults when
/// the file does not exist, then apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::minimal()
    };

    config.apply_overrides(std::env::var(ROOT_ENV).ok(), std::env::var(VERSION_ENV).ok());
    validate(&config)?;
    Ok(config)
}

/// Parse TOML text into a [`Config`] without touching the environment.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.mirror.default_version.trim().is_empty() {
        bail!("mirror.default_version must not be empty");
    }
    if config.git.timeout_secs == 0 {
        bail!("git.timeout_secs must be > 0");
    }
    if config.search.timeout_secs == 0 {
        bail!("search.timeout_secs must be > 0");
    }
    if config.search.default_max_results == 0 {
        bail!("search.default_max_results must be >= 1");
    }

    let mut seen = HashSet::new();
    for repo in &config.repositories {
        if repo.name.trim().is_empty() {
            bail!("repository name must not be empty");
        }
        if !is_single_component(&repo.name) {
            bail!(
                "repository name '{}' must be a single directory name under mirror.root",
                repo.name
            );
        }
        if repo.url.trim().is_empty() {
            bail!("repository '{}' has an empty url", repo.name);
        }
        if !seen.insert(repo.name.as_str()) {
            bail!("duplicate repository name: '{}'", repo.name);
        }
    }

    Ok(())
}

/// Checkouts live at `root/<name>`; `..`, separators and absolute paths
/// would escape the root.
fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
