//! Code and documentation search over the mirrored tree.
//!
//! There is no index: every query re-scans the checkouts.
//!
//! 1. **Primary**: ripgrep, invoked with an explicit argument list (no
//!    shell), so the query reaches it verbatim: regex syntax such as
//!    `a|b.*c+` keeps working and shell metacharacters need no escaping.
//!    Output is read line by line up to `2 × max_results` matches or
//!    `search.max_output_bytes`, whichever comes first, under
//!    `search.timeout_secs`. Hidden and ignore-listed files are searched,
//!    and matched lines come back whole, so both strategies see the same
//!    files and return the same content.
//! 2. **Fallback**: when ripgrep cannot be run (missing binary, timeout,
//!    hard error), a sorted `walkdir` scan with `globset` file filtering and
//!    the `regex` crate. Queries that are not valid regexes are matched as
//!    literals. Zero matches from ripgrep is a result, not a failure.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobMatcher};
use regex::{Regex, RegexBuilder};
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::models::{repository_of, SearchResult};

/// Directories never searched.
const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules"];

/// File pattern used for documentation search.
pub const DOCS_PATTERN: &str = "*.{md,mdx}";

/// Options for [`search_code`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Glob applied to file paths (e.g. `*.nr`).
    pub file_pattern: String,
    /// Restrict the search to one repository.
    pub repository: Option<String>,
    pub max_results: usize,
    pub case_sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            file_pattern: "*".to_string(),
            repository: None,
            max_results: 50,
            case_sensitive: false,
        }
    }
}

/// Options for [`search_docs`].
#[derive(Debug, Clone, Default)]
pub struct DocsOptions {
    /// Documentation subdirectory, e.g. `developers`.
    pub section: Option<String>,
    pub max_results: usize,
}

/// Search code across the mirror, or one repository of it.
pub async fn search_code(config: &Config, query: &str, opts: &SearchOptions) -> Vec<SearchResult> {
    let scope = match opts.repository.as_deref().map(str::trim) {
        Some(repo) if !repo.is_empty() => match relative_path(repo) {
            Some(path) => path,
            None => return Vec::new(),
        },
        _ => PathBuf::from("."),
    };

    search_scope(
        config,
        query,
        &scope,
        &opts.file_pattern,
        opts.max_results,
        opts.case_sensitive,
    )
    .await
}

/// Search markdown documentation inside the monorepo.
///
/// A `section` that does not exist on disk widens the search to the whole
/// documentation tree.
pub async fn search_docs(config: &Config, query: &str, opts: &DocsOptions) -> Vec<SearchResult> {
    let docs_root = PathBuf::from(&config.mirror.monorepo).join(&config.mirror.docs_path);

    let scope = opts
        .section
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(relative_path)
        .map(|section| docs_root.join(section))
        .filter(|candidate| config.mirror.root.join(candidate).is_dir())
        .unwrap_or(docs_root);

    search_scope(config, query, &scope, DOCS_PATTERN, opts.max_results, false).await
}

/// Accept only plain relative paths (no `..`, no root).
fn relative_path(value: &str) -> Option<PathBuf> {
    let path = Path::new(value);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| path.to_path_buf())
}

async fn search_scope(
    config: &Config,
    query: &str,
    scope: &Path,
    pattern: &str,
    max_results: usize,
    case_sensitive: bool,
) -> Vec<SearchResult> {
    let root = config.mirror.root.clone();
    let abs_scope = root.join(scope);
    if max_results == 0 || !abs_scope.exists() {
        return Vec::new();
    }

    match ripgrep(config, query, scope, pattern, max_results, case_sensitive).await {
        Ok(mut results) => {
            results.truncate(max_results);
            results
        }
        Err(err) => {
            warn!(error = %err, "ripgrep unavailable, using manual search");
            let query = query.to_string();
            let pattern = pattern.to_string();
            tokio::task::spawn_blocking(move || {
                manual_search(&root, &abs_scope, &query, &pattern, max_results, case_sensitive)
            })
            .await
            .unwrap_or_default()
        }
    }
}

/// Arguments for one ripgrep invocation, run from the mirror root.
pub fn ripgrep_args(query: &str, scope: &Path, pattern: &str, case_sensitive: bool) -> Vec<String> {
    let mut args: Vec<String> = [
        "--no-config",
        "--line-number",
        "--no-heading",
        "--with-filename",
        "--color",
        "never",
        "--hidden",
        "--no-ignore",
        "--glob",
        pattern,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for dir in EXCLUDED_DIRS {
        args.push("--glob".to_string());
        args.push(format!("!{}", dir));
    }

    args.push(if case_sensitive {
        "--case-sensitive".to_string()
    } else {
        "--ignore-case".to_string()
    });
    args.push("-e".to_string());
    args.push(query.to_string());
    args.push(scope.to_string_lossy().to_string());
    args
}

async fn ripgrep(
    config: &Config,
    query: &str,
    scope: &Path,
    pattern: &str,
    max_results: usize,
    case_sensitive: bool,
) -> Result<Vec<SearchResult>> {
    let args = ripgrep_args(query, scope, pattern, case_sensitive);
    debug!(binary = %config.search.ripgrep_binary, ?args, "running ripgrep");

    let mut child = Command::new(&config.search.ripgrep_binary)
        .args(&args)
        .current_dir(&config.mirror.root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to execute '{}'", config.search.ripgrep_binary))?;

    let stdout = child
        .stdout
        .take()
        .context("ripgrep stdout was not captured")?;
    let cap = max_results.saturating_mul(2);
    let byte_limit = config.search.max_output_bytes;
    let timeout = Duration::from_secs(config.search.timeout_secs);

    let collected = tokio::time::timeout(timeout, async {
        let mut reader = BufReader::new(stdout);
        let mut results = Vec::new();
        let mut line = Vec::new();
        let mut bytes = 0u64;
        let mut stopped_early = false;

        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line).await?;
            if n == 0 {
                break;
            }
            bytes += n as u64;
            let text = String::from_utf8_lossy(&line);
            if let Some(result) = parse_ripgrep_line(text.trim_end_matches(['\n', '\r'])) {
                results.push(result);
            }
            if results.len() >= cap || bytes >= byte_limit {
                stopped_early = true;
                let _ = child.start_kill();
                break;
            }
        }

        let status = child.wait().await?;
        Ok::<_, std::io::Error>((results, status, stopped_early))
    })
    .await;

    let (results, status, stopped_early) = match collected {
        Ok(inner) => inner.context("failed to read ripgrep output")?,
        Err(_) => bail!("ripgrep timed out after {}s", timeout.as_secs()),
    };

    // 0 = matches, 1 = no matches, 2 = error (possibly with partial output).
    match status.code() {
        Some(0) | Some(1) => Ok(results),
        _ if stopped_early => Ok(results),
        Some(2) if !results.is_empty() => Ok(results),
        _ => bail!("ripgrep exited with {}", status),
    }
}

/// Parse one `path:line:content` line of ripgrep output.
pub fn parse_ripgrep_line(line: &str) -> Option<SearchResult> {
    let (file, rest) = line.split_once(':')?;
    let (line_no, content) = rest.split_once(':')?;
    let line_no = line_no.parse::<u64>().ok()?;
    let file = file.trim_start_matches("./");
    if file.is_empty() {
        return None;
    }

    Some(SearchResult {
        file: file.to_string(),
        line: Some(line_no),
        content: content.trim().to_string(),
        repository: repository_of(file),
    })
}

fn build_query_regex(query: &str, case_sensitive: bool) -> Option<Regex> {
    RegexBuilder::new(query)
        .case_insensitive(!case_sensitive)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(query))
                .case_insensitive(!case_sensitive)
                .build()
        })
        .ok()
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && EXCLUDED_DIRS
            .iter()
            .any(|dir| entry.file_name() == std::ffi::OsStr::new(dir))
}

fn file_matches(matcher: &GlobMatcher, relative: &Path) -> bool {
    matcher.is_match(relative)
        || relative
            .file_name()
            .map(|name| matcher.is_match(Path::new(name)))
            .unwrap_or(false)
}

/// Line-by-line scan of `scope` without external tools.
///
/// Results carry paths relative to `root`. The cap is checked before each
/// file and each line; unreadable or non-UTF-8 files are skipped.
pub fn manual_search(
    root: &Path,
    scope: &Path,
    query: &str,
    pattern: &str,
    max_results: usize,
    case_sensitive: bool,
) -> Vec<SearchResult> {
    let mut results = Vec::new();

    let Some(regex) = build_query_regex(query, case_sensitive) else {
        return results;
    };
    let matcher = match Glob::new(pattern) {
        Ok(glob) => glob.compile_matcher(),
        Err(err) => {
            debug!(pattern, error = %err, "invalid file pattern");
            return results;
        }
    };

    let walker = WalkDir::new(scope)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e));

    for entry in walker.filter_map(|e| e.ok()) {
        if results.len() >= max_results {
            break;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let within_scope = path.strip_prefix(scope).unwrap_or(path);
        if !file_matches(&matcher, within_scope) {
            continue;
        }

        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let repository = repository_of(&relative);

        for (idx, line) in content.lines().enumerate() {
            if results.len() >= max_results {
                break;
            }
            if regex.is_match(line) {
                results.push(SearchResult {
                    file: relative.clone(),
                    line: Some(idx as u64 + 1),
                    content: line.trim().to_string(),
                    repository: repository.clone(),
                });
            }
        }
    }

    results
}
