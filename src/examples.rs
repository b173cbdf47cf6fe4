//! Example contract discovery.
//!
//! An example is a `main.nr` entry point under one of the configured
//! example roots. Its name is the directory that owns it, skipping the
//! conventional `src` directory, so `token_contract/src/main.nr` is the
//! `token_contract` example.

use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::models::{repository_of, FileCategory, FileInfo};

const ENTRY_POINT: &str = "main.nr";
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Classify a file by extension and path.
pub fn classify(path: &str) -> FileCategory {
    let lower = path.to_lowercase();
    let ext = Path::new(&lower)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match ext {
        "nr" if lower.contains("test") => FileCategory::Test,
        "nr" => FileCategory::Contract,
        "ts" | "tsx" => FileCategory::Source,
        "md" | "mdx" => FileCategory::Documentation,
        _ => FileCategory::Other,
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

fn example_name(entry_point: &Path) -> Option<String> {
    let mut dir = entry_point.parent()?;
    if dir.file_name().and_then(|n| n.to_str()) == Some("src") {
        dir = dir.parent()?;
    }
    dir.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

/// Every example under the configured roots, sorted by path.
///
/// `category` keeps examples whose name or path contains it
/// (case-insensitive). Missing roots contribute nothing.
pub fn list_examples(config: &Config, category: Option<&str>) -> Vec<FileInfo> {
    let root = &config.mirror.root;
    let mut examples = Vec::new();

    for example_root in &config.mirror.example_roots {
        let dir = root.join(example_root);
        if !dir.is_dir() {
            continue;
        }

        let walker = WalkDir::new(&dir)
            .into_iter()
            .filter_entry(|e| !is_skipped(e));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || entry.file_name() != ENTRY_POINT {
                continue;
            }
            let Some(name) = example_name(entry.path()) else {
                continue;
            };
            let path = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");

            examples.push(FileInfo {
                repository: repository_of(&path),
                category: classify(&path),
                name,
                path,
            });
        }
    }

    examples.sort_by(|a, b| a.path.cmp(&b.path));
    examples.dedup_by(|a, b| a.path == b.path);

    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(filter) => {
            let filter = filter.to_lowercase();
            examples
                .into_iter()
                .filter(|e| {
                    e.name.to_lowercase().contains(&filter)
                        || e.path.to_lowercase().contains(&filter)
                })
                .collect()
        }
        None => examples,
    }
}

/// Resolve an example by name: exact match first, then the first
/// substring match on name or path.
pub fn find_example(examples: &[FileInfo], name: &str) -> Option<FileInfo> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    examples
        .iter()
        .find(|e| e.name.to_lowercase() == needle)
        .or_else(|| {
            examples.iter().find(|e| {
                e.name.to_lowercase().contains(&needle) || e.path.to_lowercase().contains(&needle)
            })
        })
        .cloned()
}
