//! File and example reads.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::examples::{find_example, list_examples};
use crate::models::FileInfo;

/// An example entry point together with its project files.
#[derive(Debug, Clone, Serialize)]
pub struct ExampleContent {
    pub example: FileInfo,
    /// Source of the entry point.
    pub content: String,
    /// `Nargo.toml` and the other `.nr` files of the project, relative to
    /// the mirror root.
    pub files: Vec<String>,
}

fn resolve(config: &Config, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        config.mirror.root.join(candidate)
    }
}

/// Read a file, absolute or relative to the mirror root.
pub fn read_file(config: &Config, path: &str) -> Option<String> {
    std::fs::read_to_string(resolve(config, path)).ok()
}

/// Read an example by name (see [`find_example`]).
pub fn read_example(config: &Config, name: &str) -> Option<ExampleContent> {
    let examples = list_examples(config, None);
    let example = find_example(&examples, name)?;
    let entry_point = config.mirror.root.join(&example.path);
    let content = std::fs::read_to_string(&entry_point).ok()?;

    let files = project_dir(&entry_point)
        .map(|dir| project_files(&config.mirror.root, dir))
        .unwrap_or_default();

    Some(ExampleContent {
        example,
        content,
        files,
    })
}

/// The directory holding `Nargo.toml`: the parent of `src/` when the entry
/// point lives in one.
fn project_dir(entry_point: &Path) -> Option<&Path> {
    let dir = entry_point.parent()?;
    if dir.file_name().and_then(|n| n.to_str()) == Some("src") && !dir.join("Nargo.toml").exists() {
        dir.parent()
    } else {
        Some(dir)
    }
}

fn project_files(root: &Path, dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .max_depth(4)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && matches!(e.file_name().to_str(), Some("target" | ".git" | "node_modules")))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            name == "Nargo.toml" || name.ends_with(".nr")
        })
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap_or(e.path())
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TOKEN: &str =
        "aztec-packages/noir-projects/noir-contracts/contracts/app/token_contract";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn read_file_relative_absolute_and_missing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "noir/README.md", "# Noir\n");
        let config = Config::with_root(tmp.path());

        assert_eq!(read_file(&config, "noir/README.md").as_deref(), Some("# Noir\n"));
        let abs = tmp.path().join("noir/README.md");
        assert!(read_file(&config, abs.to_str().unwrap()).is_some());
        assert!(read_file(&config, "noir/missing.md").is_none());
        assert!(read_file(&config, "noir").is_none());
    }

    #[test]
    fn read_example_includes_project_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, &format!("{}/src/main.nr", TOKEN), "contract Token {}\n");
        write(root, &format!("{}/src/types.nr", TOKEN), "struct Note {}\n");
        write(root, &format!("{}/Nargo.toml", TOKEN), "[package]\n");
        write(root, &format!("{}/target/debug.nr", TOKEN), "\n");
        let config = Config::with_root(root);

        let found = read_example(&config, "token_contract").unwrap();
        assert_eq!(found.example.name, "token_contract");
        assert_eq!(found.content, "contract Token {}\n");
        assert_eq!(
            found.files,
            vec![
                format!("{}/Nargo.toml", TOKEN),
                format!("{}/src/main.nr", TOKEN),
                format!("{}/src/types.nr", TOKEN),
            ]
        );

        assert!(read_example(&config, "escrow").is_none());
    }
}
