//! # aztec-mirror CLI
//!
//! ```bash
//! aztec-mirror --config ./config/mirror.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `repos` | List the configured repositories |
//! | `sync` | Clone or update repositories |
//! | `status` | Show which repositories are cloned |
//! | `search "<query>"` | Search code |
//! | `docs "<query>"` | Search documentation |
//! | `examples` | List example contracts |
//! | `example <name>` | Print an example contract |
//! | `read <path>` | Print a mirrored file |
//! | `serve` | Start the HTTP tool server |
//!
//! Logs go to stderr; command output goes to stdout.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use aztec_mirror::config::{self, Config};
use aztec_mirror::examples::list_examples;
use aztec_mirror::git::GitCli;
use aztec_mirror::lookup::{read_example, read_file};
use aztec_mirror::progress::ProgressMode;
use aztec_mirror::registry::Registry;
use aztec_mirror::search::{search_code, search_docs, DocsOptions, SearchOptions};
use aztec_mirror::server;
use aztec_mirror::status::{cloned_names, repository_status};
use aztec_mirror::sync::{sync_all, SyncOptions};

/// Local mirror of the Aztec and Noir repositories, with search.
#[derive(Parser)]
#[command(name = "aztec-mirror", version)]
struct Cli {
    /// Path to configuration file (TOML). A missing file means defaults.
    #[arg(long, global = true, default_value = "./config/mirror.toml")]
    config: PathBuf,

    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured repositories and the refs they track.
    Repos,

    /// Clone missing repositories and update existing ones.
    Sync {
        /// Remove and re-clone existing checkouts.
        #[arg(long)]
        force: bool,

        /// Only sync this repository (repeatable).
        #[arg(long = "repo")]
        repos: Vec<String>,

        /// Release tag for the Aztec repositories (e.g. v2.0.2).
        #[arg(long)]
        version: Option<String>,

        /// Progress output: auto, off, human, or json (stderr).
        #[arg(long, default_value = "auto", value_parser = ProgressMode::parse)]
        progress: ProgressMode,
    },

    /// Show which repositories are cloned and at which commit.
    Status,

    /// Search code (regex; invalid regexes match literally).
    Search {
        query: String,

        /// File glob, e.g. `*.nr`.
        #[arg(long, default_value = "*")]
        pattern: String,

        /// Restrict to one repository.
        #[arg(long)]
        repo: Option<String>,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        case_sensitive: bool,
    },

    /// Search the documentation.
    Docs {
        query: String,

        /// Docs subdirectory, e.g. `developers`.
        #[arg(long)]
        section: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// List example contracts.
    Examples {
        /// Substring filter on name or path.
        #[arg(long)]
        category: Option<String>,
    },

    /// Print an example contract and its project files.
    Example { name: String },

    /// Print a file, relative to the mirror root or absolute.
    Read { path: String },

    /// Start the HTTP tool server on `[server] bind`.
    Serve,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn require_mirror(cfg: &Config) -> Result<()> {
    if cloned_names(cfg).is_empty() {
        bail!(
            "no repositories are cloned under {}; run `aztec-mirror sync` first",
            cfg.mirror.root.display()
        );
    }
    Ok(())
}

fn limit_or_default(cfg: &Config, limit: Option<usize>) -> Result<usize> {
    match limit {
        Some(0) => bail!("--limit must be at least 1"),
        Some(n) => Ok(n),
        None => Ok(cfg.search.default_max_results),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Repos => {
            let registry = Registry::from_config(&cfg);
            println!("{:<18} {:<24} DESCRIPTION", "REPOSITORY", "REF");
            for desc in registry.list_descriptors(None) {
                println!(
                    "{:<18} {:<24} {}",
                    desc.name,
                    desc.clone_ref().to_string(),
                    desc.description
                );
            }
        }
        Commands::Sync {
            force,
            repos,
            version,
            progress,
        } => {
            let vcs = GitCli::from_config(&cfg.git);
            let options = SyncOptions {
                force,
                repositories: if repos.is_empty() { None } else { Some(repos) },
                version,
            };
            let reporter = progress.reporter();
            let report = sync_all(&cfg, &vcs, &options, reporter.as_ref()).await;

            for outcome in &report.repositories {
                println!("{:<18} {}", outcome.name, outcome.message);
                if let Some(err) = &outcome.error {
                    println!("{:<18} error: {}", "", err);
                }
            }
            println!("{} (version {})", report.message, report.version);

            if !report.success {
                bail!("{}", report.message);
            }
        }
        Commands::Status => {
            let vcs = GitCli::from_config(&cfg.git);
            println!("Mirror root: {}", cfg.mirror.root.display());
            println!(
                "{:<18} {:<8} {:<9} {:<22} REF",
                "REPOSITORY", "CLONED", "COMMIT", "COMMITTED"
            );
            for status in repository_status(&cfg, &vcs).await {
                println!(
                    "{:<18} {:<8} {:<9} {:<22} {}",
                    status.name,
                    if status.cloned { "yes" } else { "no" },
                    status.commit.as_deref().unwrap_or("-"),
                    status.committed_at.as_deref().unwrap_or("-"),
                    status.reference
                );
            }
        }
        Commands::Search {
            query,
            pattern,
            repo,
            limit,
            case_sensitive,
        } => {
            require_mirror(&cfg)?;
            let opts = SearchOptions {
                file_pattern: pattern,
                repository: repo,
                max_results: limit_or_default(&cfg, limit)?,
                case_sensitive,
            };
            let results = search_code(&cfg, &query, &opts).await;
            if results.is_empty() {
                println!("No results.");
            }
            for r in &results {
                match r.line {
                    Some(line) => println!("{}:{}: {}", r.file, line, r.content),
                    None => println!("{}: {}", r.file, r.content),
                }
            }
        }
        Commands::Docs {
            query,
            section,
            limit,
        } => {
            require_mirror(&cfg)?;
            let opts = DocsOptions {
                section,
                max_results: limit_or_default(&cfg, limit)?,
            };
            let results = search_docs(&cfg, &query, &opts).await;
            if results.is_empty() {
                println!("No results.");
            }
            for r in &results {
                println!("{}:{}: {}", r.file, r.line.unwrap_or(0), r.content);
            }
        }
        Commands::Examples { category } => {
            require_mirror(&cfg)?;
            let examples = list_examples(&cfg, category.as_deref());
            if examples.is_empty() {
                println!("No examples found.");
            }
            for e in &examples {
                println!("{:<36} {:<10} {}", e.name, e.category.as_str(), e.path);
            }
        }
        Commands::Example { name } => {
            require_mirror(&cfg)?;
            let Some(found) = read_example(&cfg, &name) else {
                bail!("example '{}' not found", name);
            };
            println!("// {} ({})", found.example.name, found.example.path);
            println!("{}", found.content);
            if !found.files.is_empty() {
                println!("// Project files:");
                for file in &found.files {
                    println!("//   {}", file);
                }
            }
        }
        Commands::Read { path } => {
            let Some(content) = read_file(&cfg, &path) else {
                bail!("file not found or unreadable: {}", path);
            };
            print!("{}", content);
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
