//! # aztec-mirror
//!
//! Keeps a local mirror of the Aztec and Noir source repositories at a
//! chosen release and lets an agent search and read it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────┐
//! │ Registry │──▶│   Sync   │──▶│ Clone/Update │──▶ <root>/<repo>/
//! └──────────┘   └──────────┘   │ (git, sparse)│         │
//!                               └──────────────┘         │
//!                      ┌─────────────────────────────────┤
//!                      ▼                                 ▼
//!                ┌──────────┐                     ┌──────────┐
//!                │  Search  │                     │  Lookup  │
//!                │ rg / scan│                     │ examples │
//!                └────┬─────┘                     └────┬─────┘
//!                     └──────────┬─────────────────────┘
//!                                ▼
//!                    ┌──────────────────────┐
//!                    │ Tools: CLI and HTTP  │
//!                    └──────────────────────┘
//! ```
//!
//! Sync clones the monorepo first, reads the interpreter commit it pins
//! (`noir/noir-repo`), and checks the companion `noir` repository out at
//! that exact commit, so both trees describe the same release.
//!
//! ## Quick Start
//!
//! ```bash
//! aztec-mirror sync --version v2.0.2
//! aztec-mirror search "fn transfer" --pattern "*.nr"
//! aztec-mirror docs "private state" --section developers
//! aztec-mirror example token_contract
//! aztec-mirror serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`models`] | Descriptors, outcomes, search results |
//! | [`registry`] | The set of repositories to mirror |
//! | [`git`] | `Vcs` trait and the git CLI implementation |
//! | [`checkout`] | Clone or update one repository |
//! | [`sync`] | Ordered sync of all repositories with pin propagation |
//! | [`progress`] | Sync progress reporting |
//! | [`status`] | Which repositories are cloned, at which commit |
//! | [`search`] | Code and documentation search |
//! | [`examples`] | Example contract discovery |
//! | [`lookup`] | File and example reads |
//! | [`tools`] | Caller-facing operations |
//! | [`server`] | HTTP tool server |

pub mod checkout;
pub mod config;
pub mod examples;
pub mod git;
pub mod lookup;
pub mod models;
pub mod progress;
pub mod registry;
pub mod search;
pub mod server;
pub mod status;
pub mod sync;
pub mod tools;
