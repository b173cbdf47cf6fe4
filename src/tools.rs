//! Caller-facing tools.
//!
//! Every operation an agent can invoke is a [`Tool`] registered in a
//! [`ToolRegistry`]. The HTTP server lists them at `GET /tools/list` and
//! dispatches `POST /tools/{name}` to [`Tool::execute`], which decodes the
//! JSON body into the tool's own parameter struct with [`parse_params`].
//!
//! Results always have the shape `{ "success": bool, "message": string, ... }`.
//! Missing repositories, examples, or files are reported in-band with
//! `success: false`. The only errors a tool raises are [`InvalidParams`]:
//! a body that is not an object, a missing required field, a wrong JSON
//! type, an empty query, or a zero result limit.
//!
//! | Tool | Payload |
//! |------|---------|
//! | `sync` | `version`, `repositories` (per-repository outcomes) |
//! | `status` | `mirror_root`, `repositories` |
//! | `search_code` | `results` |
//! | `search_docs` | `results` |
//! | `list_examples` | `examples` |
//! | `read_example` | `example`, `content`, `files` |
//! | `read_file` | `path`, `content` |

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::Config;
use crate::examples::list_examples;
use crate::git::Vcs;
use crate::lookup::{read_example, read_file};
use crate::progress::NoProgress;
use crate::search::{search_code, search_docs, DocsOptions, SearchOptions};
use crate::status::{cloned_names, repository_status};
use crate::sync::{sync_all, SyncOptions};

/// A parameter validation failure. Maps to HTTP 400.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct InvalidParams(pub String);

fn invalid(message: impl Into<String>) -> anyhow::Error {
    InvalidParams(message.into()).into()
}

/// Tool metadata returned by `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// An operation callable by an agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name (`POST /tools/{name}`).
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// JSON Schema of the parameters object, for listing only.
    fn parameters_schema(&self) -> Value;

    /// Run the tool on the raw request body.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;

    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Shared state handed to every tool invocation.
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<Config>,
    pub vcs: Arc<dyn Vcs>,
    /// Held for the whole of a sync; checkouts are rewritten in place.
    sync_lock: Arc<Mutex<()>>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, vcs: Arc<dyn Vcs>) -> Self {
        Self {
            config,
            vcs,
            sync_lock: Arc::new(Mutex::new(())),
        }
    }

    /// `Some(response)` when nothing has been cloned yet.
    fn require_mirror(&self) -> Option<Value> {
        if cloned_names(&self.config).is_empty() {
            Some(failure(
                "No repositories are cloned. Run the sync tool first.",
            ))
        } else {
            None
        }
    }
}

fn failure(message: impl Into<String>) -> Value {
    json!({ "success": false, "message": message.into() })
}

fn success(message: impl Into<String>, payload: Value) -> Value {
    let mut obj = Map::new();
    obj.insert("success".to_string(), Value::Bool(true));
    obj.insert("message".to_string(), Value::String(message.into()));
    if let Value::Object(fields) = payload {
        obj.extend(fields);
    }
    Value::Object(obj)
}

/// Decode a request body into a tool's parameter struct. `null` is an
/// empty object; unknown fields are ignored.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T> {
    let params = match params {
        Value::Null => Value::Object(Map::new()),
        Value::Object(_) => params,
        _ => return Err(invalid("parameters must be a JSON object")),
    };
    serde_json::from_value(params).map_err(|e| invalid(e.to_string()))
}

fn non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

/// Blank strings count as absent.
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn limit(value: Option<u64>, field: &str, default: usize) -> Result<usize> {
    match value {
        None => Ok(default),
        Some(0) => Err(invalid(format!("{} must be a positive integer", field))),
        Some(n) => Ok(usize::try_from(n).unwrap_or(usize::MAX)),
    }
}

#[derive(Debug, Deserialize)]
struct SyncParams {
    force: Option<bool>,
    repositories: Option<Vec<String>>,
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchCodeParams {
    query: String,
    file_pattern: Option<String>,
    repository: Option<String>,
    max_results: Option<u64>,
    case_sensitive: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SearchDocsParams {
    query: String,
    section: Option<String>,
    max_results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListExamplesParams {
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadExampleParams {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReadFileParams {
    path: String,
}

/// Clone or update the mirrored repositories.
pub struct SyncTool;

#[async_trait]
impl Tool for SyncTool {
    fn name(&self) -> &str {
        "sync"
    }

    fn description(&self) -> &str {
        "Clone or update the Aztec and Noir repositories at a version"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "force": { "type": "boolean", "description": "Re-clone even if present", "default": false },
                "repositories": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Only sync these repositories"
                },
                "version": { "type": "string", "description": "Tag for the Aztec repositories, e.g. v2.0.2" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let params: SyncParams = parse_params(params)?;
        let options = SyncOptions {
            force: params.force.unwrap_or(false),
            version: given(&params.version).map(str::to_string),
            repositories: params.repositories,
        };

        let _running = match ctx.sync_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                info!("another sync is running, waiting for it to finish");
                ctx.sync_lock.lock().await
            }
        };
        let report = sync_all(&ctx.config, ctx.vcs.as_ref(), &options, &NoProgress).await;
        Ok(serde_json::to_value(&report)?)
    }
}

/// Report which repositories are cloned and at which commit.
pub struct StatusTool;

#[async_trait]
impl Tool for StatusTool {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "Show which repositories are cloned and their commits"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let _: Map<String, Value> = parse_params(params)?;
        let statuses = repository_status(&ctx.config, ctx.vcs.as_ref()).await;
        let cloned = statuses.iter().filter(|s| s.cloned).count();
        Ok(success(
            format!("{} of {} repositories cloned", cloned, statuses.len()),
            json!({
                "mirror_root": ctx.config.mirror.root.display().to_string(),
                "repositories": statuses,
            }),
        ))
    }
}

/// Regex search over mirrored source code.
pub struct SearchCodeTool;

#[async_trait]
impl Tool for SearchCodeTool {
    fn name(&self) -> &str {
        "search_code"
    }

    fn description(&self) -> &str {
        "Search Noir and TypeScript code in the cloned repositories (regex)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Regex or literal text" },
                "file_pattern": { "type": "string", "description": "File glob, e.g. *.nr", "default": "*" },
                "repository": { "type": "string", "description": "Restrict to one repository" },
                "max_results": { "type": "integer", "description": "Max results" },
                "case_sensitive": { "type": "boolean", "default": false }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let params: SearchCodeParams = parse_params(params)?;
        let query = non_empty(&params.query, "query")?;
        let opts = SearchOptions {
            file_pattern: given(&params.file_pattern).unwrap_or("*").to_string(),
            repository: given(&params.repository).map(str::to_string),
            max_results: limit(
                params.max_results,
                "max_results",
                ctx.config.search.default_max_results,
            )?,
            case_sensitive: params.case_sensitive.unwrap_or(false),
        };

        if let Some(response) = ctx.require_mirror() {
            return Ok(response);
        }

        let results = search_code(&ctx.config, query, &opts).await;
        Ok(success(
            format!("Found {} results for '{}'", results.len(), query),
            json!({ "results": results }),
        ))
    }
}

/// Search the monorepo documentation.
pub struct SearchDocsTool;

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        "search_docs"
    }

    fn description(&self) -> &str {
        "Search the Aztec documentation (markdown)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Regex or literal text" },
                "section": { "type": "string", "description": "Docs subdirectory, e.g. developers" },
                "max_results": { "type": "integer", "description": "Max results" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let params: SearchDocsParams = parse_params(params)?;
        let query = non_empty(&params.query, "query")?;
        let opts = DocsOptions {
            section: given(&params.section).map(str::to_string),
            max_results: limit(
                params.max_results,
                "max_results",
                ctx.config.search.default_max_results,
            )?,
        };

        if let Some(response) = ctx.require_mirror() {
            return Ok(response);
        }

        let results = search_docs(&ctx.config, query, &opts).await;
        Ok(success(
            format!("Found {} documentation matches for '{}'", results.len(), query),
            json!({ "results": results }),
        ))
    }
}

/// List example contracts.
pub struct ListExamplesTool;

#[async_trait]
impl Tool for ListExamplesTool {
    fn name(&self) -> &str {
        "list_examples"
    }

    fn description(&self) -> &str {
        "List example Aztec contracts"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "Substring filter on name or path, e.g. token" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let params: ListExamplesParams = parse_params(params)?;

        if let Some(response) = ctx.require_mirror() {
            return Ok(response);
        }

        let config = Arc::clone(&ctx.config);
        let category = given(&params.category).map(str::to_string);
        let examples =
            tokio::task::spawn_blocking(move || list_examples(&config, category.as_deref()))
                .await?;
        Ok(success(
            format!("Found {} examples", examples.len()),
            json!({ "examples": examples }),
        ))
    }
}

/// Read an example contract with its project files.
pub struct ReadExampleTool;

#[async_trait]
impl Tool for ReadExampleTool {
    fn name(&self) -> &str {
        "read_example"
    }

    fn description(&self) -> &str {
        "Read the source of an example contract by name"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Example name, e.g. token_contract" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let params: ReadExampleParams = parse_params(params)?;
        let name = non_empty(&params.name, "name")?.to_string();

        if let Some(response) = ctx.require_mirror() {
            return Ok(response);
        }

        let config = Arc::clone(&ctx.config);
        let wanted = name.clone();
        let found = tokio::task::spawn_blocking(move || read_example(&config, &wanted)).await?;
        match found {
            Some(found) => Ok(success(
                format!("Example '{}' at {}", found.example.name, found.example.path),
                serde_json::to_value(&found)?,
            )),
            None => Ok(failure(format!("Example '{}' not found", name))),
        }
    }
}

/// Read any file in the mirror.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file from the cloned repositories"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path relative to the mirror root, or absolute" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let params: ReadFileParams = parse_params(params)?;
        let path = non_empty(&params.path, "path")?.to_string();

        let config = Arc::clone(&ctx.config);
        let wanted = path.clone();
        let content = tokio::task::spawn_blocking(move || read_file(&config, &wanted)).await?;
        match content {
            Some(content) => Ok(success(
                format!("Read {} bytes", content.len()),
                json!({ "path": path, "content": content }),
            )),
            None => Ok(failure(format!("File not found or unreadable: {}", path))),
        }
    }
}

/// Registered tools, in listing order.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry holding every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SyncTool));
        registry.register(Box::new(StatusTool));
        registry.register(Box::new(SearchCodeTool));
        registry.register(Box::new(SearchDocsTool));
        registry.register(Box::new(ListExamplesTool));
        registry.register(Box::new(ReadExampleTool));
        registry.register(Box::new(ReadFileTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools.iter().map(|t| t.info()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::RecordingVcs;
    use crate::git::{CommitInfo, GitError, ResetMode};
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn context(root: &Path) -> ToolContext {
        let mut config = Config::with_root(root);
        config.search.ripgrep_binary = "/nonexistent/rg".to_string();
        ToolContext::new(Arc::new(config), Arc::new(RecordingVcs::new()))
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn cloned_mirror() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("aztec-packages/.git")).unwrap();
        write(
            root,
            "aztec-packages/noir-projects/noir-contracts/contracts/app/token_contract/src/main.nr",
            "contract Token {\n    fn transfer() {}\n}\n",
        );
        write(
            root,
            "aztec-packages/noir-projects/noir-contracts/contracts/app/token_contract/Nargo.toml",
            "[package]\nname = \"token_contract\"\n",
        );
        write(root, "aztec-packages/docs/intro.md", "Private transfer\n");
        tmp
    }

    async fn call(ctx: &ToolContext, name: &str, params: Value) -> Result<Value> {
        let registry = ToolRegistry::with_builtins();
        let tool = registry.find(name).unwrap();
        tool.execute(params, ctx).await
    }

    #[test]
    fn builtins_are_registered_in_order() {
        let registry = ToolRegistry::with_builtins();
        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "sync",
                "status",
                "search_code",
                "search_docs",
                "list_examples",
                "read_example",
                "read_file"
            ]
        );
        assert!(registry.find("unknown").is_none());
    }

    #[test]
    fn params_reject_missing_and_mistyped_fields() {
        let err = parse_params::<SearchCodeParams>(json!({})).unwrap_err();
        assert!(err.downcast_ref::<InvalidParams>().is_some());
        assert!(err.to_string().contains("query"), "{}", err);

        let err = parse_params::<SearchCodeParams>(json!({ "query": 5 })).unwrap_err();
        assert!(err.downcast_ref::<InvalidParams>().is_some());

        let err = parse_params::<SearchCodeParams>(json!({ "query": "x", "max_results": -1 }))
            .unwrap_err();
        assert!(err.downcast_ref::<InvalidParams>().is_some());

        let err = parse_params::<SyncParams>(json!(["noir"])).unwrap_err();
        assert!(err.to_string().contains("object"));
    }

    #[test]
    fn absent_and_null_params_take_defaults() {
        let sync: SyncParams = parse_params(Value::Null).unwrap();
        assert!(sync.force.is_none());
        assert!(sync.repositories.is_none());

        let search: SearchCodeParams = parse_params(json!({
            "query": "x",
            "file_pattern": null,
            "case_sensitive": null,
            "extra": true
        }))
        .unwrap();
        assert_eq!(given(&search.file_pattern), None);
        assert_eq!(search.case_sensitive, None);
        assert_eq!(limit(search.max_results, "max_results", 50).unwrap(), 50);
        assert!(limit(Some(0), "max_results", 50).is_err());
    }

    #[tokio::test]
    async fn zero_limit_is_invalid() {
        let tmp = cloned_mirror();
        let ctx = context(tmp.path());
        let err = call(&ctx, "search_docs", json!({ "query": "x", "max_results": 0 }))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<InvalidParams>().is_some());
    }

    #[tokio::test]
    async fn empty_query_is_invalid() {
        let tmp = cloned_mirror();
        let ctx = context(tmp.path());
        let err = call(&ctx, "search_code", json!({ "query": "   " }))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<InvalidParams>().is_some());
    }

    #[tokio::test]
    async fn search_before_sync_fails_in_band() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let out = call(&ctx, "search_code", json!({ "query": "transfer" }))
            .await
            .unwrap();
        assert_eq!(out["success"], false);
        assert!(out["message"].as_str().unwrap().contains("sync"));
    }

    #[tokio::test]
    async fn search_code_and_docs() {
        let tmp = cloned_mirror();
        let ctx = context(tmp.path());

        let code = call(
            &ctx,
            "search_code",
            json!({ "query": "fn transfer", "file_pattern": "*.nr" }),
        )
        .await
        .unwrap();
        assert_eq!(code["success"], true);
        assert_eq!(code["results"].as_array().unwrap().len(), 1);
        assert_eq!(code["results"][0]["line"], 2);

        let docs = call(&ctx, "search_docs", json!({ "query": "private" }))
            .await
            .unwrap();
        assert_eq!(docs["results"][0]["file"], "aztec-packages/docs/intro.md");
    }

    #[tokio::test]
    async fn examples_and_files() {
        let tmp = cloned_mirror();
        let ctx = context(tmp.path());

        let listed = call(&ctx, "list_examples", json!({})).await.unwrap();
        assert_eq!(listed["examples"][0]["name"], "token_contract");

        let example = call(&ctx, "read_example", json!({ "name": "token" }))
            .await
            .unwrap();
        assert_eq!(example["success"], true);
        assert!(example["content"].as_str().unwrap().contains("contract Token"));

        let missing = call(&ctx, "read_example", json!({ "name": "escrow" }))
            .await
            .unwrap();
        assert_eq!(missing["success"], false);

        let file = call(
            &ctx,
            "read_file",
            json!({ "path": "aztec-packages/docs/intro.md" }),
        )
        .await
        .unwrap();
        assert_eq!(file["content"], "Private transfer\n");

        let gone = call(&ctx, "read_file", json!({ "path": "nope.md" }))
            .await
            .unwrap();
        assert_eq!(gone["success"], false);
    }

    #[tokio::test]
    async fn sync_rejects_non_string_names() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let err = call(&ctx, "sync", json!({ "repositories": ["noir", 3] }))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<InvalidParams>().is_some());
    }

    /// Counts clones in flight; each clone yields to the scheduler midway.
    struct OverlapVcs {
        inner: RecordingVcs,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Vcs for OverlapVcs {
        async fn clone_repo(&self, url: &str, dest: &Path, flags: &[&str]) -> Result<(), GitError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let result = self.inner.clone_repo(url, dest, flags).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn fetch(&self, repo: &Path, args: &[&str]) -> Result<(), GitError> {
            self.inner.fetch(repo, args).await
        }

        async fn reset(&self, repo: &Path, mode: ResetMode, target: &str) -> Result<(), GitError> {
            self.inner.reset(repo, mode, target).await
        }

        async fn pull(&self, repo: &Path) -> Result<(), GitError> {
            self.inner.pull(repo).await
        }

        async fn checkout(&self, repo: &Path, reference: &str) -> Result<(), GitError> {
            self.inner.checkout(repo, reference).await
        }

        async fn raw(&self, repo: &Path, args: &[&str]) -> Result<String, GitError> {
            self.inner.raw(repo, args).await
        }

        async fn head_commit(&self, repo: &Path) -> Result<CommitInfo, GitError> {
            self.inner.head_commit(repo).await
        }
    }

    #[tokio::test]
    async fn concurrent_syncs_run_one_at_a_time() {
        let tmp = TempDir::new().unwrap();
        let vcs = Arc::new(OverlapVcs {
            inner: RecordingVcs::new(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let ctx = ToolContext::new(Arc::new(Config::with_root(tmp.path())), vcs.clone());
        let params = json!({ "force": true, "repositories": ["noir-examples", "aztec-starter"] });

        let other = ctx.clone();

        let (first, second) = tokio::join!(
            call(&ctx, "sync", params.clone()),
            call(&other, "sync", params.clone())
        );

        assert_eq!(first.unwrap()["success"], true);
        assert_eq!(second.unwrap()["success"], true);
        assert_eq!(vcs.peak.load(Ordering::SeqCst), 1);
        let clones = vcs
            .inner
            .calls()
            .iter()
            .filter(|c| c.starts_with("clone"))
            .count();
        assert_eq!(clones, 4);
    }

    #[tokio::test]
    async fn sync_reports_outcomes() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let out = call(&ctx, "sync", json!({ "repositories": ["noir-examples"] }))
            .await
            .unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(out["repositories"][0]["name"], "noir-examples");
        assert_eq!(out["repositories"][0]["action"], "cloned");

        let status = call(&ctx, "status", json!({})).await.unwrap();
        let cloned: Vec<&Value> = status["repositories"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|r| r["cloned"] == true)
            .collect();
        assert_eq!(cloned.len(), 1);
    }
}
