//! Sync progress reporting.
//!
//! Reports which repository is being materialized and how it went, so a
//! long sync of several large repositories is observable. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for sync.
#[derive(Clone, Debug)]
pub enum SyncProgressEvent {
    /// Repository `n` of `total` is about to be cloned or updated.
    Started { repo: String, n: usize, total: usize },
    /// Repository finished; `ok` is false when its outcome is a failure.
    Finished { repo: String, ok: bool, detail: String },
}

/// Reports sync progress. Implementations write to stderr (human or JSON).
pub trait SyncProgressReporter: Send + Sync {
    fn report(&self, event: SyncProgressEvent);
}

/// Human-friendly progress on stderr: "sync [2/5] noir ...".
pub struct StderrProgress;

impl SyncProgressReporter for StderrProgress {
    fn report(&self, event: SyncProgressEvent) {
        let line = match &event {
            SyncProgressEvent::Started { repo, n, total } => {
                format!("sync [{}/{}] {} ...\n", n, total, repo)
            }
            SyncProgressEvent::Finished { repo, ok, detail } => {
                let mark = if *ok { "ok" } else { "FAILED" };
                format!("sync {}  {}  {}\n", repo, mark, detail)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl SyncProgressReporter for JsonProgress {
    fn report(&self, event: SyncProgressEvent) {
        let obj = match &event {
            SyncProgressEvent::Started { repo, n, total } => serde_json::json!({
                "event": "progress",
                "repo": repo,
                "phase": "started",
                "n": n,
                "total": total
            }),
            SyncProgressEvent::Finished { repo, ok, detail } => serde_json::json!({
                "event": "progress",
                "repo": repo,
                "phase": "finished",
                "ok": ok,
                "detail": detail
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SyncProgressReporter for NoProgress {
    fn report(&self, _event: SyncProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a `--progress` value; `auto` defers to [`default_for_tty`](Self::default_for_tty).
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "auto" => Ok(Self::default_for_tty()),
            "off" | "none" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "unknown progress mode '{}': expected auto, off, human or json",
                other
            )),
        }
    }

    pub fn reporter(&self) -> Box<dyn SyncProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
