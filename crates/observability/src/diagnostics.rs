use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub at: DateTime<Utc>,
    pub request_id: Uuid,
    pub stage: String,
    pub detail: Value,
}

impl DiagnosticEvent {
    pub fn new(request_id: Uuid, stage: &str, detail: Value) -> Self {
        Self {
            at: Utc::now(),
            request_id,
            stage: stage.to_string(),
            detail,
        }
    }
}

/// Append-only destination for per-request diagnostic events.
///
/// `record` may be called concurrently from any number of requests. Every
/// event is stored whole; no ordering is guaranteed between requests and
/// nothing is ever read back on the request path.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: DiagnosticEvent) {}
}

#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    pub fn stages_for(&self, request_id: Uuid) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.request_id == request_id)
            .map(|event| event.stage.clone())
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

/// One JSON object per line. Each line is written with a single `write_all`
/// while holding the file lock, so concurrent requests never interleave.
#[derive(Debug)]
pub struct JsonlFileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlFileSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed creating diagnostics directory {}", parent.display())
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed opening diagnostics log {}", path.display()))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticSink for JsonlFileSink {
    fn record(&self, event: DiagnosticEvent) {
        let mut line = match serde_json::to_vec(&event) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "diagnostic event not serializable");
                return;
            }
        };
        line.push(b'\n');

        let mut file = self.file.lock();
        if let Err(err) = file.write_all(&line) {
            tracing::warn!(error = %err, path = %self.path.display(), "diagnostic append failed");
        }
    }
}
