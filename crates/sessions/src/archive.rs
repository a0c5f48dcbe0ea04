//! Persistent conversation archive.
//!
//! One JSON document maps each session id to its ordered list of
//! exchanges. The whole map is cached in memory after the first load;
//! writes go to a temp file and are renamed into place so a crash never
//! leaves a half-written archive. Ancillary notes (image-analysis
//! summaries and similar) live in a sibling document with the same shape.
//! A document that fails to parse is renamed to `<name>.corrupt-<time>`
//! and the archive starts empty, so the next write cannot clobber it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use tg_domain::config::ArchiveConfig;
use tg_domain::error::{Error, Result};
use tg_domain::trace::TraceEvent;

/// One archived user/assistant exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub user: String,
    pub assistant: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

/// Free-form context attached to a session outside the dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionNote {
    #[serde(default = "d_note_kind")]
    pub kind: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

fn d_note_kind() -> String {
    "note".into()
}

type RecordMap = HashMap<String, Vec<ConversationRecord>>;
type NoteMap = HashMap<String, Vec<SessionNote>>;

pub struct ConversationArchive {
    path: PathBuf,
    notes_path: PathBuf,
    retention: usize,
    records: RwLock<RecordMap>,
    notes: RwLock<NoteMap>,
    /// Serializes writers so snapshots hit disk in order.
    write_lock: tokio::sync::Mutex<()>,
}

impl ConversationArchive {
    /// Open (or lazily create) the archive described by `config`.
    pub async fn open(config: &ArchiveConfig) -> Result<Self> {
        let path = config.path.clone();
        let notes_path = config.notes_path.clone();

        let records: RecordMap = load_json_map(path.clone()).await?;
        let notes: NoteMap = load_json_map(notes_path.clone()).await?;

        tracing::info!(
            sessions = records.len(),
            path = %path.display(),
            "conversation archive loaded"
        );

        Ok(Self {
            path,
            notes_path,
            retention: config.retention_per_session,
            records: RwLock::new(records),
            notes: RwLock::new(notes),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one exchange and persist. Records beyond the per-session
    /// retention count are dropped oldest first.
    pub async fn append(&self, record: ConversationRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let session_id = record.session_id.clone();

        let snapshot = {
            let mut records = self.records.read().clone();
            let list = records.entry(session_id.clone()).or_default();
            list.push(record);
            if list.len() > self.retention {
                let excess = list.len() - self.retention;
                list.drain(..excess);
            }
            records
        };

        // Disk first; the cache only moves once the write succeeded.
        write_json_atomic(self.path.clone(), &snapshot).await?;
        let kept = snapshot.get(&session_id).map_or(0, Vec::len);
        *self.records.write() = snapshot;

        TraceEvent::ArchiveAppend {
            session_id,
            records: kept,
        }
        .emit();
        Ok(())
    }

    /// Up to `limit` records for a session, newest first.
    pub fn recent(&self, session_id: &str, limit: usize) -> Vec<ConversationRecord> {
        self.records
            .read()
            .get(session_id)
            .map(|list| list.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.records.read().len()
    }

    pub async fn add_note(&self, session_id: &str, note: SessionNote) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let snapshot = {
            let mut notes = self.notes.read().clone();
            let list = notes.entry(session_id.to_owned()).or_default();
            list.push(note);
            if list.len() > self.retention {
                let excess = list.len() - self.retention;
                list.drain(..excess);
            }
            notes
        };
        write_json_atomic(self.notes_path.clone(), &snapshot).await?;
        *self.notes.write() = snapshot;
        Ok(())
    }

    /// All notes for a session, oldest first.
    pub fn notes(&self, session_id: &str) -> Vec<SessionNote> {
        self.notes
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }
}

// ── Private helpers ───────────────────────────────────────────────

async fn load_json_map<T>(path: PathBuf) -> Result<T>
where
    T: DeserializeOwned + Default + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        if !path.exists() {
            return Ok(T::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        if raw.trim().is_empty() {
            return Ok(T::default());
        }
        match serde_json::from_str(&raw) {
            Ok(v) => Ok(v),
            Err(e) => {
                let aside = quarantine_path(&path, Utc::now());
                std::fs::rename(&path, &aside).map_err(Error::Io)?;
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "archive file unreadable, moved aside and starting empty"
                );
                Ok(T::default())
            }
        }
    })
    .await
    .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
}

/// `conversations.json` -> `conversations.json.corrupt-20260101T120000Z`.
fn quarantine_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", at.format("%Y%m%dT%H%M%SZ")));
    path.with_file_name(name)
}

async fn write_json_atomic<T: Serialize>(path: PathBuf, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    tokio::task::spawn_blocking(move || {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(Error::Io)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(Error::Io)?;
        std::fs::rename(&tmp, &path).map_err(Error::Io)?;
        Ok::<(), Error>(())
    })
    .await
    .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
}
