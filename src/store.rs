//! Tournament record storage: whole-record load and replace, guarded by a per-record revision.

use crate::models::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Storage failures.
#[derive(Debug)]
pub enum StoreError {
    /// No record with this id.
    NotFound(TournamentId),
    /// The record changed since it was loaded.
    Conflict { expected: u64, actual: u64 },
    /// Snapshot file could not be read or written.
    Io(std::io::Error),
    /// Snapshot file is not valid JSON of the expected shape.
    Format(serde_json::Error),
    /// Lock was poisoned by a panicking writer.
    Poisoned,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Tournament {} not found", id),
            StoreError::Conflict { expected, actual } => write!(
                f,
                "Tournament revision is {} but edit was based on {}",
                actual, expected
            ),
            StoreError::Io(e) => write!(f, "Storage I/O error: {}", e),
            StoreError::Format(e) => write!(f, "Storage format error: {}", e),
            StoreError::Poisoned => write!(f, "Storage lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Format(e)
    }
}

/// A stored record and the revision it was read at.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioned {
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "tournament")]
    pub record: Value,
}

/// Whole-record storage used by the edit protocol.
pub trait Store {
    fn load(&self, id: TournamentId) -> Result<Option<Versioned>, StoreError>;

    /// Replace the record if its revision is still `expected_revision`. Returns the new revision.
    fn replace(
        &self,
        id: TournamentId,
        record: Value,
        expected_revision: u64,
    ) -> Result<u64, StoreError>;
}

/// Snapshot file layout: `{ "tournaments": [record, ...] }`, each record carrying its `id`.
#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    tournaments: Vec<Value>,
}

struct Entry {
    record: Value,
    revision: u64,
    updated_at: DateTime<Utc>,
}

/// In-memory record map, optionally mirrored to a JSON file after every write.
pub struct Database {
    entries: RwLock<BTreeMap<TournamentId, Entry>>,
    path: Option<PathBuf>,
}

fn record_id(record: &Value) -> Option<TournamentId> {
    record.get("id").and_then(Value::as_u64)
}

fn with_id(mut record: Value, id: TournamentId) -> Value {
    if let Some(obj) = record.as_object_mut() {
        obj.insert("id".to_string(), Value::from(id));
    }
    record
}

impl Database {
    /// Empty database that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            path: None,
        }
    }

    /// Build from snapshot bytes (empty input means no records). Writes go to `path` if given.
    /// Records without a numeric `id` are skipped.
    pub fn from_snapshot(bytes: &[u8], path: Option<PathBuf>) -> Result<Self, StoreError> {
        let snapshot: Snapshot = if bytes.iter().all(u8::is_ascii_whitespace) {
            Snapshot::default()
        } else {
            serde_json::from_slice(bytes)?
        };
        let now = Utc::now();
        let mut entries = BTreeMap::new();
        for record in snapshot.tournaments {
            match record_id(&record) {
                Some(id) => {
                    entries.insert(
                        id,
                        Entry {
                            record,
                            revision: 1,
                            updated_at: now,
                        },
                    );
                }
                None => log::warn!("Skipping stored tournament without a numeric id"),
            }
        }
        log::info!("Loaded {} tournament(s)", entries.len());
        Ok(Self {
            entries: RwLock::new(entries),
            path,
        })
    }

    /// Store a new record under the next free id. Returns that id.
    pub fn insert(&self, record: Value) -> Result<TournamentId, StoreError> {
        let mut g = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let id = g.keys().next_back().map_or(1, |last| last + 1);
        g.insert(
            id,
            Entry {
                record: with_id(record, id),
                revision: 1,
                updated_at: Utc::now(),
            },
        );
        if let Err(e) = self.persist(&g) {
            g.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |g| g.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every record to the snapshot file, if one is configured.
    fn persist(&self, entries: &BTreeMap<TournamentId, Entry>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot = Snapshot {
            tournaments: entries.values().map(|e| e.record.clone()).collect(),
        };
        write_snapshot(path, &snapshot)
    }
}

/// Written to a sibling temp file, then renamed over `path`.
fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl Store for Database {
    fn load(&self, id: TournamentId) -> Result<Option<Versioned>, StoreError> {
        let g = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.get(&id).map(|e| Versioned {
            revision: e.revision,
            updated_at: e.updated_at,
            record: e.record.clone(),
        }))
    }

    fn replace(
        &self,
        id: TournamentId,
        record: Value,
        expected_revision: u64,
    ) -> Result<u64, StoreError> {
        let mut g = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let entry = g.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if entry.revision != expected_revision {
            return Err(StoreError::Conflict {
                expected: expected_revision,
                actual: entry.revision,
            });
        }
        let revision = entry.revision + 1;
        let previous = std::mem::replace(
            entry,
            Entry {
                record: with_id(record, id),
                revision,
                updated_at: Utc::now(),
            },
        );
        // The in-memory entry only keeps the new record once the snapshot holds it too.
        if let Err(e) = self.persist(&g) {
            g.insert(id, previous);
            return Err(e);
        }
        Ok(revision)
    }
}
