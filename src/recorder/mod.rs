//! Response Recorder - persisted table of guess records
//!
//! The table is a single CSV file holding every participant's records across
//! runs. Each persistence point is a full read-merge-rewrite:
//!
//! ```text
//! load(path) ──> concat(new) ──> dedup keep-last (class_name, user_name) ──> rewrite(path)
//! ```
//!
//! [`ResponseRecorder`] serializes these rewrites within one process and
//! replaces the file by renaming a sibling temp file, so a reader never
//! observes a half-written table. Two *processes* writing the same table can
//! still lose updates.

pub mod log;

pub use log::{calculate_metrics, InteractionLog, LogEvent, LogMetrics};

use crate::session::GuessRecord;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// In-memory copy of the persisted table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseTable {
    records: Vec<GuessRecord>,
}

impl ResponseTable {
    /// Build from records (no dedup applied)
    #[must_use]
    pub fn new(records: Vec<GuessRecord>) -> Self {
        Self { records }
    }

    /// Load the table; an absent file is an empty table.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or decoded
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No response table at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<GuessRecord>, csv::Error>>()?;
        Ok(Self { records })
    }

    /// All records in table order
    #[must_use]
    pub fn records(&self) -> &[GuessRecord] {
        &self.records
    }

    /// Consume into records
    #[must_use]
    pub fn into_records(self) -> Vec<GuessRecord> {
        self.records
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append `new` and drop earlier rows sharing a key with a later one.
    pub fn merge(&mut self, new: &[GuessRecord]) {
        let mut all = std::mem::take(&mut self.records);
        all.extend_from_slice(new);
        self.records = dedup_keep_last(all);
    }

    /// Highest participant id present, if any.
    #[must_use]
    pub fn max_participant_id(&self) -> Option<u64> {
        self.records.iter().map(|r| r.participant_id).max()
    }

    /// Rewrite the whole table at `path` (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the file written
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            for record in &self.records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;

        tmp.persist(path).map_err(|e| {
            Error::StorageError(format!(
                "Failed to replace response table {}: {}",
                path.display(),
                e.error
            ))
        })?;
        Ok(())
    }
}

/// Keep only the last occurrence of each `(class_name, user_name)` key.
///
/// Survivors keep their relative order.
#[must_use]
pub fn dedup_keep_last(records: Vec<GuessRecord>) -> Vec<GuessRecord> {
    let mut last: HashMap<(String, String), usize> = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        last.insert(
            (record.class_label.clone(), record.participant_name.clone()),
            i,
        );
    }

    records
        .into_iter()
        .enumerate()
        .filter(|(i, r)| {
            last.get(&(r.class_label.clone(), r.participant_name.clone())) == Some(i)
        })
        .map(|(_, r)| r)
        .collect()
}

/// Merge `new_records` into the table at `table_path` and rewrite it.
///
/// Unguarded read-modify-write; prefer [`ResponseRecorder::persist`] when
/// several sessions share a process. Returns the resulting row count.
///
/// # Errors
///
/// Returns error if the table cannot be read or written
pub fn persist<P: AsRef<Path>>(table_path: P, new_records: &[GuessRecord]) -> Result<usize> {
    let path = table_path.as_ref();
    let mut table = ResponseTable::load(path)?;
    table.merge(new_records);
    table.write(path)?;
    Ok(table.len())
}

/// Destination for a session's records.
pub trait ResponseSink: Send + Sync {
    /// Merge records into the persisted table.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails
    fn persist(&self, records: &[GuessRecord]) -> Result<()>;

    /// Id for a newly named participant.
    ///
    /// # Errors
    ///
    /// Returns error if the existing table cannot be read
    fn next_participant_id(&self) -> Result<u64>;
}

/// Table recorder serializing read-modify-write within the process.
#[derive(Debug)]
pub struct ResponseRecorder {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ResponseRecorder {
    /// Create a recorder for the table at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Table path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current table.
    ///
    /// # Errors
    ///
    /// Returns error if the table exists but cannot be decoded
    pub fn load(&self) -> Result<ResponseTable> {
        let _guard = self.guard()?;
        ResponseTable::load(&self.path)
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| Error::StorageError("Response table lock poisoned".to_string()))
    }
}

impl ResponseSink for ResponseRecorder {
    fn persist(&self, records: &[GuessRecord]) -> Result<()> {
        let _guard = self.guard()?;
        let rows = persist(&self.path, records)?;
        info!(
            "Persisted {} records to {} ({} rows total)",
            records.len(),
            self.path.display(),
            rows
        );
        Ok(())
    }

    fn next_participant_id(&self) -> Result<u64> {
        let _guard = self.guard()?;
        let table = ResponseTable::load(&self.path)?;
        Ok(table.max_participant_id().map_or(1, |id| id + 1))
    }
}
