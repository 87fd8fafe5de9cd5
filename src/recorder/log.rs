//! Interaction log - append-only record of session events
//!
//! One CSV file per process start (`study_logs_YYYYmmdd_HHMMSS.csv`) with
//! columns `session_id, timestamp, phase, event_type, data`, where `data` is
//! a JSON document. Rows are only ever appended.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// One logged interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Session the event belongs to
    pub session_id: String,
    /// Wall-clock time of the event
    pub timestamp: DateTime<Utc>,
    /// Coarse study phase (`welcome`, `guessing`, `teaching`, `testing`)
    pub phase: String,
    /// Event name, e.g. `guess_submitted`
    pub event_type: String,
    /// JSON-encoded payload
    pub data: String,
}

impl LogEvent {
    /// Decoded payload
    ///
    /// # Errors
    ///
    /// Returns error if `data` is not valid JSON
    pub fn payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.data)?)
    }
}

/// Append-only interaction log writer.
#[derive(Debug)]
pub struct InteractionLog {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl InteractionLog {
    /// Start a new timestamped log file inside `log_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn create<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let dir = log_dir.as_ref();
        fs::create_dir_all(dir)?;
        let name = format!("study_logs_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
        Self::open(dir.join(name))
    }

    /// Open (or create) a log file for appending.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(["session_id", "timestamp", "phase", "event_type", "data"])?;
            writer.flush()?;
        }

        debug!("Interaction log at {}", path.display());
        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    /// Log file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event and flush it to disk.
    ///
    /// # Errors
    ///
    /// Returns error if the row cannot be written
    pub fn log_interaction(
        &self,
        session_id: &str,
        phase: &str,
        event_type: &str,
        data: &serde_json::Value,
    ) -> Result<()> {
        let event = LogEvent {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            phase: phase.to_string(),
            event_type: event_type.to_string(),
            data: serde_json::to_string(data)?,
        };

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| crate::Error::StorageError("Interaction log lock poisoned".to_string()))?;
        writer.serialize(&event)?;
        writer.flush()?;
        Ok(())
    }
}

/// Read every event of a log file.
///
/// # Errors
///
/// Returns error if the file cannot be read or a row fails to decode
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<LogEvent>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let events = reader
        .deserialize()
        .collect::<std::result::Result<Vec<LogEvent>, csv::Error>>()?;
    Ok(events)
}

/// Summary figures over one interaction log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMetrics {
    /// Distinct session ids
    pub total_participants: usize,
    /// Events recorded
    pub total_events: usize,
}

/// Compute [`LogMetrics`]; an absent file yields zeroes.
///
/// # Errors
///
/// Returns error if the file exists but cannot be decoded
pub fn calculate_metrics<P: AsRef<Path>>(path: P) -> Result<LogMetrics> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(LogMetrics::default());
    }

    let events = read_events(path)?;
    let sessions: HashSet<&str> = events.iter().map(|e| e.session_id.as_str()).collect();
    Ok(LogMetrics {
        total_participants: sessions.len(),
        total_events: events.len(),
    })
}
