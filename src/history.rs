use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::session::SessionState;

/// One finished session, as written to the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Local>,
    pub difficulty: String,
    pub pack: String,
    pub raw_score: u64,
    pub display_score: u64,
    pub levels_completed: usize,
    pub time_remaining_secs: u32,
    pub reason: String,
}

impl HistoryEntry {
    /// `None` unless the session has ended
    pub fn from_state(state: &SessionState, difficulty: &str, pack: &str) -> Option<Self> {
        let reason = state.end_reason?;
        Some(Self {
            date: Local::now(),
            difficulty: difficulty.to_string(),
            pack: pack.to_string(),
            raw_score: state.raw_score,
            display_score: state.display_score.unwrap_or_default(),
            levels_completed: state.levels_completed,
            time_remaining_secs: state.time_remaining_secs,
            reason: reason.to_string(),
        })
    }
}

/// Append-only CSV log of finished sessions
#[derive(Debug, Clone)]
pub struct SessionHistory {
    path: PathBuf,
}

impl SessionHistory {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, entry: &HistoryEntry) -> csv::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;

        Ok(())
    }

    pub fn entries(&self) -> csv::Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        csv::Reader::from_path(&self.path)?
            .deserialize()
            .collect()
    }
}
