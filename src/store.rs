use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::achievements::Achievement;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("progress database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("progress value could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("progress directory could not be created: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything that outlives a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurableProgress {
    pub best_streak_ever: u32,
    pub games_played: u64,
    /// Best display score per difficulty name
    pub high_scores: BTreeMap<String, u64>,
    pub achievements: BTreeMap<Achievement, bool>,
}

impl DurableProgress {
    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.achievements.get(&achievement).copied().unwrap_or(false)
    }

    /// Returns true only the first time an achievement is unlocked
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        if self.is_unlocked(achievement) {
            return false;
        }
        self.achievements.insert(achievement, true);
        true
    }

    pub fn high_score(&self, difficulty: &str) -> u64 {
        self.high_scores.get(difficulty).copied().unwrap_or(0)
    }

    /// Returns true when `score` beats the stored best
    pub fn record_score(&mut self, difficulty: &str, score: u64) -> bool {
        if score > self.high_score(difficulty) {
            self.high_scores.insert(difficulty.to_string(), score);
            true
        } else {
            // keep an explicit zero entry so every played difficulty shows up
            self.high_scores.entry(difficulty.to_string()).or_insert(0);
            false
        }
    }
}

/// Synchronous key-value capability the engine persists through
pub trait ProgressStore {
    fn load(&self) -> Result<DurableProgress, StoreError>;
    fn save(&mut self, progress: &DurableProgress) -> Result<(), StoreError>;
}

/// Volatile store for tests and `--ephemeral` runs
#[derive(Debug, Default, Clone)]
pub struct MemoryProgressStore {
    progress: DurableProgress,
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<DurableProgress, StoreError> {
        Ok(self.progress.clone())
    }

    fn save(&mut self, progress: &DurableProgress) -> Result<(), StoreError> {
        self.progress = progress.clone();
        Ok(())
    }
}

const KEY_BEST_STREAK: &str = "best_streak_ever";
const KEY_GAMES_PLAYED: &str = "games_played";
const KEY_HIGH_SCORES: &str = "high_scores";
const KEY_ACHIEVEMENTS: &str = "achievements";

/// SQLite-backed key-value table, one JSON value per durable field
#[derive(Debug)]
pub struct SqliteProgressStore {
    conn: Connection,
}

impl SqliteProgressStore {
    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS progress (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM progress WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

impl ProgressStore for SqliteProgressStore {
    fn load(&self) -> Result<DurableProgress, StoreError> {
        Ok(DurableProgress {
            best_streak_ever: self.get(KEY_BEST_STREAK)?.unwrap_or_default(),
            games_played: self.get(KEY_GAMES_PLAYED)?.unwrap_or_default(),
            high_scores: self.get(KEY_HIGH_SCORES)?.unwrap_or_default(),
            achievements: self.get(KEY_ACHIEVEMENTS)?.unwrap_or_default(),
        })
    }

    fn save(&mut self, progress: &DurableProgress) -> Result<(), StoreError> {
        let values = [
            (KEY_BEST_STREAK, serde_json::to_string(&progress.best_streak_ever)?),
            (KEY_GAMES_PLAYED, serde_json::to_string(&progress.games_played)?),
            (KEY_HIGH_SCORES, serde_json::to_string(&progress.high_scores)?),
            (KEY_ACHIEVEMENTS, serde_json::to_string(&progress.achievements)?),
        ];

        let tx = self.conn.transaction()?;
        for (key, value) in values {
            tx.execute(
                r#"
                INSERT INTO progress (key, value, updated_at)
                VALUES (?1, ?2, CURRENT_TIMESTAMP)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
                "#,
                params![key, value],
            )?;
        }
        tx.commit()?;

        Ok(())
    }
}
