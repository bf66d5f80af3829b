use chrono::{DateTime, Local};
use clap::ValueEnum;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::scoring::Difficulty;
use crate::session::{Mode, SessionSummary};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        completed_at TEXT NOT NULL,
        title TEXT NOT NULL,
        mode TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        wpm INTEGER NOT NULL,
        accuracy INTEGER NOT NULL,
        errors INTEGER NOT NULL,
        typed_length INTEGER NOT NULL,
        elapsed_seconds REAL NOT NULL,
        max_combo INTEGER NOT NULL,
        max_streak INTEGER NOT NULL,
        points INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
"#;

/// One completed session as stored in the history log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub completed_at: DateTime<Local>,
    pub title: String,
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub wpm: u32,
    pub accuracy: u8,
    pub errors: u64,
    pub typed_length: u64,
    pub elapsed_seconds: f64,
    pub max_combo: u32,
    pub max_streak: u32,
    pub points: u64,
}

impl From<&SessionSummary> for HistoryRecord {
    fn from(s: &SessionSummary) -> Self {
        Self {
            completed_at: s.completed_at,
            title: s.title.clone(),
            mode: s.mode,
            difficulty: s.difficulty,
            wpm: s.wpm,
            accuracy: s.accuracy,
            errors: s.errors as u64,
            typed_length: s.typed_length as u64,
            elapsed_seconds: s.elapsed_seconds,
            max_combo: s.max_combo,
            max_streak: s.max_streak,
            points: s.points,
        }
    }
}

fn text_column<T: ValueEnum>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    <T as ValueEnum>::from_str(&raw, true)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn record_from_row(row: &Row) -> rusqlite::Result<HistoryRecord> {
    let timestamp: String = row.get(0)?;
    let completed_at = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?
        .with_timezone(&Local);

    Ok(HistoryRecord {
        completed_at,
        title: row.get(1)?,
        mode: text_column(row, 2)?,
        difficulty: text_column(row, 3)?,
        wpm: row.get(4)?,
        accuracy: row.get(5)?,
        errors: row.get::<_, i64>(6)? as u64,
        typed_length: row.get::<_, i64>(7)? as u64,
        elapsed_seconds: row.get(8)?,
        max_combo: row.get(9)?,
        max_streak: row.get(10)?,
        points: row.get::<_, i64>(11)? as u64,
    })
}

/// SQLite log of every completed session
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening history database");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn record(&self, summary: &SessionSummary) -> Result<()> {
        let r = HistoryRecord::from(summary);
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (completed_at, title, mode, difficulty, wpm, accuracy, errors, typed_length,
             elapsed_seconds, max_combo, max_streak, points)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                r.completed_at.to_rfc3339(),
                r.title,
                r.mode.to_string(),
                r.difficulty.to_string(),
                r.wpm,
                r.accuracy,
                r.errors as i64,
                r.typed_length as i64,
                r.elapsed_seconds,
                r.max_combo,
                r.max_streak,
                r.points as i64,
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions first
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT completed_at, title, mode, difficulty, wpm, accuracy, errors, typed_length,
                   elapsed_seconds, max_combo, max_streak, points
            FROM sessions
            ORDER BY completed_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map([limit as i64], record_from_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Every session, oldest first
    pub fn all(&self) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT completed_at, title, mode, difficulty, wpm, accuracy, errors, typed_length,
                   elapsed_seconds, max_combo, max_streak, points
            FROM sessions
            ORDER BY completed_at ASC, id ASC
            "#,
        )?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn best_wpm(&self) -> Result<Option<u32>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(wpm) FROM sessions", [], |row| row.get(0))?)
    }

    pub fn average_wpm(&self) -> Result<Option<f64>> {
        Ok(self
            .conn
            .query_row("SELECT AVG(wpm) FROM sessions", [], |row| row.get(0))?)
    }

    /// Write the whole log as CSV, oldest first
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let records = self.all()?;

        let mut wtr = csv::Writer::from_writer(writer);
        for record in &records {
            wtr.serialize(ExportRow::from(record))?;
        }
        wtr.flush()?;
        Ok(records.len())
    }
}

#[derive(Serialize)]
struct ExportRow<'a> {
    completed_at: String,
    title: &'a str,
    mode: Mode,
    difficulty: Difficulty,
    wpm: u32,
    accuracy: u8,
    errors: u64,
    typed_length: u64,
    elapsed_seconds: String,
    max_combo: u32,
    max_streak: u32,
    points: u64,
}

impl<'a> From<&'a HistoryRecord> for ExportRow<'a> {
    fn from(r: &'a HistoryRecord) -> Self {
        Self {
            completed_at: r.completed_at.to_rfc3339(),
            title: &r.title,
            mode: r.mode,
            difficulty: r.difficulty,
            wpm: r.wpm,
            accuracy: r.accuracy,
            errors: r.errors,
            typed_length: r.typed_length,
            elapsed_seconds: format!("{:.2}", r.elapsed_seconds),
            max_combo: r.max_combo,
            max_streak: r.max_streak,
            points: r.points,
        }
    }
}
