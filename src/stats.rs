use crate::challenge::AnswerOutcome;
use crate::game::RoundResult;
use crate::palette::ColorName;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::PathBuf;

/// Default bound on history queries; the engine never assumes more than
/// this many rounds survive on disk.
pub const RECENT_WINDOW: usize = 100;

/// One persisted round, as read back from the database. Deliberately flat:
/// durable analytics do not need the live challenge identity.
#[derive(Debug, Clone)]
pub struct StoredRound {
    pub word: ColorName,
    pub ink_color: ColorName,
    pub selected_color: Option<ColorName>,
    pub outcome: AnswerOutcome,
    pub reaction_time_ms: u64,
    pub timestamp: DateTime<Local>,
}

/// End-of-session summary row.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub finished_at: DateTime<Local>,
    pub total_rounds: usize,
    pub successes: usize,
    pub best_streak: u32,
    pub mean_reaction_ms: Option<f64>,
}

/// Per-ink-color aggregate for the results screen.
#[derive(Debug, Clone)]
pub struct ColorSummary {
    pub ink_color: ColorName,
    pub avg_reaction_ms: f64,
    pub miss_rate: f64,
    pub attempts: i64,
}

/// Database manager for round history and session summaries
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
}

impl StatsDb {
    /// Initialize the database connection and create tables if needed
    pub fn new() -> Result<Self> {
        let db_path =
            crate::app_dirs::AppDirs::db_path().unwrap_or_else(|| PathBuf::from("stroop_stats.db"));

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(&db_path)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS rounds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL,
                ink_color TEXT NOT NULL,
                selected_color TEXT,
                outcome TEXT NOT NULL,
                reaction_time_ms INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                finished_at TEXT NOT NULL,
                total_rounds INTEGER NOT NULL,
                successes INTEGER NOT NULL,
                best_streak INTEGER NOT NULL,
                mean_reaction_ms REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_rounds_ink_color ON rounds(ink_color)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_rounds_timestamp ON rounds(timestamp)",
            [],
        )?;

        Ok(StatsDb { conn })
    }

    /// Record one finished round
    pub fn record_round(&self, round: &RoundResult) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO rounds
            (word, ink_color, selected_color, outcome, reaction_time_ms, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                round.challenge.word.label(),
                round.challenge.ink_color.label(),
                round.selected_color.map(|c| c.label()),
                round.outcome.to_string(),
                round.reaction_time_ms,
                round.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Record a whole session's rounds in one transaction
    pub fn record_rounds_batch(&mut self, rounds: &[RoundResult]) -> Result<()> {
        let tx = self.conn.transaction()?;

        for round in rounds {
            tx.execute(
                r#"
                INSERT INTO rounds
                (word, ink_color, selected_color, outcome, reaction_time_ms, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    round.challenge.word.label(),
                    round.challenge.ink_color.label(),
                    round.selected_color.map(|c| c.label()),
                    round.outcome.to_string(),
                    round.reaction_time_ms,
                    round.timestamp.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Record an end-of-session summary
    pub fn record_session(&self, summary: &SessionSummary) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (finished_at, total_rounds, successes, best_streak, mean_reaction_ms)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                summary.finished_at.to_rfc3339(),
                summary.total_rounds,
                summary.successes,
                summary.best_streak,
                summary.mean_reaction_ms,
            ],
        )?;

        Ok(())
    }

    /// Most recent rounds, newest first, bounded by `limit`
    pub fn recent_rounds(&self, limit: usize) -> Result<Vec<StoredRound>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT word, ink_color, selected_color, outcome, reaction_time_ms, timestamp
            FROM rounds
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let round_iter = stmt.query_map([limit], |row| {
            let timestamp_str: String = row.get(5)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        5,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            let word: String = row.get(0)?;
            let ink: String = row.get(1)?;
            let selected: Option<String> = row.get(2)?;
            let outcome: String = row.get(3)?;

            Ok(StoredRound {
                word: parse_color(0, &word)?,
                ink_color: parse_color(1, &ink)?,
                selected_color: match selected {
                    Some(s) => Some(parse_color(2, &s)?),
                    None => None,
                },
                outcome: outcome.parse().map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        3,
                        "outcome".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?,
                reaction_time_ms: row.get(4)?,
                timestamp,
            })
        })?;

        let mut rounds = Vec::new();
        for round in round_iter {
            rounds.push(round?);
        }

        Ok(rounds)
    }

    /// Best streak ever recorded across all sessions
    pub fn all_time_best_streak(&self) -> Result<Option<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT MAX(best_streak) FROM sessions")?;
        let best: Option<u32> = stmt.query_row([], |row| row.get(0))?;
        Ok(best)
    }

    /// Per-ink-color aggregates: average success reaction time, miss rate
    /// (any non-success outcome), and attempt count
    pub fn color_summary(&self) -> Result<Vec<ColorSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                ink_color,
                AVG(CASE WHEN outcome = 'success' THEN reaction_time_ms END) as avg_reaction,
                (SUM(CASE WHEN outcome != 'success' THEN 1 ELSE 0 END) * 100.0 / COUNT(*)) as miss_rate,
                COUNT(*) as attempts
            FROM rounds
            GROUP BY ink_color
            ORDER BY ink_color
            "#,
        )?;

        let summary_iter = stmt.query_map([], |row| {
            let ink: String = row.get(0)?;
            let avg_reaction: Option<f64> = row.get(1)?;
            let miss_rate: f64 = row.get(2)?;
            let attempts: i64 = row.get(3)?;

            Ok(ColorSummary {
                ink_color: parse_color(0, &ink)?,
                avg_reaction_ms: avg_reaction.unwrap_or(0.0),
                miss_rate,
                attempts,
            })
        })?;

        let mut summary = Vec::new();
        for item in summary_iter {
            summary.push(item?);
        }

        Ok(summary)
    }

    /// Clear all history (for testing or reset purposes)
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM rounds", [])?;
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }
}

fn parse_color(idx: usize, s: &str) -> rusqlite::Result<ColorName> {
    ColorName::parse(s).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(idx, "color".to_string(), rusqlite::types::Type::Text)
    })
}
