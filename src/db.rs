use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSession {
    pub session_id: String,
    pub ball_count: usize,
    pub fetched_at: String,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS recent_sessions (
                session_id TEXT PRIMARY KEY,
                ball_count INTEGER NOT NULL,
                fetched_at TEXT NOT NULL,
                seq INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_recent_sessions_seq ON recent_sessions(seq DESC);
            "#,
        )?;
        Ok(())
    }

    pub fn credential(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM credentials WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
    }

    /// Writes every pair in one transaction so a crash never leaves a mixed
    /// access/refresh pair behind.
    pub fn put_credentials(&mut self, pairs: &[(&str, &str)]) -> rusqlite::Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        for (key, value) in pairs {
            tx.execute(
                r#"
                INSERT INTO credentials (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![key, value, now],
            )?;
        }
        tx.commit()
    }

    pub fn record_session(&self, session_id: &str, ball_count: usize) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO recent_sessions (session_id, ball_count, fetched_at, seq)
            VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(seq), 0) + 1 FROM recent_sessions))
            ON CONFLICT(session_id) DO UPDATE SET
                ball_count = excluded.ball_count,
                fetched_at = excluded.fetched_at,
                seq = excluded.seq
            "#,
            params![session_id, ball_count as i64, now],
        )?;
        Ok(())
    }

    pub fn last_session(&self) -> Result<Option<RecentSession>> {
        Ok(self.list_sessions()?.into_iter().next())
    }

    pub fn list_sessions(&self) -> Result<Vec<RecentSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, ball_count, fetched_at FROM recent_sessions ORDER BY seq DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let ball_count: i64 = row.get(1)?;
            Ok(RecentSession {
                session_id: row.get(0)?,
                ball_count: ball_count.max(0) as usize,
                fetched_at: row.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
