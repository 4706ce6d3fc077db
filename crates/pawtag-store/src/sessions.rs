//! Opaque bearer-token sessions.
//!
//! The server keeps an in-memory copy of this table; the rows here are what
//! survive a restart.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;

use pawtag_shared::UserId;

use crate::database::{parse_timestamp, parse_uuid, Database};
use crate::error::{Result, StoreError};

/// A persisted session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Database {
    pub fn insert_session(&self, session: &Session) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![
                    session.token,
                    session.user_id.to_string(),
                    session
                        .created_at
                        .to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )
            .map_err(|e| StoreError::from_write(e, "session token"))?;
        Ok(())
    }

    pub fn get_session(&self, token: &str) -> Result<Session> {
        self.conn()
            .query_row(
                "SELECT token, user_id, created_at FROM sessions WHERE token = ?1",
                params![token],
                row_to_session,
            )
            .map_err(StoreError::from_query)
    }

    /// Every live session, used to warm the in-memory session table.
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT token, user_id, created_at FROM sessions ORDER BY created_at ASC")?;
        let rows = stmt.query_map([], row_to_session)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    /// Returns `true` if the token existed.
    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(affected > 0)
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let user_str: String = row.get(1)?;
    let created_str: String = row.get(2)?;

    Ok(Session {
        token: row.get(0)?,
        user_id: UserId(parse_uuid(1, &user_str)?),
        created_at: parse_timestamp(2, &created_str)?,
    })
}
