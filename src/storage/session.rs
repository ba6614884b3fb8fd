//! Session storage: save, load, update, list, and delete sessions.

use rusqlite::{Connection, Transaction};
use uuid::Uuid;

use crate::event_log::EventLog;
use crate::model::{Event, PatientOutcome, Session, SessionMode};

use super::{Result, Storage, StorageError};

impl Storage {
    /// Saves a finished session and its full event record.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let mut conn = self.open_db()?;
        if session_exists(&conn, session.id)? {
            return Err(StorageError::SessionAlreadyExists(session.id));
        }

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO session (id, mode, started_at, ended_at, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                session.id.to_string(),
                session.mode.as_str(),
                session.started_at.to_string(),
                session.ended_at.map(|t| t.to_string()),
                session.outcome.as_str(),
            ],
        )?;
        insert_events(&tx, session)?;
        tx.commit()?;

        log::info!(
            "saved session {} ({} events)",
            session.id,
            session.events.len()
        );
        Ok(())
    }

    /// Replaces a stored session's metadata and event record.
    pub fn update_session(&self, session: &Session) -> Result<()> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        let rows = tx.execute(
            "UPDATE session
             SET mode = ?1, started_at = ?2, ended_at = ?3, outcome = ?4
             WHERE id = ?5",
            rusqlite::params![
                session.mode.as_str(),
                session.started_at.to_string(),
                session.ended_at.map(|t| t.to_string()),
                session.outcome.as_str(),
                session.id.to_string(),
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::SessionNotFound(session.id));
        }
        tx.execute(
            "DELETE FROM event WHERE session_id = ?1",
            [session.id.to_string()],
        )?;
        insert_events(&tx, session)?;
        tx.commit()?;
        Ok(())
    }

    /// Loads a single session with its events.
    pub fn load_session(&self, id: Uuid) -> Result<Session> {
        let conn = self.open_db()?;
        load_session_row(&conn, id)
    }

    /// Lists stored sessions, newest first, optionally only one mode.
    pub fn list_sessions(&self, mode: Option<SessionMode>) -> Result<Vec<Session>> {
        let conn = self.open_db()?;
        let mut stmt = conn.prepare("SELECT id FROM session")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut sessions = Vec::with_capacity(ids.len());
        for id in ids {
            let id = parse_id(&id)?;
            let session = load_session_row(&conn, id)?;
            if mode.is_none_or(|m| m == session.mode) {
                sessions.push(session);
            }
        }
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    /// Deletes a session and its events.
    pub fn delete_session(&self, id: Uuid) -> Result<()> {
        let conn = self.open_db()?;
        let rows = conn.execute("DELETE FROM session WHERE id = ?1", [id.to_string()])?;
        if rows == 0 {
            return Err(StorageError::SessionNotFound(id));
        }
        log::info!("deleted session {id}");
        Ok(())
    }

    /// Deletes every stored session. Returns how many were removed.
    pub fn clear_sessions(&self) -> Result<usize> {
        let conn = self.open_db()?;
        let rows = conn.execute("DELETE FROM session", [])?;
        log::info!("cleared {rows} sessions");
        Ok(rows)
    }
}

fn session_exists(conn: &Connection, id: Uuid) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM session WHERE id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn insert_events(tx: &Transaction<'_>, session: &Session) -> Result<()> {
    let mut stmt = tx.prepare("INSERT INTO event (session_id, seq, body) VALUES (?1, ?2, ?3)")?;
    let id = session.id.to_string();
    for (seq, event) in session.events.iter().enumerate() {
        let body = serde_json::to_string(event)?;
        let seq = i64::try_from(seq).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        stmt.execute(rusqlite::params![id, seq, body])?;
    }
    Ok(())
}

/// Reads one session row and its events.
fn load_session_row(conn: &Connection, id: Uuid) -> Result<Session> {
    let row = conn.query_row(
        "SELECT mode, started_at, ended_at, outcome FROM session WHERE id = ?1",
        [id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );
    let (mode_str, started_at_str, ended_at_opt, outcome_str) = match row {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(StorageError::SessionNotFound(id));
        }
        Err(e) => return Err(e.into()),
    };

    let mode = mode_str
        .parse::<SessionMode>()
        .map_err(StorageError::Corrupt)?;
    let outcome = outcome_str
        .parse::<PatientOutcome>()
        .map_err(StorageError::Corrupt)?;
    let started_at = parse_timestamp("started_at", &started_at_str)?;
    let ended_at = ended_at_opt
        .map(|s| parse_timestamp("ended_at", &s))
        .transpose()?;

    Ok(Session {
        id,
        mode,
        started_at,
        ended_at,
        events: load_events(conn, id)?,
        outcome,
    })
}

fn load_events(conn: &Connection, id: Uuid) -> Result<EventLog> {
    let mut stmt = conn.prepare("SELECT body FROM event WHERE session_id = ?1 ORDER BY seq")?;
    let bodies = stmt
        .query_map([id.to_string()], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    bodies
        .iter()
        .map(|body| serde_json::from_str::<Event>(body).map_err(StorageError::from))
        .collect()
}

fn parse_id(text: &str) -> Result<Uuid> {
    text.parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid session id: {e}")))
}

fn parse_timestamp(column: &str, text: &str) -> Result<jiff::Timestamp> {
    text.parse::<jiff::Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}
