use crate::error::{Result, StoreError};
use dialdeck_core::domain::{CallDirection, CallSession, ContactId, SessionId};
use dialdeck_core::dto::CallLogDto;
use rusqlite::{params, Connection, Row};
use std::str::FromStr;
use tracing::debug;

pub struct CallLogRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CallLogRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Writes a finished session. Returns `None` for sessions with nothing to
    /// log; writing the same session again is a no-op.
    pub fn record_session(&self, session: &CallSession) -> Result<Option<CallLogDto>> {
        let Some(entry) = CallLogDto::from_session(session) else {
            return Ok(None);
        };
        self.add(&entry)?;
        Ok(Some(entry))
    }

    pub fn add(&self, entry: &CallLogDto) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO call_log
                (session_id, contact_id, direction, number, final_status, started_at,
                 ended_at, duration_secs, failure, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                entry.session_id.to_string(),
                entry.contact_id.as_ref().map(ContactId::as_str),
                entry.direction,
                entry.number,
                entry.final_status,
                entry.started_at,
                entry.ended_at,
                entry.duration_secs,
                entry.failure,
                entry.outcome,
            ],
        )?;
        if inserted > 0 {
            debug!(session = %entry.session_id, status = %entry.final_status, "call logged");
        }
        Ok(())
    }

    /// Tags the latest untagged call with this contact with the recorded outcome.
    /// Returns false when there is no such call.
    pub fn attach_outcome(&self, contact_id: &ContactId, outcome: &str) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE call_log SET outcome = ?2
             WHERE session_id = (
                SELECT session_id FROM call_log
                WHERE contact_id = ?1 AND outcome IS NULL
                ORDER BY ended_at DESC, session_id DESC
                LIMIT 1
             );",
            params![contact_id.as_str(), outcome],
        )?;
        Ok(updated > 0)
    }

    /// Newest first.
    pub fn list(&self, contact_id: Option<&ContactId>, limit: i64) -> Result<Vec<CallLogDto>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, contact_id, direction, number, final_status, started_at,
                    ended_at, duration_secs, failure, outcome
             FROM call_log
             WHERE ?1 IS NULL OR contact_id = ?1
             ORDER BY ended_at DESC, session_id DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![contact_id.map(ContactId::as_str), limit])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(entry_from_row(row)?);
        }
        Ok(items)
    }
}

fn entry_from_row(row: &Row<'_>) -> Result<CallLogDto> {
    let session_raw: String = row.get(0)?;
    let session_id =
        SessionId::from_str(&session_raw).map_err(|_| StoreError::InvalidId(session_raw.clone()))?;
    let contact_raw: Option<String> = row.get(1)?;
    let contact_id = contact_raw
        .map(|raw| ContactId::new(&raw).map_err(|_| StoreError::InvalidId(raw.clone())))
        .transpose()?;
    let direction: String = row.get(2)?;
    if CallDirection::parse(&direction).is_none() {
        return Err(StoreError::InvalidColumn {
            column: "direction",
            value: direction,
        });
    }
    Ok(CallLogDto {
        session_id,
        contact_id,
        direction,
        number: row.get(3)?,
        final_status: row.get(4)?,
        started_at: row.get(5)?,
        ended_at: row.get(6)?,
        duration_secs: row.get(7)?,
        failure: row.get(8)?,
        outcome: row.get(9)?,
    })
}
