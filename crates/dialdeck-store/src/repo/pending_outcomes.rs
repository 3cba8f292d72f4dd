use crate::error::{Result, StoreError};
use dialdeck_core::dialer::OutcomeSink;
use dialdeck_core::domain::{ContactId, OutcomeDraft, OutcomeId};
use dialdeck_core::dto::PendingOutcomeDto;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// An outcome that failed to reach the backend and waits for a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOutcome {
    pub draft: OutcomeDraft,
    pub queued_at: i64,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<i64>,
}

impl PendingOutcome {
    pub fn to_dto(&self) -> PendingOutcomeDto {
        PendingOutcomeDto {
            id: self.draft.id,
            contact_id: self.draft.contact_id.clone(),
            outcome: self.draft.outcome.clone(),
            notes: self.draft.notes.clone(),
            queued_at: self.queued_at,
            attempts: self.attempts,
            last_error: self.last_error.clone(),
            last_attempt_at: self.last_attempt_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: Vec<OutcomeId>,
    pub failed: Vec<(OutcomeId, String)>,
}

pub struct PendingOutcomesRepo<'a> {
    conn: &'a Connection,
}

impl<'a> PendingOutcomesRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Queues a draft after a failed send. Queuing the same draft twice keeps
    /// one row and refreshes the error.
    pub fn enqueue(
        &self,
        now_utc: i64,
        draft: &OutcomeDraft,
        last_error: Option<&str>,
    ) -> Result<PendingOutcome> {
        let attempts: u32 = if last_error.is_some() { 1 } else { 0 };
        let last_attempt_at = last_error.map(|_| now_utc);
        self.conn.execute(
            "INSERT INTO pending_outcomes
                (id, contact_id, caller_id, outcome, notes, created_at, queued_at,
                 attempts, last_error, last_attempt_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                last_error = COALESCE(excluded.last_error, pending_outcomes.last_error),
                last_attempt_at = COALESCE(excluded.last_attempt_at, pending_outcomes.last_attempt_at);",
            params![
                draft.id.to_string(),
                draft.contact_id.as_str(),
                draft.caller_id,
                draft.outcome,
                draft.notes,
                draft.created_at,
                now_utc,
                attempts,
                last_error,
                last_attempt_at,
            ],
        )?;
        debug!(outcome = %draft.id, contact = %draft.contact_id, "outcome queued");
        self.get(draft.id)?
            .ok_or_else(|| StoreError::NotFound(draft.id.to_string()))
    }

    pub fn get(&self, id: OutcomeId) -> Result<Option<PendingOutcome>> {
        self.conn
            .query_row(
                "SELECT id, contact_id, caller_id, outcome, notes, created_at, queued_at,
                        attempts, last_error, last_attempt_at
                 FROM pending_outcomes WHERE id = ?1;",
                [id.to_string()],
                |row| Ok(pending_from_row(row)),
            )
            .optional()?
            .transpose()
    }

    /// Oldest first, the order a flush sends them in.
    pub fn list(&self, limit: Option<i64>) -> Result<Vec<PendingOutcome>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contact_id, caller_id, outcome, notes, created_at, queued_at,
                    attempts, last_error, last_attempt_at
             FROM pending_outcomes
             ORDER BY queued_at ASC, id ASC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([limit.unwrap_or(-1)])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(pending_from_row(row)?);
        }
        Ok(items)
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM pending_outcomes;", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    pub fn record_failure(&self, now_utc: i64, id: OutcomeId, error: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE pending_outcomes
             SET attempts = attempts + 1, last_error = ?2, last_attempt_at = ?3
             WHERE id = ?1;",
            params![id.to_string(), error, now_utc],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Resends queued outcomes oldest first. Delivered rows are removed; a
    /// failure is counted against its row and the flush moves on.
    pub fn flush<S: OutcomeSink>(
        &self,
        now_utc: i64,
        sink: &S,
        limit: Option<i64>,
    ) -> Result<FlushReport> {
        let mut report = FlushReport::default();
        for pending in self.list(limit)? {
            let id = pending.draft.id;
            match sink.send_outcome(&pending.draft) {
                Ok(()) => {
                    self.remove(id)?;
                    report.delivered.push(id);
                }
                Err(err) => {
                    warn!(outcome = %id, error = %err, "pending outcome not delivered");
                    self.record_failure(now_utc, id, &err.reason)?;
                    report.failed.push((id, err.reason));
                }
            }
        }
        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "pending outcomes flushed"
        );
        Ok(report)
    }

    pub fn remove(&self, id: OutcomeId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM pending_outcomes WHERE id = ?1;", [id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(outcome = %id, "pending outcome removed");
        Ok(())
    }
}

fn pending_from_row(row: &Row<'_>) -> Result<PendingOutcome> {
    let id_raw: String = row.get(0)?;
    let id = OutcomeId::from_str(&id_raw).map_err(|_| StoreError::InvalidId(id_raw.clone()))?;
    let contact_raw: String = row.get(1)?;
    let contact_id =
        ContactId::new(&contact_raw).map_err(|_| StoreError::InvalidId(contact_raw.clone()))?;
    Ok(PendingOutcome {
        draft: OutcomeDraft {
            id,
            contact_id,
            caller_id: row.get(2)?,
            outcome: row.get(3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
        },
        queued_at: row.get(6)?,
        attempts: row.get(7)?,
        last_error: row.get(8)?,
        last_attempt_at: row.get(9)?,
    })
}
