use crate::error::Result;
use dialdeck_core::domain::{OutcomeCatalog, OutcomeLabel};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// Last catalog fetched from the backend, for use while it is unreachable.
pub struct OutcomeLabelsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> OutcomeLabelsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn replace_all(&self, now_utc: i64, catalog: &OutcomeCatalog) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM outcome_labels;", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO outcome_labels (label, bg_color, text_color, sort_order, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for label in catalog.labels() {
                stmt.execute(params![
                    label.label,
                    label.bg_color,
                    label.text_color,
                    label.sort_order,
                    now_utc,
                ])?;
            }
        }
        tx.commit()?;
        debug!(labels = catalog.len(), "outcome catalog cached");
        Ok(())
    }

    /// `None` when nothing has been cached yet.
    pub fn catalog(&self) -> Result<Option<OutcomeCatalog>> {
        let mut stmt = self.conn.prepare(
            "SELECT label, bg_color, text_color, sort_order
             FROM outcome_labels
             ORDER BY sort_order ASC, label ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut labels = Vec::new();
        while let Some(row) = rows.next()? {
            labels.push(OutcomeLabel {
                label: row.get(0)?,
                bg_color: row.get(1)?,
                text_color: row.get(2)?,
                sort_order: row.get(3)?,
            });
        }
        if labels.is_empty() {
            return Ok(None);
        }
        Ok(Some(OutcomeCatalog::new(labels)?))
    }

    pub fn fetched_at(&self) -> Result<Option<i64>> {
        let fetched = self
            .conn
            .query_row("SELECT MAX(fetched_at) FROM outcome_labels;", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .optional()?
            .flatten();
        Ok(fetched)
    }
}
