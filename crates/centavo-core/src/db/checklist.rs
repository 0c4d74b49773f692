//! Agenda checklist

use rusqlite::params;
use tracing::debug;

use super::{parse_column, Database};
use crate::error::Result;
use crate::models::ChecklistEntry;
use crate::store::ChecklistStore;

impl ChecklistStore for Database {
    fn list_checklist(&self) -> Result<Vec<ChecklistEntry>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT target_id, month FROM agenda_checklist ORDER BY month, target_id")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(ChecklistEntry {
                    target_id: row.get(0)?,
                    month: parse_column(row, 1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn toggle_checklist(&self, entry: &ChecklistEntry) -> Result<Vec<ChecklistEntry>> {
        let month = entry.month.to_string();
        {
            let mut conn = self.conn()?;
            let sql_tx = conn.transaction()?;
            let removed = sql_tx.execute(
                "DELETE FROM agenda_checklist WHERE target_id = ? AND month = ?",
                params![entry.target_id, month],
            )?;
            if removed == 0 {
                sql_tx.execute(
                    "INSERT INTO agenda_checklist (target_id, month) VALUES (?, ?)",
                    params![entry.target_id, month],
                )?;
            }
            sql_tx.commit()?;
            debug!(
                "Checklist {} for {}: {}",
                entry.target_id,
                month,
                if removed == 0 { "checked" } else { "unchecked" }
            );
        }
        self.list_checklist()
    }
}
