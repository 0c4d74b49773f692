//! Statement imports

use std::collections::{HashMap, HashSet};

use rusqlite::{params, OptionalExtension};
use tracing::{info, warn};

use super::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::invoices::{check_import, ImportDecision, InvoiceDraft};
use crate::models::InvoiceGroup;
use crate::store::InvoiceStore;

impl Database {
    fn live_transaction_ids(&self) -> Result<HashSet<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM transactions")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }

    pub fn get_invoice(&self, id: i64) -> Result<Option<InvoiceGroup>> {
        Ok(self.list_invoices()?.into_iter().find(|g| g.id == id))
    }
}

impl InvoiceStore for Database {
    fn list_invoices(&self) -> Result<Vec<InvoiceGroup>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT invoice_id, transaction_id FROM invoice_transactions
             ORDER BY invoice_id, position",
        )?;
        let mut members: HashMap<i64, Vec<i64>> = HashMap::new();
        for pair in stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))? {
            let (invoice_id, tx_id) = pair?;
            members.entry(invoice_id).or_default().push(tx_id);
        }

        let mut stmt = conn.prepare(
            "SELECT id, issuer, due_date, total_amount, transaction_count, fingerprint, imported_at
             FROM invoice_groups ORDER BY id",
        )?;
        let groups = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let count: i64 = row.get(4)?;
                let imported_at: String = row.get(6)?;
                Ok(InvoiceGroup {
                    id,
                    issuer: row.get(1)?,
                    due_date: parse_date(row, 2)?,
                    total_amount: row.get(3)?,
                    transaction_count: count.max(0) as usize,
                    fingerprint: row.get(5)?,
                    imported_at: parse_datetime(&imported_at),
                    transaction_ids: members.remove(&id).unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(groups)
    }

    fn record_import(
        &self,
        draft: &InvoiceDraft,
        survival_threshold: f64,
        force: bool,
    ) -> Result<InvoiceGroup> {
        draft.validate()?;
        let fingerprint = draft.fingerprint();

        let stale_groups = if force {
            Vec::new()
        } else {
            match check_import(
                &fingerprint,
                &self.list_invoices()?,
                &self.live_transaction_ids()?,
                survival_threshold,
            ) {
                ImportDecision::Accept { stale_groups } => stale_groups,
                ImportDecision::Duplicate { existing_id } => {
                    warn!(
                        "Rejected {} statement due {}: already imported as invoice {}",
                        draft.issuer, draft.due_date, existing_id
                    );
                    return Err(Error::DuplicateImport {
                        fingerprint,
                        existing_id,
                    });
                }
            }
        };

        let transactions = draft.to_transactions();
        let mut conn = self.conn()?;
        let sql_tx = conn.transaction()?;

        // Records whose transactions are gone no longer describe anything
        for stale in &stale_groups {
            sql_tx.execute("DELETE FROM invoice_groups WHERE id = ?", params![stale])?;
        }

        let mut ids = Vec::with_capacity(transactions.len());
        for tx in &transactions {
            ids.push(Self::insert_transaction_on(&sql_tx, tx)?);
        }

        sql_tx.execute(
            r#"
            INSERT INTO invoice_groups (issuer, due_date, total_amount, transaction_count, fingerprint)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                draft.issuer.trim(),
                draft.due_date.to_string(),
                draft.total(),
                ids.len() as i64,
                fingerprint,
            ],
        )?;
        let invoice_id = sql_tx.last_insert_rowid();

        for (position, tx_id) in ids.iter().enumerate() {
            sql_tx.execute(
                "INSERT INTO invoice_transactions (invoice_id, transaction_id, position) VALUES (?, ?, ?)",
                params![invoice_id, tx_id, position as i64],
            )?;
        }
        sql_tx.commit()?;

        info!(
            "Imported {} statement due {} as invoice {} ({} transactions)",
            draft.issuer,
            draft.due_date,
            invoice_id,
            ids.len()
        );

        self.get_invoice(invoice_id)?
            .ok_or_else(|| Error::NotFound(format!("invoice {}", invoice_id)))
    }

    fn revert_import(&self, id: i64) -> Result<usize> {
        let mut conn = self.conn()?;
        let sql_tx = conn.transaction()?;

        let exists: Option<i64> = sql_tx
            .query_row(
                "SELECT id FROM invoice_groups WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("invoice {}", id)));
        }

        let removed = sql_tx.execute(
            "DELETE FROM transactions WHERE id IN
             (SELECT transaction_id FROM invoice_transactions WHERE invoice_id = ?)",
            params![id],
        )?;
        sql_tx.execute("DELETE FROM invoice_groups WHERE id = ?", params![id])?;
        sql_tx.commit()?;

        info!("Reverted invoice {} ({} transactions deleted)", id, removed);
        Ok(removed)
    }
}
