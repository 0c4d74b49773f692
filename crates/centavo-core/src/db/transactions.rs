//! Transaction operations

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{parse_column, parse_date, parse_datetime, parse_optional_date, parse_optional_time, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};
use crate::store::LedgerStore;

const TRANSACTION_COLUMNS: &str = "id, description, amount, category, kind, occurred_date, \
     occurred_time, effective_date, is_recurring, is_credit_purchase, credit_card_issuer, \
     linked_to_invoice_group, created_at";

impl Database {
    /// Helper to convert a row to Transaction (column order: `TRANSACTION_COLUMNS`)
    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let created_at_str: String = row.get(12)?;
        Ok(Transaction {
            id: row.get(0)?,
            description: row.get(1)?,
            amount: row.get(2)?,
            category: parse_column(row, 3)?,
            kind: parse_column(row, 4)?,
            occurred_date: parse_date(row, 5)?,
            occurred_time: parse_optional_time(row, 6)?,
            effective_date: parse_optional_date(row, 7)?,
            is_recurring: row.get(8)?,
            is_credit_purchase: row.get(9)?,
            credit_card_issuer: row.get(10)?,
            linked_to_invoice_group: row.get(11)?,
            created_at: parse_datetime(&created_at_str),
        })
    }

    /// Insert on an existing connection so callers can batch inside one SQL transaction
    pub(crate) fn insert_transaction_on(conn: &Connection, tx: &NewTransaction) -> Result<i64> {
        tx.validate()?;
        conn.execute(
            r#"
            INSERT INTO transactions (description, amount, category, kind, occurred_date,
                occurred_time, effective_date, is_recurring, is_credit_purchase,
                credit_card_issuer, linked_to_invoice_group)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.description.trim(),
                tx.amount,
                tx.category.as_str(),
                tx.kind.as_str(),
                tx.occurred_date.to_string(),
                tx.occurred_time.map(|t| t.format("%H:%M:%S").to_string()),
                tx.effective_date.map(|d| d.to_string()),
                tx.is_recurring,
                tx.is_credit_purchase,
                tx.credit_card_issuer,
                tx.linked_to_invoice_group,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert many transactions atomically. Nothing is stored if any row is invalid.
    pub fn insert_transactions(&self, txs: &[NewTransaction]) -> Result<Vec<i64>> {
        let mut conn = self.conn()?;
        let sql_tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(txs.len());
        for tx in txs {
            ids.push(Self::insert_transaction_on(&sql_tx, tx)?);
        }
        sql_tx.commit()?;
        debug!("Inserted {} transactions", ids.len());
        Ok(ids)
    }

    /// Count total transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl LedgerStore for Database {
    fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY occurred_date, id",
            TRANSACTION_COLUMNS
        ))?;
        let transactions = stmt
            .query_map([], |row| Self::row_to_transaction(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let transaction = conn
            .query_row(
                &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
                params![id],
                |row| Self::row_to_transaction(row),
            )
            .optional()?;
        Ok(transaction)
    }

    fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let conn = self.conn()?;
        Self::insert_transaction_on(&conn, tx)
    }

    fn update_transaction(&self, id: i64, tx: &NewTransaction) -> Result<()> {
        tx.validate()?;
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE transactions SET description = ?, amount = ?, category = ?, kind = ?,
                occurred_date = ?, occurred_time = ?, effective_date = ?, is_recurring = ?,
                is_credit_purchase = ?, credit_card_issuer = ?, linked_to_invoice_group = ?
            WHERE id = ?
            "#,
            params![
                tx.description.trim(),
                tx.amount,
                tx.category.as_str(),
                tx.kind.as_str(),
                tx.occurred_date.to_string(),
                tx.occurred_time.map(|t| t.format("%H:%M:%S").to_string()),
                tx.effective_date.map(|d| d.to_string()),
                tx.is_recurring,
                tx.is_credit_purchase,
                tx.credit_card_issuer,
                tx.linked_to_invoice_group,
                id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    fn delete_transaction(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}
