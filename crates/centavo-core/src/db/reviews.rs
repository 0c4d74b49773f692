//! Savings review overrides

use rusqlite::params;

use super::{format_datetime, parse_column, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{ReviewStatus, SavingsReview};
use crate::store::ReviewStore;

impl ReviewStore for Database {
    fn list_reviews(&self) -> Result<Vec<SavingsReview>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT opportunity_id, status, adjusted_amount, note, updated_at
             FROM savings_reviews ORDER BY opportunity_id",
        )?;
        let reviews = stmt
            .query_map([], |row| {
                let updated_at: String = row.get(4)?;
                Ok(SavingsReview {
                    opportunity_id: row.get(0)?,
                    status: parse_column(row, 1)?,
                    adjusted_amount: row.get(2)?,
                    note: row.get(3)?,
                    updated_at: parse_datetime(&updated_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn upsert_review(&self, review: &SavingsReview) -> Result<()> {
        if review.opportunity_id.trim().is_empty() {
            return Err(Error::InvalidData("opportunity id must not be empty".into()));
        }

        // The override amount only means something for adjusted reviews
        let adjusted_amount = match review.status {
            ReviewStatus::Adjusted => match review.adjusted_amount {
                Some(amount) if amount.is_finite() && amount >= 0.0 => Some(amount),
                Some(amount) => {
                    return Err(Error::InvalidData(format!(
                        "adjusted amount must be zero or more, got {}",
                        amount
                    )))
                }
                None => {
                    return Err(Error::InvalidData(
                        "an adjusted review needs an amount".into(),
                    ))
                }
            },
            _ => None,
        };

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO savings_reviews (opportunity_id, status, adjusted_amount, note, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(opportunity_id) DO UPDATE SET
                status = excluded.status,
                adjusted_amount = excluded.adjusted_amount,
                note = excluded.note,
                updated_at = excluded.updated_at
            "#,
            params![
                review.opportunity_id.trim(),
                review.status.as_str(),
                adjusted_amount,
                review.note,
                format_datetime(&review.updated_at),
            ],
        )?;
        Ok(())
    }
}
