//! Credit-card statement imports
//!
//! A statement arrives as an [`InvoiceDraft`]: the issuer, the due date and
//! the already-normalized purchase lines. Its fingerprint identifies the
//! statement so a second import of the same file can be caught before it
//! doubles the ledger.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::matching;
use crate::models::{Category, InvoiceGroup, NewTransaction};

/// Lines that go into the fingerprint
const FINGERPRINT_LINES: usize = 3;

/// One purchase on a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    #[serde(default = "default_category")]
    pub category: Category,
}

fn default_category() -> Category {
    Category::Other
}

/// A parsed statement waiting to be imported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub issuer: String,
    pub due_date: NaiveDate,
    pub lines: Vec<InvoiceLine>,
}

impl InvoiceDraft {
    pub fn total(&self) -> f64 {
        self.lines.iter().map(|l| l.amount).sum()
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(self.due_date, self.total(), &self.lines)
    }

    pub fn validate(&self) -> Result<()> {
        if self.issuer.trim().is_empty() {
            return Err(Error::InvalidData("invoice issuer must not be empty".into()));
        }
        if self.lines.is_empty() {
            return Err(Error::InvalidData("invoice has no lines".into()));
        }
        for tx in self.to_transactions() {
            tx.validate()?;
        }
        Ok(())
    }

    /// Ledger entries for the statement. Every purchase settles on the due date.
    pub fn to_transactions(&self) -> Vec<NewTransaction> {
        self.lines
            .iter()
            .map(|line| {
                NewTransaction::expense(
                    line.description.trim(),
                    line.amount,
                    line.category,
                    line.date,
                )
                .effective_on(self.due_date)
                .on_card(self.issuer.trim())
            })
            .collect()
    }
}

fn cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Deterministic digest of due date, total and the leading lines
pub fn fingerprint(due_date: NaiveDate, total: f64, lines: &[InvoiceLine]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(due_date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(cents(total).to_string().as_bytes());
    for line in lines.iter().take(FINGERPRINT_LINES) {
        hasher.update(b"|");
        hasher.update(line.date.to_string().as_bytes());
        hasher.update(b";");
        hasher.update(matching::normalize(&line.description).as_bytes());
        hasher.update(b";");
        hasher.update(cents(line.amount).to_string().as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Outcome of checking a fingerprint against earlier imports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum ImportDecision {
    /// Safe to import. Earlier records of the same statement whose
    /// transactions were deleted are listed so the store can drop them.
    Accept { stale_groups: Vec<i64> },
    /// The same statement is already in the ledger
    Duplicate { existing_id: i64 },
}

/// Decide whether a statement with `fingerprint` may be imported.
///
/// An earlier import blocks the new one while at least `survival_threshold`
/// of its transactions still exist. Legacy imports without recorded
/// transaction ids cannot be verified and always block.
pub fn check_import(
    fingerprint: &str,
    existing: &[InvoiceGroup],
    live_ids: &HashSet<i64>,
    survival_threshold: f64,
) -> ImportDecision {
    let mut stale_groups = Vec::new();

    for group in existing.iter().filter(|g| g.fingerprint == fingerprint) {
        if group.transaction_ids.is_empty() {
            info!(
                "Invoice {} has no recorded transactions; treating it as still imported",
                group.id
            );
            return ImportDecision::Duplicate {
                existing_id: group.id,
            };
        }

        let alive = group
            .transaction_ids
            .iter()
            .filter(|id| live_ids.contains(id))
            .count();
        let ratio = alive as f64 / group.transaction_ids.len() as f64;

        if ratio >= survival_threshold {
            info!(
                "Invoice {} already imported ({}/{} transactions still present)",
                group.id,
                alive,
                group.transaction_ids.len()
            );
            return ImportDecision::Duplicate {
                existing_id: group.id,
            };
        }

        debug!(
            "Invoice {} matches but only {}/{} transactions remain; allowing re-import",
            group.id,
            alive,
            group.transaction_ids.len()
        );
        stale_groups.push(group.id);
    }

    ImportDecision::Accept { stale_groups }
}

/// Group invoices by normalized issuer, sorted by issuer key
pub fn cluster_by_issuer(invoices: &[InvoiceGroup]) -> Vec<(String, Vec<&InvoiceGroup>)> {
    let mut clusters: Vec<(String, Vec<&InvoiceGroup>)> = Vec::new();
    for invoice in invoices {
        let key = matching::normalize(&invoice.issuer);
        match clusters.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(invoice),
            None => clusters.push((key, vec![invoice])),
        }
    }
    clusters.sort_by(|a, b| a.0.cmp(&b.0));
    clusters
}
