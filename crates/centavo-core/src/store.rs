//! Storage traits
//!
//! The engine only reads snapshots; these traits are what a backing store
//! must provide for the CLI to feed it. [`crate::db::Database`] implements
//! all of them.

use crate::error::Result;
use crate::invoices::InvoiceDraft;
use crate::models::{
    ChecklistEntry, InvoiceGroup, NewTransaction, SavingsReview, Settings, Transaction,
};

pub trait LedgerStore {
    fn list_transactions(&self) -> Result<Vec<Transaction>>;

    fn get_transaction(&self, id: i64) -> Result<Option<Transaction>>;

    /// Validate and store a new transaction, returning its id
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64>;

    /// Replace a stored transaction wholesale
    fn update_transaction(&self, id: i64, tx: &NewTransaction) -> Result<()>;

    /// Returns false if no such transaction existed
    fn delete_transaction(&self, id: i64) -> Result<bool>;
}

pub trait SettingsStore {
    /// `None` until settings are saved once
    fn settings(&self) -> Result<Option<Settings>>;

    fn save_settings(&self, settings: &Settings) -> Result<()>;
}

pub trait InvoiceStore {
    fn list_invoices(&self) -> Result<Vec<InvoiceGroup>>;

    /// Import a statement: store its transactions and the group record.
    ///
    /// Fails with [`crate::Error::DuplicateImport`] when the same statement
    /// is still in the ledger, unless `force` is set.
    fn record_import(
        &self,
        draft: &InvoiceDraft,
        survival_threshold: f64,
        force: bool,
    ) -> Result<InvoiceGroup>;

    /// Delete a group and every transaction it imported. Returns the number
    /// of transactions removed.
    fn revert_import(&self, id: i64) -> Result<usize>;
}

pub trait ReviewStore {
    fn list_reviews(&self) -> Result<Vec<SavingsReview>>;

    /// Insert or replace the review for `review.opportunity_id`
    fn upsert_review(&self, review: &SavingsReview) -> Result<()>;
}

pub trait ChecklistStore {
    fn list_checklist(&self) -> Result<Vec<ChecklistEntry>>;

    /// Flip presence of `entry` and return the resulting list
    fn toggle_checklist(&self, entry: &ChecklistEntry) -> Result<Vec<ChecklistEntry>>;
}

/// Everything the engine needs from one store
pub trait Store: LedgerStore + SettingsStore + InvoiceStore + ReviewStore + ChecklistStore {}

impl<T> Store for T where T: LedgerStore + SettingsStore + InvoiceStore + ReviewStore + ChecklistStore
{}
