//! Centavo Core Library
//!
//! Reconciliation and forecasting engine for the Centavo personal finance tool:
//! - Ledger queries over the transaction collection
//! - Month-end forecast with per-category budget risk
//! - Alerts (overspend, habits, large and late-night expenses)
//! - Savings opportunity detection with a persisted review layer
//! - Savings plan composition
//! - Monthly agenda reconciling invoices, recurring charges and one-offs
//! - Card statement fingerprinting and import checks
//! - SQLite store with optional SQLCipher encryption
//!
//! The engine functions are pure: they take a [`Snapshot`] of the store plus
//! an explicit "today" and never touch the clock or the database.

pub mod agenda;
pub mod alerts;
pub mod config;
pub mod db;
pub mod error;
pub mod forecast;
pub mod import;
pub mod invoices;
pub mod ledger;
pub mod matching;
pub mod models;
pub mod plan;
pub mod recurring;
pub mod savings;
pub mod snapshot;
pub mod store;

pub use agenda::{AgendaItem, AgendaSource, AgendaStatus};
pub use alerts::{Alert, AlertSeverity};
pub use config::EngineConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use forecast::{Forecast, RiskCategory};
pub use invoices::{ImportDecision, InvoiceDraft, InvoiceLine};
pub use models::*;
pub use plan::{Impact, PlanAction, SavingsPlan};
pub use recurring::RecurringDefinition;
pub use savings::{Opportunity, OpportunityKind, SavingsReport};
pub use snapshot::Snapshot;
pub use store::{ChecklistStore, InvoiceStore, LedgerStore, ReviewStore, SettingsStore, Store};
