//! A point-in-time copy of everything the engine reads

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::agenda::{self, AgendaItem};
use crate::alerts::{self, Alert};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::forecast::{self, Forecast};
use crate::models::{ChecklistEntry, InvoiceGroup, MonthKey, SavingsReview, Settings, Transaction};
use crate::plan::{self, SavingsPlan};
use crate::savings::{self, Opportunity, SavingsReport};
use crate::store::Store;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub settings: Option<Settings>,
    pub invoices: Vec<InvoiceGroup>,
    pub reviews: Vec<SavingsReview>,
    pub checklist: Vec<ChecklistEntry>,
}

impl Snapshot {
    /// Read every collection from the store once
    pub fn load<S: Store + ?Sized>(store: &S) -> Result<Self> {
        let snapshot = Self {
            transactions: store.list_transactions()?,
            settings: store.settings()?,
            invoices: store.list_invoices()?,
            reviews: store.list_reviews()?,
            checklist: store.list_checklist()?,
        };
        debug!(
            "Loaded snapshot: {} transactions, {} invoices, {} reviews, {} checklist entries",
            snapshot.transactions.len(),
            snapshot.invoices.len(),
            snapshot.reviews.len(),
            snapshot.checklist.len()
        );
        Ok(snapshot)
    }

    pub fn forecast(
        &self,
        as_of: NaiveDate,
        today: NaiveDate,
        turbo: bool,
        config: &EngineConfig,
    ) -> Forecast {
        forecast::project(
            &self.transactions,
            as_of,
            today,
            self.settings.as_ref(),
            turbo,
            &config.forecast,
        )
    }

    pub fn alerts(&self, now: NaiveDateTime, turbo: bool, config: &EngineConfig) -> Vec<Alert> {
        alerts::generate_alerts(
            &self.transactions,
            self.settings.as_ref(),
            turbo,
            now,
            &config.alerts,
        )
    }

    pub fn savings(&self, config: &EngineConfig) -> SavingsReport {
        savings::detect(&self.transactions, &self.reviews, &config.savings)
    }

    /// Every opportunity with its review status, nothing filtered
    pub fn savings_annotated(&self, config: &EngineConfig) -> Vec<Opportunity> {
        savings::annotate(
            savings::detect_raw(&self.transactions, &config.savings),
            &self.reviews,
        )
    }

    pub fn plan(&self, today: NaiveDate, turbo: bool, config: &EngineConfig) -> SavingsPlan {
        let forecast = self.forecast(today, today, turbo, config);
        plan::compose(
            &self.transactions,
            &self.reviews,
            &forecast,
            self.settings.as_ref(),
            &config.savings,
            &config.plan,
        )
    }

    pub fn agenda(&self, month: MonthKey, today: NaiveDate) -> Vec<AgendaItem> {
        agenda::build(
            &self.transactions,
            &self.invoices,
            &self.checklist,
            month,
            today,
        )
    }
}
