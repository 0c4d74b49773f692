//! Ledger queries
//!
//! Pure filtering and grouping over the transaction collection. Every other
//! engine component reads the ledger through these helpers.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Category, InvoiceGroup, MonthKey, Transaction};

/// Income/expense sums for one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
}

impl Totals {
    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// Transactions whose effective date falls in `month`
pub fn in_month(ledger: &[Transaction], month: MonthKey) -> Vec<&Transaction> {
    ledger
        .iter()
        .filter(|tx| month.contains(tx.effective()))
        .collect()
}

/// Transactions whose occurred date falls in `month`
pub fn occurred_in_month(ledger: &[Transaction], month: MonthKey) -> Vec<&Transaction> {
    ledger
        .iter()
        .filter(|tx| month.contains(tx.occurred_date))
        .collect()
}

pub fn expenses<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Vec<&'a Transaction> {
    txs.into_iter().filter(|tx| tx.is_expense()).collect()
}

pub fn by_category<'a>(
    txs: impl IntoIterator<Item = &'a Transaction>,
    category: Category,
) -> Vec<&'a Transaction> {
    txs.into_iter().filter(|tx| tx.category == category).collect()
}

pub fn recurring(ledger: &[Transaction]) -> Vec<&Transaction> {
    ledger.iter().filter(|tx| tx.is_recurring).collect()
}

pub fn totals<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    txs.into_iter().fold(Totals::default(), |mut acc, tx| {
        if tx.is_income() {
            acc.income += tx.amount;
        } else {
            acc.expense += tx.amount;
        }
        acc
    })
}

pub fn month_totals(ledger: &[Transaction], month: MonthKey) -> Totals {
    totals(in_month(ledger, month))
}

/// Expense totals per category
pub fn category_totals<'a>(
    txs: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<Category, f64> {
    let mut totals = BTreeMap::new();
    for tx in txs.into_iter().filter(|tx| tx.is_expense()) {
        *totals.entry(tx.category).or_insert(0.0) += tx.amount;
    }
    totals
}

/// Category with the largest expense total. Ties resolve to the
/// category declared first.
pub fn largest_category<'a>(
    txs: impl IntoIterator<Item = &'a Transaction>,
) -> Option<(Category, f64)> {
    category_totals(txs)
        .into_iter()
        .fold(None, |best: Option<(Category, f64)>, (cat, total)| match best {
            Some((_, best_total)) if best_total >= total => best,
            _ => Some((cat, total)),
        })
}

/// Whether `date` falls in the last `days` calendar days, `today` included
pub fn within_days(date: NaiveDate, today: NaiveDate, days: i64) -> bool {
    let age = (today - date).num_days();
    (0..days).contains(&age)
}

/// Transactions that occurred in the last `days` calendar days
pub fn occurred_within(ledger: &[Transaction], today: NaiveDate, days: i64) -> Vec<&Transaction> {
    ledger
        .iter()
        .filter(|tx| within_days(tx.occurred_date, today, days))
        .collect()
}

/// Ids of every transaction claimed by an imported invoice
pub fn invoice_member_ids(invoices: &[InvoiceGroup]) -> HashSet<i64> {
    invoices
        .iter()
        .flat_map(|inv| inv.transaction_ids.iter().copied())
        .collect()
}
