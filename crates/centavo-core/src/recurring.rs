//! Recurring definitions
//!
//! A recurring definition is never stored. It is recomputed from the ledger
//! on every call: for each normalized description, the most recent expense
//! flagged `is_recurring` that was not imported as part of a card invoice.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::matching;
use crate::models::{Category, Transaction};

/// A recurring obligation inferred from history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringDefinition {
    /// Stable id derived from the normalized description
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub category: Category,
    /// Occurred date of the latest occurrence; its day-of-month is the due day
    pub anchor_date: NaiveDate,
    /// Occurred date of the earliest occurrence
    pub first_date: NaiveDate,
    pub source_transaction_id: i64,
    pub linked_to_invoice_group: bool,
    pub credit_card_issuer: Option<String>,
}

impl RecurringDefinition {
    /// Normalized description, the join key for occurrences
    pub fn key(&self) -> String {
        matching::normalize(&self.description)
    }
}

/// Stable id for the definition behind a description
pub fn definition_id(description: &str) -> String {
    format!("recurring:{}", matching::normalize(description))
}

/// Derive one definition per normalized description, most recent wins.
///
/// Ties on `occurred_date` fall to the later insertion, then the higher id,
/// so the result is the same for any ordering of `ledger`.
pub fn derive_definitions(
    ledger: &[Transaction],
    invoice_members: &HashSet<i64>,
) -> Vec<RecurringDefinition> {
    let mut latest: BTreeMap<String, &Transaction> = BTreeMap::new();
    let mut first: HashMap<String, NaiveDate> = HashMap::new();

    for tx in ledger {
        if !tx.is_recurring || !tx.is_expense() || invoice_members.contains(&tx.id) {
            continue;
        }
        let key = matching::normalize(&tx.description);
        if key.is_empty() {
            continue;
        }
        first
            .entry(key.clone())
            .and_modify(|d| *d = (*d).min(tx.occurred_date))
            .or_insert(tx.occurred_date);
        let replace = match latest.get(&key) {
            Some(current) => {
                (tx.occurred_date, tx.created_at, tx.id)
                    > (current.occurred_date, current.created_at, current.id)
            }
            None => true,
        };
        if replace {
            latest.insert(key, tx);
        }
    }

    latest
        .into_iter()
        .map(|(key, tx)| RecurringDefinition {
            id: definition_id(&tx.description),
            description: tx.description.trim().to_string(),
            amount: tx.amount,
            category: tx.category,
            anchor_date: tx.occurred_date,
            first_date: first.get(&key).copied().unwrap_or(tx.occurred_date),
            source_transaction_id: tx.id,
            linked_to_invoice_group: tx.linked_to_invoice_group,
            credit_card_issuer: tx.credit_card_issuer.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::ledger;
    use crate::models::NewTransaction;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_one_definition_per_description_latest_wins() {
        let txs = ledger(vec![
            NewTransaction::expense("Netflix", 39.9, Category::Subscriptions, date(2026, 1, 5))
                .recurring(),
            NewTransaction::expense(" NETFLIX ", 44.9, Category::Subscriptions, date(2026, 2, 6))
                .recurring(),
            NewTransaction::expense("Gym", 99.0, Category::Health, date(2026, 2, 1)).recurring(),
            NewTransaction::expense("Coffee", 9.0, Category::Food, date(2026, 2, 2)),
        ]);

        let defs = derive_definitions(&txs, &HashSet::new());
        assert_eq!(defs.len(), 2);

        let netflix = defs.iter().find(|d| d.id == "recurring:netflix").unwrap();
        assert_eq!(netflix.amount, 44.9);
        assert_eq!(netflix.anchor_date, date(2026, 2, 6));
        assert_eq!(netflix.first_date, date(2026, 1, 5));
        assert_eq!(netflix.source_transaction_id, 2);
        assert_eq!(netflix.description, "NETFLIX");
    }

    #[test]
    fn test_same_day_tie_resolves_to_later_insert() {
        let txs = ledger(vec![
            NewTransaction::expense("Spotify", 19.9, Category::Subscriptions, date(2026, 2, 6))
                .recurring(),
            NewTransaction::expense("spotify", 21.9, Category::Subscriptions, date(2026, 2, 6))
                .recurring(),
        ]);
        let mut reversed = txs.clone();
        reversed.reverse();

        let a = derive_definitions(&txs, &HashSet::new());
        let b = derive_definitions(&reversed, &HashSet::new());
        assert_eq!(a, b);
        assert_eq!(a[0].amount, 21.9);
    }

    #[test]
    fn test_invoice_members_and_income_excluded() {
        let txs = ledger(vec![
            NewTransaction::expense("Cloud", 10.0, Category::Subscriptions, date(2026, 2, 6))
                .recurring(),
            NewTransaction::income("Salary", 3000.0, Category::Salary, date(2026, 2, 5))
                .recurring(),
        ]);
        let members: HashSet<i64> = [1].into_iter().collect();
        assert!(derive_definitions(&txs, &members).is_empty());
    }

    #[test]
    fn test_definition_id_is_stable() {
        assert_eq!(definition_id("  Netflix  Premium"), "recurring:netflix premium");
        assert_eq!(definition_id("netflix premium"), definition_id("NETFLIX PREMIUM"));
    }
}
