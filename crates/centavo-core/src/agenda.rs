//! Monthly agenda
//!
//! Reconciles three sources into one list of obligations for a month:
//!
//! 1. Credit-card invoices, one item per issuer, plus recurring charges
//!    billed on that issuer's card
//! 2. Recurring definitions paid directly
//! 3. One-off expenses settling in the month
//!
//! Status is derived on every call from the ledger, the checklist and
//! `today`. Nothing here is stored.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::invoices;
use crate::ledger;
use crate::matching;
use crate::models::{ChecklistEntry, InvoiceGroup, MonthKey, Transaction};
use crate::recurring::{self, RecurringDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaSource {
    Invoice,
    Recurring,
    OneOff,
}

impl AgendaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgendaSource::Invoice => "invoice",
            AgendaSource::Recurring => "recurring",
            AgendaSource::OneOff => "one_off",
        }
    }
}

impl std::fmt::Display for AgendaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendaStatus {
    Paid,
    Pending,
    Overdue,
}

impl AgendaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgendaStatus::Paid => "paid",
            AgendaStatus::Pending => "pending",
            AgendaStatus::Overdue => "overdue",
        }
    }

    /// Unpaid status implied by the due date alone
    fn by_date(due_date: NaiveDate, today: NaiveDate) -> Self {
        if today > due_date {
            AgendaStatus::Overdue
        } else {
            AgendaStatus::Pending
        }
    }
}

impl std::fmt::Display for AgendaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One obligation in one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    /// Key for checklist entries
    pub target_id: String,
    pub source: AgendaSource,
    pub title: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: AgendaStatus,
    /// Paid because of a checklist entry rather than a matching transaction
    pub paid_manually: bool,
    /// Ledger transactions backing this item this month
    pub transaction_ids: Vec<i64>,
}

/// Checklist target for an issuer's invoices
pub fn invoice_target_id(issuer: &str) -> String {
    format!("invoice:{}", matching::normalize(issuer))
}

/// Checklist target for a one-off transaction
pub fn transaction_target_id(id: i64) -> String {
    format!("tx:{}", id)
}

/// Build the agenda for `month` as seen on `today`
pub fn build(
    ledger: &[Transaction],
    invoices: &[InvoiceGroup],
    checklist: &[ChecklistEntry],
    month: MonthKey,
    today: NaiveDate,
) -> Vec<AgendaItem> {
    let members = ledger::invoice_member_ids(invoices);
    let definitions = recurring::derive_definitions(ledger, &members);
    let checked: HashSet<&str> = checklist
        .iter()
        .filter(|e| e.month == month)
        .map(|e| e.target_id.as_str())
        .collect();
    let is_checked = |target: &str| checked.contains(target);

    let clusters = invoices::cluster_by_issuer(invoices);
    let billed_to = bill_definitions(&definitions, &clusters);

    let mut items = Vec::new();

    for (key, cluster) in &clusters {
        let cluster_ids: HashSet<i64> = cluster
            .iter()
            .flat_map(|g| g.transaction_ids.iter().copied())
            .collect();
        let charges: Vec<&Transaction> = ledger
            .iter()
            .filter(|tx| cluster_ids.contains(&tx.id) && month.contains(tx.effective()))
            .collect();

        let linked: Vec<&RecurringDefinition> = definitions
            .iter()
            .filter(|d| billed_to.get(d.id.as_str()) == Some(&key.as_str()))
            .filter(|d| MonthKey::of(d.first_date) <= month)
            .collect();

        if charges.is_empty() && linked.is_empty() {
            continue;
        }

        let Some(reference) = reference_invoice(cluster, month) else {
            continue;
        };
        let due_date = month.anchor(reference.due_date.day());
        let amount = charges.iter().map(|tx| tx.amount).sum::<f64>()
            + linked.iter().map(|d| d.amount).sum::<f64>();

        let target_id = invoice_target_id(key);
        let paid = is_checked(&target_id);
        items.push(AgendaItem {
            status: if paid {
                AgendaStatus::Paid
            } else {
                AgendaStatus::by_date(due_date, today)
            },
            paid_manually: paid,
            target_id,
            source: AgendaSource::Invoice,
            title: reference.issuer.trim().to_string(),
            amount,
            due_date,
            transaction_ids: sorted_ids(charges.iter().copied()),
        });
    }

    for def in &definitions {
        if billed_to.contains_key(def.id.as_str()) {
            continue;
        }
        if MonthKey::of(def.first_date) > month {
            continue;
        }

        let due_date = month.anchor(def.anchor_date.day());
        let occurrences: Vec<&Transaction> = ledger::occurred_in_month(ledger, month)
            .into_iter()
            .filter(|tx| tx.is_expense())
            .filter(|tx| matching::same_description(&tx.description, &def.description))
            .collect();

        let (status, paid_manually) = if !occurrences.is_empty() {
            (AgendaStatus::Paid, false)
        } else if is_checked(&def.id) {
            (AgendaStatus::Paid, true)
        } else {
            (AgendaStatus::by_date(due_date, today), false)
        };

        items.push(AgendaItem {
            target_id: def.id.clone(),
            source: AgendaSource::Recurring,
            title: def.description.clone(),
            amount: def.amount,
            due_date,
            status,
            paid_manually,
            transaction_ids: sorted_ids(occurrences),
        });
    }

    for tx in ledger::in_month(ledger, month) {
        if !tx.is_expense() || tx.is_recurring || members.contains(&tx.id) {
            continue;
        }

        let due_date = tx.effective();
        let target_id = transaction_target_id(tx.id);
        let (status, paid_manually) = if due_date <= today {
            (AgendaStatus::Paid, false)
        } else if is_checked(&target_id) {
            (AgendaStatus::Paid, true)
        } else {
            (AgendaStatus::Pending, false)
        };

        items.push(AgendaItem {
            target_id,
            source: AgendaSource::OneOff,
            title: tx.description.trim().to_string(),
            amount: tx.amount,
            due_date,
            status,
            paid_manually,
            transaction_ids: vec![tx.id],
        });
    }

    items.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.target_id.cmp(&b.target_id))
    });
    items
}

/// Issuer cluster each invoice-linked definition is billed on.
///
/// An exact issuer key wins; otherwise the first loosely matching key in
/// sorted order. A definition lands on at most one invoice.
fn bill_definitions<'a>(
    definitions: &'a [RecurringDefinition],
    clusters: &'a [(String, Vec<&InvoiceGroup>)],
) -> HashMap<&'a str, &'a str> {
    let mut billed = HashMap::new();
    for def in definitions.iter().filter(|d| d.linked_to_invoice_group) {
        let Some(issuer) = def.credit_card_issuer.as_deref() else {
            continue;
        };
        let normalized = matching::normalize(issuer);
        let cluster = clusters
            .iter()
            .find(|(key, _)| *key == normalized)
            .or_else(|| {
                clusters
                    .iter()
                    .find(|(key, _)| matching::same_issuer(issuer, key))
            });
        if let Some((key, _)) = cluster {
            billed.insert(def.id.as_str(), key.as_str());
        }
    }
    billed
}

/// Invoice whose due date sets the cluster's due day for `month`: one due
/// in the month if any, else the most recent.
fn reference_invoice<'a>(cluster: &[&'a InvoiceGroup], month: MonthKey) -> Option<&'a InvoiceGroup> {
    cluster
        .iter()
        .filter(|g| month.contains(g.due_date))
        .min_by_key(|g| (g.due_date, g.id))
        .or_else(|| cluster.iter().max_by_key(|g| (g.due_date, g.id)))
        .copied()
}

fn sorted_ids<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Vec<i64> {
    let mut ids: Vec<i64> = txs.into_iter().map(|tx| tx.id).collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::ledger;
    use crate::models::{toggle_checklist, Category, NewTransaction};
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(y: i32, m: u32) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    fn invoice(id: i64, issuer: &str, due: NaiveDate, ids: Vec<i64>) -> InvoiceGroup {
        InvoiceGroup {
            id,
            issuer: issuer.to_string(),
            due_date: due,
            total_amount: 0.0,
            transaction_count: ids.len(),
            imported_at: Utc::now(),
            fingerprint: format!("fp-{}", id),
            transaction_ids: ids,
        }
    }

    fn nubank_ledger() -> (Vec<Transaction>, Vec<InvoiceGroup>) {
        let txs = ledger(vec![
            NewTransaction::expense("Amazon", 100.0, Category::Shopping, date(2025, 12, 20))
                .effective_on(date(2026, 1, 10))
                .on_card("Nubank"),
            NewTransaction::expense("Posto", 80.0, Category::Transport, date(2026, 1, 15))
                .effective_on(date(2026, 2, 10))
                .on_card("Nubank"),
            NewTransaction::expense("Spotify", 21.9, Category::Subscriptions, date(2026, 1, 12))
                .recurring()
                .linked_to_invoice("nubank"),
        ]);
        let invoices = vec![
            invoice(1, "Nubank", date(2026, 1, 10), vec![1]),
            invoice(2, "Nubank", date(2026, 2, 10), vec![2]),
        ];
        (txs, invoices)
    }

    #[test]
    fn test_invoice_cluster_sums_charges_and_linked_recurring() {
        let (txs, invoices) = nubank_ledger();
        let items = build(&txs, &invoices, &[], month(2026, 2), date(2026, 2, 1));

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.source, AgendaSource::Invoice);
        assert_eq!(item.title, "Nubank");
        assert_eq!(item.target_id, "invoice:nubank");
        assert_eq!(item.due_date, date(2026, 2, 10));
        assert!((item.amount - 101.9).abs() < 1e-9);
        assert_eq!(item.transaction_ids, vec![2]);
        assert_eq!(item.status, AgendaStatus::Pending);
    }

    #[test]
    fn test_invoice_due_day_reanchored_when_no_invoice_in_month() {
        let (txs, invoices) = nubank_ledger();
        let items = build(&txs, &invoices, &[], month(2026, 3), date(2026, 3, 20));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].due_date, date(2026, 3, 10));
        assert!((items[0].amount - 21.9).abs() < 1e-9);
        assert!(items[0].transaction_ids.is_empty());
        assert_eq!(items[0].status, AgendaStatus::Overdue);
    }

    #[test]
    fn test_checklist_toggle_round_trip() {
        let (txs, invoices) = nubank_ledger();
        let feb = month(2026, 2);
        let today = date(2026, 2, 20);

        let checklist = toggle_checklist(&[], ChecklistEntry::new("invoice:nubank", feb));
        let items = build(&txs, &invoices, &checklist, feb, today);
        assert_eq!(items[0].status, AgendaStatus::Paid);
        assert!(items[0].paid_manually);

        let checklist = toggle_checklist(&checklist, ChecklistEntry::new("invoice:nubank", feb));
        assert!(checklist.is_empty());
        let items = build(&txs, &invoices, &checklist, feb, today);
        assert_eq!(items[0].status, AgendaStatus::Overdue);
        assert!(!items[0].paid_manually);
    }

    #[test]
    fn test_checklist_is_scoped_to_month() {
        let (txs, invoices) = nubank_ledger();
        let checklist = vec![ChecklistEntry::new("invoice:nubank", month(2026, 1))];
        let items = build(&txs, &invoices, &checklist, month(2026, 2), date(2026, 2, 1));
        assert_eq!(items[0].status, AgendaStatus::Pending);
    }

    #[test]
    fn test_recurring_paid_by_occurrence() {
        let txs = ledger(vec![
            NewTransaction::expense("Gym", 99.0, Category::Health, date(2026, 1, 8)).recurring(),
            NewTransaction::expense("gym ", 99.0, Category::Health, date(2026, 2, 9)).recurring(),
        ]);

        let feb = build(&txs, &[], &[], month(2026, 2), date(2026, 2, 20));
        assert_eq!(feb.len(), 1);
        assert_eq!(feb[0].target_id, "recurring:gym");
        assert_eq!(feb[0].due_date, date(2026, 2, 9));
        assert_eq!(feb[0].status, AgendaStatus::Paid);
        assert_eq!(feb[0].transaction_ids, vec![2]);

        let mar = build(&txs, &[], &[], month(2026, 3), date(2026, 3, 5));
        assert_eq!(mar[0].due_date, date(2026, 3, 9));
        assert_eq!(mar[0].status, AgendaStatus::Pending);

        let mar_late = build(&txs, &[], &[], month(2026, 3), date(2026, 3, 10));
        assert_eq!(mar_late[0].status, AgendaStatus::Overdue);

        // Before the first occurrence there is nothing to pay
        assert!(build(&txs, &[], &[], month(2025, 12), date(2025, 12, 1)).is_empty());
    }

    #[test]
    fn test_recurring_due_day_clamped_to_short_month() {
        let txs = ledger(vec![NewTransaction::expense(
            "Rent",
            1500.0,
            Category::Housing,
            date(2026, 1, 31),
        )
        .recurring()]);
        let items = build(&txs, &[], &[], month(2026, 2), date(2026, 2, 1));
        assert_eq!(items[0].due_date, date(2026, 2, 28));
    }

    #[test]
    fn test_recurring_manual_check() {
        let txs = ledger(vec![NewTransaction::expense(
            "Internet",
            120.0,
            Category::Utilities,
            date(2026, 1, 15),
        )
        .recurring()]);
        let feb = month(2026, 2);
        let checklist = vec![ChecklistEntry::new("recurring:internet", feb)];
        let items = build(&txs, &[], &checklist, feb, date(2026, 2, 20));
        assert_eq!(items[0].status, AgendaStatus::Paid);
        assert!(items[0].paid_manually);
    }

    #[test]
    fn test_linked_recurring_without_invoices_is_standalone() {
        let txs = ledger(vec![NewTransaction::expense(
            "Spotify",
            21.9,
            Category::Subscriptions,
            date(2026, 1, 12),
        )
        .recurring()
        .linked_to_invoice("Itau")]);
        let items = build(&txs, &[], &[], month(2026, 2), date(2026, 2, 1));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, AgendaSource::Recurring);
    }

    #[test]
    fn test_linked_recurring_billed_on_one_overlapping_issuer() {
        let txs = ledger(vec![
            NewTransaction::expense("Mercado", 50.0, Category::Food, date(2026, 1, 20))
                .effective_on(date(2026, 2, 5))
                .on_card("Nu"),
            NewTransaction::expense("Posto", 80.0, Category::Transport, date(2026, 1, 15))
                .effective_on(date(2026, 2, 10))
                .on_card("Nubank"),
            NewTransaction::expense("Spotify", 21.9, Category::Subscriptions, date(2026, 1, 12))
                .recurring()
                .linked_to_invoice("Nubank"),
        ]);
        let invoices = vec![
            invoice(1, "Nu", date(2026, 2, 5), vec![1]),
            invoice(2, "Nubank", date(2026, 2, 10), vec![2]),
        ];
        let items = build(&txs, &invoices, &[], month(2026, 2), date(2026, 2, 1));

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.source == AgendaSource::Invoice));
        assert_eq!(items[0].target_id, "invoice:nu");
        assert!((items[0].amount - 50.0).abs() < 1e-9);
        assert_eq!(items[1].target_id, "invoice:nubank");
        assert!((items[1].amount - 101.9).abs() < 1e-9);
    }

    #[test]
    fn test_one_off_status_by_effective_date() {
        let txs = ledger(vec![
            NewTransaction::expense("Dentist", 300.0, Category::Health, date(2026, 2, 3)),
            NewTransaction::expense("Course", 500.0, Category::Education, date(2026, 2, 1))
                .effective_on(date(2026, 2, 25)),
            NewTransaction::income("Salary", 3000.0, Category::Salary, date(2026, 2, 5)),
        ]);
        let feb = month(2026, 2);
        let today = date(2026, 2, 10);

        let items = build(&txs, &[], &[], feb, today);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].target_id, "tx:1");
        assert_eq!(items[0].status, AgendaStatus::Paid);
        assert_eq!(items[1].target_id, "tx:2");
        assert_eq!(items[1].status, AgendaStatus::Pending);

        let checklist = vec![ChecklistEntry::new("tx:2", feb)];
        let items = build(&txs, &[], &checklist, feb, today);
        assert_eq!(items[1].status, AgendaStatus::Paid);
        assert!(items[1].paid_manually);
    }

    #[test]
    fn test_sorted_by_due_date_and_idempotent() {
        let (mut txs, invoices) = nubank_ledger();
        txs.extend(ledger(vec![
            NewTransaction::expense("Gym", 99.0, Category::Health, date(2026, 1, 3)).recurring(),
            NewTransaction::expense("Dentist", 300.0, Category::Health, date(2026, 2, 20)),
        ]));
        // Re-id the appended rows so ids stay unique
        txs[3].id = 4;
        txs[4].id = 5;

        let feb = month(2026, 2);
        let today = date(2026, 2, 15);
        let a = build(&txs, &invoices, &[], feb, today);
        let b = build(&txs, &invoices, &[], feb, today);
        assert_eq!(a, b);

        let dues: Vec<NaiveDate> = a.iter().map(|i| i.due_date).collect();
        assert_eq!(
            dues,
            vec![date(2026, 2, 3), date(2026, 2, 10), date(2026, 2, 20)]
        );
        assert_eq!(a[0].status, AgendaStatus::Overdue);

        let mut reversed = txs.clone();
        reversed.reverse();
        assert_eq!(build(&reversed, &invoices, &[], feb, today), a);
    }
}
