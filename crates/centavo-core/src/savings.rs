//! Savings opportunity detection
//!
//! Scans expenses for:
//! - Duplicate charges: same description and amount within a few days
//! - Subscriptions: anything categorized as a subscription or flagged recurring
//! - Bank fees: descriptions mentioning fees, annual fees, interest or penalties
//!
//! Every opportunity id is `<kind>:<transaction id>`. The detector re-runs
//! from scratch on each call, and stored reviews find their item again
//! through that id.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SavingsConfig;
use crate::ledger;
use crate::matching;
use crate::models::{Category, ReviewStatus, SavingsReview, Transaction};

/// Kind of savings opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Duplicate,
    Subscription,
    Fee,
}

impl OpportunityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityKind::Duplicate => "duplicate",
            OpportunityKind::Subscription => "subscription",
            OpportunityKind::Fee => "fee",
        }
    }
}

impl std::fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable id for an opportunity found on a transaction
pub fn opportunity_id(kind: OpportunityKind, transaction_id: i64) -> String {
    format!("{}:{}", kind.as_str(), transaction_id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub kind: OpportunityKind,
    pub transaction_id: i64,
    pub description: String,
    pub category: Category,
    pub date: NaiveDate,
    /// Amount of the underlying transaction
    pub original_amount: f64,
    /// Amount that counts toward potential savings after review
    pub counted_amount: f64,
    pub status: ReviewStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsReport {
    pub total_potential: f64,
    pub items: Vec<Opportunity>,
}

/// Detect opportunities and apply reviews.
///
/// Kept and dismissed items drop out of both the list and the total.
/// Adjusted items count their override amount. Sorted by counted amount,
/// largest first.
pub fn detect(
    ledger: &[Transaction],
    reviews: &[SavingsReview],
    config: &SavingsConfig,
) -> SavingsReport {
    let mut items: Vec<Opportunity> = annotate(detect_raw(ledger, config), reviews)
        .into_iter()
        .filter(|item| item.status.counts())
        .collect();
    sort_by_counted(&mut items);

    SavingsReport {
        total_potential: total_potential(&items),
        items,
    }
}

/// Every opportunity in the ledger, ignoring reviews (all pending)
pub fn detect_raw(ledger: &[Transaction], config: &SavingsConfig) -> Vec<Opportunity> {
    let expenses = ledger::expenses(ledger);

    let mut items = Vec::new();
    items.extend(find_duplicates(&expenses, config));
    items.extend(find_subscriptions(&expenses));
    items.extend(find_fees(&expenses, config));

    sort_by_counted(&mut items);
    items
}

/// Attach review status to each item without removing any
pub fn annotate(items: Vec<Opportunity>, reviews: &[SavingsReview]) -> Vec<Opportunity> {
    let by_id: HashMap<&str, &SavingsReview> = reviews
        .iter()
        .map(|r| (r.opportunity_id.as_str(), r))
        .collect();

    items
        .into_iter()
        .map(|mut item| {
            if let Some(review) = by_id.get(item.id.as_str()) {
                item.status = review.status;
                item.counted_amount = match review.status {
                    ReviewStatus::Pending => item.original_amount,
                    ReviewStatus::Kept | ReviewStatus::Dismissed => 0.0,
                    ReviewStatus::Adjusted => review
                        .adjusted_amount
                        .unwrap_or(item.original_amount)
                        .max(0.0),
                };
            }
            item
        })
        .collect()
}

/// Sum of counted amounts for items still in play (pending + adjusted)
pub fn total_potential(items: &[Opportunity]) -> f64 {
    items
        .iter()
        .filter(|item| item.status.counts())
        .map(|item| item.counted_amount)
        .sum()
}

fn sort_by_counted(items: &mut [Opportunity]) {
    items.sort_by(|a, b| {
        b.counted_amount
            .partial_cmp(&a.counted_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn opportunity(kind: OpportunityKind, tx: &Transaction, reason: String) -> Opportunity {
    Opportunity {
        id: opportunity_id(kind, tx.id),
        kind,
        transaction_id: tx.id,
        description: tx.description.trim().to_string(),
        category: tx.category,
        date: tx.occurred_date,
        original_amount: tx.amount,
        counted_amount: tx.amount,
        status: ReviewStatus::Pending,
        reason,
    }
}

fn cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Later charge of each same-description, same-amount pair within the window.
///
/// Expenses are grouped by normalized description and amount in cents
/// before sorting, so pairs are consecutive within a group rather than in
/// the whole ledger: unrelated charges falling between two identical ones
/// do not hide the repeat.
fn find_duplicates(expenses: &[&Transaction], config: &SavingsConfig) -> Vec<Opportunity> {
    let mut groups: BTreeMap<(String, i64), Vec<&Transaction>> = BTreeMap::new();
    for tx in expenses {
        groups
            .entry((matching::normalize(&tx.description), cents(tx.amount)))
            .or_default()
            .push(tx);
    }

    let mut found = Vec::new();
    for (_, mut txs) in groups {
        if txs.len() < 2 {
            continue;
        }
        txs.sort_by_key(|tx| (tx.occurred_date, tx.created_at, tx.id));

        for pair in txs.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            let gap = (later.occurred_date - earlier.occurred_date).num_days();
            if gap > config.duplicate_window_days {
                continue;
            }

            let floor = if config.duplicate_frequent_categories.contains(&later.category) {
                config.duplicate_frequent_min_amount
            } else {
                config.duplicate_min_amount
            };
            if later.amount < floor {
                debug!(
                    "Ignoring repeat charge {} ({:.2} {}) below the {:.2} noise floor",
                    later.id, later.amount, later.category, floor
                );
                continue;
            }

            found.push(opportunity(
                OpportunityKind::Duplicate,
                later,
                format!(
                    "Same charge as transaction {} on {} ({} day(s) apart)",
                    earlier.id, earlier.occurred_date, gap
                ),
            ));
        }
    }
    found
}

fn find_subscriptions(expenses: &[&Transaction]) -> Vec<Opportunity> {
    expenses
        .iter()
        .filter(|tx| tx.category == Category::Subscriptions || tx.is_recurring)
        .map(|tx| {
            opportunity(
                OpportunityKind::Subscription,
                tx,
                "Recurring charge worth reviewing or cancelling".to_string(),
            )
        })
        .collect()
}

fn find_fees(expenses: &[&Transaction], config: &SavingsConfig) -> Vec<Opportunity> {
    let matcher = FeeMatcher::new(&config.fee_keywords);
    expenses
        .iter()
        .filter(|tx| matcher.is_match(&tx.description))
        .map(|tx| {
            opportunity(
                OpportunityKind::Fee,
                tx,
                "Bank fee or interest charge that can often be negotiated away".to_string(),
            )
        })
        .collect()
}

/// Case-insensitive substring match on any keyword, so plural and
/// inflected forms ("fees", "tarifas", "multas") count too
struct FeeMatcher {
    pattern: Option<Regex>,
    keywords: Vec<String>,
}

impl FeeMatcher {
    fn new(keywords: &[String]) -> Self {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| matching::normalize(k))
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return Self {
                pattern: None,
                keywords,
            };
        }

        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = match Regex::new(&format!(r"(?i)(?:{})", alternation)) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Fee keyword pattern rejected ({}), using plain matching", e);
                None
            }
        };

        Self { pattern, keywords }
    }

    fn is_match(&self, description: &str) -> bool {
        let normalized = matching::normalize(description);
        match &self.pattern {
            Some(re) => re.is_match(&normalized),
            None => self.keywords.iter().any(|k| normalized.contains(k.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::ledger;
    use crate::models::NewTransaction;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn review(id: &str, status: ReviewStatus, amount: Option<f64>) -> SavingsReview {
        SavingsReview {
            opportunity_id: id.to_string(),
            status,
            adjusted_amount: amount,
            note: None,
            updated_at: Utc::now(),
        }
    }

    fn ids(items: &[Opportunity]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_opportunity_id_format() {
        assert_eq!(opportunity_id(OpportunityKind::Duplicate, 42), "duplicate:42");
        assert_eq!(opportunity_id(OpportunityKind::Subscription, 7), "subscription:7");
        assert_eq!(opportunity_id(OpportunityKind::Fee, 1), "fee:1");
    }

    #[test]
    fn test_duplicate_flags_later_charge() {
        let txs = ledger(vec![
            NewTransaction::expense("Store X", 120.0, Category::Shopping, date(2026, 1, 3)),
            NewTransaction::expense("store x", 120.0, Category::Shopping, date(2026, 1, 5)),
        ]);
        let report = detect(&txs, &[], &SavingsConfig::default());
        assert_eq!(ids(&report.items), vec!["duplicate:2"]);
        assert_eq!(report.total_potential, 120.0);
    }

    #[test]
    fn test_duplicate_found_across_interleaved_charges() {
        let txs = ledger(vec![
            NewTransaction::expense("Gym Pass", 90.0, Category::Health, date(2026, 1, 1)),
            NewTransaction::expense("Bookstore", 45.0, Category::Education, date(2026, 1, 2)),
            NewTransaction::expense("GYM PASS", 90.0, Category::Health, date(2026, 1, 3)),
        ]);
        let report = detect(&txs, &[], &SavingsConfig::default());
        assert_eq!(ids(&report.items), vec!["duplicate:3"]);
        assert!(report.items[0].reason.contains("transaction 1"));
    }

    #[test]
    fn test_cheap_transport_repeat_is_not_duplicate() {
        let txs = ledger(vec![
            NewTransaction::expense("Uber", 25.0, Category::Transport, date(2026, 1, 3)),
            NewTransaction::expense("Uber", 25.0, Category::Transport, date(2026, 1, 4)),
        ]);
        let report = detect(&txs, &[], &SavingsConfig::default());
        assert!(report.items.is_empty());
        assert_eq!(report.total_potential, 0.0);
    }

    #[test]
    fn test_duplicate_noise_floor_and_window() {
        let txs = ledger(vec![
            // Under the general floor of 10
            NewTransaction::expense("Candy", 8.0, Category::Shopping, date(2026, 1, 3)),
            NewTransaction::expense("Candy", 8.0, Category::Shopping, date(2026, 1, 3)),
            // Too far apart
            NewTransaction::expense("Gift", 50.0, Category::Shopping, date(2026, 1, 1)),
            NewTransaction::expense("Gift", 50.0, Category::Shopping, date(2026, 1, 10)),
            // Food above the raised floor
            NewTransaction::expense("Steakhouse", 80.0, Category::Food, date(2026, 1, 4)),
            NewTransaction::expense("Steakhouse", 80.0, Category::Food, date(2026, 1, 7)),
            // Different amounts are not duplicates
            NewTransaction::expense("Pharmacy", 40.0, Category::Health, date(2026, 1, 4)),
            NewTransaction::expense("Pharmacy", 41.0, Category::Health, date(2026, 1, 4)),
        ]);
        let report = detect(&txs, &[], &SavingsConfig::default());
        assert_eq!(ids(&report.items), vec!["duplicate:6"]);
    }

    #[test]
    fn test_triple_charge_flags_each_repeat() {
        let txs = ledger(vec![
            NewTransaction::expense("Hotel", 300.0, Category::Shopping, date(2026, 1, 1)),
            NewTransaction::expense("Hotel", 300.0, Category::Shopping, date(2026, 1, 2)),
            NewTransaction::expense("Hotel", 300.0, Category::Shopping, date(2026, 1, 3)),
        ]);
        let report = detect(&txs, &[], &SavingsConfig::default());
        assert_eq!(ids(&report.items), vec!["duplicate:2", "duplicate:3"]);
    }

    #[test]
    fn test_subscriptions_detected_regardless_of_amount() {
        let txs = ledger(vec![
            NewTransaction::expense("Netflix", 40.0, Category::Subscriptions, date(2026, 1, 5)),
            NewTransaction::expense("Gym", 2.0, Category::Health, date(2026, 1, 5)).recurring(),
            NewTransaction::income("Salary", 3000.0, Category::Salary, date(2026, 1, 5))
                .recurring(),
        ]);
        let report = detect(&txs, &[], &SavingsConfig::default());
        assert_eq!(ids(&report.items), vec!["subscription:1", "subscription:2"]);
        assert_eq!(report.total_potential, 42.0);
    }

    #[test]
    fn test_fee_keywords_match_inside_words() {
        let txs = ledger(vec![
            NewTransaction::expense("Monthly account FEE", 15.0, Category::Other, date(2026, 1, 5)),
            NewTransaction::expense("Anuidade cartao", 30.0, Category::Other, date(2026, 1, 5)),
            NewTransaction::expense("Juros rotativo", 55.0, Category::Other, date(2026, 1, 5)),
            NewTransaction::expense("Groceries", 12.0, Category::Food, date(2026, 1, 5)),
            NewTransaction::expense("Late penalty", 5.0, Category::Other, date(2026, 1, 6)),
        ]);
        let report = detect(&txs, &[], &SavingsConfig::default());
        assert_eq!(ids(&report.items), vec!["fee:3", "fee:2", "fee:1", "fee:5"]);
    }

    #[test]
    fn test_fee_keywords_match_plural_forms() {
        let txs = ledger(vec![
            NewTransaction::expense("Tarifas bancarias", 20.0, Category::Other, date(2026, 1, 5)),
            NewTransaction::expense("MULTAS DETRAN", 130.0, Category::Transport, date(2026, 1, 6)),
            NewTransaction::expense("Overdraft fees", 35.0, Category::Other, date(2026, 1, 7)),
        ]);
        let report = detect(&txs, &[], &SavingsConfig::default());
        assert_eq!(ids(&report.items), vec!["fee:2", "fee:3", "fee:1"]);
        assert!(report.items.iter().all(|i| i.kind == OpportunityKind::Fee));
        assert_eq!(report.total_potential, 185.0);
    }

    #[test]
    fn test_fee_regex_and_plain_matching_agree() {
        let matcher = FeeMatcher::new(&SavingsConfig::default().fee_keywords);
        let plain = FeeMatcher {
            pattern: None,
            keywords: matcher.keywords.clone(),
        };
        for description in ["Tarifas bancarias", "MULTAS DETRAN", "Annual   FEE", "Rent"] {
            assert_eq!(matcher.is_match(description), plain.is_match(description));
        }
        assert!(matcher.pattern.is_some());
    }

    #[test]
    fn test_reviews_filter_and_adjust() {
        let txs = ledger(vec![
            NewTransaction::expense("Netflix", 40.0, Category::Subscriptions, date(2026, 1, 5)),
            NewTransaction::expense("Spotify", 20.0, Category::Subscriptions, date(2026, 1, 5)),
            NewTransaction::expense("Disney", 30.0, Category::Subscriptions, date(2026, 1, 5)),
            NewTransaction::expense("Max", 35.0, Category::Subscriptions, date(2026, 1, 5)),
        ]);
        let reviews = vec![
            review("subscription:1", ReviewStatus::Dismissed, None),
            review("subscription:2", ReviewStatus::Kept, None),
            review("subscription:3", ReviewStatus::Adjusted, Some(10.0)),
        ];

        let report = detect(&txs, &reviews, &SavingsConfig::default());
        assert_eq!(ids(&report.items), vec!["subscription:4", "subscription:3"]);
        assert_eq!(report.total_potential, 45.0);

        let adjusted = &report.items[1];
        assert_eq!(adjusted.status, ReviewStatus::Adjusted);
        assert_eq!(adjusted.counted_amount, 10.0);
        assert_eq!(adjusted.original_amount, 30.0);
    }

    #[test]
    fn test_dismiss_never_increases_total_and_keep_matches_dismiss() {
        let txs = ledger(vec![
            NewTransaction::expense("Netflix", 40.0, Category::Subscriptions, date(2026, 1, 5)),
            NewTransaction::expense("Bank fee", 12.0, Category::Other, date(2026, 1, 6)),
        ]);
        let config = SavingsConfig::default();

        let before = detect(&txs, &[], &config).total_potential;
        let dismissed = detect(
            &txs,
            &[review("fee:2", ReviewStatus::Dismissed, None)],
            &config,
        )
        .total_potential;
        let kept = detect(&txs, &[review("fee:2", ReviewStatus::Kept, None)], &config)
            .total_potential;

        assert!(dismissed <= before);
        assert_eq!(before, 52.0);
        assert_eq!(dismissed, 40.0);
        assert_eq!(kept, dismissed);
    }

    #[test]
    fn test_review_survives_ledger_growth() {
        let mut drafts = vec![NewTransaction::expense(
            "Netflix",
            40.0,
            Category::Subscriptions,
            date(2026, 1, 5),
        )];
        let reviews = vec![review("subscription:1", ReviewStatus::Dismissed, None)];
        let config = SavingsConfig::default();

        let first = detect(&ledger(drafts.clone()), &reviews, &config);
        assert!(first.items.is_empty());

        drafts.push(NewTransaction::expense(
            "Hulu",
            25.0,
            Category::Subscriptions,
            date(2026, 2, 5),
        ));
        let second = detect(&ledger(drafts), &reviews, &config);
        assert_eq!(ids(&second.items), vec!["subscription:2"]);
    }

    #[test]
    fn test_raw_detection_ignores_reviews_and_annotate_keeps_all() {
        let txs = ledger(vec![
            NewTransaction::expense("Netflix", 40.0, Category::Subscriptions, date(2026, 1, 5)),
            NewTransaction::expense("Spotify", 20.0, Category::Subscriptions, date(2026, 1, 5)),
        ]);
        let config = SavingsConfig::default();
        let raw = detect_raw(&txs, &config);
        assert_eq!(raw.len(), 2);
        assert!(raw.iter().all(|i| i.status == ReviewStatus::Pending));

        let annotated = annotate(raw, &[review("subscription:1", ReviewStatus::Dismissed, None)]);
        assert_eq!(annotated.len(), 2);
        assert_eq!(annotated[0].status, ReviewStatus::Dismissed);
        assert_eq!(annotated[0].counted_amount, 0.0);
        assert_eq!(total_potential(&annotated), 20.0);
    }

    #[test]
    fn test_detection_is_order_independent() {
        let txs = ledger(vec![
            NewTransaction::expense("Store X", 120.0, Category::Shopping, date(2026, 1, 3)),
            NewTransaction::expense("Store X", 120.0, Category::Shopping, date(2026, 1, 5)),
            NewTransaction::expense("Tarifa pacote", 30.0, Category::Other, date(2026, 1, 6)),
        ]);
        let mut reversed = txs.clone();
        reversed.reverse();
        let config = SavingsConfig::default();
        assert_eq!(detect(&txs, &[], &config), detect(&reversed, &[], &config));
    }
}
