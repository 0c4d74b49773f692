//! Spending alerts
//!
//! Derives a short list of human-readable warnings from the ledger. Each
//! rule is independent; no rule hides another. Alert ids are derived from
//! their inputs so the UI can deduplicate across refreshes.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::AlertConfig;
use crate::ledger;
use crate::models::{Category, MonthKey, Settings, Transaction};

/// Severity level of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Danger,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Danger => "danger",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(AlertSeverity::Info),
            "warning" => Ok(AlertSeverity::Warning),
            "danger" => Ok(AlertSeverity::Danger),
            _ => Err(format!("Unknown alert severity: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Deterministic key (e.g., "large-expense:42")
    pub id: String,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
}

impl Alert {
    fn new(
        id: impl Into<String>,
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Generate alerts for the moment `now` (local wall-clock time).
///
/// Order: turbo banner, overspend, habits (by category), large expenses
/// (newest first), late-night spending.
pub fn generate_alerts(
    ledger: &[Transaction],
    settings: Option<&Settings>,
    turbo: bool,
    now: NaiveDateTime,
    config: &AlertConfig,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if turbo {
        alerts.push(Alert::new(
            "turbo-mode",
            AlertSeverity::Info,
            "Turbo mode is on",
            "Budget limits are tightened while turbo mode is active.",
        ));
    }

    alerts.extend(overspend_alert(ledger, settings, now, config));
    alerts.extend(habit_alerts(ledger, now, config));
    alerts.extend(large_expense_alerts(ledger, now, config));
    alerts.extend(late_night_alert(ledger, now, config));

    alerts
}

fn overspend_alert(
    ledger: &[Transaction],
    settings: Option<&Settings>,
    now: NaiveDateTime,
    config: &AlertConfig,
) -> Option<Alert> {
    let month = MonthKey::of(now.date());
    let totals = ledger::month_totals(ledger, month);

    // Ledger income first; declared income covers months where the salary has not landed yet
    let income = if totals.income > 0.0 {
        totals.income
    } else {
        settings.and_then(|s| s.income())?
    };

    if totals.expense > income {
        Some(Alert::new(
            format!("overspend-danger:{}", month),
            AlertSeverity::Danger,
            "Spending exceeds income",
            format!(
                "You have spent {:.2} this month against an income of {:.2}.",
                totals.expense, income
            ),
        ))
    } else if totals.expense >= income * config.overspend_warning_ratio {
        Some(Alert::new(
            format!("overspend-warning:{}", month),
            AlertSeverity::Warning,
            "Close to your income limit",
            format!(
                "You have used {:.0}% of this month's income ({:.2} of {:.2}).",
                totals.expense / income * 100.0,
                totals.expense,
                income
            ),
        ))
    } else {
        None
    }
}

fn habit_alerts(ledger: &[Transaction], now: NaiveDateTime, config: &AlertConfig) -> Vec<Alert> {
    let recent = ledger::occurred_within(ledger, now.date(), config.habit_window_days);

    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for tx in ledger::expenses(recent) {
        if tx.category == Category::Housing {
            continue;
        }
        *counts.entry(tx.category).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count >= config.habit_min_count)
        .map(|(category, count)| {
            Alert::new(
                format!("habit:{}", category),
                AlertSeverity::Warning,
                format!("Frequent {} spending", category.label()),
                format!(
                    "{} {} purchases in the last {} days.",
                    count,
                    category.label(),
                    config.habit_window_days
                ),
            )
        })
        .collect()
}

fn large_expense_alerts(
    ledger: &[Transaction],
    now: NaiveDateTime,
    config: &AlertConfig,
) -> Vec<Alert> {
    let recent = ledger::occurred_within(ledger, now.date(), config.large_expense_window_days);
    let mut large: Vec<&Transaction> = ledger::expenses(recent)
        .into_iter()
        .filter(|tx| tx.category != Category::Housing)
        .filter(|tx| tx.amount > config.large_expense_threshold)
        .collect();
    large.sort_by(|a, b| {
        b.occurred_date
            .cmp(&a.occurred_date)
            .then_with(|| b.id.cmp(&a.id))
    });

    large
        .into_iter()
        .map(|tx| {
            Alert::new(
                format!("large-expense:{}", tx.id),
                AlertSeverity::Warning,
                "Large expense",
                format!(
                    "{} for {:.2} on {}.",
                    tx.description.trim(),
                    tx.amount,
                    tx.occurred_date
                ),
            )
        })
        .collect()
}

fn late_night_alert(
    ledger: &[Transaction],
    now: NaiveDateTime,
    config: &AlertConfig,
) -> Option<Alert> {
    let recent = ledger::occurred_within(ledger, now.date(), config.late_night_window_days);
    let count = ledger::expenses(recent)
        .into_iter()
        .filter(|tx| {
            tx.occurred_time.is_some_and(|t| {
                t.hour() >= config.late_night_start_hour || t.hour() <= config.late_night_end_hour
            })
        })
        .count();

    (count > 0).then(|| {
        Alert::new(
            format!("late-night:{}", now.date()),
            AlertSeverity::Info,
            "Late-night spending",
            format!(
                "{} purchase(s) made late at night in the last {} days.",
                count, config.late_night_window_days
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::ledger;
    use crate::models::NewTransaction;
    use chrono::{NaiveDate, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon(d: NaiveDate) -> NaiveDateTime {
        d.and_hms_opt(12, 0, 0).unwrap()
    }

    fn ids(alerts: &[Alert]) -> Vec<&str> {
        alerts.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_turbo_banner() {
        let now = noon(date(2026, 9, 10));
        let config = AlertConfig::default();
        assert!(generate_alerts(&[], None, false, now, &config).is_empty());
        assert_eq!(
            ids(&generate_alerts(&[], None, true, now, &config)),
            vec!["turbo-mode"]
        );
    }

    #[test]
    fn test_overspend_danger_and_warning_are_exclusive() {
        let now = noon(date(2026, 9, 20));
        let config = AlertConfig::default();

        let over = ledger(vec![
            NewTransaction::income("Salary", 1000.0, Category::Salary, date(2026, 9, 1)),
            NewTransaction::expense("Rent", 1100.0, Category::Housing, date(2026, 9, 2)),
        ]);
        assert_eq!(
            ids(&generate_alerts(&over, None, false, now, &config)),
            vec!["overspend-danger:2026-09"]
        );

        let close = ledger(vec![
            NewTransaction::income("Salary", 1000.0, Category::Salary, date(2026, 9, 1)),
            NewTransaction::expense("Rent", 950.0, Category::Housing, date(2026, 9, 2)),
        ]);
        let alerts = generate_alerts(&close, None, false, now, &config);
        assert_eq!(ids(&alerts), vec!["overspend-warning:2026-09"]);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);

        let fine = ledger(vec![
            NewTransaction::income("Salary", 1000.0, Category::Salary, date(2026, 9, 1)),
            NewTransaction::expense("Rent", 500.0, Category::Housing, date(2026, 9, 2)),
        ]);
        assert!(generate_alerts(&fine, None, false, now, &config).is_empty());
    }

    #[test]
    fn test_overspend_uses_declared_income_when_ledger_has_none() {
        let now = noon(date(2026, 9, 20));
        let txs = ledger(vec![NewTransaction::expense(
            "Rent",
            2000.0,
            Category::Housing,
            date(2026, 9, 2),
        )]);
        let settings = Settings {
            monthly_income: Some(1500.0),
            ..Default::default()
        };

        let alerts = generate_alerts(&txs, Some(&settings), false, now, &AlertConfig::default());
        assert_eq!(ids(&alerts), vec!["overspend-danger:2026-09"]);

        // No income anywhere: no base, no alert
        assert!(generate_alerts(&txs, None, false, now, &AlertConfig::default()).is_empty());
    }

    #[test]
    fn test_habit_alert_per_category_housing_exempt() {
        let today = date(2026, 9, 10);
        let mut drafts = Vec::new();
        for day in 4..=10 {
            drafts.push(NewTransaction::expense("Lunch", 5.0, Category::Food, date(2026, 9, day)));
        }
        for day in 6..=10 {
            drafts.push(NewTransaction::expense("Bill", 5.0, Category::Housing, date(2026, 9, day)));
        }
        // Only 4 rides, below threshold
        for day in 7..=10 {
            drafts.push(NewTransaction::expense("Ride", 5.0, Category::Transport, date(2026, 9, day)));
        }
        let txs = ledger(drafts);

        let alerts = generate_alerts(&txs, None, false, noon(today), &AlertConfig::default());
        assert_eq!(ids(&alerts), vec!["habit:food"]);
        assert!(alerts[0].message.starts_with("7 Food purchases"));
    }

    #[test]
    fn test_large_expense_alerts() {
        let today = date(2026, 9, 10);
        let txs = ledger(vec![
            NewTransaction::expense("Phone", 2500.0, Category::Shopping, date(2026, 9, 9)),
            NewTransaction::expense("TV", 1800.0, Category::Shopping, date(2026, 9, 10)),
            NewTransaction::expense("Old laptop", 3000.0, Category::Shopping, date(2026, 9, 1)),
            NewTransaction::expense("Rent", 2000.0, Category::Housing, date(2026, 9, 10)),
            NewTransaction::expense("Exactly", 1000.0, Category::Shopping, date(2026, 9, 10)),
            NewTransaction::income("Bonus", 50000.0, Category::Salary, date(2026, 9, 10)),
        ]);

        let alerts = generate_alerts(&txs, None, false, noon(today), &AlertConfig::default());
        assert_eq!(ids(&alerts), vec!["large-expense:2", "large-expense:1"]);
    }

    #[test]
    fn test_late_night_single_alert() {
        let today = date(2026, 9, 10);
        let txs = ledger(vec![
            NewTransaction::expense("Snack", 8.0, Category::Food, date(2026, 9, 9))
                .at(NaiveTime::from_hms_opt(23, 30, 0).unwrap()),
            NewTransaction::expense("Taxi", 30.0, Category::Transport, date(2026, 9, 10))
                .at(NaiveTime::from_hms_opt(2, 15, 0).unwrap()),
            NewTransaction::expense("Breakfast", 12.0, Category::Food, date(2026, 9, 10))
                .at(NaiveTime::from_hms_opt(5, 0, 0).unwrap()),
        ]);

        let alerts = generate_alerts(&txs, None, false, noon(today), &AlertConfig::default());
        assert_eq!(ids(&alerts), vec!["late-night:2026-09-10"]);
        assert!(alerts[0].message.starts_with("2 purchase(s)"));
    }

    #[test]
    fn test_late_night_outside_window_ignored() {
        let today = date(2026, 9, 10);
        let txs = ledger(vec![NewTransaction::expense(
            "Snack",
            8.0,
            Category::Food,
            date(2026, 9, 7),
        )
        .at(NaiveTime::from_hms_opt(1, 0, 0).unwrap())]);

        assert!(generate_alerts(&txs, None, false, noon(today), &AlertConfig::default()).is_empty());
    }

    #[test]
    fn test_alerts_are_deterministic() {
        let today = date(2026, 9, 10);
        let txs = ledger(vec![
            NewTransaction::income("Salary", 1000.0, Category::Salary, date(2026, 9, 1)),
            NewTransaction::expense("Phone", 2500.0, Category::Shopping, date(2026, 9, 9))
                .at(NaiveTime::from_hms_opt(23, 59, 0).unwrap()),
        ]);
        let config = AlertConfig::default();
        let a = generate_alerts(&txs, None, true, noon(today), &config);
        let b = generate_alerts(&txs, None, true, noon(today), &config);
        assert_eq!(a, b);
        assert_eq!(
            ids(&a),
            vec![
                "turbo-mode",
                "overspend-danger:2026-09",
                "large-expense:2",
                "late-night:2026-09-10"
            ]
        );
    }
}
