//! Month-end forecast
//!
//! Projects month-end income, expense and balance from month-to-date
//! actuals plus the fixed expenses declared in settings, and flags
//! categories on track to exceed an income-based budget.
//!
//! Only the real current month is extrapolated. Past and future months
//! being viewed report their actuals unchanged.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ForecastConfig;
use crate::ledger;
use crate::matching;
use crate::models::{Category, FixedExpense, MonthKey, Settings, Transaction};

/// A category projected to overshoot its budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCategory {
    pub category: Category,
    pub current: f64,
    pub projected: f64,
    pub limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub month: MonthKey,
    /// Whether the month was extrapolated (it is the real current month)
    pub extrapolated: bool,
    pub actual_income: f64,
    pub actual_expense: f64,
    /// Declared fixed expenses with no matching payment yet this month
    pub pending_fixed: Vec<FixedExpense>,
    pub pending_fixed_total: f64,
    pub days_passed: u32,
    pub days_remaining: u32,
    pub avg_daily_expense: f64,
    pub predicted_income: f64,
    pub predicted_expense: f64,
    pub predicted_balance: f64,
    pub risk_categories: Vec<RiskCategory>,
}

/// Project the month containing `as_of`.
///
/// `today` is the caller's notion of the real current date; it decides
/// whether the month is extrapolated and how many days have passed.
pub fn project(
    ledger: &[Transaction],
    as_of: NaiveDate,
    today: NaiveDate,
    settings: Option<&Settings>,
    turbo: bool,
    config: &ForecastConfig,
) -> Forecast {
    let month = MonthKey::of(as_of);
    let month_txs = ledger::in_month(ledger, month);
    let actual = ledger::totals(month_txs.iter().copied());
    let days_in_month = month.days_in_month();
    let extrapolated = month == MonthKey::of(today);

    let (days_passed, days_remaining) = if extrapolated {
        let passed = today.day().max(1);
        (passed, days_in_month.saturating_sub(passed))
    } else {
        (days_in_month, 0)
    };

    let avg_daily_expense = actual.expense / days_passed as f64;

    let mut pending_fixed = Vec::new();
    let mut predicted_expense = actual.expense;
    let mut predicted_income = actual.income;

    if extrapolated {
        if let Some(settings) = settings {
            pending_fixed = unmatched_fixed_expenses(&settings.fixed_expenses, &month_txs, config);
            if let Some(income) = settings.income() {
                predicted_income = predicted_income.max(income);
            }
        }
        let pending_total: f64 = pending_fixed.iter().map(|f| f.amount).sum();
        predicted_expense = actual.expense
            + pending_total
            + avg_daily_expense * days_remaining as f64 * config.damping_factor;
    }

    let pending_fixed_total = pending_fixed.iter().map(|f| f.amount).sum();

    let risk_categories = match settings.and_then(|s| s.income()) {
        Some(income) => risk_categories(
            &month_txs,
            income,
            days_passed,
            days_remaining,
            turbo,
            config,
        ),
        None => Vec::new(),
    };

    Forecast {
        month,
        extrapolated,
        actual_income: actual.income,
        actual_expense: actual.expense,
        pending_fixed,
        pending_fixed_total,
        days_passed,
        days_remaining,
        avg_daily_expense,
        predicted_income,
        predicted_expense,
        predicted_balance: predicted_income - predicted_expense,
        risk_categories,
    }
}

/// Fixed expenses with no same-month payment within tolerance
fn unmatched_fixed_expenses(
    fixed: &[FixedExpense],
    month_txs: &[&Transaction],
    config: &ForecastConfig,
) -> Vec<FixedExpense> {
    fixed
        .iter()
        .filter(|f| f.amount > 0.0)
        .filter(|f| {
            !month_txs.iter().any(|tx| {
                tx.is_expense()
                    && matching::loosely_matches(&tx.description, &f.description)
                    && matching::amount_within(tx.amount, f.amount, config.fixed_match_tolerance)
            })
        })
        .cloned()
        .collect()
}

fn risk_categories(
    month_txs: &[&Transaction],
    income: f64,
    days_passed: u32,
    days_remaining: u32,
    turbo: bool,
    config: &ForecastConfig,
) -> Vec<RiskCategory> {
    let spent = ledger::category_totals(month_txs.iter().copied());
    let factor = if turbo { config.turbo_factor } else { 1.0 };

    let mut risks: Vec<RiskCategory> = config
        .budget_fractions
        .iter()
        .filter_map(|(category, fraction)| {
            let current = spent.get(category).copied().unwrap_or(0.0);
            let projected =
                current + current / days_passed.max(1) as f64 * days_remaining as f64;
            let limit = income * fraction * factor;
            (projected > limit).then_some(RiskCategory {
                category: *category,
                current,
                projected,
                limit,
            })
        })
        .collect();

    let discretionary_at_risk = risks
        .iter()
        .any(|r| config.non_essential.contains(&r.category));
    if discretionary_at_risk {
        let before = risks.len();
        risks.retain(|r| r.category != Category::Housing);
        if risks.len() != before {
            debug!("Housing risk suppressed in favour of discretionary overspend");
        }
    }

    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::ledger;
    use crate::models::NewTransaction;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings(income: f64, fixed: &[(&str, f64)]) -> Settings {
        Settings {
            monthly_income: Some(income),
            savings_goal: None,
            fixed_expenses: fixed
                .iter()
                .map(|(d, a)| FixedExpense {
                    description: d.to_string(),
                    amount: *a,
                })
                .collect(),
        }
    }

    #[test]
    fn test_projection_with_pending_fixed_expense() {
        // September 2026 has 30 days
        let txs = ledger(vec![
            NewTransaction::expense("Groceries", 50.0, Category::Food, date(2026, 9, 1)),
            NewTransaction::expense("Netflix", 40.0, Category::Subscriptions, date(2026, 8, 5))
                .recurring(),
        ]);
        let settings = settings(3000.0, &[("Netflix", 40.0)]);
        let today = date(2026, 9, 15);

        let forecast = project(
            &txs,
            today,
            today,
            Some(&settings),
            false,
            &ForecastConfig::default(),
        );

        assert!(forecast.extrapolated);
        assert_eq!(forecast.days_passed, 15);
        assert_eq!(forecast.days_remaining, 15);
        assert!((forecast.avg_daily_expense - 50.0 / 15.0).abs() < 1e-9);
        assert_eq!(forecast.pending_fixed_total, 40.0);
        assert!((forecast.predicted_expense - 130.0).abs() < 1e-9);
        assert_eq!(forecast.predicted_income, 3000.0);
        assert!((forecast.predicted_balance - 2870.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_expense_matched_within_tolerance() {
        let txs = ledger(vec![NewTransaction::expense(
            "Netflix Premium",
            43.0,
            Category::Subscriptions,
            date(2026, 9, 3),
        )]);
        let settings = settings(3000.0, &[("netflix", 40.0), ("Rent", 1000.0)]);
        let today = date(2026, 9, 10);

        let forecast = project(
            &txs,
            today,
            today,
            Some(&settings),
            false,
            &ForecastConfig::default(),
        );

        assert_eq!(forecast.pending_fixed.len(), 1);
        assert_eq!(forecast.pending_fixed[0].description, "Rent");
    }

    #[test]
    fn test_fixed_expense_outside_tolerance_stays_pending() {
        let txs = ledger(vec![NewTransaction::expense(
            "Netflix",
            60.0,
            Category::Subscriptions,
            date(2026, 9, 3),
        )]);
        let settings = settings(3000.0, &[("Netflix", 40.0)]);
        let today = date(2026, 9, 10);

        let forecast = project(&txs, today, today, Some(&settings), false, &ForecastConfig::default());
        assert_eq!(forecast.pending_fixed_total, 40.0);
    }

    #[test]
    fn test_past_month_reports_actuals() {
        let txs = ledger(vec![
            NewTransaction::income("Salary", 3000.0, Category::Salary, date(2026, 8, 1)),
            NewTransaction::expense("Groceries", 500.0, Category::Food, date(2026, 8, 10)),
        ]);
        let settings = settings(3500.0, &[("Rent", 1000.0)]);

        let forecast = project(
            &txs,
            date(2026, 8, 20),
            date(2026, 9, 15),
            Some(&settings),
            false,
            &ForecastConfig::default(),
        );

        assert!(!forecast.extrapolated);
        assert_eq!(forecast.predicted_expense, 500.0);
        assert_eq!(forecast.predicted_income, 3000.0);
        assert_eq!(forecast.predicted_balance, 2500.0);
        assert!(forecast.pending_fixed.is_empty());
        assert_eq!(forecast.days_remaining, 0);
    }

    #[test]
    fn test_missing_income_disables_risk() {
        let txs = ledger(vec![NewTransaction::expense(
            "Dinner",
            900.0,
            Category::Food,
            date(2026, 9, 2),
        )]);
        let today = date(2026, 9, 10);
        let config = ForecastConfig::default();

        let forecast = project(&txs, today, today, None, false, &config);
        assert!(forecast.risk_categories.is_empty());

        let no_income = Settings::default();
        let forecast = project(&txs, today, today, Some(&no_income), false, &config);
        assert!(forecast.risk_categories.is_empty());
    }

    #[test]
    fn test_risk_category_flagged_from_linear_projection() {
        // 300 on food in 10 of 30 days projects to 900; limit is 3000 * 0.25 = 750
        let txs = ledger(vec![NewTransaction::expense(
            "Market",
            300.0,
            Category::Food,
            date(2026, 9, 5),
        )]);
        let settings = settings(3000.0, &[]);
        let today = date(2026, 9, 10);

        let forecast = project(&txs, today, today, Some(&settings), false, &ForecastConfig::default());
        assert_eq!(forecast.risk_categories.len(), 1);
        let risk = &forecast.risk_categories[0];
        assert_eq!(risk.category, Category::Food);
        assert_eq!(risk.current, 300.0);
        assert!((risk.projected - 900.0).abs() < 1e-9);
        assert!((risk.limit - 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_turbo_tightens_limits() {
        // Transport 140 in 10 days projects to 420; limit 450 normally, 360 in turbo
        let txs = ledger(vec![NewTransaction::expense(
            "Fuel",
            140.0,
            Category::Transport,
            date(2026, 9, 5),
        )]);
        let settings = settings(3000.0, &[]);
        let today = date(2026, 9, 10);
        let config = ForecastConfig::default();

        let normal = project(&txs, today, today, Some(&settings), false, &config);
        assert!(normal.risk_categories.is_empty());

        let turbo = project(&txs, today, today, Some(&settings), true, &config);
        assert_eq!(turbo.risk_categories.len(), 1);
        assert!((turbo.risk_categories[0].limit - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_housing_risk_suppressed_by_discretionary_risk() {
        let txs = ledger(vec![
            NewTransaction::expense("Rent", 1500.0, Category::Housing, date(2026, 9, 1)),
            NewTransaction::expense("Concert", 200.0, Category::Entertainment, date(2026, 9, 2)),
        ]);
        let settings = settings(3000.0, &[]);
        let today = date(2026, 9, 10);

        let forecast = project(&txs, today, today, Some(&settings), false, &ForecastConfig::default());
        let cats: Vec<Category> = forecast.risk_categories.iter().map(|r| r.category).collect();
        assert_eq!(cats, vec![Category::Entertainment]);
    }

    #[test]
    fn test_housing_risk_kept_without_discretionary_risk() {
        let txs = ledger(vec![NewTransaction::expense(
            "Rent",
            1500.0,
            Category::Housing,
            date(2026, 9, 1),
        )]);
        let settings = settings(3000.0, &[]);
        let today = date(2026, 9, 10);

        let forecast = project(&txs, today, today, Some(&settings), false, &ForecastConfig::default());
        assert_eq!(forecast.risk_categories.len(), 1);
        assert_eq!(forecast.risk_categories[0].category, Category::Housing);
    }

    #[test]
    fn test_day_one_counts_as_one_day_passed() {
        let txs = ledger(vec![NewTransaction::expense(
            "Market",
            30.0,
            Category::Food,
            date(2026, 9, 1),
        )]);
        let today = date(2026, 9, 1);
        let forecast = project(&txs, today, today, None, false, &ForecastConfig::default());
        assert_eq!(forecast.days_passed, 1);
        assert_eq!(forecast.days_remaining, 29);
        assert!((forecast.predicted_expense - (30.0 + 30.0 * 29.0 * 0.8)).abs() < 1e-9);
    }
}
