//! Savings plan composer
//!
//! Turns raw detector output, review annotations and the month forecast into
//! a report: executive summary, diagnosis, strategy and a triaged action
//! list. Dismissed and kept opportunities stay in the list with their status
//! but contribute nothing to the totals.

use serde::{Deserialize, Serialize};

use crate::config::{PlanConfig, SavingsConfig};
use crate::forecast::Forecast;
use crate::ledger;
use crate::models::{Category, MonthKey, ReviewStatus, SavingsReview, Settings, Transaction};
use crate::savings::{self, Opportunity, OpportunityKind};

/// Impact bucket for a plan action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::High => "high",
            Impact::Medium => "medium",
            Impact::Low => "low",
        }
    }

    fn classify(amount: f64, config: &PlanConfig) -> Self {
        if amount > config.high_impact_threshold {
            Impact::High
        } else if amount > config.medium_impact_threshold {
            Impact::Medium
        } else {
            Impact::Low
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAction {
    /// Opportunity this action came from; `None` for the generic fallback
    pub opportunity_id: Option<String>,
    pub kind: Option<OpportunityKind>,
    pub title: String,
    pub detail: String,
    pub impact: Impact,
    pub counted_amount: f64,
    pub original_amount: f64,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub month: MonthKey,
    /// Pending and adjusted opportunities only
    pub total_potential: f64,
    /// Fee and duplicate savings still in play
    pub confident_savings: f64,
    pub opportunity_count: usize,
    pub open_count: usize,
    pub predicted_balance: f64,
    pub savings_goal: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlan {
    pub summary: ExecutiveSummary,
    pub diagnosis: String,
    pub strategy: String,
    pub high: Vec<PlanAction>,
    pub medium: Vec<PlanAction>,
    pub low: Vec<PlanAction>,
}

impl SavingsPlan {
    pub fn actions(&self) -> impl Iterator<Item = &PlanAction> {
        self.high.iter().chain(&self.medium).chain(&self.low)
    }
}

/// Compose the plan for the forecast's month
pub fn compose(
    ledger: &[Transaction],
    reviews: &[SavingsReview],
    forecast: &Forecast,
    settings: Option<&Settings>,
    savings_config: &SavingsConfig,
    plan_config: &PlanConfig,
) -> SavingsPlan {
    let items = savings::annotate(savings::detect_raw(ledger, savings_config), reviews);

    let total_potential = savings::total_potential(&items);
    let confident_savings: f64 = items
        .iter()
        .filter(|i| i.status.counts())
        .filter(|i| matches!(i.kind, OpportunityKind::Fee | OpportunityKind::Duplicate))
        .map(|i| i.counted_amount)
        .sum();

    let month_expenses = ledger::in_month(ledger, forecast.month);
    let largest = ledger::largest_category(month_expenses.iter().copied());
    let month_spend = ledger::totals(month_expenses.iter().copied()).expense;

    let summary = ExecutiveSummary {
        month: forecast.month,
        total_potential,
        confident_savings,
        opportunity_count: items.len(),
        open_count: items.iter().filter(|i| i.status.counts()).count(),
        predicted_balance: forecast.predicted_balance,
        savings_goal: settings.and_then(|s| s.savings_goal).filter(|g| *g > 0.0),
    };

    let diagnosis = diagnose(forecast, largest, month_spend);
    let strategy = strategize(&summary, largest.map(|(cat, _)| cat));

    let (mut high, mut medium, mut low) = (Vec::new(), Vec::new(), Vec::new());
    if items.is_empty() {
        high.push(fallback_action(largest.map(|(cat, _)| cat)));
    }
    for item in &items {
        let action = action_for(item, plan_config);
        match action.impact {
            Impact::High => high.push(action),
            Impact::Medium => medium.push(action),
            Impact::Low => low.push(action),
        }
    }

    SavingsPlan {
        summary,
        diagnosis,
        strategy,
        high,
        medium,
        low,
    }
}

fn action_for(item: &Opportunity, config: &PlanConfig) -> PlanAction {
    let title = match item.kind {
        OpportunityKind::Duplicate => format!("Dispute possible duplicate: {}", item.description),
        OpportunityKind::Subscription => format!("Review subscription: {}", item.description),
        OpportunityKind::Fee => format!("Negotiate or avoid fee: {}", item.description),
    };

    let detail = match item.status {
        ReviewStatus::Adjusted => format!(
            "{} Counting {:.2} of the original {:.2}.",
            item.reason, item.counted_amount, item.original_amount
        ),
        ReviewStatus::Kept => format!("{} Kept on purpose.", item.reason),
        ReviewStatus::Dismissed => format!("{} Dismissed.", item.reason),
        ReviewStatus::Pending => item.reason.clone(),
    };

    PlanAction {
        opportunity_id: Some(item.id.clone()),
        kind: Some(item.kind),
        title,
        detail,
        impact: Impact::classify(item.counted_amount, config),
        counted_amount: item.counted_amount,
        original_amount: item.original_amount,
        status: item.status,
    }
}

fn fallback_action(largest: Option<Category>) -> PlanAction {
    let detail = match largest {
        Some(cat) => format!(
            "No savings opportunities detected. Set a monthly cap for {} and check it weekly.",
            cat.label()
        ),
        None => "No savings opportunities detected. Set a monthly spending cap and check it weekly."
            .to_string(),
    };

    PlanAction {
        opportunity_id: None,
        kind: None,
        title: "Set a monthly spending cap".to_string(),
        detail,
        impact: Impact::High,
        counted_amount: 0.0,
        original_amount: 0.0,
        status: ReviewStatus::Pending,
    }
}

fn diagnose(forecast: &Forecast, largest: Option<(Category, f64)>, month_spend: f64) -> String {
    let mut text = match largest {
        Some((cat, total)) => {
            let share = if month_spend > 0.0 {
                total / month_spend * 100.0
            } else {
                0.0
            };
            format!(
                "{} is your largest expense category in {}: {:.2} ({:.0}% of spending).",
                cat.label(),
                forecast.month,
                total,
                share
            )
        }
        None => format!("No expenses recorded in {} yet.", forecast.month),
    };

    if !forecast.risk_categories.is_empty() {
        let risks: Vec<String> = forecast
            .risk_categories
            .iter()
            .map(|r| format!("{} ({:.2} of {:.2})", r.category.label(), r.projected, r.limit))
            .collect();
        text.push_str(&format!(" Over budget pace: {}.", risks.join(", ")));
    }

    if forecast.predicted_balance < 0.0 {
        text.push_str(&format!(
            " The month is projected to close {:.2} in the red.",
            -forecast.predicted_balance
        ));
    }

    text
}

fn strategize(summary: &ExecutiveSummary, largest: Option<Category>) -> String {
    let mut text = match largest {
        Some(cat) => format!("Focus on {} first. ", cat.label()),
        None => String::new(),
    };

    text.push_str(&format!(
        "Cutting fees and duplicate charges saves at least {:.2}; acting on every open opportunity saves up to {:.2}.",
        summary.confident_savings, summary.total_potential
    ));

    if let Some(goal) = summary.savings_goal {
        let reachable = summary.predicted_balance + summary.total_potential;
        if reachable >= goal {
            text.push_str(&format!(" Your savings goal of {:.2} is within reach.", goal));
        } else {
            text.push_str(&format!(
                " Your savings goal of {:.2} is {:.2} short even with every cut.",
                goal,
                goal - reachable
            ));
        }
    }

    text
}
