//! Report command implementations (forecast, alerts, savings, review, plan)

use anyhow::{anyhow, bail, Result};
use centavo_core::db::Database;
use centavo_core::plan::PlanAction;
use centavo_core::{
    AlertSeverity, EngineConfig, MonthKey, ReviewStatus, ReviewStore, SavingsReview, Snapshot,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};

use super::truncate;

pub fn cmd_forecast(
    db: &Database,
    month: MonthKey,
    today: NaiveDate,
    turbo: bool,
    json: bool,
    config: &EngineConfig,
) -> Result<()> {
    let snapshot = Snapshot::load(db)?;
    let as_of = if month.contains(today) {
        today
    } else {
        month.first_day()
    };
    let forecast = snapshot.forecast(as_of, today, turbo, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
        return Ok(());
    }

    println!();
    println!("🔮 Forecast for {}", forecast.month);
    println!("   ─────────────────────────────");
    if forecast.extrapolated {
        println!(
            "   Day {} ({} remaining)",
            forecast.days_passed, forecast.days_remaining
        );
    } else {
        println!("   Not the current month: actuals only");
    }
    if turbo {
        println!("   🚀 Turbo mode: tighter limits");
    }
    println!("   Income so far:     {:>10.2}", forecast.actual_income);
    println!("   Spent so far:      {:>10.2}", forecast.actual_expense);
    println!("   Daily average:     {:>10.2}", forecast.avg_daily_expense);
    if !forecast.pending_fixed.is_empty() {
        println!(
            "   Fixed still due:   {:>10.2}",
            forecast.pending_fixed_total
        );
        for fixed in &forecast.pending_fixed {
            println!(
                "     • {:<28} {:>10.2}",
                truncate(&fixed.description, 28),
                fixed.amount
            );
        }
    }
    println!();
    println!("   Predicted income:  {:>10.2}", forecast.predicted_income);
    println!("   Predicted expense: {:>10.2}", forecast.predicted_expense);

    let balance = forecast.predicted_balance;
    if balance < 0.0 {
        println!("   Predicted balance: \x1b[31m{:>10.2}\x1b[0m", balance);
    } else {
        println!("   Predicted balance: \x1b[32m{:>10.2}\x1b[0m", balance);
    }

    if !forecast.risk_categories.is_empty() {
        println!();
        println!("⚠️  Categories over budget pace");
        for risk in &forecast.risk_categories {
            println!(
                "   {:<14} {:>9.2} now → {:>9.2} projected (limit {:.2})",
                risk.category.label(),
                risk.current,
                risk.projected,
                risk.limit
            );
        }
    }

    Ok(())
}

pub fn cmd_alerts(
    db: &Database,
    now: NaiveDateTime,
    turbo: bool,
    json: bool,
    config: &EngineConfig,
) -> Result<()> {
    let snapshot = Snapshot::load(db)?;
    let alerts = snapshot.alerts(now, turbo, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    if alerts.is_empty() {
        println!("✅ No alerts. Spending looks on track.");
        return Ok(());
    }

    println!();
    println!("🔔 Alerts ({})", alerts.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for alert in &alerts {
        let icon = match alert.severity {
            AlertSeverity::Danger => "🔴",
            AlertSeverity::Warning => "🟡",
            AlertSeverity::Info => "🔵",
        };
        println!("   {} {}", icon, alert.title);
        println!("      {}", alert.message);
    }

    Ok(())
}

pub fn cmd_savings(db: &Database, raw: bool, json: bool, config: &EngineConfig) -> Result<()> {
    let snapshot = Snapshot::load(db)?;

    let (items, total) = if raw {
        let items = snapshot.savings_annotated(config);
        let total = centavo_core::savings::total_potential(&items);
        (items, total)
    } else {
        let report = snapshot.savings(config);
        (report.items, report.total_potential)
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total_potential": total,
                "items": items,
            }))?
        );
        return Ok(());
    }

    if items.is_empty() {
        println!("✅ No savings opportunities found.");
        return Ok(());
    }

    println!();
    println!("💰 Savings Opportunities");
    println!("   ─────────────────────────────────────────────────────────────");
    for item in &items {
        let status = if item.status == ReviewStatus::Pending {
            String::new()
        } else {
            format!(" [{}]", item.status)
        };
        println!(
            "   {:<18} │ {} │ {:>9.2} │ {}{}",
            item.id,
            item.date,
            item.counted_amount,
            truncate(&item.description, 30),
            status
        );
        println!("      {}", item.reason);
    }
    println!();
    println!("   Potential savings: {:.2}", total);
    println!();
    println!("   Use 'centavo review <id> dismissed' to drop an item.");

    Ok(())
}

pub fn cmd_review(
    db: &Database,
    opportunity_id: &str,
    status: &str,
    amount: Option<f64>,
    note: Option<&str>,
) -> Result<()> {
    let status: ReviewStatus = status.parse().map_err(|e: String| anyhow!(e))?;
    if status == ReviewStatus::Adjusted && amount.is_none() {
        bail!("An adjusted review needs --amount");
    }

    db.upsert_review(&SavingsReview {
        opportunity_id: opportunity_id.trim().to_string(),
        status,
        adjusted_amount: amount,
        note: note.map(str::to_string),
        updated_at: Utc::now(),
    })?;

    match (status, amount) {
        (ReviewStatus::Adjusted, Some(amount)) => {
            println!("✅ {} adjusted to {:.2}", opportunity_id, amount)
        }
        _ => println!("✅ {} marked {}", opportunity_id, status),
    }

    Ok(())
}

fn print_actions(heading: &str, actions: &[PlanAction]) {
    if actions.is_empty() {
        return;
    }
    println!();
    println!("{}", heading);
    for action in actions {
        let status = if action.status == ReviewStatus::Pending {
            String::new()
        } else {
            format!(" [{}]", action.status)
        };
        println!(
            "   • {} ({:.2}){}",
            action.title, action.counted_amount, status
        );
        println!("     {}", action.detail);
    }
}

pub fn cmd_plan(
    db: &Database,
    today: NaiveDate,
    turbo: bool,
    json: bool,
    config: &EngineConfig,
) -> Result<()> {
    let snapshot = Snapshot::load(db)?;
    let plan = snapshot.plan(today, turbo, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let summary = &plan.summary;
    println!();
    println!("📋 Savings Plan for {}", summary.month);
    println!("   ─────────────────────────────");
    println!("   Potential savings:  {:>10.2}", summary.total_potential);
    println!("   Confident savings:  {:>10.2}", summary.confident_savings);
    println!(
        "   Opportunities:      {:>10} ({} open)",
        summary.opportunity_count, summary.open_count
    );
    println!("   Predicted balance:  {:>10.2}", summary.predicted_balance);
    if let Some(goal) = summary.savings_goal {
        println!("   Savings goal:       {:>10.2}", goal);
    }

    println!();
    println!("🩺 Diagnosis");
    println!("   {}", plan.diagnosis);
    println!();
    println!("🎯 Strategy");
    println!("   {}", plan.strategy);

    print_actions("🔴 High impact", &plan.high);
    print_actions("🟡 Medium impact", &plan.medium);
    print_actions("🟢 Low impact", &plan.low);

    Ok(())
}
