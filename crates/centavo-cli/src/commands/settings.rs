//! Settings command implementations

use anyhow::{bail, Result};
use centavo_core::db::Database;
use centavo_core::{FixedExpense, Settings, SettingsStore};

use super::truncate;

fn load(db: &Database) -> Result<Settings> {
    Ok(db.settings()?.unwrap_or_default())
}

fn require_amount(amount: f64, what: &str) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        bail!("{} must be a non-negative number, got {}", what, amount);
    }
    Ok(())
}

pub fn cmd_settings_show(db: &Database, json: bool) -> Result<()> {
    let settings = db.settings()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let Some(settings) = settings else {
        println!("No settings saved yet. Start with:");
        println!("  centavo settings income 5000");
        return Ok(());
    };

    println!();
    println!("⚙️  Settings");
    println!("   ─────────────────────────────");
    match settings.monthly_income {
        Some(income) => println!("   Monthly income: {:.2}", income),
        None => println!("   Monthly income: (not set)"),
    }
    match settings.savings_goal {
        Some(goal) => println!("   Savings goal:   {:.2}", goal),
        None => println!("   Savings goal:   (not set)"),
    }

    if settings.fixed_expenses.is_empty() {
        println!("   Fixed expenses: none");
    } else {
        let total: f64 = settings.fixed_expenses.iter().map(|f| f.amount).sum();
        println!("   Fixed expenses ({:.2}/month):", total);
        for fixed in &settings.fixed_expenses {
            println!(
                "     • {:<30} {:>10.2}",
                truncate(&fixed.description, 30),
                fixed.amount
            );
        }
    }

    Ok(())
}

pub fn cmd_settings_income(db: &Database, amount: f64) -> Result<()> {
    require_amount(amount, "Income")?;
    let mut settings = load(db)?;
    settings.monthly_income = Some(amount);
    db.save_settings(&settings)?;
    println!("✅ Monthly income set to {:.2}", amount);
    Ok(())
}

pub fn cmd_settings_goal(db: &Database, amount: f64) -> Result<()> {
    require_amount(amount, "Savings goal")?;
    let mut settings = load(db)?;
    settings.savings_goal = Some(amount);
    db.save_settings(&settings)?;
    println!("✅ Savings goal set to {:.2}", amount);
    Ok(())
}

pub fn cmd_settings_fixed_add(db: &Database, description: &str, amount: f64) -> Result<()> {
    let description = description.trim();
    if description.is_empty() {
        bail!("Fixed expense description must not be empty");
    }
    require_amount(amount, "Fixed expense")?;

    let mut settings = load(db)?;
    // Same description replaces the old amount
    settings
        .fixed_expenses
        .retain(|f| !f.description.eq_ignore_ascii_case(description));
    settings.fixed_expenses.push(FixedExpense {
        description: description.to_string(),
        amount,
    });
    db.save_settings(&settings)?;

    println!("✅ Fixed expense '{}' set to {:.2}", description, amount);
    Ok(())
}

pub fn cmd_settings_fixed_remove(db: &Database, description: &str) -> Result<()> {
    let mut settings = load(db)?;
    let before = settings.fixed_expenses.len();
    settings
        .fixed_expenses
        .retain(|f| !f.description.eq_ignore_ascii_case(description.trim()));

    if settings.fixed_expenses.len() == before {
        bail!("No fixed expense named '{}'", description);
    }

    db.save_settings(&settings)?;
    println!("🗑️  Removed fixed expense '{}'", description);
    Ok(())
}
