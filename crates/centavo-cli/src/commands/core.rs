//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Engine config with the user override applied
//! - `resolve_today` / `resolve_month` / `resolve_now` - Date arguments shared by reports
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use centavo_core::{db::Database, EngineConfig, MonthKey};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {}", db_path.display()))?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = EngineConfig::load(path).context("Failed to load engine config")?;
    tracing::debug!(
        "Engine config: damping {}, survival threshold {}",
        config.forecast.damping_factor,
        config.invoices.survival_threshold
    );
    Ok(config)
}

/// `--today` if given, otherwise the local date
pub fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid --today (expected YYYY-MM-DD): {}", s)),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn parse_month(s: &str) -> Result<MonthKey> {
    s.parse::<MonthKey>().map_err(|e| anyhow!(e))
}

/// `--month` if given, otherwise the month containing `today`
pub fn resolve_month(month: Option<&str>, today: NaiveDate) -> Result<MonthKey> {
    match month {
        Some(s) => parse_month(s),
        None => Ok(MonthKey::of(today)),
    }
}

/// Moment the alert rules evaluate at.
///
/// With `--today` and no `--at` this is noon, so reruns are reproducible.
pub fn resolve_now(today: Option<&str>, at: Option<&str>) -> Result<NaiveDateTime> {
    let date = resolve_today(today)?;
    let time = match at {
        Some(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .with_context(|| format!("Invalid --at (expected HH:MM): {}", s))?,
        None if today.is_some() => NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default(),
        None => Local::now().time(),
    };
    Ok(date.and_time(time))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;
    let count = db
        .count_transactions()
        .context("Failed to read transactions")?;
    println!("   Ledger holds {} transactions", count);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: centavo tx import --file ledger.csv");
    println!("  2. Set your income: centavo settings income 5000");
    println!("  3. See where the month is heading: centavo forecast");

    Ok(())
}
