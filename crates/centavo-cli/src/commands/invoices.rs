//! Credit-card statement command implementations

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use centavo_core::db::Database;
use centavo_core::import::{parse_date, parse_statement_csv};
use centavo_core::{EngineConfig, Error, InvoiceStore};

use super::truncate;

pub fn cmd_invoice_import(
    db: &Database,
    file: &Path,
    issuer: &str,
    due: &str,
    force: bool,
    config: &EngineConfig,
) -> Result<()> {
    let due_date = parse_date(due).with_context(|| format!("Invalid --due: {}", due))?;

    println!(
        "📥 Importing {} statement due {} from {}...",
        issuer,
        due_date,
        file.display()
    );

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let draft = parse_statement_csv(csv_file, issuer, due_date)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    println!(
        "   Found {} lines totalling {:.2}",
        draft.lines.len(),
        draft.total()
    );

    let group = match db.record_import(&draft, config.invoices.survival_threshold, force) {
        Ok(group) => group,
        Err(e @ Error::DuplicateImport { existing_id, .. }) => {
            println!("   ⚠️  Already imported as invoice #{}", existing_id);
            println!(
                "   Revert it with 'centavo invoice revert {}' or pass --force.",
                existing_id
            );
            return Err(e.into());
        }
        Err(e) => return Err(e).context("Failed to import statement"),
    };

    if force {
        println!("   ⚠️  Duplicate check skipped (--force)");
    }
    println!(
        "✅ Imported invoice #{} with {} transactions",
        group.id, group.transaction_count
    );
    println!("   Fingerprint: {}", truncate(&group.fingerprint, 16));

    Ok(())
}

pub fn cmd_invoice_list(db: &Database, json: bool) -> Result<()> {
    let invoices = db.list_invoices()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&invoices)?);
        return Ok(());
    }

    if invoices.is_empty() {
        println!("No statements imported. Import one with:");
        println!("  centavo invoice import --file statement.csv --issuer Nubank --due 2026-02-10");
        return Ok(());
    }

    println!();
    println!("💳 Imported Statements");
    println!("   ─────────────────────────────────────────────────────────────");

    for invoice in &invoices {
        let legacy = if invoice.transaction_ids.is_empty() {
            " (legacy)"
        } else {
            ""
        };
        println!(
            "   [{}] {} │ {:<15} │ {:>10.2} │ {} lines{}",
            invoice.id,
            invoice.due_date,
            truncate(&invoice.issuer, 15),
            invoice.total_amount,
            invoice.transaction_count,
            legacy
        );
    }

    Ok(())
}

pub fn cmd_invoice_revert(db: &Database, id: i64) -> Result<()> {
    let removed = db
        .revert_import(id)
        .with_context(|| format!("Failed to revert invoice {}", id))?;

    println!(
        "↩️  Reverted invoice #{} ({} transactions removed)",
        id, removed
    );

    Ok(())
}
