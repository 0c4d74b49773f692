//! Transaction command implementations

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use centavo_core::db::Database;
use centavo_core::import::{parse_date, parse_transactions_csv};
use centavo_core::{
    expand_installments, Category, LedgerStore, MonthKey, NewTransaction, TransactionKind,
};
use chrono::{NaiveDate, NaiveTime};

use super::truncate;

/// Raw `tx add` arguments as they come off the command line
pub struct TxArgs<'a> {
    pub description: &'a str,
    pub amount: f64,
    pub category: &'a str,
    pub kind: &'a str,
    pub date: Option<&'a str>,
    pub time: Option<&'a str>,
    pub effective: Option<&'a str>,
    pub recurring: bool,
    pub card: Option<&'a str>,
    pub on_invoice: bool,
}

impl TxArgs<'_> {
    /// Parse into a transaction draft, defaulting the date to `today`
    pub fn to_new_transaction(&self, today: NaiveDate) -> Result<NewTransaction> {
        let category: Category = self.category.parse().map_err(|e: String| anyhow!(e))?;
        let kind: TransactionKind = self.kind.parse().map_err(|e: String| anyhow!(e))?;
        let occurred = match self.date {
            Some(s) => parse_date(s)?,
            None => today,
        };

        let mut tx = match kind {
            TransactionKind::Income => {
                NewTransaction::income(self.description, self.amount, category, occurred)
            }
            TransactionKind::Expense => {
                NewTransaction::expense(self.description, self.amount, category, occurred)
            }
        };

        if let Some(time) = self.time {
            let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
                .with_context(|| format!("Invalid --time (expected HH:MM): {}", time))?;
            tx = tx.at(time);
        }
        if let Some(effective) = self.effective {
            tx = tx.effective_on(parse_date(effective)?);
        }
        if self.recurring {
            tx = tx.recurring();
        }
        match (self.card, self.on_invoice) {
            (Some(issuer), true) => tx = tx.recurring().linked_to_invoice(issuer),
            (Some(issuer), false) => tx = tx.on_card(issuer),
            (None, true) => bail!("--on-invoice needs --card <issuer>"),
            (None, false) => {}
        }

        Ok(tx)
    }
}

pub fn cmd_tx_add(db: &Database, tx: &NewTransaction, installments: Option<u32>) -> Result<()> {
    let parts = match installments {
        Some(count) => {
            if !tx.is_credit_purchase {
                bail!("--installments needs --card <issuer>");
            }
            expand_installments(tx, count)?
        }
        None => vec![tx.clone()],
    };

    let ids = db
        .insert_transactions(&parts)
        .context("Failed to add transaction")?;
    tracing::debug!("Stored transaction ids {:?}", ids);

    if ids.len() == 1 {
        println!(
            "✅ Added transaction #{}: {} ({:.2})",
            ids[0], tx.description, tx.amount
        );
    } else {
        println!(
            "✅ Added {} installments of {} ({:.2} total)",
            ids.len(),
            tx.description,
            tx.amount
        );
        for (id, part) in ids.iter().zip(&parts) {
            println!(
                "   [{}] {} │ {:>10.2}",
                id,
                part.effective_date.unwrap_or(part.occurred_date),
                part.amount
            );
        }
    }

    Ok(())
}

pub fn cmd_tx_list(db: &Database, month: Option<MonthKey>, limit: usize) -> Result<()> {
    let mut transactions = db.list_transactions()?;
    if let Some(month) = month {
        transactions.retain(|tx| month.contains(tx.effective()));
    }

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  centavo tx import --file ledger.csv");
        return Ok(());
    }

    println!();
    match month {
        Some(month) => println!("📝 Transactions for {}", month),
        None => println!("📝 Recent Transactions"),
    }
    println!("   ─────────────────────────────────────────────────────────────");

    // Newest first
    for tx in transactions.iter().rev().take(limit) {
        let amount_str = if tx.is_expense() {
            format!("\x1b[31m-{:.2}\x1b[0m", tx.amount) // Red for expenses
        } else {
            format!("\x1b[32m+{:.2}\x1b[0m", tx.amount) // Green for income
        };

        let mut flags = String::new();
        if tx.is_recurring {
            flags.push_str(" 🔁");
        }
        if let Some(issuer) = &tx.credit_card_issuer {
            flags.push_str(&format!(" 💳 {}", issuer));
        }

        println!(
            "   [{}] {} │ {:>10} │ {:<13} │ {}{}",
            tx.id,
            tx.effective(),
            amount_str,
            tx.category.as_str(),
            truncate(&tx.description, 35),
            flags
        );
    }

    if transactions.len() > limit {
        println!();
        println!(
            "   Showing {} of {} (use --limit to see more)",
            limit,
            transactions.len()
        );
    }

    Ok(())
}

pub fn cmd_tx_delete(db: &Database, id: i64) -> Result<()> {
    let tx = db
        .get_transaction(id)?
        .ok_or_else(|| anyhow!("Transaction not found: {}", id))?;

    db.delete_transaction(id)?;
    println!(
        "🗑️  Deleted transaction #{}: {} ({:.2})",
        id,
        truncate(&tx.description, 40),
        tx.amount
    );

    Ok(())
}

pub fn cmd_tx_import(db: &Database, file: &Path) -> Result<()> {
    println!("📥 Importing transactions from {}...", file.display());

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let transactions = parse_transactions_csv(csv_file)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    println!("   Found {} transactions", transactions.len());

    let ids = db
        .insert_transactions(&transactions)
        .context("Failed to store transactions")?;

    println!("✅ Imported {} transactions", ids.len());

    Ok(())
}
