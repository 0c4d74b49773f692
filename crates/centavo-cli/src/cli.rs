//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Centavo - Forecast, reconcile and trim your monthly spending
#[derive(Parser)]
#[command(name = "centavo")]
#[command(about = "Personal finance forecasting and reconciliation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "centavo.db", global = true)]
    pub db: PathBuf,

    /// Engine config file (defaults to the user override, then built-in values)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set CENTAVO_DB_KEY environment variable with your passphrase.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Manage ledger transactions
    Tx {
        #[command(subcommand)]
        action: Option<TxAction>,
    },

    /// Show or change income, savings goal and fixed expenses
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Import, list and revert credit-card statements
    Invoice {
        #[command(subcommand)]
        action: InvoiceAction,
    },

    /// Project the month-end balance
    Forecast {
        /// Month to project (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Tighten budget limits
        #[arg(long)]
        turbo: bool,

        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Show spending alerts
    Alerts {
        /// Tighten budget limits
        #[arg(long)]
        turbo: bool,

        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,

        /// Local time of day to evaluate at (HH:MM, defaults to now, or noon with --today)
        #[arg(long)]
        at: Option<String>,
    },

    /// List savings opportunities
    Savings {
        /// Ignore reviews and show every detected opportunity
        #[arg(long)]
        raw: bool,
    },

    /// Record a decision on a savings opportunity
    Review {
        /// Opportunity id (e.g. duplicate:42, subscription:7, fee:3)
        opportunity_id: String,

        /// pending, kept, dismissed or adjusted
        status: String,

        /// Amount to count instead (required for adjusted)
        #[arg(long)]
        amount: Option<f64>,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },

    /// Build the savings plan
    Plan {
        /// Tighten budget limits
        #[arg(long)]
        turbo: bool,

        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Show the monthly agenda of bills
    Agenda {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Toggle the manual "paid" mark for an agenda item
    Check {
        /// Agenda target id (e.g. invoice:nubank, recurring:gym, tx:12)
        target_id: String,

        /// Month (YYYY-MM)
        month: String,
    },
}

#[derive(Subcommand)]
pub enum TxAction {
    /// Add a transaction
    Add {
        /// Description
        description: String,

        /// Amount (always positive)
        amount: f64,

        /// Category (food, housing, transport, ...)
        #[arg(short, long, default_value = "other")]
        category: String,

        /// income or expense
        #[arg(short, long, default_value = "expense")]
        kind: String,

        /// Date of the purchase (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Local time of the purchase (HH:MM)
        #[arg(long)]
        time: Option<String>,

        /// Date the money moves, if different (YYYY-MM-DD)
        #[arg(long)]
        effective: Option<String>,

        /// Mark as a recurring charge
        #[arg(long)]
        recurring: bool,

        /// Credit card issuer for a card purchase
        #[arg(long)]
        card: Option<String>,

        /// Recurring charge billed through the card's invoice (needs --card)
        #[arg(long)]
        on_invoice: bool,

        /// Split a card purchase into this many monthly installments
        #[arg(long)]
        installments: Option<u32>,
    },

    /// List transactions
    List {
        /// Only this month (YYYY-MM, by effective date)
        #[arg(long)]
        month: Option<String>,

        /// Maximum number to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },

    /// Import transactions from a normalized CSV
    /// (date,description,amount,kind,category[,recurring])
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,

    /// Set the declared monthly income
    Income { amount: f64 },

    /// Set the monthly savings goal
    Goal { amount: f64 },

    /// Declare a fixed monthly expense
    FixedAdd { description: String, amount: f64 },

    /// Remove a fixed monthly expense
    FixedRemove { description: String },
}

#[derive(Subcommand)]
pub enum InvoiceAction {
    /// Import a statement CSV (date,description,amount[,category])
    Import {
        /// CSV file with the statement lines
        #[arg(short, long)]
        file: PathBuf,

        /// Card issuer (e.g. Nubank)
        #[arg(long)]
        issuer: String,

        /// Statement due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        /// Import even if the same statement is already in the ledger
        #[arg(long)]
        force: bool,
    },

    /// List imported statements
    List,

    /// Delete a statement and every transaction it imported
    Revert {
        /// Invoice ID
        id: i64,
    },
}
