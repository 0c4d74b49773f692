//! Centavo CLI - Personal finance forecasting and reconciliation
//!
//! Usage:
//!   centavo init                          Initialize database
//!   centavo tx import --file CSV          Import transactions
//!   centavo invoice import --file CSV ... Import a card statement
//!   centavo forecast                      Project the month-end balance
//!   centavo savings                       List savings opportunities
//!   centavo plan                          Build the savings plan
//!   centavo agenda                        Show bills due this month

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Tx { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_tx_list(&db, None, 50),
                Some(TxAction::List { month, limit }) => {
                    let month = month.as_deref().map(commands::parse_month).transpose()?;
                    commands::cmd_tx_list(&db, month, limit)
                }
                Some(TxAction::Add {
                    description,
                    amount,
                    category,
                    kind,
                    date,
                    time,
                    effective,
                    recurring,
                    card,
                    on_invoice,
                    installments,
                }) => {
                    let args = commands::TxArgs {
                        description: &description,
                        amount,
                        category: &category,
                        kind: &kind,
                        date: date.as_deref(),
                        time: time.as_deref(),
                        effective: effective.as_deref(),
                        recurring,
                        card: card.as_deref(),
                        on_invoice,
                    };
                    let tx = args.to_new_transaction(commands::resolve_today(None)?)?;
                    commands::cmd_tx_add(&db, &tx, installments)
                }
                Some(TxAction::Delete { id }) => commands::cmd_tx_delete(&db, id),
                Some(TxAction::Import { file }) => commands::cmd_tx_import(&db, &file),
            }
        }
        Commands::Settings { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(SettingsAction::Show) => commands::cmd_settings_show(&db, cli.json),
                Some(SettingsAction::Income { amount }) => {
                    commands::cmd_settings_income(&db, amount)
                }
                Some(SettingsAction::Goal { amount }) => commands::cmd_settings_goal(&db, amount),
                Some(SettingsAction::FixedAdd {
                    description,
                    amount,
                }) => commands::cmd_settings_fixed_add(&db, &description, amount),
                Some(SettingsAction::FixedRemove { description }) => {
                    commands::cmd_settings_fixed_remove(&db, &description)
                }
            }
        }
        Commands::Invoice { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                InvoiceAction::Import {
                    file,
                    issuer,
                    due,
                    force,
                } => {
                    let config = commands::load_config(cli.config.as_deref())?;
                    commands::cmd_invoice_import(&db, &file, &issuer, &due, force, &config)
                }
                InvoiceAction::List => commands::cmd_invoice_list(&db, cli.json),
                InvoiceAction::Revert { id } => commands::cmd_invoice_revert(&db, id),
            }
        }
        Commands::Forecast {
            month,
            turbo,
            today,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let today = commands::resolve_today(today.as_deref())?;
            let month = commands::resolve_month(month.as_deref(), today)?;
            commands::cmd_forecast(&db, month, today, turbo, cli.json, &config)
        }
        Commands::Alerts { turbo, today, at } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let now = commands::resolve_now(today.as_deref(), at.as_deref())?;
            commands::cmd_alerts(&db, now, turbo, cli.json, &config)
        }
        Commands::Savings { raw } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_savings(&db, raw, cli.json, &config)
        }
        Commands::Review {
            opportunity_id,
            status,
            amount,
            note,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_review(&db, &opportunity_id, &status, amount, note.as_deref())
        }
        Commands::Plan { turbo, today } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let today = commands::resolve_today(today.as_deref())?;
            commands::cmd_plan(&db, today, turbo, cli.json, &config)
        }
        Commands::Agenda { month, today } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let today = commands::resolve_today(today.as_deref())?;
            let month = commands::resolve_month(month.as_deref(), today)?;
            commands::cmd_agenda(&db, month, today, cli.json)
        }
        Commands::Check { target_id, month } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_check(&db, &target_id, commands::parse_month(&month)?)
        }
    }
}
