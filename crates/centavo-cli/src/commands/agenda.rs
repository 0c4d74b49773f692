//! Agenda and checklist command implementations

use anyhow::Result;
use centavo_core::db::Database;
use centavo_core::{AgendaSource, AgendaStatus, ChecklistEntry, ChecklistStore, MonthKey, Snapshot};
use chrono::NaiveDate;

use super::truncate;

pub fn cmd_agenda(db: &Database, month: MonthKey, today: NaiveDate, json: bool) -> Result<()> {
    let snapshot = Snapshot::load(db)?;
    let agenda = snapshot.agenda(month, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&agenda)?);
        return Ok(());
    }

    if agenda.is_empty() {
        println!("Nothing due in {}.", month);
        return Ok(());
    }

    println!();
    println!("📅 Agenda for {}", month);
    println!("   ─────────────────────────────────────────────────────────────");

    for item in &agenda {
        let status = match item.status {
            AgendaStatus::Paid if item.paid_manually => "✅ paid (marked)",
            AgendaStatus::Paid => "✅ paid",
            AgendaStatus::Pending => "⏳ pending",
            AgendaStatus::Overdue => "🔴 overdue",
        };
        let icon = match item.source {
            AgendaSource::Invoice => "💳",
            AgendaSource::Recurring => "🔁",
            AgendaSource::OneOff => "•",
        };
        println!(
            "   {} │ {} {:<28} │ {:>10.2} │ {}",
            item.due_date,
            icon,
            truncate(&item.title, 28),
            item.amount,
            status
        );
        println!("      id: {}", item.target_id);
    }

    let (paid, open): (Vec<_>, Vec<_>) = agenda
        .iter()
        .partition(|i| i.status == AgendaStatus::Paid);
    println!();
    println!(
        "   Paid {:.2} │ Still due {:.2}",
        paid.iter().map(|i| i.amount).sum::<f64>(),
        open.iter().map(|i| i.amount).sum::<f64>()
    );
    println!("   Use 'centavo check <id> {}' to mark an item paid.", month);

    Ok(())
}

pub fn cmd_check(db: &Database, target_id: &str, month: MonthKey) -> Result<()> {
    let entry = ChecklistEntry::new(target_id.trim(), month);
    let entries = db.toggle_checklist(&entry)?;

    if entries.contains(&entry) {
        println!("☑️  {} marked paid for {}", entry.target_id, month);
    } else {
        println!("⬜ {} unmarked for {}", entry.target_id, month);
    }

    Ok(())
}
