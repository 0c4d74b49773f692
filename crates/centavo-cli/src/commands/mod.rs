//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db, config, date arguments)
//! - `transactions` - Ledger commands (add, list, delete, import)
//! - `settings` - Income, savings goal and fixed expenses
//! - `invoices` - Statement import, list and revert
//! - `reports` - Forecast, alerts, savings, review and plan
//! - `agenda` - Monthly agenda and checklist

pub mod agenda;
pub mod core;
pub mod invoices;
pub mod reports;
pub mod settings;
pub mod transactions;

// Re-export command functions for main.rs
pub use agenda::*;
pub use self::core::*;
pub use invoices::*;
pub use reports::*;
pub use settings::*;
pub use transactions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
