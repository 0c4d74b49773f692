//! Engine configuration
//!
//! Every tunable constant the engine uses lives here: the forecast damping
//! factor, the budget-fraction table, alert thresholds, detector thresholds
//! and the invoice survival threshold.
//!
//! ## Configuration Resolution
//!
//! 1. An explicit path (the CLI's `--config`)
//! 2. Override in data dir (~/.local/share/centavo/config/engine.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Keys missing from a file fall back to the built-in defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Category;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub forecast: ForecastConfig,
    pub alerts: AlertConfig,
    pub savings: SavingsConfig,
    pub plan: PlanConfig,
    pub invoices: InvoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub damping_factor: f64,
    pub turbo_factor: f64,
    pub fixed_match_tolerance: f64,
    pub non_essential: Vec<Category>,
    pub budget_fractions: BTreeMap<Category, f64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.8,
            turbo_factor: 0.8,
            fixed_match_tolerance: 0.10,
            non_essential: vec![
                Category::Entertainment,
                Category::Shopping,
                Category::Subscriptions,
            ],
            budget_fractions: BTreeMap::from([
                (Category::Food, 0.25),
                (Category::Housing, 0.35),
                (Category::Transport, 0.15),
                (Category::Entertainment, 0.10),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Warn when month-to-date expense reaches this share of income
    pub overspend_warning_ratio: f64,
    pub habit_min_count: usize,
    pub habit_window_days: i64,
    pub large_expense_threshold: f64,
    pub large_expense_window_days: i64,
    /// Late-night window is [start_hour, 24) plus [0, end_hour]
    pub late_night_start_hour: u32,
    pub late_night_end_hour: u32,
    pub late_night_window_days: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            overspend_warning_ratio: 0.9,
            habit_min_count: 5,
            habit_window_days: 7,
            large_expense_threshold: 1000.0,
            large_expense_window_days: 3,
            late_night_start_hour: 23,
            late_night_end_hour: 4,
            late_night_window_days: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavingsConfig {
    pub duplicate_window_days: i64,
    /// Pairs cheaper than this are never duplicates
    pub duplicate_min_amount: f64,
    /// Raised floor for categories with frequent small repeats (lunches, rides)
    pub duplicate_frequent_min_amount: f64,
    pub duplicate_frequent_categories: Vec<Category>,
    pub fee_keywords: Vec<String>,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            duplicate_window_days: 3,
            duplicate_min_amount: 10.0,
            duplicate_frequent_min_amount: 30.0,
            duplicate_frequent_categories: vec![Category::Food, Category::Transport],
            fee_keywords: [
                "fee",
                "tarifa",
                "annual fee",
                "anuidade",
                "interest",
                "juros",
                "penalty",
                "multa",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub high_impact_threshold: f64,
    pub medium_impact_threshold: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            high_impact_threshold: 100.0,
            medium_impact_threshold: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceConfig {
    pub survival_threshold: f64,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            survival_threshold: 0.5,
        }
    }
}

impl EngineConfig {
    /// Load configuration (explicit path, then data-dir override, then embedded default)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            debug!("Loaded engine config from {}", path.display());
            return Self::from_toml(&content);
        }

        if let Some(default_path) = default_config_path() {
            if default_path.exists() {
                let content = fs::read_to_string(&default_path)?;
                debug!("Loaded engine config from {}", default_path.display());
                return Self::from_toml(&content);
            }
        }

        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Parse config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        let f = &self.forecast;
        if !(0.0..=1.0).contains(&f.damping_factor) || !(0.0..=1.0).contains(&f.turbo_factor) {
            return Err(Error::Config(
                "forecast factors must be between 0 and 1".to_string(),
            ));
        }
        if f.budget_fractions.values().any(|v| *v <= 0.0) {
            return Err(Error::Config(
                "budget fractions must be positive".to_string(),
            ));
        }
        let a = &self.alerts;
        if a.late_night_start_hour > 23 || a.late_night_end_hour > 23 {
            return Err(Error::Config(
                "late-night hours must be between 0 and 23".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.invoices.survival_threshold) {
            return Err(Error::Config(
                "invoice survival threshold must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("centavo").join("config").join("engine.toml"))
}
