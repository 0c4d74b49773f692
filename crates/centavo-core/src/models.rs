//! Domain models for Centavo

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closed set of spending/income categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Housing,
    Transport,
    Entertainment,
    Shopping,
    Subscriptions,
    Health,
    Education,
    Utilities,
    Salary,
    Investments,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Housing => "housing",
            Self::Transport => "transport",
            Self::Entertainment => "entertainment",
            Self::Shopping => "shopping",
            Self::Subscriptions => "subscriptions",
            Self::Health => "health",
            Self::Education => "education",
            Self::Utilities => "utilities",
            Self::Salary => "salary",
            Self::Investments => "investments",
            Self::Other => "other",
        }
    }

    /// Human-readable label used in report text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Housing => "Housing",
            Self::Transport => "Transport",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Subscriptions => "Subscriptions",
            Self::Health => "Health",
            Self::Education => "Education",
            Self::Utilities => "Utilities",
            Self::Salary => "Salary",
            Self::Investments => "Investments",
            Self::Other => "Other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Housing,
            Self::Transport,
            Self::Entertainment,
            Self::Shopping,
            Self::Subscriptions,
            Self::Health,
            Self::Education,
            Self::Utilities,
            Self::Salary,
            Self::Investments,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" | "alimentacao" | "alimentação" => Ok(Self::Food),
            "housing" | "moradia" => Ok(Self::Housing),
            "transport" | "transporte" => Ok(Self::Transport),
            "entertainment" | "lazer" => Ok(Self::Entertainment),
            "shopping" | "compras" => Ok(Self::Shopping),
            "subscriptions" | "subscription" | "assinaturas" => Ok(Self::Subscriptions),
            "health" | "saude" | "saúde" => Ok(Self::Health),
            "education" | "educacao" | "educação" => Ok(Self::Education),
            "utilities" | "contas" => Ok(Self::Utilities),
            "salary" | "salario" | "salário" => Ok(Self::Salary),
            "investments" | "investimentos" => Ok(Self::Investments),
            "other" | "outros" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Ok(Self::Income),
            "expense" | "out" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ledger entry. Immutable once stored; updates replace it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub description: String,
    /// Always positive; direction comes from `kind`
    pub amount: f64,
    pub category: Category,
    pub kind: TransactionKind,
    /// Date of the purchase / economic event
    pub occurred_date: NaiveDate,
    /// Local wall-clock time of the purchase, when known
    pub occurred_time: Option<NaiveTime>,
    /// Date the money actually moves (credit-card float). Falls back to `occurred_date`.
    pub effective_date: Option<NaiveDate>,
    pub is_recurring: bool,
    pub is_credit_purchase: bool,
    pub credit_card_issuer: Option<String>,
    /// Recurring charge billed through a credit-card invoice
    pub linked_to_invoice_group: bool,
    /// Insertion timestamp; ordering only
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a stored transaction from a validated draft
    pub fn from_new(id: i64, tx: NewTransaction, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            description: tx.description,
            amount: tx.amount,
            category: tx.category,
            kind: tx.kind,
            occurred_date: tx.occurred_date,
            occurred_time: tx.occurred_time,
            effective_date: tx.effective_date,
            is_recurring: tx.is_recurring,
            is_credit_purchase: tx.is_credit_purchase,
            credit_card_issuer: tx.credit_card_issuer,
            linked_to_invoice_group: tx.linked_to_invoice_group,
            created_at,
        }
    }

    /// Date used for cash-flow purposes
    pub fn effective(&self) -> NaiveDate {
        self.effective_date.unwrap_or(self.occurred_date)
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }
}

/// A transaction to be stored (before the store assigns an id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub category: Category,
    pub kind: TransactionKind,
    pub occurred_date: NaiveDate,
    #[serde(default)]
    pub occurred_time: Option<NaiveTime>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub is_credit_purchase: bool,
    #[serde(default)]
    pub credit_card_issuer: Option<String>,
    #[serde(default)]
    pub linked_to_invoice_group: bool,
}

impl NewTransaction {
    pub fn expense(
        description: impl Into<String>,
        amount: f64,
        category: Category,
        occurred_date: NaiveDate,
    ) -> Self {
        Self::new(
            description,
            amount,
            category,
            TransactionKind::Expense,
            occurred_date,
        )
    }

    pub fn income(
        description: impl Into<String>,
        amount: f64,
        category: Category,
        occurred_date: NaiveDate,
    ) -> Self {
        Self::new(
            description,
            amount,
            category,
            TransactionKind::Income,
            occurred_date,
        )
    }

    fn new(
        description: impl Into<String>,
        amount: f64,
        category: Category,
        kind: TransactionKind,
        occurred_date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category,
            kind,
            occurred_date,
            occurred_time: None,
            effective_date: None,
            is_recurring: false,
            is_credit_purchase: false,
            credit_card_issuer: None,
            linked_to_invoice_group: false,
        }
    }

    pub fn recurring(mut self) -> Self {
        self.is_recurring = true;
        self
    }

    pub fn at(mut self, time: NaiveTime) -> Self {
        self.occurred_time = Some(time);
        self
    }

    pub fn effective_on(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }

    /// Mark as a credit-card purchase on the given issuer's card
    pub fn on_card(mut self, issuer: impl Into<String>) -> Self {
        self.is_credit_purchase = true;
        self.credit_card_issuer = Some(issuer.into());
        self
    }

    /// Mark as a recurring charge billed through the issuer's invoice
    pub fn linked_to_invoice(mut self, issuer: impl Into<String>) -> Self {
        self.linked_to_invoice_group = true;
        self.credit_card_issuer = Some(issuer.into());
        self
    }

    /// Reject input the engine must never see
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "amount must be a positive number, got {}",
                self.amount
            )));
        }
        if self.description.trim().is_empty() {
            return Err(Error::InvalidData(
                "description must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split a credit purchase into monthly installments.
///
/// Each installment keeps the purchase's occurred date; effective dates step
/// one calendar month at a time from the purchase's effective date. The last
/// installment absorbs the rounding remainder so the parts sum to the total.
pub fn expand_installments(purchase: &NewTransaction, count: u32) -> Result<Vec<NewTransaction>> {
    purchase.validate()?;
    if count == 0 {
        return Err(Error::InvalidData(
            "installment count must be at least 1".to_string(),
        ));
    }
    if count == 1 {
        return Ok(vec![purchase.clone()]);
    }

    let total_cents = (purchase.amount * 100.0).round() as i64;
    if count as i64 > total_cents {
        return Err(Error::InvalidData(format!(
            "cannot split {:.2} into {} installments of at least one cent",
            purchase.amount, count
        )));
    }
    let part_cents = total_cents / count as i64;
    let first_effective = purchase.effective_date.unwrap_or(purchase.occurred_date);

    let mut parts = Vec::with_capacity(count as usize);
    for i in 0..count {
        let cents = if i + 1 == count {
            total_cents - part_cents * (count as i64 - 1)
        } else {
            part_cents
        };
        let effective = first_effective
            .checked_add_months(Months::new(i))
            .ok_or_else(|| Error::InvalidData("installment date out of range".to_string()))?;

        let mut part = purchase.clone();
        part.description = format!("{} ({}/{})", purchase.description, i + 1, count);
        part.amount = cents as f64 / 100.0;
        part.effective_date = Some(effective);
        parts.push(part);
    }

    Ok(parts)
}

/// A calendar month, rendered as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Constructors guarantee a valid year/month
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.next().first_day();
        (next - self.first_day()).num_days() as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Re-anchor a day-of-month into this month, clamped to its last day
    pub fn anchor(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.first_day())
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid month (expected YYYY-MM): {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in month: {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month number in month: {}", s))?;
        Self::new(year, month).ok_or_else(|| format!("Month out of range: {}", s))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// A user-declared recurring obligation kept in settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    pub description: String,
    pub amount: f64,
}

/// User settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub savings_goal: Option<f64>,
    #[serde(default)]
    pub fixed_expenses: Vec<FixedExpense>,
}

impl Settings {
    /// Declared monthly income, if usable as a budget base
    pub fn income(&self) -> Option<f64> {
        self.monthly_income.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// One imported credit-card statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceGroup {
    pub id: i64,
    pub issuer: String,
    pub due_date: NaiveDate,
    pub total_amount: f64,
    pub transaction_count: usize,
    pub imported_at: DateTime<Utc>,
    pub fingerprint: String,
    /// Empty for legacy imports recorded before ids were tracked
    pub transaction_ids: Vec<i64>,
}

/// Review decision for a savings opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Kept,
    Dismissed,
    Adjusted,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Kept => "kept",
            Self::Dismissed => "dismissed",
            Self::Adjusted => "adjusted",
        }
    }

    /// Whether an item with this status still counts toward potential savings
    pub fn counts(&self) -> bool {
        matches!(self, Self::Pending | Self::Adjusted)
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "kept" | "keep" => Ok(Self::Kept),
            "dismissed" | "dismiss" => Ok(Self::Dismissed),
            "adjusted" | "adjust" => Ok(Self::Adjusted),
            _ => Err(format!("Unknown review status: {}", s)),
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User override for a detected savings opportunity, keyed by the detector's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsReview {
    pub opportunity_id: String,
    pub status: ReviewStatus,
    /// Only meaningful when `status` is `Adjusted`
    pub adjusted_amount: Option<f64>,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Manual "paid" mark for an agenda target in a month
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub target_id: String,
    pub month: MonthKey,
}

impl ChecklistEntry {
    pub fn new(target_id: impl Into<String>, month: MonthKey) -> Self {
        Self {
            target_id: target_id.into(),
            month,
        }
    }
}

/// Symmetric presence toggle: removes the entry if present, adds it otherwise
pub fn toggle_checklist(entries: &[ChecklistEntry], entry: ChecklistEntry) -> Vec<ChecklistEntry> {
    if entries.contains(&entry) {
        entries.iter().filter(|e| **e != entry).cloned().collect()
    } else {
        let mut next = entries.to_vec();
        next.push(entry);
        next
    }
}
