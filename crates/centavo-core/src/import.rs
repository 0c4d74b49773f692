//! CSV import for ledger rows and card statements
//!
//! Ledger files carry one normalized transaction per row:
//!
//! ```text
//! date,description,amount,kind,category[,recurring]
//! 2026-01-05,Netflix,39.90,expense,subscriptions,true
//! 2026-01-05 23:40,Bar,80.00,expense,entertainment
//! ```
//!
//! Statement files list the purchases on one card invoice:
//!
//! ```text
//! date,description,amount[,category]
//! ```
//!
//! Rows are numbered from the first data line (the header is line 1), so a
//! bad row is reported as it appears in an editor.

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::{Error, Result};
use crate::invoices::{InvoiceDraft, InvoiceLine};
use crate::models::{Category, NewTransaction, TransactionKind};

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    kind: Option<usize>,
    category: Option<usize>,
    recurring: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, need_kind: bool) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::Import(format!("Missing '{}' column", name)))
        };

        let columns = Self {
            date: require("date")?,
            description: require("description")?,
            amount: require("amount")?,
            kind: find("kind"),
            category: find("category"),
            recurring: find("recurring"),
        };
        if need_kind {
            require("kind")?;
            require("category")?;
        }
        Ok(columns)
    }
}

fn reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Import(format!("Missing {}", name)))
}

fn optional_field(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty())
}

fn at_row<T>(line: usize, result: Result<T>) -> Result<T> {
    result.map_err(|e| match e {
        Error::Import(msg) | Error::InvalidData(msg) => {
            Error::Import(format!("line {}: {}", line, msg))
        }
        other => other,
    })
}

/// Parse a normalized ledger CSV
pub fn parse_transactions_csv<R: Read>(input: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = reader(input);
    let columns = Columns::resolve(&rdr.headers()?.clone(), true)?;

    let mut transactions = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = result?;
        let tx = at_row(line, parse_transaction_row(&record, &columns))?;
        transactions.push(tx);
    }

    debug!("Parsed {} ledger rows", transactions.len());
    Ok(transactions)
}

fn parse_transaction_row(record: &StringRecord, columns: &Columns) -> Result<NewTransaction> {
    let (date, time) = parse_date_time(field(record, columns.date, "date")?)?;
    let description = field(record, columns.description, "description")?;
    let amount = parse_amount(field(record, columns.amount, "amount")?)?;

    let kind: TransactionKind = optional_field(record, columns.kind)
        .ok_or_else(|| Error::Import("Missing kind".into()))?
        .parse()
        .map_err(Error::Import)?;
    let category: Category = optional_field(record, columns.category)
        .ok_or_else(|| Error::Import("Missing category".into()))?
        .parse()
        .map_err(Error::Import)?;
    let recurring = optional_field(record, columns.recurring)
        .map(parse_bool)
        .transpose()?
        .unwrap_or(false);

    let mut tx = match kind {
        TransactionKind::Income => NewTransaction::income(description, amount, category, date),
        TransactionKind::Expense => NewTransaction::expense(description, amount, category, date),
    };
    if let Some(time) = time {
        tx = tx.at(time);
    }
    if recurring {
        tx = tx.recurring();
    }
    tx.validate()?;
    Ok(tx)
}

/// Parse a card statement CSV into a draft for `issuer` due on `due_date`
pub fn parse_statement_csv<R: Read>(
    input: R,
    issuer: &str,
    due_date: NaiveDate,
) -> Result<InvoiceDraft> {
    let mut rdr = reader(input);
    let columns = Columns::resolve(&rdr.headers()?.clone(), false)?;

    let mut lines = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = result?;
        lines.push(at_row(line, parse_statement_row(&record, &columns))?);
    }

    let draft = InvoiceDraft {
        issuer: issuer.trim().to_string(),
        due_date,
        lines,
    };
    draft.validate()?;
    Ok(draft)
}

fn parse_statement_row(record: &StringRecord, columns: &Columns) -> Result<InvoiceLine> {
    let (date, _) = parse_date_time(field(record, columns.date, "date")?)?;
    let amount = parse_amount(field(record, columns.amount, "amount")?)?;
    if amount <= 0.0 {
        return Err(Error::Import(format!(
            "Statement amounts must be positive, got {}",
            amount
        )));
    }
    let category = optional_field(record, columns.category)
        .map(|c| c.parse::<Category>().map_err(Error::Import))
        .transpose()?
        .unwrap_or(Category::Other);

    Ok(InvoiceLine {
        date,
        description: field(record, columns.description, "description")?.to_string(),
        amount,
        category,
    })
}

/// Parse a date, optionally followed by a local time
pub fn parse_date_time(s: &str) -> Result<(NaiveDate, Option<NaiveTime>)> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok((dt.date(), Some(dt.time())));
        }
    }

    parse_date(s).map(|d| (d, None))
}

/// Parse a date in ISO or day-first form
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2026-01-15
        "%d/%m/%Y", // 15/01/2026
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and thousands separators
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s.trim().replace("R$", "").replace(['$', ',', ' '], "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Import(format!("Unable to parse amount: {}", s)))
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "sim" => Ok(true),
        "false" | "no" | "n" | "0" | "nao" | "não" => Ok(false),
        _ => Err(Error::Import(format!("Unable to parse flag: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2026-01-15").unwrap(), date(2026, 1, 15));
        assert_eq!(parse_date("15/01/2026").unwrap(), date(2026, 1, 15));
        assert!(parse_date("Jan 15").is_err());
    }

    #[test]
    fn test_parse_date_time() {
        let (d, t) = parse_date_time("2026-01-05 23:40").unwrap();
        assert_eq!(d, date(2026, 1, 5));
        assert_eq!(t, NaiveTime::from_hms_opt(23, 40, 0));

        let (_, t) = parse_date_time("2026-01-05").unwrap();
        assert!(t.is_none());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("R$ 39.90").unwrap(), 39.9);
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_transactions_csv() {
        let csv = "date,description,amount,kind,category,recurring
2026-01-05,Netflix,39.90,expense,subscriptions,true
2026-01-05 23:40,Bar,80.00,expense,entertainment,
2026-01-01,Salary,3000,income,salary,no";

        let txs = parse_transactions_csv(csv.as_bytes()).unwrap();
        assert_eq!(txs.len(), 3);
        assert!(txs[0].is_recurring);
        assert_eq!(txs[0].category, Category::Subscriptions);
        assert_eq!(txs[1].occurred_time, NaiveTime::from_hms_opt(23, 40, 0));
        assert!(!txs[1].is_recurring);
        assert_eq!(txs[2].kind, TransactionKind::Income);
    }

    #[test]
    fn test_optional_recurring_column() {
        let csv = "date,description,amount,kind,category
2026-01-05,Lunch,25,expense,food";
        let txs = parse_transactions_csv(csv.as_bytes()).unwrap();
        assert_eq!(txs.len(), 1);
        assert!(!txs[0].is_recurring);
    }

    #[test]
    fn test_bad_row_reports_line_number() {
        let csv = "date,description,amount,kind,category
2026-01-05,Lunch,25,expense,food
2026-01-06,Dinner,-4,expense,food";
        let err = parse_transactions_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);

        let csv = "date,description,amount,kind,category
2026-01-05,Lunch,25,expense,groceries";
        let err = parse_transactions_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "date,description,amount
2026-01-05,Lunch,25";
        assert!(parse_transactions_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_statement_csv() {
        let csv = "date,description,amount,category
2026-01-02,Amazon,120.00,shopping
2026-01-05,iFood,45.50,";
        let draft = parse_statement_csv(csv.as_bytes(), " Nubank ", date(2026, 2, 10)).unwrap();
        assert_eq!(draft.issuer, "Nubank");
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.lines[1].category, Category::Other);
        assert_eq!(draft.total(), 165.5);
    }
}
