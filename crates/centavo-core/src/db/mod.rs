//! Database access layer with connection pooling and migrations
//!
//! This module is organized by store:
//! - `transactions` - Ledger CRUD
//! - `settings` - User settings document
//! - `invoices` - Statement imports and reverts
//! - `reviews` - Savings review overrides
//! - `checklist` - Agenda checklist entries

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod checklist;
mod invoices;
mod reviews;
mod settings;
mod transactions;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "CENTAVO_DB_KEY";

/// Timestamp format SQLite uses for `CURRENT_TIMESTAMP`
const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this invalidates every existing encrypted database
    const APP_SALT: &[u8; 16] = b"centavo-salt-v01";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, SQLITE_DATETIME)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(SQLITE_DATETIME).to_string()
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, message.into())
}

/// Read a text column through `FromStr`
pub(crate) fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn parse_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| conversion_error(idx, format!("bad date '{}': {}", raw, e)))
}

pub(crate) fn parse_optional_date(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| conversion_error(idx, format!("bad date '{}': {}", s, e)))
    })
    .transpose()
}

pub(crate) fn parse_optional_time(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<NaiveTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveTime::parse_from_str(&s, "%H:%M:%S")
            .map_err(|e| conversion_error(idx, format!("bad time '{}': {}", s, e)))
    })
    .transpose()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open an encrypted database
    ///
    /// Requires the `CENTAVO_DB_KEY` environment variable. The database is
    /// encrypted with SQLCipher using a key derived from the passphrase via
    /// Argon2. Use `new_unencrypted()` for development and tests.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases.",
                DB_KEY_ENV
            ))),
        }
    }

    /// Open an unencrypted database
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Open a database with an explicit passphrase
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let key_pragma = passphrase
            .map(derive_key)
            .transpose()?
            .map(|key| format!("PRAGMA key = 'x\"{}\"';", key));

        // Every pooled connection needs the key and foreign keys
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            if let Some(pragma) = &key_pragma {
                conn.execute_batch(pragma)?;
            }
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because every pooled
    /// connection must see the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "centavo_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().to_string();

        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Check if the database is encrypted
    pub fn is_encrypted(&self) -> Result<bool> {
        let conn = self.conn()?;
        // SQLCipher sets cipher_version if encryption is active
        let result: rusqlite::Result<String> =
            conn.query_row("PRAGMA cipher_version;", [], |row| row.get(0));
        Ok(result.is_ok() && std::env::var(DB_KEY_ENV).is_ok())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- AUTOINCREMENT so a deleted id is never handed out again
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                kind TEXT NOT NULL,                       -- income, expense
                occurred_date DATE NOT NULL,
                occurred_time TEXT,                       -- HH:MM:SS local time, if known
                effective_date DATE,                      -- NULL = occurred_date
                is_recurring BOOLEAN NOT NULL DEFAULT 0,
                is_credit_purchase BOOLEAN NOT NULL DEFAULT 0,
                credit_card_issuer TEXT,
                linked_to_invoice_group BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_occurred ON transactions(occurred_date);
            CREATE INDEX IF NOT EXISTS idx_transactions_effective ON transactions(effective_date);

            -- Key-value documents (user settings as JSON)
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS invoice_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                issuer TEXT NOT NULL,
                due_date DATE NOT NULL,
                total_amount REAL NOT NULL,
                transaction_count INTEGER NOT NULL,
                fingerprint TEXT NOT NULL,
                imported_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_invoice_groups_fingerprint ON invoice_groups(fingerprint);

            -- No foreign key to transactions: deleted members must stay
            -- listed so re-imports can tell how many survived
            CREATE TABLE IF NOT EXISTS invoice_transactions (
                invoice_id INTEGER NOT NULL REFERENCES invoice_groups(id) ON DELETE CASCADE,
                transaction_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (invoice_id, transaction_id)
            );

            CREATE TABLE IF NOT EXISTS savings_reviews (
                opportunity_id TEXT PRIMARY KEY,          -- e.g. "duplicate:42"
                status TEXT NOT NULL,                     -- pending, kept, dismissed, adjusted
                adjusted_amount REAL,
                note TEXT,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS agenda_checklist (
                target_id TEXT NOT NULL,                  -- e.g. "invoice:nubank", "recurring:gym"
                month TEXT NOT NULL,                      -- YYYY-MM
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (target_id, month)
            );
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
