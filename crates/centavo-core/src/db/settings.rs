//! Settings document

use rusqlite::{params, OptionalExtension};
use tracing::warn;

use super::Database;
use crate::error::Result;
use crate::models::Settings;
use crate::store::SettingsStore;

const SETTINGS_KEY: &str = "user_settings";

impl SettingsStore for Database {
    /// A document that no longer parses is reported and treated as absent
    fn settings(&self) -> Result<Option<Settings>> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw.and_then(|json| match serde_json::from_str(&json) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("Ignoring unreadable settings document: {}", e);
                None
            }
        }))
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![SETTINGS_KEY, json],
        )?;
        Ok(())
    }
}
