use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

use crate::constants::Constants;
use crate::time::OpeningHours;

/// Admin-controlled simulated clock, stored under the `testing_clock` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestingClockValue {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>, // YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>, // HH:MM
}

/// Keyed JSON settings table.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    db: SqlitePool,
}

impl SettingsStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(match raw {
            Some((text,)) => Some(serde_json::from_str(&text)?),
            None => None,
        })
    }

    pub async fn put(&self, key: &str, value: &Value) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value.to_string())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Operating window. Any failure (missing row, malformed value, store
    /// unreachable) degrades to the default window rather than erroring:
    /// the grid must still render.
    pub async fn opening_hours(&self) -> OpeningHours {
        match self.get(Constants::OPERATION_HOURS_KEY).await {
            Ok(Some(value)) => {
                // Accept both the current {start, end} shape and the legacy
                // {open, close} keys.
                let start = value
                    .get("start")
                    .or_else(|| value.get("open"))
                    .and_then(Value::as_str);
                let end = value
                    .get("end")
                    .or_else(|| value.get("close"))
                    .and_then(Value::as_str);
                OpeningHours::from_strings(start, end)
            }
            Ok(None) => OpeningHours::default(),
            Err(err) => {
                warn!("failed to load operation hours, using defaults: {err}");
                OpeningHours::default()
            }
        }
    }

    pub async fn set_opening_hours(&self, hours: &OpeningHours) -> Result<()> {
        let value = serde_json::json!({
            "start": hours.start.format("%H:%M").to_string(),
            "end": hours.end.format("%H:%M").to_string(),
        });
        self.put(Constants::OPERATION_HOURS_KEY, &value).await
    }

    pub async fn testing_clock(&self) -> Result<Option<TestingClockValue>> {
        Ok(match self.get(Constants::TESTING_CLOCK_KEY).await? {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        })
    }

    pub async fn set_testing_clock(&self, clock: &TestingClockValue) -> Result<()> {
        self.put(Constants::TESTING_CLOCK_KEY, &serde_json::to_value(clock)?)
            .await
    }
}
