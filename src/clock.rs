use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::SqlitePool;
use tokio::time::sleep;
use tracing::warn;

use crate::settings::{SettingsStore, TestingClockValue};
use crate::time::parse_hhmm;

/// Source of "now" for all business logic. Slot checks, reconciliation and
/// availability never read the system clock directly, so the whole system
/// can be driven by the admin's simulated clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Production wall clock. Bookings are wall-clock entities, so local time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Fixed clock for deterministic tests.
pub struct FixedClock {
    current: RwLock<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(initial: NaiveDateTime) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn set(&self, to: NaiveDateTime) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = to;
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.current.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Clock backed by the `testing_clock` settings row. While the override is
/// enabled, every reading returns the configured fixed instant; otherwise
/// this behaves like [`SystemClock`]. A background task keeps the cached
/// override fresh.
pub struct StoreClock {
    settings: SettingsStore,
    simulated: RwLock<Option<NaiveDateTime>>,
}

impl StoreClock {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            settings: SettingsStore::new(db),
            simulated: RwLock::new(None),
        }
    }

    /// Re-read the override from settings. Failures keep the previous
    /// cached value; a stale simulated clock beats a crashed grid.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let simulated = self
            .settings
            .testing_clock()
            .await?
            .and_then(|value| effective_instant(&value, Local::now().date_naive()));
        let mut guard = match self.simulated.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = simulated;
        Ok(())
    }

    pub async fn run(self: Arc<Self>, interval: Duration) {
        loop {
            if let Err(err) = self.refresh().await {
                warn!("testing clock refresh failed: {err}");
            }
            sleep(interval).await;
        }
    }
}

impl Clock for StoreClock {
    fn now(&self) -> NaiveDateTime {
        let guard = match self.simulated.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.unwrap_or_else(|| Local::now().naive_local())
    }
}

/// Resolve a testing-clock value to the instant it pins, if enabled.
/// A missing date means `fallback_day`; a missing time means midnight.
pub fn effective_instant(
    value: &TestingClockValue,
    fallback_day: NaiveDate,
) -> Option<NaiveDateTime> {
    if !value.enabled {
        return None;
    }
    let day = value
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or(fallback_day);
    let time = value
        .time
        .as_deref()
        .and_then(parse_hhmm)
        .unwrap_or(NaiveTime::MIN);
    Some(day.and_time(time))
}
