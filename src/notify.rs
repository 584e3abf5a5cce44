use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::constants::Constants;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Bookings,
    Rooms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// A row-level change on one of the watched tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: ChangeOp,
    pub row_id: i64,
    /// Day the row belongs to, when the write path knows it. Subscribers
    /// treat day-less events as potentially relevant.
    pub day: Option<NaiveDate>,
}

/// Broadcast hub for change events, one channel per table.
///
/// Write paths publish here after every successful store write, giving
/// subscribers a single "booking set changed" signal instead of separate
/// polling and push triggers.
#[derive(Debug)]
pub struct NotifyHub {
    channels: DashMap<Table, broadcast::Sender<ChangeEvent>>,
    last_local_write: Mutex<Option<Instant>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            last_local_write: Mutex::new(None),
        }
    }

    /// Subscribe to one table's events. Creates the channel if needed.
    pub fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        let sender = self
            .channels
            .entry(table)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send an event. No-op if nobody is listening.
    pub fn publish(&self, event: ChangeEvent) {
        if let Some(sender) = self.channels.get(&event.table) {
            let _ = sender.send(event);
        }
    }

    /// Record a reconciliation write originating in this process.
    /// Subscribers skip refetching for events landing inside the cooldown,
    /// since their local state was already merged.
    pub fn stamp_local_write(&self) {
        let mut guard = match self.last_local_write.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(Instant::now());
    }

    pub fn within_cooldown(&self) -> bool {
        let guard = match self.last_local_write.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .map(|at| at.elapsed() < Duration::from_millis(Constants::SELF_WRITE_COOLDOWN_MS))
            .unwrap_or(false)
    }
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}
