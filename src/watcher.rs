use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bookings::BookingStore;
use crate::grid::DayGrid;
use crate::notify::{ChangeEvent, NotifyHub, Table};
use crate::rooms::RoomStore;
use crate::settings::SettingsStore;
use crate::time;

/// Live projection of one day's grid.
///
/// Subscribes to booking and room change events, refetches when a change is
/// relevant to its day (outside the self-write cooldown), and publishes each
/// rebuilt grid on a watch channel. Dropping the receiver tears the watcher
/// down; a refetch already in flight finishes but its result is discarded.
pub struct DayWatcher {
    day: NaiveDate,
    rooms: RoomStore,
    bookings: BookingStore,
    settings: SettingsStore,
    hub: Arc<NotifyHub>,
}

impl DayWatcher {
    pub fn new(db: SqlitePool, hub: Arc<NotifyHub>, day: NaiveDate) -> Self {
        Self {
            day,
            rooms: RoomStore::new(db.clone(), Arc::clone(&hub)),
            bookings: BookingStore::new(db.clone(), Arc::clone(&hub)),
            settings: SettingsStore::new(db),
            hub,
        }
    }

    /// Initial load plus the background refresh loop. Subscriptions are
    /// taken before this returns, so no write can fall between the initial
    /// fetch and the first event.
    pub async fn spawn(self) -> Result<(watch::Receiver<DayGrid>, JoinHandle<()>)> {
        let bookings_rx = self.hub.subscribe(Table::Bookings);
        let rooms_rx = self.hub.subscribe(Table::Rooms);
        let grid = self.load().await?;
        let (tx, rx) = watch::channel(grid);
        let handle = tokio::spawn(async move { self.run(tx, bookings_rx, rooms_rx).await });
        Ok((rx, handle))
    }

    /// Fetch everything the grid needs and project it.
    pub async fn load(&self) -> Result<DayGrid> {
        let hours = self.settings.opening_hours().await;
        let rooms = self.rooms.available().await?;
        let bookings = self.bookings.for_day(self.day).await?;
        let slots = time::time_slots(self.day, &hours);
        Ok(DayGrid::project(self.day, rooms, slots, bookings))
    }

    async fn run(
        self,
        tx: watch::Sender<DayGrid>,
        mut bookings_rx: broadcast::Receiver<ChangeEvent>,
        mut rooms_rx: broadcast::Receiver<ChangeEvent>,
    ) {
        loop {
            let relevant = tokio::select! {
                _ = tx.closed() => break,
                event = bookings_rx.recv() => match event {
                    Ok(event) => self.is_relevant(&tx, &event),
                    // missed events: assume something changed
                    Err(RecvError::Lagged(_)) => true,
                    Err(RecvError::Closed) => break,
                },
                event = rooms_rx.recv() => match event {
                    Ok(_) => true,
                    Err(RecvError::Lagged(_)) => true,
                    Err(RecvError::Closed) => break,
                },
            };

            if !relevant {
                continue;
            }
            if self.hub.within_cooldown() {
                debug!("change event within self-write cooldown, skipping refetch");
                continue;
            }

            match self.load().await {
                Ok(grid) => {
                    if tx.send(grid).is_err() {
                        break;
                    }
                }
                // degrade gracefully; the next event retries
                Err(err) => warn!("failed to refresh day grid: {}", err),
            }
        }
    }

    /// A booking event matters when it names this day, or (day unknown,
    /// e.g. deletes) when the row is part of the currently shown set.
    fn is_relevant(&self, tx: &watch::Sender<DayGrid>, event: &ChangeEvent) -> bool {
        match event.day {
            Some(day) => day == self.day,
            None => tx
                .borrow()
                .bookings
                .iter()
                .any(|display| display.booking.id == event.row_id),
        }
    }
}
