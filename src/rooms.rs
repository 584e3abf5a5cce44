use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::constants::Constants;
use crate::error::BookingError;
use crate::models::{encode_label_list, Booking, BookingStatus, Room};
use crate::notify::{ChangeEvent, ChangeOp, NotifyHub, Table};

/// Fields for creating or replacing a room from the settings screen.
#[derive(Debug, Clone, Default)]
pub struct RoomDraft {
    pub name: String,
    pub capacity: Option<i64>,
    pub borrowable_items: Vec<String>,
    pub dynamic_labels: Vec<String>,
    pub is_available: bool,
    pub is_open: bool,
}

impl RoomDraft {
    fn validate(&self) -> Result<(), BookingError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation("Room name is required.".into()));
        }
        if name.len() > Constants::MAX_ROOM_NAME_LENGTH {
            return Err(BookingError::Validation("Room name is too long.".into()));
        }
        Ok(())
    }
}

/// One room's situation at "now", for the booking panel's room picker.
#[derive(Debug, Clone)]
pub struct RoomStatusNow {
    pub room: Room,
    pub busy: bool,
    pub overdue: bool,
    /// Minutes a Reserved party is past its start, when over the grace period.
    pub reserved_late_minutes: Option<i64>,
}

impl RoomStatusNow {
    /// Busy rooms stay pickable when their occupant is overdue or late:
    /// the desk needs to be able to book over a no-show.
    pub fn selectable(&self) -> bool {
        !self.busy || self.overdue || self.reserved_late_minutes.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct RoomStore {
    db: SqlitePool,
    hub: Arc<NotifyHub>,
}

impl RoomStore {
    pub fn new(db: SqlitePool, hub: Arc<NotifyHub>) -> Self {
        Self { db, hub }
    }

    /// Rooms offered for booking, in grid column order.
    pub async fn available(&self) -> Result<Vec<Room>, BookingError> {
        let rooms = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE is_available = 1")
            .fetch_all(&self.db)
            .await
            .map_err(BookingError::from_db)?;
        Ok(sort_rooms(rooms))
    }

    /// Every room, for the settings screen.
    pub async fn all(&self) -> Result<Vec<Room>, BookingError> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY name")
            .fetch_all(&self.db)
            .await
            .map_err(BookingError::from_db)
    }

    pub async fn get(&self, id: i64) -> Result<Room, BookingError> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(BookingError::from_db)?
            .ok_or(BookingError::NotFound)
    }

    pub async fn create(&self, draft: &RoomDraft) -> Result<Room, BookingError> {
        draft.validate()?;
        let room = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (name, capacity, borrowable_items, dynamic_labels, is_available, is_open)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(draft.name.trim())
        .bind(draft.capacity)
        .bind(encode_label_list(&draft.borrowable_items))
        .bind(encode_label_list(&draft.dynamic_labels))
        .bind(draft.is_available)
        .bind(draft.is_open)
        .fetch_one(&self.db)
        .await
        .map_err(BookingError::from_db)?;
        self.notify(ChangeOp::Insert, room.id);
        Ok(room)
    }

    pub async fn update(&self, id: i64, draft: &RoomDraft) -> Result<Room, BookingError> {
        draft.validate()?;
        let room = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET name = ?, capacity = ?, borrowable_items = ?, dynamic_labels = ?,
                    is_available = ?, is_open = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ? RETURNING *",
        )
        .bind(draft.name.trim())
        .bind(draft.capacity)
        .bind(encode_label_list(&draft.borrowable_items))
        .bind(encode_label_list(&draft.dynamic_labels))
        .bind(draft.is_available)
        .bind(draft.is_open)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(BookingError::from_db)?
        .ok_or(BookingError::NotFound)?;
        self.notify(ChangeOp::Update, id);
        Ok(room)
    }

    pub async fn delete(&self, id: i64) -> Result<(), BookingError> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(BookingError::from_db)?;
        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound);
        }
        self.notify(ChangeOp::Delete, id);
        Ok(())
    }

    fn notify(&self, op: ChangeOp, row_id: i64) {
        self.hub.publish(ChangeEvent {
            table: Table::Rooms,
            op,
            row_id,
            day: None,
        });
    }
}

/// Grid column order: `Room <N>` names numerically first, everything else
/// alphabetically (case-insensitive) after.
pub fn sort_rooms(rooms: Vec<Room>) -> Vec<Room> {
    let mut numeric: Vec<(u32, Room)> = Vec::new();
    let mut other: Vec<Room> = Vec::new();
    for room in rooms {
        match room_number(&room.name) {
            Some(n) => numeric.push((n, room)),
            None => other.push(room),
        }
    }
    numeric.sort_by_key(|(n, _)| *n);
    other.sort_by_key(|room| room.name.to_lowercase());

    let mut sorted: Vec<Room> = numeric.into_iter().map(|(_, room)| room).collect();
    sorted.extend(other);
    sorted
}

/// `"Room 3"` (any casing, optional space) parses to 3; anything else is None.
fn room_number(name: &str) -> Option<u32> {
    let trimmed = name.trim();
    if trimmed.len() < 4 || !trimmed.is_char_boundary(4) {
        return None;
    }
    let (prefix, rest) = trimmed.split_at(4);
    if !prefix.eq_ignore_ascii_case("Room") {
        return None;
    }
    let digits = rest.trim_start();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Project each room's current situation from the day's bookings.
pub fn room_statuses_now(
    rooms: Vec<Room>,
    bookings: &[Booking],
    now: NaiveDateTime,
) -> Vec<RoomStatusNow> {
    rooms
        .into_iter()
        .map(|room| {
            let mut busy = false;
            let mut overdue = false;
            let mut reserved_late_minutes = None;
            for booking in bookings.iter().filter(|b| b.room_id == room.id) {
                match booking.status() {
                    BookingStatus::Active => {
                        if booking.starts_at() <= now && now < booking.ends_at() {
                            busy = true;
                        }
                    }
                    BookingStatus::Overdue => {
                        busy = true;
                        overdue = true;
                    }
                    BookingStatus::Reserved => {
                        let minutes = (now - booking.starts_at()).num_minutes();
                        if minutes > Constants::LATE_GRACE_MINUTES {
                            let late = reserved_late_minutes.unwrap_or(0);
                            reserved_late_minutes = Some(late.max(minutes));
                        }
                    }
                    BookingStatus::Ended => {}
                }
            }
            RoomStatusNow {
                room,
                busy,
                overdue,
                reserved_late_minutes,
            }
        })
        .collect()
}
