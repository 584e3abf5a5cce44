use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{BookingDisplay, Room};
use crate::time::span_rows;

/// One (room, slot) position on the day grid.
///
/// Only anchor cells carry a booking for rendering; the interior of a span
/// is merged into its anchor and must not be offered as a booking target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Free,
    /// The booking starts here and visually spans `rows` slots downward.
    Anchor { booking: usize, rows: i64 },
    /// Inside a span started in an earlier slot.
    Covered { booking: usize },
}

/// Pure projection of one day's bookings onto the room x slot grid.
/// Recomputed whenever the underlying booking set changes.
#[derive(Debug, Clone)]
pub struct DayGrid {
    pub day: NaiveDate,
    pub rooms: Vec<Room>,
    pub slots: Vec<NaiveDateTime>,
    pub bookings: Vec<BookingDisplay>,
    cells: Vec<Cell>, // row-major by slot
}

impl DayGrid {
    pub fn project(
        day: NaiveDate,
        rooms: Vec<Room>,
        slots: Vec<NaiveDateTime>,
        bookings: Vec<BookingDisplay>,
    ) -> Self {
        let mut cells = Vec::with_capacity(slots.len() * rooms.len());
        for slot in &slots {
            for room in &rooms {
                cells.push(cell_for(room.id, *slot, &bookings));
            }
        }
        Self {
            day,
            rooms,
            slots,
            bookings,
            cells,
        }
    }

    pub fn cell(&self, slot_idx: usize, room_idx: usize) -> Option<Cell> {
        (slot_idx < self.slots.len() && room_idx < self.rooms.len())
            .then(|| self.cells[slot_idx * self.rooms.len() + room_idx])
    }

    /// The booking covering a (room, slot) position, anchor or not.
    pub fn booking_at(&self, room_id: i64, slot: NaiveDateTime) -> Option<&BookingDisplay> {
        self.bookings.iter().find(|display| {
            let b = &display.booking;
            b.room_id == room_id && slot >= b.starts_at() && slot < b.ends_at()
        })
    }

    /// Whether the position can be offered as a new booking's start.
    pub fn is_free(&self, room_id: i64, slot: NaiveDateTime) -> bool {
        self.booking_at(room_id, slot).is_none()
    }

    pub fn booking(&self, idx: usize) -> Option<&BookingDisplay> {
        self.bookings.get(idx)
    }
}

fn cell_for(room_id: i64, slot: NaiveDateTime, bookings: &[BookingDisplay]) -> Cell {
    // Overlaps are prevented upstream; if one slips through, the first
    // booking by persisted order wins deterministically.
    for (idx, display) in bookings.iter().enumerate() {
        let b = &display.booking;
        if b.room_id != room_id {
            continue;
        }
        if slot >= b.starts_at() && slot < b.ends_at() {
            return if slot == b.starts_at() {
                Cell::Anchor {
                    booking: idx,
                    rows: span_rows(b.start_time, b.end_time),
                }
            } else {
                Cell::Covered { booking: idx }
            };
        }
    }
    Cell::Free
}
