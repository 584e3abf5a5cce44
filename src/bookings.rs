use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use sqlx::SqlitePool;

use crate::clock::Clock;
use crate::constants::Constants;
use crate::error::BookingError;
use crate::models::{encode_label_list, Booking, BookingDisplay, BookingStatus, CourseRef};
use crate::notify::{ChangeEvent, ChangeOp, NotifyHub, Table};
use crate::time;

/// Fields for creating or replacing a booking. End time is derived from
/// start + duration so both always land on grid boundaries together.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub room_id: i64,
    pub booking_day: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub course: CourseRef,
    pub booked_by: String,
    pub student_numbers: Option<String>,
    pub borrowed_items: Vec<String>,
    pub status: BookingStatus,
}

impl BookingDraft {
    /// Pre-store validation: everything here fails before a query runs.
    fn validate(&self) -> Result<(), BookingError> {
        if !time::on_slot_boundary(self.start_time) {
            return Err(BookingError::Granularity);
        }
        if self.duration_minutes <= 0 || self.duration_minutes % Constants::SLOT_MINUTES != 0 {
            return Err(BookingError::Granularity);
        }
        let staff = self.booked_by.trim();
        if staff.is_empty() {
            return Err(BookingError::Validation("Staff name is required.".into()));
        }
        if staff.len() > Constants::MAX_STAFF_NAME_LENGTH {
            return Err(BookingError::Validation("Staff name is too long.".into()));
        }
        if let CourseRef::Other(name) = &self.course {
            if name.trim().is_empty() {
                return Err(BookingError::Validation(
                    "Please enter a course name for 'Other'.".into(),
                ));
            }
        }
        Ok(())
    }

    fn end_time(&self) -> Result<NaiveTime, BookingError> {
        let end = time::minutes_of_day(self.start_time) + self.duration_minutes;
        if end >= Constants::MINUTES_PER_DAY {
            return Err(BookingError::Validation(
                "Booking must end before midnight.".into(),
            ));
        }
        time::time_from_minutes(end).ok_or(BookingError::Granularity)
    }

    fn course_columns(&self) -> (Option<i64>, Option<String>) {
        match &self.course {
            CourseRef::Course(id) => (Some(*id), None),
            CourseRef::Other(name) => (None, Some(name.trim().to_string())),
            CourseRef::None => (None, None),
        }
    }
}

/// All reads and writes against the bookings table. The no-overlap rule is
/// enforced by the store's triggers; this layer maps those rejections onto
/// [`BookingError`] and publishes change events after successful writes.
#[derive(Debug, Clone)]
pub struct BookingStore {
    db: SqlitePool,
    hub: Arc<NotifyHub>,
}

impl BookingStore {
    pub fn new(db: SqlitePool, hub: Arc<NotifyHub>) -> Self {
        Self { db, hub }
    }

    /// Every booking of a day across all rooms, with joined course display
    /// fields, in persisted order.
    pub async fn for_day(&self, day: NaiveDate) -> Result<Vec<BookingDisplay>, BookingError> {
        sqlx::query_as::<_, BookingDisplay>(
            "SELECT b.*, c.name AS course, c.color_hex AS course_color
             FROM bookings b LEFT JOIN courses c ON c.id = b.course_id
             WHERE b.booking_day = ? ORDER BY b.id",
        )
        .bind(day)
        .fetch_all(&self.db)
        .await
        .map_err(BookingError::from_db)
    }

    /// One room's bookings for a day, for availability computations.
    pub async fn for_room_day(
        &self,
        room_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<Booking>, BookingError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE room_id = ? AND booking_day = ? ORDER BY start_time",
        )
        .bind(room_id)
        .bind(day)
        .fetch_all(&self.db)
        .await
        .map_err(BookingError::from_db)
    }

    pub async fn get(&self, id: i64) -> Result<Booking, BookingError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(BookingError::from_db)?
            .ok_or(BookingError::NotFound)
    }

    pub async fn insert(&self, draft: &BookingDraft) -> Result<Booking, BookingError> {
        draft.validate()?;
        let end_time = draft.end_time()?;
        let (course_id, course_name) = draft.course_columns();
        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (room_id, booking_day, start_time, end_time, status,
                                   course_id, course_name, booked_by, student_numbers, borrowed_items)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(draft.room_id)
        .bind(draft.booking_day)
        .bind(draft.start_time)
        .bind(end_time)
        .bind(draft.status.as_str())
        .bind(course_id)
        .bind(course_name)
        .bind(draft.booked_by.trim())
        .bind(draft.student_numbers.as_deref())
        .bind(encode_label_list(&draft.borrowed_items))
        .fetch_one(&self.db)
        .await
        .map_err(BookingError::from_db)?;
        self.notify(ChangeOp::Insert, &booking);
        Ok(booking)
    }

    /// Full replace of an existing booking (the edit form's Update).
    pub async fn update(&self, id: i64, draft: &BookingDraft) -> Result<Booking, BookingError> {
        draft.validate()?;
        let end_time = draft.end_time()?;
        let (course_id, course_name) = draft.course_columns();
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET room_id = ?, booking_day = ?, start_time = ?, end_time = ?,
                    status = ?, course_id = ?, course_name = ?, booked_by = ?,
                    student_numbers = ?, borrowed_items = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ? RETURNING *",
        )
        .bind(draft.room_id)
        .bind(draft.booking_day)
        .bind(draft.start_time)
        .bind(end_time)
        .bind(draft.status.as_str())
        .bind(course_id)
        .bind(course_name)
        .bind(draft.booked_by.trim())
        .bind(draft.student_numbers.as_deref())
        .bind(encode_label_list(&draft.borrowed_items))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(BookingError::from_db)?
        .ok_or(BookingError::NotFound)?;
        self.notify(ChangeOp::Update, &booking);
        Ok(booking)
    }

    /// Targeted status patch.
    pub async fn set_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ? RETURNING *",
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(BookingError::from_db)?
        .ok_or(BookingError::NotFound)?;
        self.notify(ChangeOp::Update, &booking);
        Ok(booking)
    }

    /// Quick action: put a reserved booking into use. The scheduled end is
    /// kept; it already sits on a grid boundary.
    pub async fn quick_start(&self, id: i64) -> Result<Booking, BookingError> {
        self.set_status(id, BookingStatus::Active).await
    }

    /// Quick action: conclude a booking. The recorded end is clamped to
    /// min(now rounded to the grid, scheduled end) so ending early
    /// truncates and ending late never extends, and floored to one slot so
    /// the row stays a valid interval.
    pub async fn quick_end(&self, id: i64, clock: &dyn Clock) -> Result<Booking, BookingError> {
        let booking = self.get(id).await?;
        let rounded_now = time::round_to_slot(clock.now());
        let min_end = booking.starts_at() + Duration::minutes(Constants::SLOT_MINUTES);
        let new_end = rounded_now.min(booking.ends_at()).max(min_end);

        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET end_time = ?, status = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ? RETURNING *",
        )
        .bind(new_end.time())
        .bind(BookingStatus::Ended.as_str())
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(BookingError::from_db)?
        .ok_or(BookingError::NotFound)?;
        self.notify(ChangeOp::Update, &booking);
        Ok(booking)
    }

    /// Push a live booking's end forward. A new end in the future revives
    /// an Overdue booking to Active. The store's overlap trigger is the
    /// backstop should the offered ceiling have gone stale.
    pub async fn extend(
        &self,
        id: i64,
        minutes: i64,
        clock: &dyn Clock,
    ) -> Result<Booking, BookingError> {
        if minutes <= 0 || minutes % Constants::SLOT_MINUTES != 0 {
            return Err(BookingError::Granularity);
        }
        let booking = self.get(id).await?;
        let end = time::minutes_of_day(booking.end_time) + minutes;
        if end >= Constants::MINUTES_PER_DAY {
            return Err(BookingError::Validation(
                "Booking must end before midnight.".into(),
            ));
        }
        let new_end = time::time_from_minutes(end).ok_or(BookingError::Granularity)?;
        let status = if booking.booking_day.and_time(new_end) > clock.now() {
            BookingStatus::Active
        } else {
            booking.status()
        };

        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET end_time = ?, status = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ? RETURNING *",
        )
        .bind(new_end)
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(BookingError::from_db)?
        .ok_or(BookingError::NotFound)?;
        self.notify(ChangeOp::Update, &booking);
        Ok(booking)
    }

    /// Hard remove, distinct from ending.
    pub async fn delete(&self, id: i64) -> Result<(), BookingError> {
        let booking = self.get(id).await?;
        sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(BookingError::from_db)?;
        self.notify(ChangeOp::Delete, &booking);
        Ok(())
    }

    /// Batched conditional update for the reconciler: Active bookings of
    /// `today` whose end has passed become Overdue. Returns how many rows
    /// actually flipped, so an immediate second pass reports zero.
    pub async fn mark_overdue(
        &self,
        today: NaiveDate,
        now: NaiveTime,
    ) -> Result<u64, BookingError> {
        self.flip_status(today, now, BookingStatus::Active, BookingStatus::Overdue)
            .await
    }

    /// The symmetric reversal: an Overdue booking whose end is ahead of the
    /// clock again (extension, clock adjustment) returns to Active.
    pub async fn unmark_overdue(
        &self,
        today: NaiveDate,
        now: NaiveTime,
    ) -> Result<u64, BookingError> {
        self.flip_status(today, now, BookingStatus::Overdue, BookingStatus::Active)
            .await
    }

    async fn flip_status(
        &self,
        today: NaiveDate,
        now: NaiveTime,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<u64, BookingError> {
        let predicate = match to {
            BookingStatus::Overdue => "end_time < ?",
            _ => "end_time > ?",
        };
        let sql = format!(
            "UPDATE bookings SET status = ?, updated_at = CURRENT_TIMESTAMP
             WHERE status = ? AND booking_day = ? AND {predicate} RETURNING id",
        );
        let flipped: Vec<(i64,)> = sqlx::query_as(&sql)
            .bind(to.as_str())
            .bind(from.as_str())
            .bind(today)
            .bind(now)
            .fetch_all(&self.db)
            .await
            .map_err(BookingError::from_db)?;

        if !flipped.is_empty() {
            self.hub.stamp_local_write();
            for (id,) in &flipped {
                self.hub.publish(ChangeEvent {
                    table: Table::Bookings,
                    op: ChangeOp::Update,
                    row_id: *id,
                    day: Some(today),
                });
            }
        }
        Ok(flipped.len() as u64)
    }

    fn notify(&self, op: ChangeOp, booking: &Booking) {
        self.hub.publish(ChangeEvent {
            table: Table::Bookings,
            op,
            row_id: booking.id,
            day: Some(booking.booking_day),
        });
    }
}
