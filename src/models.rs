use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::Constants;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub capacity: Option<i64>,
    pub borrowable_items: Option<String>, // JSON array of item labels
    pub dynamic_labels: Option<String>,   // JSON array of maintenance labels
    pub is_available: bool,
    pub is_open: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Room {
    pub fn borrowable_item_list(&self) -> Vec<String> {
        parse_label_list(self.borrowable_items.as_deref())
    }

    pub fn dynamic_label_list(&self) -> Vec<String> {
        parse_label_list(self.dynamic_labels.as_deref())
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub color_hex: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub room_id: i64,
    pub booking_day: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String, // Reserved, Active, Overdue, Ended
    pub course_id: Option<i64>,
    pub course_name: Option<String>, // free-text override ("Other")
    pub booked_by: String,
    pub student_numbers: Option<String>,
    pub borrowed_items: Option<String>, // JSON array of item labels
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        BookingStatus::from(self.status.clone())
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.booking_day.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.booking_day.and_time(self.end_time)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.ends_at() - self.starts_at()).num_minutes()
    }

    /// Ended bookings no longer occupy their room for overlap purposes.
    pub fn is_live(&self) -> bool {
        self.status() != BookingStatus::Ended
    }

    pub fn borrowed_item_list(&self) -> Vec<String> {
        parse_label_list(self.borrowed_items.as_deref())
    }

    /// Derived presentational condition, never persisted. Late means the
    /// party is over the grace period without having started; Overdue here
    /// mirrors what the reconciler will persist on its next pass.
    pub fn soft_state(&self, now: NaiveDateTime) -> Option<SoftState> {
        match self.status() {
            BookingStatus::Reserved => {
                let late_after = self.starts_at()
                    + chrono::Duration::minutes(Constants::LATE_GRACE_MINUTES);
                (now > late_after).then_some(SoftState::Late)
            }
            BookingStatus::Active => (now > self.ends_at()).then_some(SoftState::Overdue),
            _ => None,
        }
    }
}

/// A booking joined with its course's display fields for the day grid.
#[derive(Debug, Clone, FromRow)]
pub struct BookingDisplay {
    #[sqlx(flatten)]
    pub booking: Booking,
    pub course: Option<String>,
    pub course_color: Option<String>,
}

impl BookingDisplay {
    /// Joined course name, the free-text override, or nothing.
    pub fn course_label(&self) -> Option<&str> {
        self.course
            .as_deref()
            .or(self.booking.course_name.as_deref())
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub settings: bool,
    pub authorisation: bool,
    pub analytics: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Reserved,
    Active,
    Overdue,
    Ended,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => Constants::STATUS_RESERVED,
            Self::Active => Constants::STATUS_ACTIVE,
            Self::Overdue => Constants::STATUS_OVERDUE,
            Self::Ended => Constants::STATUS_ENDED,
        }
    }
}

impl From<String> for BookingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Reserved" => Self::Reserved,
            "Active" => Self::Active,
            "Overdue" => Self::Overdue,
            "Ended" => Self::Ended,
            _ => Self::Reserved,
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftState {
    Late,
    Overdue,
}

/// Course selection on a booking form: a catalogue course, the "Other"
/// free-text escape hatch, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseRef {
    Course(i64),
    Other(String),
    None,
}

fn parse_label_list(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

pub fn encode_label_list(labels: &[String]) -> Option<String> {
    if labels.is_empty() {
        return None;
    }
    serde_json::to_string(labels).ok()
}
