use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use roombook::bookings::BookingStore;
use roombook::clock::FixedClock;
use roombook::database;
use roombook::models::{Booking, Course, Room};
use roombook::notify::NotifyHub;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// In-memory database with migrations applied. A single connection keeps
/// every query on the same database.
pub async fn setup_memory_db() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// File-backed database for tests exercising the production pool setup.
/// The temp file guard must outlive the pool.
pub async fn setup_file_db() -> Result<(SqlitePool, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let database_url = format!("sqlite:{}", temp_file.path().display());
    let pool = database::init(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok((pool, temp_file))
}

pub fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    d(year, month, day).and_time(t(hour, minute))
}

/// Builder for creating test rooms
pub struct RoomBuilder {
    name: String,
    capacity: Option<i64>,
    borrowable_items: Option<String>,
    is_available: bool,
    is_open: bool,
}

impl RoomBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capacity: Some(4),
            borrowable_items: None,
            is_available: true,
            is_open: true,
        }
    }

    pub fn with_borrowable_items(mut self, items: &[&str]) -> Self {
        let labels: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        self.borrowable_items = serde_json::to_string(&labels).ok();
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }

    pub async fn build(self, db: &SqlitePool) -> Result<Room> {
        let room = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (name, capacity, borrowable_items, is_available, is_open)
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&self.name)
        .bind(self.capacity)
        .bind(&self.borrowable_items)
        .bind(self.is_available)
        .bind(self.is_open)
        .fetch_one(db)
        .await?;
        Ok(room)
    }
}

/// Builder for creating test courses
pub struct CourseBuilder {
    name: String,
    color_hex: Option<String>,
}

impl CourseBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            color_hex: Some("#93c5fd".to_string()),
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color_hex = Some(color.to_string());
        self
    }

    pub async fn build(self, db: &SqlitePool) -> Result<Course> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (name, color_hex) VALUES (?, ?) RETURNING *",
        )
        .bind(&self.name)
        .bind(&self.color_hex)
        .fetch_one(db)
        .await?;
        Ok(course)
    }
}

/// Builder for creating test bookings, writing directly to the store so
/// fixtures can carry any status. Times must sit on grid boundaries and
/// live fixtures must not overlap; the schema enforces both.
pub struct BookingBuilder {
    room_id: i64,
    booking_day: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: String,
    course_id: Option<i64>,
    course_name: Option<String>,
    booked_by: String,
}

impl BookingBuilder {
    pub fn new(room_id: i64, day: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            room_id,
            booking_day: day,
            start_time: start,
            end_time: end,
            status: "Reserved".to_string(),
            course_id: None,
            course_name: None,
            booked_by: "Test Staff".to_string(),
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub async fn build(self, db: &SqlitePool) -> Result<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (room_id, booking_day, start_time, end_time, status,
                                   course_id, course_name, booked_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(self.room_id)
        .bind(self.booking_day)
        .bind(self.start_time)
        .bind(self.end_time)
        .bind(&self.status)
        .bind(self.course_id)
        .bind(&self.course_name)
        .bind(&self.booked_by)
        .fetch_one(db)
        .await?;
        Ok(booking)
    }
}

/// Test application context with a fixed clock.
pub struct TestContext {
    pub db: SqlitePool,
    pub hub: Arc<NotifyHub>,
    pub clock: Arc<FixedClock>,
    pub bookings: BookingStore,
}

impl TestContext {
    pub async fn new_at(now: NaiveDateTime) -> Result<Self> {
        let db = setup_memory_db().await?;
        let hub = Arc::new(NotifyHub::new());
        let clock = Arc::new(FixedClock::new(now));
        let bookings = BookingStore::new(db.clone(), Arc::clone(&hub));

        Ok(Self {
            db,
            hub,
            clock,
            bookings,
        })
    }
}
