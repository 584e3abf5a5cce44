// Library interface for the booking engine and its tests
pub mod availability;
pub mod bookings;
pub mod clock;
pub mod config;
pub mod constants;
pub mod courses;
pub mod database;
pub mod error;
pub mod grid;
pub mod models;
pub mod notify;
pub mod reconciler;
pub mod rooms;
pub mod settings;
pub mod time;
pub mod users;
pub mod utils;
pub mod watcher;
