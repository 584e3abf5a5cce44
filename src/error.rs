use thiserror::Error;

/// Errors surfaced to the caller of a booking operation.
///
/// Validation problems are caught before any query runs; constraint
/// violations come back from the store and are mapped to user-readable
/// wording here, never surfaced raw.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("This time slot is already booked. Please choose another time.")]
    Conflict,

    #[error("Invalid booking time. Please use 30-minute intervals.")]
    Granularity,

    #[error("Invalid room or course selected. Please refresh and try again.")]
    InvalidReference,

    #[error("You are not authorised to perform this operation.")]
    Unauthorised,

    #[error("Booking not found.")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl BookingError {
    /// Map a store error onto the taxonomy. The overlap triggers abort with
    /// "booking overlap"; foreign keys and checks carry their own markers.
    pub fn from_db(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            let msg = db.message();
            if msg.contains("booking overlap") {
                return Self::Conflict;
            }
            if msg.contains("FOREIGN KEY") {
                return Self::InvalidReference;
            }
            if msg.contains("CHECK constraint failed") {
                return Self::Granularity;
            }
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }
        Self::Database(err)
    }
}
