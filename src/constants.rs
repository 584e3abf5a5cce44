/// Constants used throughout the application for consistency
pub struct Constants;

impl Constants {
    // Grid granularity
    pub const SLOT_MINUTES: i64 = 30;
    pub const MINUTES_PER_DAY: i64 = 24 * 60;

    // Largest duration/extension offered in one step; the true ceiling may
    // be smaller when a neighbouring booking or closing time is nearer.
    pub const MAX_OFFERED_MINUTES: i64 = 120;

    // A Reserved booking this far past its start time is surfaced as Late.
    pub const LATE_GRACE_MINUTES: i64 = 10;

    // Fallback operating window when the settings row is missing or malformed.
    pub const DEFAULT_OPENING: &'static str = "06:00";
    pub const DEFAULT_CLOSING: &'static str = "21:00";

    // Background cadence (seconds)
    pub const RECONCILE_INTERVAL_SECS: u64 = 60;
    pub const CLOCK_REFRESH_SECS: u64 = 10;

    // Change events arriving this soon after one of our own writes are
    // self-triggered and must not cause a refetch.
    pub const SELF_WRITE_COOLDOWN_MS: u64 = 1200;

    // Settings keys
    pub const OPERATION_HOURS_KEY: &'static str = "operation_hours";
    pub const TESTING_CLOCK_KEY: &'static str = "testing_clock";

    // Booking status strings as persisted
    pub const STATUS_RESERVED: &'static str = "Reserved";
    pub const STATUS_ACTIVE: &'static str = "Active";
    pub const STATUS_OVERDUE: &'static str = "Overdue";
    pub const STATUS_ENDED: &'static str = "Ended";

    // Field limits
    pub const MAX_ROOM_NAME_LENGTH: usize = 100;
    pub const MAX_COURSE_NAME_LENGTH: usize = 100;
    pub const MAX_STAFF_NAME_LENGTH: usize = 100;
}
