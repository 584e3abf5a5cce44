// Utility functions
use chrono::NaiveTime;

/// Render a minute count the way the duration selector shows it.
pub fn format_duration_minutes(minutes: i64) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        let hours = minutes / 60;
        let remaining_minutes = minutes % 60;
        if remaining_minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, remaining_minutes)
        }
    }
}

/// Grid row label for a slot time.
pub fn format_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}
