use chrono::NaiveTime;

use crate::constants::Constants;
use crate::models::Booking;
use crate::time::{minutes_of_day, OpeningHours};

/// Closing limit in minutes from the day's midnight, relative to a
/// reference instant inside the window. An overnight window (closing at or
/// before opening) rolls past midnight for references in the evening
/// segment; references in the spilled-over morning segment keep the
/// same-day closing.
fn closing_limit(reference: i64, hours: &OpeningHours) -> i64 {
    let open = minutes_of_day(hours.start);
    let mut close = minutes_of_day(hours.end);
    if close <= open && reference >= open {
        close += Constants::MINUTES_PER_DAY;
    }
    close
}

/// Duration choices for a booking starting at `start` in one room, in grid
/// increments up to the nearest of: the next live booking, closing time,
/// and the offered cap.
///
/// `exclude` skips the booking being edited. `current_duration` keeps a
/// previously chosen value on offer while it is still within the true
/// ceiling, even when it exceeds the cap. An empty result means the start
/// conflicts with an existing booking and submission must be disabled.
pub fn duration_options(
    start: NaiveTime,
    bookings: &[Booking],
    exclude: Option<i64>,
    hours: &OpeningHours,
    current_duration: Option<i64>,
) -> Vec<i64> {
    let start_mins = minutes_of_day(start);
    let mut limit = closing_limit(start_mins, hours);

    for booking in bookings {
        if exclude == Some(booking.id) || !booking.is_live() {
            continue;
        }
        let b_start = minutes_of_day(booking.start_time);
        let b_end = minutes_of_day(booking.end_time);
        if b_start > start_mins {
            limit = limit.min(b_start);
        } else if b_end > start_mins {
            // the candidate start sits inside this booking
            limit = start_mins;
        }
    }

    let max_duration = limit - start_mins;
    let mut options = increments(max_duration);

    if let Some(current) = current_duration {
        if current > 0 && current <= max_duration && !options.contains(&current) {
            options.push(current);
            options.sort_unstable();
        }
    }
    options
}

/// Extension choices for a live booking currently running `duration_minutes`
/// from `start`, bounded by the next live booking at or after the current
/// end, else closing time.
pub fn extension_options(
    start: NaiveTime,
    duration_minutes: i64,
    bookings: &[Booking],
    exclude: i64,
    hours: &OpeningHours,
) -> Vec<i64> {
    let end_mins = minutes_of_day(start) + duration_minutes;
    let mut limit = closing_limit(end_mins, hours);

    for booking in bookings {
        if booking.id == exclude || !booking.is_live() {
            continue;
        }
        let b_start = minutes_of_day(booking.start_time);
        if b_start >= end_mins {
            limit = limit.min(b_start);
        }
    }

    increments(limit - end_mins)
}

fn increments(max: i64) -> Vec<i64> {
    (1..)
        .map(|i| i * Constants::SLOT_MINUTES)
        .take_while(|d| *d <= max && *d <= Constants::MAX_OFFERED_MINUTES)
        .collect()
}
