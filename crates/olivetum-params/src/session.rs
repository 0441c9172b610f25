//! Session-calendar math.
//!
//! Local time is `UTC + offset`. The session window is Monday through
//! Saturday, 12:00 to 24:00 local; Sunday is always off-session. The
//! off-session budget window starts at the local midnight of the current
//! day, extended back one day on Monday mornings so Sunday and the Monday
//! morning share a single 36-hour window.

const DAY_SECONDS: i64 = 86_400;

/// Day of week for a local-time second count, with Sunday = 0.
/// The Unix epoch (1970-01-01) was a Thursday.
fn weekday(local: i64) -> i64 {
    (local.div_euclid(DAY_SECONDS) + 4).rem_euclid(7)
}

fn hour(local: i64) -> i64 {
    local.rem_euclid(DAY_SECONDS) / 3_600
}

/// Whether a Unix timestamp falls inside the trading session.
pub fn is_session(timestamp: u64, tz_offset_seconds: i64) -> bool {
    let local = timestamp as i64 + tz_offset_seconds;
    if weekday(local) == 0 {
        return false;
    }
    (12..24).contains(&hour(local))
}

/// Start of the off-session budget window covering the given timestamp,
/// in local-time seconds. Returns 0 for session timestamps and for local
/// times before the epoch.
pub fn off_session_window_start(timestamp: u64, tz_offset_seconds: i64) -> u64 {
    let local = timestamp as i64 + tz_offset_seconds;
    if local < 0 {
        return 0;
    }
    if weekday(local) != 0 && (12..24).contains(&hour(local)) {
        return 0;
    }

    let mut window = (local / DAY_SECONDS) * DAY_SECONDS;
    if weekday(local) == 1 && hour(local) < 12 {
        window -= DAY_SECONDS;
        if window < 0 {
            window = 0;
        }
    }
    window as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-03 was a Sunday; 2024-03-04 a Monday.
    const SUNDAY_10_UTC: u64 = 1_709_460_000; // 2024-03-03 10:00:00 UTC
    const SUNDAY_13_UTC: u64 = 1_709_470_800; // 2024-03-03 13:00:00 UTC
    const MONDAY_10_UTC: u64 = 1_709_546_400; // 2024-03-04 10:00:00 UTC
    const MONDAY_12_UTC: u64 = 1_709_553_600; // 2024-03-04 12:00:00 UTC
    const MONDAY_13_UTC: u64 = 1_709_557_200; // 2024-03-04 13:00:00 UTC

    #[test]
    fn test_sunday_always_off_session() {
        assert!(!is_session(SUNDAY_10_UTC, 0));
        assert!(!is_session(SUNDAY_13_UTC, 0));
    }

    #[test]
    fn test_monday_noon_boundary() {
        assert!(!is_session(MONDAY_10_UTC, 0));
        assert!(is_session(MONDAY_12_UTC, 0));
        assert!(is_session(MONDAY_13_UTC, 0));
        // Midnight flips back off-session.
        assert!(!is_session(MONDAY_12_UTC + 12 * 3_600, 0));
    }

    #[test]
    fn test_tz_offset_shifts_window() {
        // Monday 10:00 UTC is 13:00 local at +3h: in session.
        assert!(is_session(MONDAY_10_UTC, 3 * 3_600));
        // Monday 13:00 UTC is 11:00 local at -2h: off-session.
        assert!(!is_session(MONDAY_13_UTC, -2 * 3_600));
    }

    #[test]
    fn test_sunday_and_monday_morning_share_window() {
        let sunday_window = off_session_window_start(SUNDAY_10_UTC, 0);
        let monday_morning_window = off_session_window_start(MONDAY_10_UTC, 0);
        assert_eq!(sunday_window, monday_morning_window);
        // Sunday midnight local.
        assert_eq!(sunday_window % DAY_SECONDS as u64, 0);
    }

    #[test]
    fn test_session_timestamps_have_no_window() {
        assert_eq!(off_session_window_start(MONDAY_13_UTC, 0), 0);
    }

    #[test]
    fn test_saturday_evening_window_is_own_day() {
        // 2024-03-02 was a Saturday; 02:00 UTC is off-session.
        let saturday_02_utc = 1_709_344_800;
        let window = off_session_window_start(saturday_02_utc, 0);
        assert_ne!(window, off_session_window_start(SUNDAY_10_UTC, 0));
        assert_eq!(window % DAY_SECONDS as u64, 0);
    }

    #[test]
    fn test_weekday_epoch_was_thursday() {
        assert_eq!(weekday(0), 4);
        assert_eq!(weekday(3 * DAY_SECONDS), 0); // 1970-01-04 was a Sunday
    }
}
