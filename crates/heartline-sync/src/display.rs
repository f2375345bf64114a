//! Pure helpers for presenting counters and timestamps.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

/// How long a received pulse reads as "just now".
pub const JUST_NOW: Duration = Duration::from_secs(2);

/// Default count-up animation length.
pub const COUNT_UP: Duration = Duration::from_millis(2000);

/// Value shown `elapsed` into a count-up animation towards `target`,
/// with cubic ease-out.
pub fn eased_count(target: u64, elapsed: Duration, duration: Duration) -> u64 {
    if duration.is_zero() {
        return target;
    }
    let progress = (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0);
    let eased = 1.0 - (1.0 - progress).powi(3);
    (target as f64 * eased).floor() as u64
}

/// Whole days since `since` (midnight UTC), counting a started day as a
/// full one.
pub fn days_together(since: NaiveDate, now: DateTime<Utc>) -> i64 {
    let start = since.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let millis = (now - start).num_milliseconds().abs();
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    (millis + DAY_MS - 1) / DAY_MS
}

pub fn hours_together(since: NaiveDate, now: DateTime<Utc>) -> i64 {
    days_together(since, now) * 24
}

pub fn recently_received(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    let Some(last) = last else {
        return false;
    };
    let age = now - last;
    age >= chrono::Duration::zero() && age.to_std().map(|d| d < JUST_NOW).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn eased_count_runs_from_zero_to_target() {
        assert_eq!(eased_count(1000, Duration::ZERO, COUNT_UP), 0);
        assert_eq!(eased_count(1000, COUNT_UP, COUNT_UP), 1000);
        assert_eq!(eased_count(1000, COUNT_UP * 3, COUNT_UP), 1000);
        // Halfway through, ease-out is already at 87.5%.
        assert_eq!(eased_count(1000, COUNT_UP / 2, COUNT_UP), 875);
    }

    #[test]
    fn eased_count_is_monotonic() {
        let mut last = 0;
        for ms in (0..=2000).step_by(50) {
            let v = eased_count(731, Duration::from_millis(ms), COUNT_UP);
            assert!(v >= last);
            last = v;
        }
        assert_eq!(eased_count(5, Duration::ZERO, Duration::ZERO), 5);
    }

    #[test]
    fn days_round_up_partial_days() {
        let since = NaiveDate::from_ymd_opt(2022, 12, 11).unwrap();
        let midnight = Utc.with_ymd_and_hms(2022, 12, 12, 0, 0, 0).unwrap();
        assert_eq!(days_together(since, midnight), 1);
        let morning = Utc.with_ymd_and_hms(2022, 12, 12, 9, 30, 0).unwrap();
        assert_eq!(days_together(since, morning), 2);
        assert_eq!(hours_together(since, morning), 48);
        assert_eq!(days_together(since, since.and_hms_opt(0, 0, 0).unwrap().and_utc()), 0);
    }

    #[test]
    fn just_now_window() {
        let now = Utc.with_ymd_and_hms(2024, 2, 14, 12, 0, 0).unwrap();
        assert!(!recently_received(None, now));
        assert!(recently_received(Some(now - chrono::Duration::milliseconds(1500)), now));
        assert!(!recently_received(Some(now - chrono::Duration::seconds(2)), now));
        assert!(!recently_received(Some(now + chrono::Duration::seconds(1)), now));
    }
}
