//! Day-key codec.
//!
//! Daily-scoped records are keyed by an integer count of days since the Unix
//! epoch (00:00 UTC, 1970-01-01) instead of a full date. Conversions use
//! flooring division so pre-epoch timestamps round toward negative infinity.

use chrono::{DateTime, Local, NaiveDate, ParseError, TimeZone, Utc};

/// Integer count of days since the Unix epoch.
pub type DayKey = i64;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Convert an instant to its day key.
pub fn date_to_day_key(date: DateTime<Utc>) -> DayKey {
    date.timestamp_millis().div_euclid(MS_PER_DAY)
}

/// Convert a day key back to an instant, always UTC midnight of that day.
pub fn day_key_to_date(day_key: DayKey) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(day_key * MS_PER_DAY)
        .single()
        .expect("day key out of representable range")
}

/// Parse a `YYYY-MM-DD` form value as UTC midnight and convert it.
///
/// Performs no validation beyond the date parse itself; form boundaries are
/// expected to reject malformed input before calling.
pub fn date_string_to_day_key(s: &str) -> Result<DayKey, ParseError> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
    Ok(date_to_day_key(date.and_hms_opt(0, 0, 0).expect("midnight exists").and_utc()))
}

/// Render a day key as a `YYYY-MM-DD` form value.
pub fn day_key_to_date_string(day_key: DayKey) -> String {
    day_key_to_date(day_key).format("%Y-%m-%d").to_string()
}

/// Format a day key as a display label, e.g. `Thu, Jan 1, 1970`.
///
/// Display only; never used for comparisons.
pub fn format_day_key(day_key: DayKey) -> String {
    day_key_to_date(day_key).format("%a, %b %-d, %Y").to_string()
}

/// Day key of the current date, anchored at local midnight.
pub fn today_day_key() -> DayKey {
    let now = Local::now();
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight exists")
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or(now);
    midnight.timestamp_millis().div_euclid(MS_PER_DAY)
}

/// Today's day key followed by the `count - 1` preceding days, most recent
/// first.
pub fn recent_day_keys(count: usize) -> Vec<DayKey> {
    let today = today_day_key();
    (0..count as i64).map(|i| today - i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_day_zero() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(date_to_day_key(epoch), 0);
        assert_eq!(day_key_to_date(0), epoch);
    }

    #[test]
    fn time_of_day_is_truncated() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 15, 7, 30, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();

        assert_eq!(date_to_day_key(morning), date_to_day_key(midnight));
        assert_eq!(date_to_day_key(evening), date_to_day_key(midnight));
        assert_eq!(day_key_to_date(date_to_day_key(evening)), midnight);
    }

    #[test]
    fn day_boundary_at_midnight() {
        let last_instant = Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 59).unwrap();
        let next_midnight = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(date_to_day_key(last_instant) + 1, date_to_day_key(next_midnight));
    }

    #[test]
    fn key_round_trip_is_stable() {
        for key in [-100_000, -1, 0, 1, 19_797, 47_481] {
            assert_eq!(date_to_day_key(day_key_to_date(key)), key);
        }
    }

    #[test]
    fn pre_epoch_dates_floor_toward_negative_infinity() {
        // One second before the epoch is day -1, not day 0.
        let almost_epoch = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(date_to_day_key(almost_epoch), -1);

        let last_1969_midnight = Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(date_to_day_key(last_1969_midnight), -1);
        assert_eq!(day_key_to_date(-1), last_1969_midnight);
    }

    #[test]
    fn leap_day_round_trips() {
        let key = date_string_to_day_key("2024-02-29").unwrap();
        assert_eq!(day_key_to_date_string(key), "2024-02-29");
        assert_eq!(day_key_to_date_string(key + 1), "2024-03-01");
    }

    #[test]
    fn date_string_parsing() {
        assert_eq!(date_string_to_day_key("1970-01-01").unwrap(), 0);
        assert_eq!(date_string_to_day_key("1970-01-02").unwrap(), 1);
        assert!(date_string_to_day_key("1970-13-01").is_err());
        assert!(date_string_to_day_key("not-a-date").is_err());
        assert!(date_string_to_day_key("").is_err());
    }

    #[test]
    fn epoch_display_label() {
        assert_eq!(format_day_key(0), "Thu, Jan 1, 1970");
    }

    #[test]
    fn recent_keys_are_consecutive_descending() {
        let keys = recent_day_keys(7);
        assert_eq!(keys.len(), 7);
        assert_eq!(keys[0], today_day_key());
        for pair in keys.windows(2) {
            assert_eq!(pair[0] - 1, pair[1]);
        }
    }
}
