//! Utility functions

use chrono::{DateTime, Days, Local, NaiveDate, SecondsFormat, TimeZone, Utc};

// ============================================================================
// Time Utilities
// ============================================================================

/// Format seconds as `m:ss` (e.g., 225.4 -> "3:45")
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Current time as an RFC 3339 UTC timestamp with millisecond precision
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Inclusive UTC bounds of a local calendar day, as timestamps
pub fn day_bounds(date: NaiveDate) -> (String, String) {
    let start = local_midnight(date);
    let end = date
        .checked_add_days(Days::new(1))
        .map(local_midnight)
        .unwrap_or(start + chrono::Duration::days(1))
        - chrono::Duration::milliseconds(1);
    (format_timestamp(start), format_timestamp(end))
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST change
        None => Utc.from_utc_datetime(&naive),
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.9), "0:05");
        assert_eq!(format_time(225.4), "3:45");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_now_timestamp_is_rfc3339_utc() {
        let stamp = now_timestamp();
        assert!(stamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn test_timestamps_order_lexically() {
        let earlier = format_timestamp(Utc.with_ymd_and_hms(2026, 1, 2, 9, 5, 0).unwrap());
        let later = format_timestamp(Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_day_bounds_cover_local_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let (start, end) = day_bounds(date);
        assert!(start < end);

        let noon = Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        let noon = format_timestamp(noon);
        assert!(start <= noon && noon <= end);

        let next = day_bounds(date.succ_opt().unwrap()).0;
        assert!(end < next);
    }
}
