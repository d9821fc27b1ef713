//! Local→UTC normalization for the persistence adapter.
//!
//! The reference uses `pytz.normalize(pytz.localize(naive))`; this is the
//! `chrono-tz` equivalent. Ambiguous or nonexistent local times (DST
//! transitions) pick the earliest valid offset rather than silently
//! picking one the way the reference does — logged so it is visible.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub fn to_storage_utc(local: NaiveDateTime, display_timezone: Tz) -> DateTime<Utc> {
    match display_timezone.from_local_datetime(&local) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earliest, _latest) => {
            tracing::warn!(%local, "ambiguous local time during DST fold-back, using the earliest offset");
            earliest.with_timezone(&Utc)
        }
        chrono::LocalResult::None => {
            tracing::warn!(%local, "nonexistent local time during DST spring-forward, clamping forward");
            display_timezone
                .from_local_datetime(&(local + chrono::Duration::hours(1)))
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local))
        }
    }
}

/// Inverse of [`to_storage_utc`]: a stored UTC instant, shown in the
/// display timezone, as the naive local the engine schedules against.
pub fn to_local_naive(utc: DateTime<Utc>, display_timezone: Tz) -> NaiveDateTime {
    utc.with_timezone(&display_timezone).naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn converts_paris_summer_time_to_utc() {
        let local = NaiveDate::from_ymd_opt(2025, 8, 11)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let utc = to_storage_utc(local, chrono_tz::Europe::Paris);
        assert_eq!(utc.naive_utc().hour(), 6);
    }
}
