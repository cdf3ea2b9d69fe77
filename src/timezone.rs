use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// The current UTC offset of `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the timezone name is not recognised.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in `canonical_timezone`, falling back to UTC if the timezone is unknown.
pub fn local_today(canonical_timezone: &str) -> Date {
    let offset = get_local_offset(canonical_timezone).unwrap_or_else(|| {
        tracing::warn!("Unknown timezone \"{canonical_timezone}\", falling back to UTC.");
        UtcOffset::UTC
    });

    OffsetDateTime::now_utc().to_offset(offset).date()
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, UtcOffset};

    use super::{get_local_offset, local_today};

    #[test]
    fn utc_offset_is_zero() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn unknown_timezone_has_no_offset() {
        assert_eq!(get_local_offset("Middle/Earth"), None);
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc_date() {
        let want = OffsetDateTime::now_utc().date();

        let got = local_today("Middle/Earth");

        // Allow for the test running across midnight.
        assert!((got - want).whole_days().abs() <= 1);
    }
}
