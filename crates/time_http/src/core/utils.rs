use std::fmt::Display;

use chrono::{DateTime, TimeZone, Timelike, Utc};

// Constants for format strings and response keys
pub const RFC822_FORMAT: &str = "%d %b %y %H:%M %Z";
pub const ZONE_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const ZONE_OFFSET_FORMAT: &str = "%z %Z";
pub const UTC_KEY: &str = "UTC";

/// Format a UTC instant using the RFC 822 layout, e.g. `01 Jan 24 00:00 UTC`
pub fn format_rfc822(instant: &DateTime<Utc>) -> String {
    instant.format(RFC822_FORMAT).to_string()
}

/// Format a zoned instant in its full default representation
///
/// # Arguments
///
/// * `instant` - The instant, already converted into the target timezone
///
/// # Returns
///
/// A string such as `2023-12-31 19:00:00 -0500 EST`. Sub-second precision is
/// kept with trailing zeros trimmed, and left out entirely on whole seconds.
pub fn format_zoned<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}{} {}",
        instant.format(ZONE_DATE_TIME_FORMAT),
        format_fraction(instant.nanosecond()),
        instant.format(ZONE_OFFSET_FORMAT)
    )
}

/// Render nanoseconds as a trimmed decimal fraction (`.5`, `.000123`), or
/// nothing for zero
pub fn format_fraction(nanos: u32) -> String {
    // Leap seconds are reported by chrono as nanos >= 1s
    let nanos = nanos % 1_000_000_000;
    if nanos == 0 {
        return String::new();
    }
    let digits = format!("{:09}", nanos);
    format!(".{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn new_year_2024() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_format_rfc822() {
        assert_eq!(format_rfc822(&new_year_2024()), "01 Jan 24 00:00 UTC");
    }

    #[test]
    fn test_format_zoned_new_york_winter() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let local = new_year_2024().with_timezone(&tz);
        assert_eq!(format_zoned(&local), "2023-12-31 19:00:00 -0500 EST");
    }

    #[test]
    fn test_format_zoned_dst_and_fractional_offsets() {
        let summer = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();

        let london: Tz = "Europe/London".parse().unwrap();
        assert_eq!(
            format_zoned(&summer.with_timezone(&london)),
            "2024-07-01 13:00:00 +0100 BST"
        );

        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        assert_eq!(
            format_zoned(&summer.with_timezone(&tokyo)),
            "2024-07-01 21:00:00 +0900 JST"
        );

        // Nepal sits at UTC+5:45
        let kathmandu: Tz = "Asia/Kathmandu".parse().unwrap();
        assert!(
            format_zoned(&summer.with_timezone(&kathmandu)).starts_with("2024-07-01 17:45:00 +0545")
        );
    }

    #[test]
    fn test_format_zoned_keeps_sub_second_precision() {
        let instant = new_year_2024() + chrono::Duration::milliseconds(250);
        let tz: Tz = "UTC".parse().unwrap();
        assert_eq!(
            format_zoned(&instant.with_timezone(&tz)),
            "2024-01-01 00:00:00.25 +0000 UTC"
        );
    }

    #[test]
    fn test_format_fraction() {
        assert_eq!(format_fraction(0), "");
        assert_eq!(format_fraction(500_000_000), ".5");
        assert_eq!(format_fraction(123_000), ".000123");
        assert_eq!(format_fraction(1), ".000000001");
    }
}
