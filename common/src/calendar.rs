//! Date arithmetic for puzzle ids (`YYYY-MM-DD`, UTC).

use chrono::{DateTime, NaiveDate, TimeDelta};

/// Day the first puzzle was published. Puzzle #1.
pub const LAUNCH_DATE: &str = "2023-12-01";

const ID_FORMAT: &str = "%Y-%m-%d";
/// Hour (UTC) at which the next day's puzzle goes live.
const ROLLOVER_HOUR: i64 = 12;

/// Parses a canonical `YYYY-MM-DD` id. Signs, missing zero padding and
/// other spellings chrono would tolerate are rejected.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(date, ID_FORMAT).ok()?;
    (format_date(parsed) == date).then_some(parsed)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(ID_FORMAT).to_string()
}

/// Sequence number shown in share text: days since launch, starting at 1.
pub fn puzzle_number(id: &str) -> Option<i64> {
    let launch = parse_date(LAUNCH_DATE)?;
    Some(parse_date(id)?.signed_duration_since(launch).num_days() + 1)
}

/// Puzzle id live at the given Unix time. Before noon UTC the previous
/// day's puzzle is still being played. Times chrono cannot represent fall
/// back to the epoch.
pub fn puzzle_id_at(unix_secs: i64) -> String {
    let instant = DateTime::from_timestamp(unix_secs, 0).unwrap_or_default();
    let shifted = instant
        .checked_sub_signed(TimeDelta::hours(ROLLOVER_HOUR))
        .unwrap_or(instant);
    format_date(shifted.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let leap = parse_date("2024-02-29").unwrap();
        assert_eq!(leap, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(format_date(leap), "2024-02-29");
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("24-01-01"), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_rejects_non_canonical_ids() {
        assert_eq!(parse_date("2024-+1-15"), None);
        assert_eq!(parse_date("+024-01-15"), None);
        assert_eq!(parse_date("2024-1-15"), None);
        assert_eq!(parse_date(" 2024-01-15"), None);
        assert_eq!(parse_date("2024-01-15T00:00"), None);
        assert_eq!(puzzle_number("2024-+1-15"), None);
    }

    #[test]
    fn test_puzzle_number() {
        assert_eq!(puzzle_number(LAUNCH_DATE), Some(1));
        assert_eq!(puzzle_number("2023-12-31"), Some(31));
        assert_eq!(puzzle_number("2024-01-15"), Some(46));
        assert_eq!(puzzle_number("garbage"), None);
    }

    #[test]
    fn test_noon_rollover() {
        // 2024-01-15T00:00:00Z
        let midnight = 1_705_276_800;
        assert_eq!(puzzle_id_at(midnight), "2024-01-14");
        assert_eq!(puzzle_id_at(midnight + 11 * 3600 + 3599), "2024-01-14");
        assert_eq!(puzzle_id_at(midnight + 12 * 3600), "2024-01-15");
    }
}
