use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone)
        .map_err(|_| CoreError::InvalidTimezone(format!("Invalid timezone: {}", timezone)))
}

/// Calendar date of `at_time` as seen in `timezone`.
///
/// Deadline classification compares dates, never instants, so "today" has to
/// be taken in the team's zone rather than in UTC.
pub fn local_date(timezone: &str, at_time: DateTime<Utc>) -> Result<NaiveDate, CoreError> {
    let tz = validate_timezone(timezone)?;
    Ok(at_time.with_timezone(&tz).date_naive())
}

pub fn today_in(timezone: &str) -> Result<NaiveDate, CoreError> {
    local_date(timezone, Utc::now())
}

/// Parses a sheet date cell. Empty cells are `None`; anything else must be
/// ISO `YYYY-MM-DD`, optionally followed by a time part that is dropped.
pub fn parse_sheet_date(raw: &str) -> Result<Option<NaiveDate>, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| CoreError::Validation(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("America/New_York").is_ok());
        assert!(validate_timezone("Invalid/Timezone").is_err());
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let late_utc = Utc.with_ymd_and_hms(2026, 5, 1, 2, 30, 0).unwrap();
        assert_eq!(
            local_date("America/Los_Angeles", late_utc).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 30).unwrap()
        );
        assert_eq!(
            local_date("UTC", late_utc).unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_sheet_date() {
        assert_eq!(parse_sheet_date("").unwrap(), None);
        assert_eq!(
            parse_sheet_date("2026-02-14").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 14)
        );
        assert_eq!(
            parse_sheet_date("2026-02-14T09:00:00.000Z").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 14)
        );
        assert!(parse_sheet_date("14/02/2026").is_err());
        assert!(parse_sheet_date("2026-02-30").is_err());
    }
}
