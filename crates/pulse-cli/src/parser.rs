use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use pulse_core::timezone::{parse_sheet_date, validate_timezone};

/// Parses a deadline given as `YYYY-MM-DD` or in plain English ("next friday").
///
/// Relative dates are resolved against "now" in `timezone`.
pub fn parse_deadline(input: &str, timezone: &str) -> Result<NaiveDate> {
    if let Ok(Some(date)) = parse_sheet_date(input) {
        return Ok(date);
    }
    let tz: Tz = validate_timezone(timezone)?;
    let now = Utc::now().with_timezone(&tz);
    parse_date_string(input.trim(), now, Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

/// Parses `"title:OWNER"` seed specs used by `project add --task`.
pub fn parse_seed_task(seed: &str) -> Result<(String, String)> {
    let (title, owner) = seed
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Task seed '{}' must look like 'title:OWNER'", seed))?;
    let (title, owner) = (title.trim(), owner.trim());
    if title.is_empty() || owner.is_empty() {
        return Err(anyhow!("Task seed '{}' needs both a title and an owner", seed));
    }
    Ok((title.to_string(), owner.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_iso_dates_parse_directly() {
        let date = parse_deadline("2026-03-14", "UTC").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
    }

    #[test]
    fn test_relative_dates_use_timezone() {
        let tomorrow = parse_deadline("tomorrow", "UTC").unwrap();
        assert_eq!(tomorrow, Utc::now().date_naive() + Duration::days(1));
    }

    #[test]
    fn test_garbage_dates_fail() {
        assert!(parse_deadline("not a date at all", "UTC").is_err());
        assert!(parse_deadline("tomorrow", "Mars/Olympus").is_err());
    }

    #[test]
    fn test_seed_task_specs() {
        assert_eq!(
            parse_seed_task("Press kit: marketing").unwrap(),
            ("Press kit".to_string(), "MARKETING".to_string())
        );
        assert_eq!(
            parse_seed_task("Launch: T-1:WEB").unwrap(),
            ("Launch: T-1".to_string(), "WEB".to_string())
        );
        assert!(parse_seed_task("no owner here").is_err());
        assert!(parse_seed_task(":WEB").is_err());
    }
}
