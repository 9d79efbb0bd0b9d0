//! Day-first date parsing, fiscal-year labels and period bucketing.
//!
//! Review dates arrive as `DD/MM/YY` or `DD/MM/YYYY`. Anything that does not
//! parse is not an error: the record simply carries no date and stays out of
//! every time-bucketed view.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{DerivedRecord, ReviewRecord};

/// First calendar month of the fiscal year (April).
pub const FISCAL_YEAR_START_MONTH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl PeriodGranularity {
    /// Chronological anchor of the bucket containing `date`.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            PeriodGranularity::Daily => date,
            PeriodGranularity::Weekly => {
                let offset = date.weekday().num_days_from_sunday();
                date - Duration::days(i64::from(offset))
            }
            PeriodGranularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// Display label for a bucket anchor.
    pub fn label(self, start: NaiveDate) -> String {
        match self {
            PeriodGranularity::Daily | PeriodGranularity::Weekly => {
                start.format("%Y-%m-%d").to_string()
            }
            PeriodGranularity::Monthly => start.format("%b %Y").to_string(),
        }
    }
}

impl FromStr for PeriodGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(PeriodGranularity::Daily),
            "weekly" | "week" => Ok(PeriodGranularity::Weekly),
            "monthly" | "month" => Ok(PeriodGranularity::Monthly),
            other => Err(format!(
                "unknown period '{other}' (expected daily, weekly or monthly)"
            )),
        }
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PeriodGranularity::Daily => "daily",
            PeriodGranularity::Weekly => "weekly",
            PeriodGranularity::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

fn expand_year(year: i32, digits: usize) -> i32 {
    if digits > 2 {
        year
    } else if year < 50 {
        2000 + year
    } else {
        1900 + year
    }
}

/// Parse a day-first `DD/MM/YY` or `DD/MM/YYYY` date.
///
/// Returns `None` when there are fewer than three `/`-separated parts, when
/// any of them is not a number, or when the triple is not a real calendar
/// date (`31/02/24`).
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('/').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    let year = expand_year(year, parts[2].len());
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `FY<start>-<end, two digits>`; January to March belong to the fiscal
/// year that started the previous calendar year.
pub fn fiscal_year(date: NaiveDate) -> String {
    let start = if date.month() >= FISCAL_YEAR_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    };
    format!("FY{}-{:02}", start, (start + 1).rem_euclid(100))
}

pub fn resolve(record: &ReviewRecord, granularity: PeriodGranularity) -> DerivedRecord {
    let parsed_date = parse_day_first(&record.date_raw);
    let period_start = parsed_date.map(|d| granularity.bucket_start(d));
    DerivedRecord {
        record: record.clone(),
        parsed_date,
        fiscal_year: parsed_date.map(fiscal_year).unwrap_or_default(),
        period_key: period_start
            .map(|s| granularity.label(s))
            .unwrap_or_default(),
        period_start,
    }
}

pub fn resolve_all(records: &[ReviewRecord], granularity: PeriodGranularity) -> Vec<DerivedRecord> {
    records.iter().map(|r| resolve(r, granularity)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dated(raw: &str) -> ReviewRecord {
        ReviewRecord {
            store_name: "A".to_string(),
            remark: "late".to_string(),
            cluster_label: "Late Delivery".to_string(),
            date_raw: raw.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn two_digit_years_pivot_at_fifty() {
        assert_eq!(parse_day_first("15/06/23").unwrap().year(), 2023);
        assert_eq!(parse_day_first("15/06/85").unwrap().year(), 1985);
        assert_eq!(parse_day_first("15/06/49").unwrap().year(), 2049);
        assert_eq!(parse_day_first("15/06/50").unwrap().year(), 1950);
        assert_eq!(parse_day_first("15/06/2023"), Some(ymd(2023, 6, 15)));
    }

    #[test]
    fn malformed_dates_yield_none() {
        assert_eq!(parse_day_first(""), None);
        assert_eq!(parse_day_first("2024-05-01"), None);
        assert_eq!(parse_day_first("01/05"), None);
        assert_eq!(parse_day_first("aa/05/24"), None);
        assert_eq!(parse_day_first("31/02/24"), None);
        assert_eq!(parse_day_first("-1/05/24"), None);
        assert_eq!(parse_day_first("01/05/24/abc"), None);
        assert_eq!(parse_day_first("01/05/24/"), None);
    }

    #[test]
    fn fiscal_year_turns_over_in_april() {
        assert_eq!(fiscal_year(parse_day_first("31/03/2024").unwrap()), "FY2023-24");
        assert_eq!(fiscal_year(parse_day_first("01/04/2024").unwrap()), "FY2024-25");
        assert_eq!(fiscal_year(ymd(1999, 12, 31)), "FY1999-00");
    }

    #[test]
    fn weekly_buckets_start_on_sunday() {
        // 1 May 2024 is a Wednesday.
        let start = PeriodGranularity::Weekly.bucket_start(ymd(2024, 5, 1));
        assert_eq!(start, ymd(2024, 4, 28));
        let sunday = PeriodGranularity::Weekly.bucket_start(ymd(2024, 4, 28));
        assert_eq!(sunday, ymd(2024, 4, 28));
    }

    #[test]
    fn monthly_labels_use_month_and_year() {
        let derived = resolve(&dated("17/05/24"), PeriodGranularity::Monthly);
        assert_eq!(derived.period_start, Some(ymd(2024, 5, 1)));
        assert_eq!(derived.period_key, "May 2024");
        assert_eq!(derived.fiscal_year, "FY2024-25");
    }

    #[test]
    fn granularity_parses_from_cli_text() {
        assert_eq!("Weekly".parse::<PeriodGranularity>(), Ok(PeriodGranularity::Weekly));
        assert_eq!(PeriodGranularity::default().to_string(), "monthly");
        assert!("hourly".parse::<PeriodGranularity>().is_err());
    }

    #[test]
    fn unparsable_date_leaves_temporal_fields_empty() {
        let derived = resolve(&dated("sometime"), PeriodGranularity::Daily);
        assert_eq!(derived.parsed_date, None);
        assert_eq!(derived.period_start, None);
        assert!(derived.fiscal_year.is_empty());
        assert!(derived.period_key.is_empty());
        assert_eq!(derived.record.store_name, "A");
    }
}
