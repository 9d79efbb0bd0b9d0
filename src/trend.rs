//! First-half versus second-half trend analysis.
//!
//! Two independent midpoints are involved. Per-key deltas split the dated
//! records themselves at the date of the middle record; the overall direction
//! splits the bucketed time series by index and compares mean bucket counts.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::time_series;
use crate::period::PeriodGranularity;
use crate::types::{DerivedRecord, TimeSeriesPoint, TrendDelta};
use crate::util::{format_number, format_signed};

/// How many rising or falling keys a report keeps.
pub const MAX_MOVERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub increasing: Vec<TrendDelta>,
    pub decreasing: Vec<TrendDelta>,
    pub overall_direction: TrendDirection,
    pub first_half_average: f64,
    pub second_half_average: f64,
    pub overall_change_pct: Option<f64>,
    pub buckets: usize,
}

impl TrendReport {
    fn neutral(buckets: usize) -> Self {
        TrendReport {
            increasing: Vec::new(),
            decreasing: Vec::new(),
            overall_direction: TrendDirection::Neutral,
            first_half_average: 0.0,
            second_half_average: 0.0,
            overall_change_pct: None,
            buckets,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.buckets < 2
    }
}

fn mean_count(points: &[TimeSeriesPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.count as f64).sum::<f64>() / points.len() as f64
}

/// Rising and falling keys plus the overall volume direction.
///
/// Fewer than two time buckets produce a neutral report with no movers.
pub fn trend_deltas<'a, K, F>(
    records: &'a [DerivedRecord],
    key_fn: F,
    granularity: PeriodGranularity,
) -> TrendReport
where
    F: Fn(&'a DerivedRecord) -> K,
    K: AsRef<str>,
{
    let series = time_series(records, granularity);
    if series.len() < 2 {
        return TrendReport::neutral(series.len());
    }

    let mut dated: Vec<&'a DerivedRecord> = records.iter().filter(|r| r.parsed_date.is_some()).collect();
    dated.sort_by_key(|r| r.parsed_date);
    let midpoint_date = dated[dated.len() / 2].parsed_date;

    let mut halves: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for &record in &dated {
        let entry = halves.entry(key_fn(record).as_ref().to_string()).or_default();
        if record.parsed_date <= midpoint_date {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }
    let deltas: Vec<TrendDelta> = halves
        .into_iter()
        .map(|(key, (first, second))| TrendDelta {
            key,
            first_half_count: first,
            second_half_count: second,
            change: second as i64 - first as i64,
        })
        .collect();

    // `deltas` is key-ordered, so a stable sort on change keeps ties alphabetical.
    let mut increasing: Vec<TrendDelta> = deltas.iter().filter(|d| d.change > 0).cloned().collect();
    increasing.sort_by(|a, b| b.change.cmp(&a.change));
    increasing.truncate(MAX_MOVERS);
    let mut decreasing: Vec<TrendDelta> = deltas.into_iter().filter(|d| d.change < 0).collect();
    decreasing.sort_by_key(|d| d.change);
    decreasing.truncate(MAX_MOVERS);

    let split = series.len() / 2;
    let first_half_average = mean_count(&series[..split]);
    let second_half_average = mean_count(&series[split..]);
    let overall_direction = if second_half_average > first_half_average {
        TrendDirection::Increasing
    } else if second_half_average < first_half_average {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Neutral
    };
    let overall_change_pct = (first_half_average > 0.0)
        .then(|| (second_half_average - first_half_average) / first_half_average * 100.0);

    TrendReport {
        increasing,
        decreasing,
        overall_direction,
        first_half_average,
        second_half_average,
        overall_change_pct,
        buckets: series.len(),
    }
}

/// Plain-language summaries of a report for the insight panel.
pub fn insight_lines(report: &TrendReport) -> Vec<String> {
    if report.is_degenerate() {
        return vec!["Not enough dated reviews to compute trends.".to_string()];
    }
    let mut lines = Vec::new();
    let change = report
        .overall_change_pct
        .map(|p| format!(" ({}{}%)", if p > 0.0 { "+" } else { "" }, format_number(p, 1)))
        .unwrap_or_default();
    let verb = match report.overall_direction {
        TrendDirection::Increasing => "rising",
        TrendDirection::Decreasing => "falling",
        TrendDirection::Neutral => "flat",
    };
    lines.push(format!(
        "Review volume is {}: {} per period recently vs {} earlier{}.",
        verb,
        format_number(report.second_half_average, 1),
        format_number(report.first_half_average, 1),
        change
    ));
    for delta in &report.increasing {
        lines.push(format!(
            "'{}' is increasing: {} mentions ({} -> {}).",
            delta.key,
            format_signed(delta.change),
            delta.first_half_count,
            delta.second_half_count
        ));
    }
    for delta in &report.decreasing {
        lines.push(format!(
            "'{}' is decreasing: {} mentions ({} -> {}).",
            delta.key,
            format_signed(delta.change),
            delta.first_half_count,
            delta.second_half_count
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::resolve_all;
    use crate::types::ReviewRecord;
    use pretty_assertions::assert_eq;

    fn dated(meta: &str, date: &str) -> ReviewRecord {
        ReviewRecord {
            store_name: "A".to_string(),
            remark: "text".to_string(),
            cluster_label: format!("{meta} cluster"),
            meta_label: meta.to_string(),
            date_raw: date.to_string(),
            ..Default::default()
        }
    }

    fn derive(rows: &[(&str, &str)]) -> Vec<DerivedRecord> {
        let records: Vec<ReviewRecord> = rows.iter().map(|(m, d)| dated(m, d)).collect();
        resolve_all(&records, PeriodGranularity::Monthly)
    }

    #[test]
    fn single_bucket_is_neutral() {
        let records = derive(&[("Quality", "01/05/24"), ("Speed", "09/05/24")]);
        let report = trend_deltas(&records, |r| r.record.meta_label.as_str(), PeriodGranularity::Monthly);
        assert_eq!(report.overall_direction, TrendDirection::Neutral);
        assert!(report.increasing.is_empty());
        assert!(report.decreasing.is_empty());
        assert!(report.is_degenerate());
        assert_eq!(insight_lines(&report).len(), 1);
    }

    #[test]
    fn splits_records_at_the_midpoint_date() {
        // Six dated records; the midpoint record (index 3) is dated 01/02/24,
        // so everything up to and including that day is the first half.
        let records = derive(&[
            ("Quality", "05/01/24"),
            ("Quality", "10/01/24"),
            ("Speed", "20/01/24"),
            ("Speed", "01/02/24"),
            ("Speed", "10/03/24"),
            ("Speed", "12/03/24"),
            ("Quality", "not a date"),
        ]);
        let report = trend_deltas(&records, |r| r.record.meta_label.as_str(), PeriodGranularity::Monthly);
        assert_eq!(
            report.decreasing,
            vec![TrendDelta {
                key: "Quality".to_string(),
                first_half_count: 2,
                second_half_count: 0,
                change: -2,
            }]
        );
        assert!(report.increasing.is_empty());
    }

    #[test]
    fn overall_direction_compares_bucket_means() {
        // Buckets: Jan=1, Feb=1, Mar=4 -> first half [1], second half [1, 4].
        // The per-record split lands on 02/03, so no key is rising even
        // though volume is.
        let records = derive(&[
            ("Quality", "05/01/24"),
            ("Quality", "05/02/24"),
            ("Speed", "01/03/24"),
            ("Speed", "02/03/24"),
            ("Speed", "03/03/24"),
            ("Speed", "04/03/24"),
        ]);
        let report = trend_deltas(&records, |r| r.record.meta_label.as_str(), PeriodGranularity::Monthly);
        assert_eq!(report.buckets, 3);
        assert_eq!(report.overall_direction, TrendDirection::Increasing);
        assert_eq!(report.first_half_average, 1.0);
        assert_eq!(report.second_half_average, 2.5);
        assert_eq!(report.overall_change_pct, Some(150.0));
        assert!(report.increasing.is_empty());
        assert_eq!(report.decreasing[0].key, "Quality");
        assert_eq!(report.decreasing[0].change, -2);
    }

    #[test]
    fn movers_are_capped_and_ordered() {
        let mut rows: Vec<(&str, &str)> = vec![
            ("A", "01/01/24"),
            ("B", "01/01/24"),
            ("C", "01/01/24"),
            ("D", "01/01/24"),
            ("E", "01/01/24"),
        ];
        rows.extend(std::iter::repeat(("F", "01/01/24")).take(8));
        for (key, times) in [("A", 4), ("B", 3), ("C", 3), ("D", 2)] {
            rows.extend(std::iter::repeat((key, "15/06/24")).take(times));
        }
        let records = derive(&rows);
        let report = trend_deltas(&records, |r| r.record.meta_label.as_str(), PeriodGranularity::Monthly);
        let rising: Vec<(&str, i64)> = report.increasing.iter().map(|d| (d.key.as_str(), d.change)).collect();
        let falling: Vec<(&str, i64)> = report.decreasing.iter().map(|d| (d.key.as_str(), d.change)).collect();
        assert_eq!(rising, vec![("A", 3), ("B", 2), ("C", 2)]);
        assert_eq!(falling, vec![("F", -8), ("E", -1)]);

        let lines = insight_lines(&report);
        assert!(lines[0].starts_with("Review volume is"));
        assert!(lines.iter().any(|l| l == "'A' is increasing: +3 mentions (1 -> 4)."));
    }
}
