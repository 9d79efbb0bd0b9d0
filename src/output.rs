use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::error::Result;
use crate::filter::{FilterOptions, FilterState};
use crate::types::{
    AggregateBucket, BucketRow, CrossTabGroup, CrossTabRow, DeltaRow, DerivedRecord, OptionRow, ReviewRow,
    SeriesRow, TimeSeriesPoint, TrendDelta,
};
use crate::util::{format_int, format_percentage, format_signed, truncate_text};

const REMARK_PREVIEW_CHARS: usize = 60;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

fn display_key(key: &str) -> String {
    if key.is_empty() {
        "(blank)".to_string()
    } else {
        key.to_string()
    }
}

pub fn bucket_rows(buckets: &[AggregateBucket]) -> Vec<BucketRow> {
    buckets
        .iter()
        .map(|b| BucketRow {
            key: display_key(&b.key),
            count: format_int(b.count),
            percentage: format_percentage(b.percentage),
        })
        .collect()
}

pub fn series_rows(points: &[TimeSeriesPoint]) -> Vec<SeriesRow> {
    points
        .iter()
        .map(|p| SeriesRow {
            period: p.period_key.clone(),
            count: p.count,
        })
        .collect()
}

pub fn cross_tab_rows(groups: &[CrossTabGroup]) -> Vec<CrossTabRow> {
    groups
        .iter()
        .flat_map(|g| {
            g.inner.iter().map(move |b| CrossTabRow {
                outer: display_key(&g.outer),
                total: g.total,
                key: display_key(&b.key),
                count: b.count,
                percentage: format_percentage(b.percentage),
            })
        })
        .collect()
}

pub fn delta_rows(deltas: &[TrendDelta]) -> Vec<DeltaRow> {
    deltas
        .iter()
        .map(|d| DeltaRow {
            key: display_key(&d.key),
            first_half: d.first_half_count,
            second_half: d.second_half_count,
            change: format_signed(d.change),
        })
        .collect()
}

pub fn review_rows(records: &[DerivedRecord]) -> Vec<ReviewRow> {
    records
        .iter()
        .map(|r| ReviewRow {
            date: r
                .parsed_date
                .map(|d| d.format("%d %b %Y").to_string())
                .unwrap_or_else(|| r.record.date_raw.clone()),
            fiscal_year: r.fiscal_year.clone(),
            region: r.record.region.clone(),
            store: r.record.store_name.clone(),
            subject: r.record.subject.clone(),
            meta_label: r.record.meta_label.clone(),
            cluster_label: r.record.cluster_label.clone(),
            remark: truncate_text(&r.record.remark, REMARK_PREVIEW_CHARS),
        })
        .collect()
}

pub fn option_rows(options: &FilterOptions, state: &FilterState) -> Vec<OptionRow> {
    options
        .dimensions
        .iter()
        .map(|(dimension, values)| OptionRow {
            dimension: dimension.to_string(),
            selected: state.selection(*dimension).to_string(),
            choices: values.len(),
            values: truncate_text(&values.join(", "), 80),
        })
        .collect()
}
