use crate::period::PeriodGranularity;
use crate::types::{AggregateBucket, CrossTabGroup, DatasetSummary, DerivedRecord, TimeSeriesPoint};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

fn by_count_then_key(a: &AggregateBucket, b: &AggregateBucket) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key))
}

/// Tally keys into buckets. Percentages are against the number of keys
/// seen and are left unrounded.
pub fn buckets_from_keys<I, S>(keys: I) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;
    for key in keys {
        total += 1;
        *counts.entry(key.as_ref().to_string()).or_default() += 1;
    }
    let mut buckets: Vec<AggregateBucket> = counts
        .into_iter()
        .map(|(key, count)| AggregateBucket {
            key,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            },
        })
        .collect();
    buckets.sort_by(by_count_then_key);
    buckets
}

/// Frequency table over `key_fn`, descending by count with ties broken by
/// ascending key.
pub fn group_count<'a, T, K, F>(records: &'a [T], key_fn: F) -> Vec<AggregateBucket>
where
    F: Fn(&'a T) -> K,
    K: AsRef<str>,
{
    buckets_from_keys(records.iter().map(key_fn))
}

/// First `n` buckets, in the order given.
pub fn top_n(buckets: &[AggregateBucket], n: usize) -> Vec<AggregateBucket> {
    buckets.iter().take(n).cloned().collect()
}

pub fn sort_alphabetical(mut buckets: Vec<AggregateBucket>) -> Vec<AggregateBucket> {
    buckets.sort_by(|a, b| a.key.cmp(&b.key));
    buckets
}

/// Counts per period bucket, oldest first. Undated records are skipped.
pub fn time_series(records: &[DerivedRecord], granularity: PeriodGranularity) -> Vec<TimeSeriesPoint> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in records.iter().filter_map(|r| r.parsed_date) {
        *counts.entry(granularity.bucket_start(date)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(start, count)| TimeSeriesPoint {
            period_key: granularity.label(start),
            period_start: start,
            count,
        })
        .collect()
}

/// Two-level breakdown. Inner percentages are relative to each outer
/// group's own total.
pub fn cross_tab<'a, T, KO, KI, FO, FI>(records: &'a [T], outer_fn: FO, inner_fn: FI) -> Vec<CrossTabGroup>
where
    FO: Fn(&'a T) -> KO,
    FI: Fn(&'a T) -> KI,
    KO: AsRef<str>,
    KI: AsRef<str>,
{
    let mut groups: HashMap<String, Vec<KI>> = HashMap::new();
    for record in records {
        groups
            .entry(outer_fn(record).as_ref().to_string())
            .or_default()
            .push(inner_fn(record));
    }
    let mut rows: Vec<CrossTabGroup> = groups
        .into_iter()
        .map(|(outer, inner_keys)| CrossTabGroup {
            outer,
            total: inner_keys.len(),
            inner: buckets_from_keys(inner_keys),
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.outer.cmp(&b.outer)));
    rows
}

fn distinct_count<'a, F>(records: &'a [DerivedRecord], field: F) -> usize
where
    F: Fn(&'a DerivedRecord) -> &'a str,
{
    records
        .iter()
        .map(field)
        .filter(|v| !v.is_empty())
        .collect::<HashSet<&str>>()
        .len()
}

pub fn summarize(records: &[DerivedRecord]) -> DatasetSummary {
    let dates: Vec<NaiveDate> = records.iter().filter_map(|r| r.parsed_date).collect();
    DatasetSummary {
        total_reviews: records.len(),
        dated_reviews: dates.len(),
        distinct_stores: distinct_count(records, |r| r.record.store_name.as_str()),
        distinct_regions: distinct_count(records, |r| r.record.region.as_str()),
        distinct_clusters: distinct_count(records, |r| r.record.cluster_label.as_str()),
        distinct_meta_clusters: distinct_count(records, |r| r.record.meta_label.as_str()),
        first_date: dates.iter().min().copied(),
        last_date: dates.iter().max().copied(),
    }
}
