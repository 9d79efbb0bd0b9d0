//! One-shot derivation of every dashboard view from the loaded reviews and
//! the current `ViewState`.

use serde::Serialize;
use tracing::debug;

use crate::aggregate::{cross_tab, group_count, summarize, time_series, top_n};
use crate::browse::{paginate, sort_records, Page, SortField, SortSpec};
use crate::error::Result;
use crate::filter::{apply_filters, cascading_options, FilterDimension, FilterOptions, FilterState, SearchScope, Selection};
use crate::period::{resolve_all, PeriodGranularity};
use crate::trend::{trend_deltas, TrendReport};
use crate::types::{AggregateBucket, CrossTabGroup, DatasetSummary, DerivedRecord, ReviewRecord, TimeSeriesPoint};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Everything the user has selected. Changing filters, search or sort sends
/// the browser back to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub filters: FilterState,
    pub sort: SortSpec,
    pub granularity: PeriodGranularity,
    pub page_number: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            filters: FilterState::default(),
            sort: SortSpec::default(),
            granularity: PeriodGranularity::default(),
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn select(mut self, dimension: FilterDimension, selection: Selection) -> Self {
        self.filters = self.filters.select(dimension, selection);
        self.page_number = 1;
        self
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.filters = filters;
        self.page_number = 1;
        self
    }

    pub fn search(mut self, term: impl Into<String>, scope: SearchScope) -> Self {
        self.filters = self.filters.with_search(term, scope);
        self.page_number = 1;
        self
    }

    pub fn toggle_sort(mut self, field: SortField) -> Self {
        self.sort = self.sort.toggle(field);
        self.page_number = 1;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self.page_number = 1;
        self
    }

    pub fn with_granularity(mut self, granularity: PeriodGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_page(mut self, page_number: usize, page_size: usize) -> Self {
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdowns {
    pub by_meta_cluster: Vec<AggregateBucket>,
    pub by_cluster: Vec<AggregateBucket>,
    pub by_region: Vec<AggregateBucket>,
    pub by_store: Vec<AggregateBucket>,
    pub by_subject: Vec<AggregateBucket>,
    pub by_aggregator: Vec<AggregateBucket>,
    pub by_fiscal_year: Vec<AggregateBucket>,
}

impl Breakdowns {
    fn compute(records: &[DerivedRecord]) -> Self {
        let dated: Vec<&DerivedRecord> = records.iter().filter(|r| r.parsed_date.is_some()).collect();
        Breakdowns {
            by_meta_cluster: group_count(records, |r| r.record.meta_label.as_str()),
            by_cluster: group_count(records, |r| r.record.cluster_label.as_str()),
            by_region: group_count(records, |r| r.record.region.as_str()),
            by_store: group_count(records, |r| r.record.store_name.as_str()),
            by_subject: group_count(records, |r| r.record.subject.as_str()),
            by_aggregator: group_count(records, |r| r.record.aggregator.as_str()),
            by_fiscal_year: group_count(&dated, |r| r.fiscal_year.as_str()),
        }
    }

    /// Keep only the first `n` buckets of every table.
    pub fn truncated(&self, n: usize) -> Self {
        Breakdowns {
            by_meta_cluster: top_n(&self.by_meta_cluster, n),
            by_cluster: top_n(&self.by_cluster, n),
            by_region: top_n(&self.by_region, n),
            by_store: top_n(&self.by_store, n),
            by_subject: top_n(&self.by_subject, n),
            by_aggregator: top_n(&self.by_aggregator, n),
            by_fiscal_year: top_n(&self.by_fiscal_year, n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub dataset_size: usize,
    pub summary: DatasetSummary,
    pub options: FilterOptions,
    pub breakdowns: Breakdowns,
    pub time_series: Vec<TimeSeriesPoint>,
    pub meta_by_subject: Vec<CrossTabGroup>,
    pub meta_by_cluster: Vec<CrossTabGroup>,
    pub trends: TrendReport,
    pub page: Page<DerivedRecord>,
}

impl DashboardSnapshot {
    pub fn compute(records: &[ReviewRecord], view: &ViewState) -> Result<Self> {
        let derived = resolve_all(records, view.granularity);
        let options = cascading_options(&derived, &view.filters);
        let filtered = apply_filters(&derived, &view.filters);
        debug!(
            total = derived.len(),
            filtered = filtered.len(),
            granularity = %view.granularity,
            "recomputed dashboard"
        );

        let sorted = sort_records(&filtered, view.sort.field, view.sort.order);
        let page = paginate(&sorted, view.page_size, view.page_number)?;

        Ok(DashboardSnapshot {
            dataset_size: derived.len(),
            summary: summarize(&filtered),
            options,
            breakdowns: Breakdowns::compute(&filtered),
            time_series: time_series(&filtered, view.granularity),
            meta_by_subject: cross_tab(&filtered, |r| r.record.meta_label.as_str(), |r| r.record.subject.as_str()),
            meta_by_cluster: cross_tab(&filtered, |r| r.record.meta_label.as_str(), |r| {
                r.record.cluster_label.as_str()
            }),
            trends: trend_deltas(&filtered, |r| r.record.meta_label.as_str(), view.granularity),
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn review(store: &str, region: &str, meta: &str, date: &str) -> ReviewRecord {
        ReviewRecord {
            store_name: store.to_string(),
            region: region.to_string(),
            meta_label: meta.to_string(),
            cluster_label: format!("{meta} cluster"),
            subject: "Food".to_string(),
            remark: format!("{meta} complaint at {store}"),
            date_raw: date.to_string(),
            ..Default::default()
        }
    }

    fn dataset() -> Vec<ReviewRecord> {
        vec![
            review("A", "North", "Quality", "01/03/24"),
            review("A", "North", "Speed", "15/04/24"),
            review("B", "South", "Quality", "02/05/24"),
            review("C", "South", "Speed", "bad date"),
        ]
    }

    #[test]
    fn view_changes_reset_the_page() {
        let view = ViewState::default().with_page(4, 10);
        assert_eq!(view.clone().toggle_sort(SortField::Store).page_number, 1);
        assert_eq!(view.clone().search("cold", SearchScope::Remark).page_number, 1);
        assert_eq!(
            view.clone()
                .select(FilterDimension::Region, Selection::parse("North"))
                .page_number,
            1
        );
        assert_eq!(view.with_granularity(PeriodGranularity::Weekly).page_number, 4);
    }

    #[test]
    fn snapshot_reflects_filters() {
        let view = ViewState::default().select(FilterDimension::Region, Selection::parse("South"));
        let snapshot = DashboardSnapshot::compute(&dataset(), &view).unwrap();
        assert_eq!(snapshot.dataset_size, 4);
        assert_eq!(snapshot.summary.total_reviews, 2);
        assert_eq!(snapshot.options.get(FilterDimension::Store), ["B", "C"]);
        assert_eq!(snapshot.time_series.len(), 1);
        assert_eq!(snapshot.page.total_records, 2);
        // Newest first; the undated review sorts last when descending.
        assert_eq!(snapshot.page.records[0].record.store_name, "B");
        assert!(snapshot.trends.is_degenerate());
    }

    #[test]
    fn fiscal_year_breakdown_skips_undated_reviews() {
        let snapshot = DashboardSnapshot::compute(&dataset(), &ViewState::default()).unwrap();
        let years: Vec<(&str, usize)> = snapshot
            .breakdowns
            .by_fiscal_year
            .iter()
            .map(|b| (b.key.as_str(), b.count))
            .collect();
        assert_eq!(years, vec![("FY2024-25", 2), ("FY2023-24", 1)]);
        assert_eq!(snapshot.breakdowns.truncated(1).by_fiscal_year.len(), 1);
    }

    #[test]
    fn invalid_page_size_surfaces_as_error() {
        let view = ViewState::default().with_page(1, 0);
        assert!(DashboardSnapshot::compute(&dataset(), &view).is_err());
    }
}
