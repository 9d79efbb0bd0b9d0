//! Cascading equality filters plus free-text search.
//!
//! The six dimensions form a fixed cascade. Options offered for a dimension
//! come only from records that satisfy every selection upstream of it, so
//! dropdowns narrow as the user works left to right.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::ReviewRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDimension {
    Region,
    AreaManager,
    Store,
    Aggregator,
    MetaCluster,
    Subject,
}

impl FilterDimension {
    pub const CASCADE: [FilterDimension; 6] = [
        FilterDimension::Region,
        FilterDimension::AreaManager,
        FilterDimension::Store,
        FilterDimension::Aggregator,
        FilterDimension::MetaCluster,
        FilterDimension::Subject,
    ];

    pub fn position(self) -> usize {
        // CASCADE lists every variant exactly once.
        Self::CASCADE.iter().position(|d| *d == self).unwrap_or(0)
    }

    pub fn value<'a>(self, record: &'a ReviewRecord) -> &'a str {
        match self {
            FilterDimension::Region => &record.region,
            FilterDimension::AreaManager => &record.area_manager_name,
            FilterDimension::Store => &record.store_name,
            FilterDimension::Aggregator => &record.aggregator,
            FilterDimension::MetaCluster => &record.meta_label,
            FilterDimension::Subject => &record.subject,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterDimension::Region => "Region",
            FilterDimension::AreaManager => "Area Manager",
            FilterDimension::Store => "Store",
            FilterDimension::Aggregator => "Aggregator",
            FilterDimension::MetaCluster => "Category",
            FilterDimension::Subject => "Subject",
        }
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// The `"all"` sentinel and blank input both mean no restriction. Other
    /// spellings such as `"ALL"` are ordinary values.
    pub fn parse(input: &str) -> Selection {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "all" {
            Selection::All
        } else {
            Selection::Only(trimmed.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Only(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    Remark,
    RemarkAndLabels,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub region: Selection,
    pub area_manager: Selection,
    pub store: Selection,
    pub aggregator: Selection,
    pub meta_cluster: Selection,
    pub subject: Selection,
    pub search_term: String,
    pub search_scope: SearchScope,
}

impl FilterState {
    pub fn selection(&self, dimension: FilterDimension) -> &Selection {
        match dimension {
            FilterDimension::Region => &self.region,
            FilterDimension::AreaManager => &self.area_manager,
            FilterDimension::Store => &self.store,
            FilterDimension::Aggregator => &self.aggregator,
            FilterDimension::MetaCluster => &self.meta_cluster,
            FilterDimension::Subject => &self.subject,
        }
    }

    fn selection_mut(&mut self, dimension: FilterDimension) -> &mut Selection {
        match dimension {
            FilterDimension::Region => &mut self.region,
            FilterDimension::AreaManager => &mut self.area_manager,
            FilterDimension::Store => &mut self.store,
            FilterDimension::Aggregator => &mut self.aggregator,
            FilterDimension::MetaCluster => &mut self.meta_cluster,
            FilterDimension::Subject => &mut self.subject,
        }
    }

    /// Set one dimension, leaving the others untouched.
    pub fn with(mut self, dimension: FilterDimension, selection: Selection) -> Self {
        *self.selection_mut(dimension) = selection;
        self
    }

    /// Set one dimension and reset every dimension after it to `All`, the
    /// way a dropdown row re-opens once an upstream choice changes.
    pub fn select(self, dimension: FilterDimension, selection: Selection) -> Self {
        self.with(dimension, selection).reset_downstream(dimension)
    }

    pub fn reset_downstream(mut self, dimension: FilterDimension) -> Self {
        for later in &FilterDimension::CASCADE[dimension.position() + 1..] {
            *self.selection_mut(*later) = Selection::All;
        }
        self
    }

    pub fn with_search(mut self, term: impl Into<String>, scope: SearchScope) -> Self {
        self.search_term = term.into();
        self.search_scope = scope;
        self
    }

    fn search_needle(&self) -> Option<String> {
        let term = self.search_term.trim();
        (!term.is_empty()).then(|| term.to_lowercase())
    }

    /// Does `record` satisfy every dimension selection (search excluded)?
    pub fn matches_dimensions(&self, record: &ReviewRecord) -> bool {
        FilterDimension::CASCADE
            .iter()
            .all(|d| self.selection(*d).matches(d.value(record)))
    }
}

fn matches_search(record: &ReviewRecord, needle: &str, scope: SearchScope) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);
    match scope {
        SearchScope::Remark => hit(&record.remark),
        SearchScope::RemarkAndLabels => {
            hit(&record.remark) || hit(&record.cluster_label) || hit(&record.meta_label)
        }
    }
}

pub fn apply_filters<T>(records: &[T], state: &FilterState) -> Vec<T>
where
    T: AsRef<ReviewRecord> + Clone,
{
    let needle = state.search_needle();
    records
        .iter()
        .filter(|r| {
            let record: &ReviewRecord = (*r).as_ref();
            state.matches_dimensions(record)
                && needle
                    .as_deref()
                    .map_or(true, |n| matches_search(record, n, state.search_scope))
        })
        .cloned()
        .collect()
}

/// Valid choices per dimension, in cascade order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterOptions {
    pub dimensions: Vec<(FilterDimension, Vec<String>)>,
}

impl FilterOptions {
    pub fn get(&self, dimension: FilterDimension) -> &[String] {
        self.dimensions
            .iter()
            .find(|(d, _)| *d == dimension)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }
}

fn distinct_values<'a, I>(records: I, dimension: FilterDimension) -> Vec<String>
where
    I: IntoIterator<Item = &'a ReviewRecord>,
{
    records
        .into_iter()
        .map(|r| dimension.value(r))
        .filter(|v| !v.trim().is_empty())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Options for each dimension, computed as an ordered pipeline: list the
/// choices present in the current subset, then narrow the subset by that
/// dimension's selection before moving on. Search does not narrow options.
pub fn cascading_options<T>(records: &[T], state: &FilterState) -> FilterOptions
where
    T: AsRef<ReviewRecord>,
{
    let mut scope: Vec<&ReviewRecord> = records.iter().map(|r| r.as_ref()).collect();
    let mut dimensions = Vec::with_capacity(FilterDimension::CASCADE.len());
    for dimension in FilterDimension::CASCADE {
        dimensions.push((dimension, distinct_values(scope.iter().copied(), dimension)));
        let selection = state.selection(dimension);
        if !selection.is_all() {
            scope.retain(|r| selection.matches(dimension.value(r)));
        }
    }
    FilterOptions { dimensions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn review(region: &str, store: &str, meta: &str, remark: &str) -> ReviewRecord {
        ReviewRecord {
            region: region.to_string(),
            store_name: store.to_string(),
            meta_label: meta.to_string(),
            remark: remark.to_string(),
            cluster_label: format!("{meta} issue"),
            area_manager_name: format!("{region} lead"),
            ..Default::default()
        }
    }

    fn sample() -> Vec<ReviewRecord> {
        vec![
            review("North", "A", "Quality", "Fries were cold"),
            review("North", "B", "Speed", "Rider was late"),
            review("South", "C", "Quality", "Burger was soggy"),
            review("South", "D", "", "Great service"),
        ]
    }

    #[test]
    fn all_selections_keep_everything() {
        let records = sample();
        assert_eq!(apply_filters(&records, &FilterState::default()), records);
    }

    #[test]
    fn dimension_filters_combine_with_and() {
        let records = sample();
        let state = FilterState::default()
            .with(FilterDimension::Region, Selection::parse("South"))
            .with(FilterDimension::MetaCluster, Selection::parse("Quality"));
        let filtered = apply_filters(&records, &state);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].store_name, "C");
    }

    #[test]
    fn search_is_case_insensitive_and_scoped() {
        let records = sample();
        let remark_only = FilterState::default().with_search("COLD", SearchScope::Remark);
        assert_eq!(apply_filters(&records, &remark_only).len(), 1);

        let by_label = FilterState::default().with_search("speed", SearchScope::Remark);
        assert!(apply_filters(&records, &by_label).is_empty());
        let with_labels = by_label.with_search("speed", SearchScope::RemarkAndLabels);
        assert_eq!(apply_filters(&records, &with_labels).len(), 1);
    }

    #[test]
    fn blank_search_is_a_no_op() {
        let records = sample();
        let state = FilterState::default().with_search("   ", SearchScope::Remark);
        assert_eq!(apply_filters(&records, &state).len(), records.len());
    }

    #[test]
    fn store_options_follow_the_region() {
        let records = sample();
        let state = FilterState::default().select(FilterDimension::Region, Selection::parse("North"));
        let options = cascading_options(&records, &state);
        assert_eq!(options.get(FilterDimension::Store), ["A", "B"]);
        // Region itself is upstream of nothing, so it still lists everything.
        assert_eq!(options.get(FilterDimension::Region), ["North", "South"]);
    }

    #[test]
    fn downstream_selection_does_not_narrow_upstream_options() {
        let records = sample();
        let state = FilterState::default().with(FilterDimension::Store, Selection::parse("C"));
        let options = cascading_options(&records, &state);
        assert_eq!(options.get(FilterDimension::Region), ["North", "South"]);
        assert_eq!(options.get(FilterDimension::MetaCluster), ["Quality"]);
    }

    #[test]
    fn blank_values_are_not_offered() {
        let records = sample();
        let options = cascading_options(&records, &FilterState::default());
        assert_eq!(options.get(FilterDimension::MetaCluster), ["Quality", "Speed"]);
        assert!(options.get(FilterDimension::Subject).is_empty());
    }

    #[test]
    fn every_offered_option_selects_something() {
        let records = vec![
            review(" North ", "A", "Quality", "cold"),
            review("South", "B\t", "Speed", "late"),
        ];
        let options = cascading_options(&records, &FilterState::default());
        for dimension in [FilterDimension::Region, FilterDimension::Store] {
            for value in options.get(dimension) {
                let state = FilterState::default().with(dimension, Selection::Only(value.clone()));
                assert!(
                    !apply_filters(&records, &state).is_empty(),
                    "{dimension} option {value:?} matched nothing"
                );
            }
        }
    }

    #[test]
    fn unmatched_selection_empties_downstream_options() {
        let records = sample();
        let state = FilterState::default().with(FilterDimension::Region, Selection::parse("West"));
        let options = cascading_options(&records, &state);
        assert!(apply_filters(&records, &state).is_empty());
        for dimension in &FilterDimension::CASCADE[1..] {
            assert!(options.get(*dimension).is_empty());
        }
    }

    #[test]
    fn selecting_upstream_resets_downstream() {
        let state = FilterState::default()
            .with(FilterDimension::Store, Selection::parse("A"))
            .with(FilterDimension::Subject, Selection::parse("Food"))
            .select(FilterDimension::Region, Selection::parse("South"));
        assert_eq!(state.region, Selection::Only("South".to_string()));
        assert!(state.store.is_all());
        assert!(state.subject.is_all());
    }

    #[test]
    fn selection_parse_treats_all_as_unrestricted() {
        assert_eq!(Selection::parse("all"), Selection::All);
        assert_eq!(Selection::parse("ALL"), Selection::Only("ALL".to_string()));
        assert_eq!(Selection::parse(""), Selection::All);
        assert_eq!(Selection::parse(" North "), Selection::Only("North".to_string()));
    }
}
