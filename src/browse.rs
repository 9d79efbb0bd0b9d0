//! Sorting and pagination for the review browser.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{DashboardError, Result};
use crate::types::DerivedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Date,
    Region,
    Store,
    Subject,
    MetaCluster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortField::Date),
            "region" => Ok(SortField::Region),
            "store" => Ok(SortField::Store),
            "subject" => Ok(SortField::Subject),
            "meta" | "category" | "meta_cluster" => Ok(SortField::MetaCluster),
            other => Err(format!(
                "unknown sort field '{other}' (expected date, region, store, subject or meta)"
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::Date => "date",
            SortField::Region => "region",
            SortField::Store => "store",
            SortField::Subject => "subject",
            SortField::MetaCluster => "meta",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            field: SortField::Date,
            order: SortOrder::Descending,
        }
    }
}

impl SortSpec {
    /// Clicking the active column flips its order; a new column starts
    /// descending.
    pub fn toggle(self, field: SortField) -> Self {
        if field == self.field {
            SortSpec {
                field,
                order: self.order.flipped(),
            }
        } else {
            SortSpec {
                field,
                order: SortOrder::Descending,
            }
        }
    }
}

fn compare(a: &DerivedRecord, b: &DerivedRecord, field: SortField) -> Ordering {
    match field {
        // `None < Some`, so undated reviews lead in ascending order.
        SortField::Date => a.parsed_date.cmp(&b.parsed_date),
        SortField::Region => a.record.region.cmp(&b.record.region),
        SortField::Store => a.record.store_name.cmp(&b.record.store_name),
        SortField::Subject => a.record.subject.cmp(&b.record.subject),
        SortField::MetaCluster => a.record.meta_label.cmp(&b.record.meta_label),
    }
}

/// Stable sort: equal keys keep their input order in either direction.
/// Undated reviews rank below every date, so they lead an ascending date
/// sort and trail a descending one.
pub fn sort_records(records: &[DerivedRecord], field: SortField, order: SortOrder) -> Vec<DerivedRecord> {
    let mut sorted = records.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort_by(|a, b| compare(a, b, field)),
        SortOrder::Descending => sorted.sort_by(|a, b| compare(b, a, field)),
    }
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_records: usize,
}

/// Slice out 1-based page `page_number`. Pages past the end come back
/// empty; a zero page size or page number is a caller bug.
pub fn paginate<T: Clone>(records: &[T], page_size: usize, page_number: usize) -> Result<Page<T>> {
    if page_size == 0 {
        return Err(DashboardError::InvalidPageSize);
    }
    if page_number == 0 {
        return Err(DashboardError::InvalidPageNumber(page_number));
    }
    let total_pages = records.len().div_ceil(page_size);
    let start = (page_number - 1).saturating_mul(page_size).min(records.len());
    let end = start.saturating_add(page_size).min(records.len());
    Ok(Page {
        records: records[start..end].to_vec(),
        page_number,
        page_size,
        total_pages,
        total_records: records.len(),
    })
}
