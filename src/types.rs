use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabled::Tabled;

/// Source columns the validator knows about, across both schema variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    SequenceNumber,
    StoreName,
    Region,
    Date,
    Remark,
    Subject,
    Aggregator,
    Month,
    AreaManagerName,
    ClusterLabel,
    MetaLabel,
    City,
    Reviews,
}

// Keys are normalized headers: lowercase, alphanumerics only.
static HEADER_ALIASES: Lazy<HashMap<&'static str, Column>> = Lazy::new(|| {
    HashMap::from([
        ("sno", Column::SequenceNumber),
        ("serialno", Column::SequenceNumber),
        ("storename", Column::StoreName),
        ("region", Column::Region),
        ("date", Column::Date),
        ("remark", Column::Remark),
        ("remarks", Column::Remark),
        ("subject", Column::Subject),
        ("aggregator", Column::Aggregator),
        ("month", Column::Month),
        ("areamangername", Column::AreaManagerName),
        ("areamanagername", Column::AreaManagerName),
        ("llmclusterlabel", Column::ClusterLabel),
        ("llmmetalabel", Column::MetaLabel),
        ("city", Column::City),
        ("reviews", Column::Reviews),
    ])
});

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl Column {
    /// Resolve a header as it appears in the decoded file, ignoring casing,
    /// spacing and punctuation.
    pub fn from_header(header: &str) -> Option<Column> {
        HEADER_ALIASES.get(normalize_header(header).as_str()).copied()
    }
}

/// One decoded row keyed by recognised column. Unknown headers are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<Column, String>,
}

impl RawRow {
    pub fn from_pairs<I, H, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (H, V)>,
        H: AsRef<str>,
        V: Into<String>,
    {
        let mut cells = HashMap::new();
        for (header, value) in pairs {
            if let Some(column) = Column::from_header(header.as_ref()) {
                // First occurrence wins when a file repeats a header.
                cells.entry(column).or_insert_with(|| value.into());
            }
        }
        RawRow { cells }
    }

    pub fn get(&self, column: Column) -> Option<&str> {
        self.cells.get(&column).map(String::as_str)
    }

    pub fn has(&self, column: Column) -> bool {
        self.cells.contains_key(&column)
    }

    /// Trimmed cell text, empty when the column is absent.
    pub fn text(&self, column: Column) -> String {
        self.get(column).map(str::trim).unwrap_or_default().to_string()
    }
}

/// A row resolved to one of the two known source layouts.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRow {
    Extended {
        sequence_number: i64,
        store_name: String,
        region: String,
        date_raw: String,
        remark: String,
        subject: String,
        aggregator: String,
        month: String,
        area_manager_name: String,
        cluster_label: String,
        meta_label: String,
    },
    Minimal {
        city: String,
        reviews: String,
        cluster_label: String,
        meta_label: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    Extended,
    Minimal,
}

impl SourceRow {
    pub fn variant(&self) -> SchemaVariant {
        match self {
            SourceRow::Extended { .. } => SchemaVariant::Extended,
            SourceRow::Minimal { .. } => SchemaVariant::Minimal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub sequence_number: i64,
    pub store_name: String,
    pub region: String,
    pub date_raw: String,
    pub remark: String,
    pub subject: String,
    pub aggregator: String,
    pub month: String,
    pub area_manager_name: String,
    pub cluster_label: String,
    pub meta_label: String,
}

impl AsRef<ReviewRecord> for ReviewRecord {
    fn as_ref(&self) -> &ReviewRecord {
        self
    }
}

/// A review plus the temporal fields computed for the active period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    #[serde(flatten)]
    pub record: ReviewRecord,
    pub parsed_date: Option<NaiveDate>,
    pub fiscal_year: String,
    pub period_key: String,
    pub period_start: Option<NaiveDate>,
}

impl AsRef<ReviewRecord> for DerivedRecord {
    fn as_ref(&self) -> &ReviewRecord {
        &self.record
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateBucket {
    pub key: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendDelta {
    pub key: String,
    pub first_half_count: usize,
    pub second_half_count: usize,
    pub change: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    pub period_key: String,
    pub period_start: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTabGroup {
    pub outer: String,
    pub total: usize,
    pub inner: Vec<AggregateBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_reviews: usize,
    pub dated_reviews: usize,
    pub distinct_stores: usize,
    pub distinct_regions: usize,
    pub distinct_clusters: usize,
    pub distinct_meta_clusters: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

// Rendered rows for console previews and CSV exports.

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BucketRow {
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: String,
    #[serde(rename = "Percentage")]
    #[tabled(rename = "Percentage")]
    pub percentage: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SeriesRow {
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CrossTabRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub outer: String,
    #[serde(rename = "GroupTotal")]
    #[tabled(rename = "GroupTotal")]
    pub total: usize,
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "ShareOfGroup")]
    #[tabled(rename = "ShareOfGroup")]
    pub percentage: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DeltaRow {
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "FirstHalf")]
    #[tabled(rename = "FirstHalf")]
    pub first_half: usize,
    #[serde(rename = "SecondHalf")]
    #[tabled(rename = "SecondHalf")]
    pub second_half: usize,
    #[serde(rename = "Change")]
    #[tabled(rename = "Change")]
    pub change: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ReviewRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "FiscalYear")]
    #[tabled(rename = "FiscalYear")]
    pub fiscal_year: String,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Store")]
    #[tabled(rename = "Store")]
    pub store: String,
    #[serde(rename = "Subject")]
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub meta_label: String,
    #[serde(rename = "Cluster")]
    #[tabled(rename = "Cluster")]
    pub cluster_label: String,
    #[serde(rename = "Remark")]
    #[tabled(rename = "Remark")]
    pub remark: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OptionRow {
    #[serde(rename = "Filter")]
    #[tabled(rename = "Filter")]
    pub dimension: String,
    #[serde(rename = "Selected")]
    #[tabled(rename = "Selected")]
    pub selected: String,
    #[serde(rename = "Choices")]
    #[tabled(rename = "Choices")]
    pub choices: usize,
    #[serde(rename = "Values")]
    #[tabled(rename = "Values")]
    pub values: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct UploadRow {
    #[serde(rename = "JobId")]
    #[tabled(rename = "JobId")]
    pub job_id: String,
    #[serde(rename = "File")]
    #[tabled(rename = "File")]
    pub file: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "UploadedAt")]
    #[tabled(rename = "UploadedAt")]
    pub uploaded_at: String,
    #[serde(rename = "ProcessedFile")]
    #[tabled(rename = "ProcessedFile")]
    pub processed_file: String,
}
