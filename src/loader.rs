use crate::error::{DashboardError, Result};
use crate::period::parse_day_first;
use crate::types::{Column, RawRow, ReviewRecord, SchemaVariant, SourceRow};
use crate::util::parse_ordinal;
use csv::ReaderBuilder;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub admitted_rows: usize,
    pub rejected_rows: usize,
    pub undated_rows: usize,
    pub extended_rows: usize,
    pub minimal_rows: usize,
}

impl LoadReport {
    fn tally(&mut self, row: &RawRow) -> Option<ReviewRecord> {
        self.total_rows += 1;
        let source = classify(row);
        let Some(record) = admit_source(source) else {
            self.rejected_rows += 1;
            return None;
        };
        self.admitted_rows += 1;
        match classify_variant(row) {
            SchemaVariant::Extended => self.extended_rows += 1,
            SchemaVariant::Minimal => self.minimal_rows += 1,
        }
        if parse_day_first(&record.date_raw).is_none() {
            self.undated_rows += 1;
        }
        Some(record)
    }
}

fn classify_variant(row: &RawRow) -> SchemaVariant {
    let extended = row.has(Column::StoreName) || row.has(Column::Remark);
    let minimal = row.has(Column::City) || row.has(Column::Reviews);
    if minimal && !extended {
        SchemaVariant::Minimal
    } else {
        SchemaVariant::Extended
    }
}

/// Resolve a decoded row into one of the two known layouts. Missing columns
/// become empty strings (or 0 for the ordinal).
pub fn classify(row: &RawRow) -> SourceRow {
    match classify_variant(row) {
        SchemaVariant::Minimal => SourceRow::Minimal {
            city: row.text(Column::City),
            reviews: row.text(Column::Reviews),
            cluster_label: row.text(Column::ClusterLabel),
            meta_label: row.text(Column::MetaLabel),
        },
        SchemaVariant::Extended => SourceRow::Extended {
            sequence_number: parse_ordinal(row.get(Column::SequenceNumber)),
            store_name: row.text(Column::StoreName),
            region: row.text(Column::Region),
            date_raw: row.text(Column::Date),
            remark: row.text(Column::Remark),
            subject: row.text(Column::Subject),
            aggregator: row.text(Column::Aggregator),
            month: row.text(Column::Month),
            area_manager_name: row.text(Column::AreaManagerName),
            cluster_label: row.text(Column::ClusterLabel),
            meta_label: row.text(Column::MetaLabel),
        },
    }
}

fn admit_source(source: SourceRow) -> Option<ReviewRecord> {
    let record = match source {
        SourceRow::Extended {
            sequence_number,
            store_name,
            region,
            date_raw,
            remark,
            subject,
            aggregator,
            month,
            area_manager_name,
            cluster_label,
            meta_label,
        } => ReviewRecord {
            sequence_number,
            store_name,
            region,
            date_raw,
            remark,
            subject,
            aggregator,
            month,
            area_manager_name,
            cluster_label,
            meta_label,
        },
        // City is the only location the minimal layout carries, so it
        // stands in for both the region and the store.
        SourceRow::Minimal {
            city,
            reviews,
            cluster_label,
            meta_label,
        } => ReviewRecord {
            store_name: city.clone(),
            region: city,
            remark: reviews,
            cluster_label,
            meta_label,
            ..Default::default()
        },
    };
    let complete = !record.store_name.is_empty()
        && !record.remark.is_empty()
        && !record.cluster_label.is_empty();
    complete.then_some(record)
}

/// Admit a single decoded row, or `None` when store, remark or cluster label
/// is blank.
pub fn admit(row: &RawRow) -> Option<ReviewRecord> {
    admit_source(classify(row))
}

pub fn admit_all<'a, I>(rows: I) -> (Vec<ReviewRecord>, LoadReport)
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let mut report = LoadReport::default();
    let records: Vec<ReviewRecord> = rows.into_iter().filter_map(|r| report.tally(r)).collect();
    if report.rejected_rows > 0 {
        debug!(
            rejected = report.rejected_rows,
            "dropped rows missing store name, remark or cluster label"
        );
    }
    (records, report)
}

/// Decode CSV text with a header row. Short or long rows are tolerated, and
/// bytes that are not valid UTF-8 (Windows-1252 exports) become U+FFFD.
pub fn rows_from_csv<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        rows.push(RawRow::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h, String::from_utf8_lossy(v).into_owned())),
        ));
    }
    Ok(rows)
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode a JSON array of header-keyed row objects. Non-object elements are
/// skipped as empty rows; a non-array document is rejected.
pub fn rows_from_json(text: &str) -> Result<Vec<RawRow>> {
    let doc: Value = serde_json::from_str(text)?;
    let Value::Array(items) = doc else {
        return Err(DashboardError::NotAnArray(describe(&doc).to_string()));
    };
    Ok(items
        .iter()
        .map(|item| match item {
            Value::Object(map) => RawRow::from_pairs(
                map.iter()
                    .filter_map(|(k, v)| cell_text(v).map(|text| (k.as_str(), text))),
            ),
            _ => RawRow::default(),
        })
        .collect())
}

/// Load a decoded data file (`.csv` or `.json`) and admit its rows.
pub fn load_rows(path: &Path) -> Result<(Vec<ReviewRecord>, LoadReport)> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let rows = match extension.as_deref() {
        Some("csv") => rows_from_csv(std::fs::File::open(path)?)?,
        Some("json") => rows_from_json(&std::fs::read_to_string(path)?)?,
        _ => return Err(DashboardError::UnsupportedFormat(path.display().to_string())),
    };
    let (records, report) = admit_all(&rows);
    info!(
        path = %path.display(),
        total = report.total_rows,
        admitted = report.admitted_rows,
        rejected = report.rejected_rows,
        "loaded feedback rows"
    );
    Ok((records, report))
}
