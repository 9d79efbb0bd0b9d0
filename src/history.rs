//! Upload history as recorded by the browser's local store.
//!
//! The store itself lives outside this crate. This module reads and writes its
//! JSON shape and applies job status updates as they arrive from polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::Result;
use crate::types::UploadRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEntry {
    pub job_id: String,
    pub original_filename: String,
    pub status: JobStatus,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadHistory {
    entries: Vec<UploadEntry>,
}

impl UploadHistory {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn entries(&self) -> &[UploadEntry] {
        &self.entries
    }

    pub fn get(&self, job_id: &str) -> Option<&UploadEntry> {
        self.entries.iter().find(|e| e.job_id == job_id)
    }

    /// Newest upload first. Re-recording a job id replaces the old entry.
    pub fn record_upload(&mut self, job_id: impl Into<String>, original_filename: impl Into<String>, uploaded_at: DateTime<Utc>) {
        let job_id = job_id.into();
        self.entries.retain(|e| e.job_id != job_id);
        self.entries.insert(
            0,
            UploadEntry {
                job_id,
                original_filename: original_filename.into(),
                status: JobStatus::Processing,
                uploaded_at,
                processed_file: None,
            },
        );
    }

    /// Apply a polled status. Results are applied as they arrive, whatever the
    /// current status; a job id we never recorded is ignored.
    pub fn apply_status(&mut self, job_id: &str, status: JobStatus, processed_file: Option<String>) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.job_id == job_id) else {
            warn!(job_id, "status update for unknown upload job");
            return false;
        };
        entry.status = status;
        if processed_file.is_some() {
            entry.processed_file = processed_file;
        }
        true
    }

    /// Jobs the poller still needs to ask about.
    pub fn outstanding(&self) -> Vec<&UploadEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == JobStatus::Processing)
            .collect()
    }

    pub fn rows(&self) -> Vec<UploadRow> {
        self.entries
            .iter()
            .map(|e| UploadRow {
                job_id: e.job_id.clone(),
                file: e.original_filename.clone(),
                status: e.status.to_string(),
                uploaded_at: e.uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
                processed_file: e.processed_file.clone().unwrap_or_else(|| "-".to_string()),
            })
            .collect()
    }
}
