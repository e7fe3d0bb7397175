//! Append-only CSV usage ledger.
//!
//! One row per processed (or failed) file. The header is written only when
//! the file is new or empty, so repeated runs accumulate into one report.

use serde::{Deserialize, Serialize, Serializer};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

/// Timestamp format used in the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome recorded for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Single-image mode succeeded
    Success,
    /// File reconciled from a batch response
    BatchSuccess,
    /// Individual mode succeeded
    IndividualSuccess,
    /// Single or individual mode failed
    Error,
    /// Batch request failed
    ApiError,
    /// Batch response unparseable or not an array
    JsonError,
    /// Batch result could not be written
    WriteError,
    /// Batch image could not be read
    ReadError,
    /// Batch response had no element for the file
    Missing,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Success => "success",
            RecordStatus::BatchSuccess => "batch_success",
            RecordStatus::IndividualSuccess => "individual_success",
            RecordStatus::Error => "error",
            RecordStatus::ApiError => "api_error",
            RecordStatus::JsonError => "json_error",
            RecordStatus::WriteError => "write_error",
            RecordStatus::ReadError => "read_error",
            RecordStatus::Missing => "missing",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RecordStatus::Success | RecordStatus::BatchSuccess | RecordStatus::IndividualSuccess
        )
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub timestamp: String,
    /// Base name of the source image
    pub file: String,
    pub tokens: u64,
    #[serde(serialize_with = "serialize_cost")]
    pub cost_usd: f64,
    pub status: RecordStatus,
    pub note: String,
}

impl UsageRecord {
    /// A row stamped with the current local time.
    pub fn new(
        file: &Path,
        tokens: u64,
        cost_usd: f64,
        status: RecordStatus,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            file: file_label(file),
            tokens,
            cost_usd,
            status,
            note: note.into(),
        }
    }

    /// A zero-usage row describing a failure.
    pub fn failure(file: &Path, status: RecordStatus, note: impl Into<String>) -> Self {
        Self::new(file, 0, 0.0, status, note)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Plain decimal, shortest form that reads back to the same value.
fn serialize_cost<S: Serializer>(cost: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{cost}"))
}

/// CSV ledger file.
#[derive(Debug, Clone)]
pub struct UsageLedger {
    path: PathBuf,
}

impl UsageLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger named `file_name` inside `dir`.
    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::new(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append rows, writing the header first if the file is new or empty.
    pub fn append(&self, records: &[UsageRecord]) -> PipelineResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        for record in records {
            writer.serialize(record).map_err(|e| self.error(e))?;
        }
        writer.flush().map_err(|e| self.error(e))?;

        tracing::debug!("Appended {} row(s) to {:?}", records.len(), self.path);
        Ok(())
    }

    fn error(&self, e: impl std::fmt::Display) -> PipelineError {
        PipelineError::Ledger {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_rows(path: &Path) -> Vec<UsageRecord> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.deserialize().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::in_dir(dir.path(), "usage_report.csv");

        ledger
            .append(&[UsageRecord::new(
                Path::new("/x/a.png"),
                1500,
                0.00015,
                RecordStatus::Success,
                "",
            )])
            .unwrap();
        ledger
            .append(&[
                UsageRecord::failure(Path::new("b.png"), RecordStatus::Error, "boom"),
                UsageRecord::new(
                    Path::new("c.jpg"),
                    10,
                    0.000001,
                    RecordStatus::IndividualSuccess,
                    "",
                ),
            ])
            .unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "timestamp,file,tokens,cost_usd,status,note");
        assert_eq!(content.matches("timestamp,file").count(), 1);
        assert!(lines[1].contains(",a.png,1500,0.00015,success,"));
        assert!(lines[2].ends_with(",b.png,0,0,error,boom"));
    }

    #[test]
    fn test_small_costs_keep_precision() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::in_dir(dir.path(), "report.csv");
        // 3 tokens at 0.0125 USD/1M
        let cost = 3.0 * 0.0125 / 1_000_000.0;
        ledger
            .append(&[UsageRecord::new(
                Path::new("a.png"),
                3,
                cost,
                RecordStatus::Success,
                "",
            )])
            .unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(content.contains(",a.png,3,0.0000000375,success,"), "{content}");
        assert_eq!(read_rows(ledger.path())[0].cost_usd, cost);
    }

    #[test]
    fn test_rows_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::in_dir(dir.path(), "report.csv");
        ledger
            .append(&[UsageRecord::failure(
                Path::new("a.png"),
                RecordStatus::ApiError,
                "Gemini HTTP 500: internal, retry later",
            )])
            .unwrap();

        let rows = read_rows(ledger.path());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RecordStatus::ApiError);
        assert_eq!(rows[0].note, "Gemini HTTP 500: internal, retry later");
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "").unwrap();

        let ledger = UsageLedger::new(&path);
        ledger
            .append(&[UsageRecord::failure(
                Path::new("a.png"),
                RecordStatus::Missing,
                "",
            )])
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,file,tokens,cost_usd,status,note\n"));
    }

    #[test]
    fn test_append_nothing_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::in_dir(dir.path(), "report.csv");
        ledger.append(&[]).unwrap();
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_timestamp_format() {
        let record = UsageRecord::failure(Path::new("a.png"), RecordStatus::Error, "");
        assert!(chrono::NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_status_strings_match_serde() {
        for status in [
            RecordStatus::Success,
            RecordStatus::BatchSuccess,
            RecordStatus::IndividualSuccess,
            RecordStatus::Error,
            RecordStatus::ApiError,
            RecordStatus::JsonError,
            RecordStatus::WriteError,
            RecordStatus::ReadError,
            RecordStatus::Missing,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!(RecordStatus::BatchSuccess.is_success());
        assert!(!RecordStatus::Missing.is_success());
    }
}
