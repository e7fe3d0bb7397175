//! Outcome and accounting types produced by the extraction pipeline.

use serde::Serialize;
use std::path::PathBuf;

use crate::ledger::RecordStatus;

/// How a directory (or file) is submitted to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// One named image, one request
    Single,
    /// Fixed-size groups of images, one request per group
    Batched,
    /// Every image on its own, one request each, sequentially
    Individual,
}

/// What happened to a single input file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// Source image
    pub path: PathBuf,

    /// Status recorded in the ledger
    pub status: RecordStatus,

    /// Tokens attributed to this file
    pub tokens: u64,

    /// Cost attributed to this file in USD
    pub cost_usd: f64,

    /// JSON file written for this image, if any
    pub output: Option<PathBuf>,

    /// Ledger note: error text for failures, attribution for batch rows
    pub note: Option<String>,

    /// Whether an API request was made on behalf of this file alone
    pub requested: bool,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of one batch request.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// 1-based batch number
    pub number: usize,

    /// Number of batches in the run
    pub total: usize,

    /// Per-file outcomes, in batch order
    pub files: Vec<FileOutcome>,

    /// Tokens reported for the whole request
    pub tokens: u64,

    /// Cost of the whole request in USD
    pub cost_usd: f64,

    /// False when every image failed to load and nothing was sent
    pub request_sent: bool,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.succeeded()).count()
    }
}

/// Totals accumulated over a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Images found for the run
    pub images: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// API requests sent
    pub requests: usize,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
}

impl RunSummary {
    pub fn new(images: usize) -> Self {
        Self {
            images,
            ..Self::default()
        }
    }

    /// Account for an individually processed file.
    pub fn record_file(&mut self, outcome: &FileOutcome) {
        if outcome.succeeded() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        if outcome.requested {
            self.requests += 1;
        }
        self.total_tokens += outcome.tokens;
        self.total_cost_usd += outcome.cost_usd;
    }

    /// Account for a batch. Usage comes from the request totals, not the
    /// per-file shares, so rounding in split attribution does not leak.
    pub fn record_batch(&mut self, outcome: &BatchOutcome) {
        let succeeded = outcome.succeeded();
        self.succeeded += succeeded;
        self.failed += outcome.files.len() - succeeded;
        if outcome.request_sent {
            self.requests += 1;
        }
        self.total_tokens += outcome.tokens;
        self.total_cost_usd += outcome.cost_usd;
    }

    /// Average tokens per image found (integer division).
    pub fn avg_tokens(&self) -> u64 {
        if self.images == 0 {
            0
        } else {
            self.total_tokens / self.images as u64
        }
    }

    /// Average cost per image found.
    pub fn avg_cost_usd(&self) -> f64 {
        if self.images == 0 {
            0.0
        } else {
            self.total_cost_usd / self.images as f64
        }
    }
}
