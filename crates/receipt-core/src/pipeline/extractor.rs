//! Extraction orchestrator.
//!
//! Drives the three processing modes against an [`LlmProvider`]: one image,
//! every image on its own, or fixed-size batches. Each file ends up with one
//! ledger row, and with a `.json` result next to it when extraction worked.
//! Files are processed sequentially; a failure never aborts the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::batch::{plan_batches, Batch};
use super::reconcile::{reconcile, strip_code_fences};
use crate::config::{BatchAttribution, Config};
use crate::error::{PipelineError, PipelineResult};
use crate::ledger::{RecordStatus, UsageLedger, UsageRecord};
use crate::llm::{ExtractionRequest, ImageInput, LlmProvider, LlmResponse, RetryPolicy};
use crate::output::{output_path_for, write_json, write_raw};
use crate::pricing::PricingTable;
use crate::types::{BatchOutcome, FileOutcome, RunSummary};

/// Runtime knobs for the extractor.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Retries after the first attempt for transient failures
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Images above this size are not sent
    pub max_file_size_mb: u64,
    /// How batch usage lands on per-file ledger rows
    pub batch_attribution: BatchAttribution,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_delay_ms: 1000,
            timeout_ms: 120_000,
            max_file_size_mb: 20,
            batch_attribution: BatchAttribution::Split,
        }
    }
}

impl ExtractOptions {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay_ms)
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            retry_attempts: config.pipeline.retry_attempts,
            retry_delay_ms: config.pipeline.retry_delay_ms,
            timeout_ms: config.limits.request_timeout_ms,
            max_file_size_mb: config.limits.max_file_size_mb,
            batch_attribution: config.report.batch_attribution,
        }
    }
}

/// Sequential extraction engine.
pub struct Extractor {
    provider: Box<dyn LlmProvider>,
    pricing: PricingTable,
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        pricing: PricingTable,
        options: ExtractOptions,
    ) -> Self {
        Self {
            provider,
            pricing,
            options,
        }
    }

    /// Model requests are sent to (and priced by).
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Per-million-token rate applied to this run.
    pub fn rate(&self) -> f64 {
        self.pricing.rate(self.provider.model())
    }

    /// Extract one image and record a `success` or `error` row.
    pub async fn extract_single(&self, path: &Path, ledger: &UsageLedger) -> FileOutcome {
        let outcome = self.extract_one(path, RecordStatus::Success, "").await;
        self.record(ledger, &[to_record(&outcome)]);
        outcome
    }

    /// Extract every file with its own request, in order.
    ///
    /// `on_file` is called after each file, once its ledger row is written.
    pub async fn extract_individually<F>(
        &self,
        files: &[PathBuf],
        ledger: &UsageLedger,
        mut on_file: F,
    ) -> RunSummary
    where
        F: FnMut(&FileOutcome),
    {
        let mut summary = RunSummary::new(files.len());
        for (i, path) in files.iter().enumerate() {
            tracing::info!("[{}/{}] {}", i + 1, files.len(), path.display());
            let outcome = self
                .extract_one(
                    path,
                    RecordStatus::IndividualSuccess,
                    "processed individually, exact usage",
                )
                .await;
            self.record(ledger, &[to_record(&outcome)]);
            summary.record_file(&outcome);
            on_file(&outcome);
        }
        summary
    }

    /// Split `files` into batches of `batch_size` and extract each batch.
    pub async fn extract_batched<F>(
        &self,
        files: &[PathBuf],
        batch_size: usize,
        ledger: &UsageLedger,
        mut on_batch: F,
    ) -> RunSummary
    where
        F: FnMut(&BatchOutcome),
    {
        let mut summary = RunSummary::new(files.len());
        for batch in plan_batches(files, batch_size) {
            tracing::info!(
                "Batch {}/{} ({} images)",
                batch.number,
                batch.total,
                batch.files.len()
            );
            let outcome = self.extract_batch(&batch, ledger).await;
            summary.record_batch(&outcome);
            on_batch(&outcome);
        }
        summary
    }

    /// Send one batch in a single request and reconcile the response.
    ///
    /// Images that cannot be loaded get a `read_error` row and are left out
    /// of the request; response indices refer to the images actually sent.
    pub async fn extract_batch(&self, batch: &Batch, ledger: &UsageLedger) -> BatchOutcome {
        let mut slots: Vec<Option<FileOutcome>> = vec![None; batch.files.len()];
        let mut sent: Vec<usize> = Vec::with_capacity(batch.files.len());
        let mut images = Vec::with_capacity(batch.files.len());

        for (pos, path) in batch.files.iter().enumerate() {
            match self.read_image(path).await {
                Ok(image) => {
                    sent.push(pos);
                    images.push(image);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", path.display());
                    slots[pos] = Some(failure(path, RecordStatus::ReadError, &e, false));
                }
            }
        }

        let mut outcome = BatchOutcome {
            number: batch.number,
            total: batch.total,
            files: Vec::new(),
            tokens: 0,
            cost_usd: 0.0,
            request_sent: false,
        };

        if !images.is_empty() {
            tracing::info!("Sending batch request with {} images", images.len());
            outcome.request_sent = true;
            let request = ExtractionRequest::batch(images);

            match self.generate_with_retry(&request).await {
                Ok(response) => {
                    outcome.tokens = response.usage.total_tokens;
                    outcome.cost_usd = self.pricing.cost_usd(outcome.tokens, self.model());
                    tracing::info!(
                        "Batch usage: {} tokens, ${:.6} ({}ms)",
                        outcome.tokens,
                        outcome.cost_usd,
                        response.latency_ms
                    );
                    tracing::warn!(
                        "Token usage covers the whole batch of {} images, not individual files",
                        sent.len()
                    );
                    self.settle_batch(batch, &sent, &response, &outcome, &mut slots);
                }
                Err(e) => {
                    tracing::error!("Batch {}/{} failed: {e}", batch.number, batch.total);
                    for &pos in &sent {
                        let path = &batch.files[pos];
                        slots[pos] = Some(failure(path, RecordStatus::ApiError, &e, false));
                    }
                }
            }
        } else {
            tracing::warn!(
                "No readable images in batch {}/{}, nothing sent",
                batch.number,
                batch.total
            );
        }

        outcome.files = slots.into_iter().flatten().collect();
        let records: Vec<UsageRecord> = outcome.files.iter().map(to_record).collect();
        self.record(ledger, &records);
        outcome
    }

    /// Fill the slots of the sent images from a successful batch response.
    fn settle_batch(
        &self,
        batch: &Batch,
        sent: &[usize],
        response: &LlmResponse,
        outcome: &BatchOutcome,
        slots: &mut [Option<FileOutcome>],
    ) {
        let (tokens, cost_usd) = self.attribute(outcome.tokens, outcome.cost_usd, sent.len());
        let note = match self.options.batch_attribution {
            BatchAttribution::Split => format!("batch of {}, usage split evenly", sent.len()),
            BatchAttribution::Shared => {
                format!("batch of {}, usage for the whole batch", sent.len())
            }
        };
        let charged = |path: &Path,
                       status: RecordStatus,
                       output: Option<PathBuf>,
                       note: Option<String>| FileOutcome {
            path: path.to_path_buf(),
            status,
            tokens,
            cost_usd,
            output,
            note,
            requested: false,
        };

        let cleaned = strip_code_fences(&response.text);
        let reconciled = match reconcile(&cleaned, sent.len()) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Could not parse batch response: {e}");
                tracing::debug!("Raw response:\n{}", response.text);
                for &pos in sent {
                    slots[pos] = Some(charged(
                        &batch.files[pos],
                        RecordStatus::JsonError,
                        None,
                        Some(e.to_string()),
                    ));
                }
                return;
            }
        };
        if reconciled.rejected > 0 {
            tracing::warn!("{} response element(s) dropped", reconciled.rejected);
        }

        for entry in &reconciled.entries {
            let pos = sent[entry.index];
            let path = &batch.files[pos];
            let output = output_path_for(path);
            slots[pos] = Some(match write_json(&output, &entry.payload) {
                Ok(()) => {
                    tracing::info!("Saved {}", output.display());
                    charged(path, RecordStatus::BatchSuccess, Some(output), Some(note.clone()))
                }
                Err(e) => {
                    tracing::error!("{e}");
                    charged(path, RecordStatus::WriteError, None, Some(e.to_string()))
                }
            });
        }

        for index in reconciled.missing() {
            let path = &batch.files[sent[index]];
            tracing::warn!("No result for {} in batch response", path.display());
            slots[sent[index]] = Some(charged(
                path,
                RecordStatus::Missing,
                None,
                Some("no result for this image in the batch response".to_string()),
            ));
        }
    }

    /// Per-file share of batch usage.
    fn attribute(&self, tokens: u64, cost_usd: f64, files: usize) -> (u64, f64) {
        match self.options.batch_attribution {
            BatchAttribution::Shared => (tokens, cost_usd),
            BatchAttribution::Split => {
                let n = files.max(1);
                (tokens / n as u64, cost_usd / n as f64)
            }
        }
    }

    async fn extract_one(&self, path: &Path, success: RecordStatus, note: &str) -> FileOutcome {
        let image = match self.read_image(path).await {
            Ok(image) => image,
            Err(e) => {
                tracing::error!("{e}");
                return failure(path, RecordStatus::Error, &e, false);
            }
        };

        let request = ExtractionRequest::single(image);
        let response = match self.generate_with_retry(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Extraction failed for {}: {e}", path.display());
                return failure(path, RecordStatus::Error, &e, true);
            }
        };

        let tokens = response.usage.total_tokens;
        let cost_usd = self.pricing.cost_usd(tokens, self.model());
        tracing::info!(
            "{}: {} tokens, ${:.6} ({}ms)",
            path.display(),
            tokens,
            cost_usd,
            response.latency_ms
        );

        let output = output_path_for(path);
        let (status, output, note) = match write_raw(&output, &strip_code_fences(&response.text)) {
            Ok(()) => {
                tracing::info!("Saved {}", output.display());
                (success, Some(output), Some(note.to_string()).filter(|n| !n.is_empty()))
            }
            Err(e) => {
                tracing::error!("{e}");
                (RecordStatus::Error, None, Some(e.to_string()))
            }
        };

        FileOutcome {
            path: path.to_path_buf(),
            status,
            tokens,
            cost_usd,
            output,
            note,
            requested: true,
        }
    }

    async fn read_image(&self, path: &Path) -> PipelineResult<ImageInput> {
        let read_error = |e: std::io::Error| PipelineError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let size = tokio::fs::metadata(path).await.map_err(read_error)?.len();
        let max_bytes = self.options.max_file_size_mb.saturating_mul(1024 * 1024);
        if size > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: size / (1024 * 1024),
                max_mb: self.options.max_file_size_mb,
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        Ok(ImageInput::from_bytes(&bytes, path))
    }

    async fn generate_with_retry(
        &self,
        request: &ExtractionRequest,
    ) -> PipelineResult<LlmResponse> {
        let policy = self.options.retry_policy();
        let mut attempt = 0;
        loop {
            if let Some(delay) = policy.delay_before(attempt) {
                tracing::debug!("Retry {attempt}/{} after {delay:?}", policy.attempts);
                tokio::time::sleep(delay).await;
            }

            let error = match tokio::time::timeout(
                Duration::from_millis(self.options.timeout_ms),
                self.provider.generate(request),
            )
            .await
            {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => e,
                Err(_) => PipelineError::Timeout {
                    stage: "request".to_string(),
                    timeout_ms: self.options.timeout_ms,
                },
            };

            tracing::warn!(
                "{} request failed (attempt {}): {error}",
                self.provider.name(),
                attempt + 1
            );
            if !policy.should_retry(&error, attempt) {
                return Err(error);
            }
            attempt += 1;
        }
    }

    fn record(&self, ledger: &UsageLedger, records: &[UsageRecord]) {
        if let Err(e) = ledger.append(records) {
            tracing::error!("{e}");
        }
    }
}

fn failure(
    path: &Path,
    status: RecordStatus,
    error: &PipelineError,
    requested: bool,
) -> FileOutcome {
    FileOutcome {
        path: path.to_path_buf(),
        status,
        tokens: 0,
        cost_usd: 0.0,
        output: None,
        note: Some(error.to_string()),
        requested,
    }
}

/// Ledger row for an outcome. Failure rows carry no usage even when the
/// request itself was billed.
fn to_record(outcome: &FileOutcome) -> UsageRecord {
    let note = outcome.note.clone().unwrap_or_default();
    if outcome.succeeded() {
        UsageRecord::new(
            &outcome.path,
            outcome.tokens,
            outcome.cost_usd,
            outcome.status,
            note,
        )
    } else {
        UsageRecord::failure(&outcome.path, outcome.status, note)
    }
}
