//! Receipt Core - structured data extraction from receipt images.
//!
//! Receipt images are sent to a Gemini vision model, which returns the
//! receipt contents as JSON. Results are written next to the images and
//! every file gets a row in a CSV usage ledger with its token count and
//! estimated cost.
//!
//! # Architecture
//!
//! ```text
//! Discover → Read → Request (single | batch) → Reconcile → Write JSON → Ledger
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use receipt_core::{
//!     create_provider, resolve_api_key, Config, ExtractOptions, Extractor, PricingTable,
//!     UsageLedger,
//! };
//!
//! #[tokio::main]
//! async fn main() -> receipt_core::Result<()> {
//!     let config = Config::load()?;
//!     let api_key = resolve_api_key(&config, None)?;
//!     let provider = create_provider(&config, &api_key, None);
//!     let extractor = Extractor::new(
//!         provider,
//!         PricingTable::from_config(&config.pricing),
//!         ExtractOptions::from_config(&config),
//!     );
//!
//!     let ledger = UsageLedger::in_dir("example".as_ref(), &config.report.file_name);
//!     let outcome = extractor.extract_single("example/receipt.png".as_ref(), &ledger).await;
//!     println!("{}: {} tokens", outcome.status, outcome.tokens);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod ledger;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod pricing;
pub mod types;

pub use config::{BatchAttribution, Config};
pub use credential::{load_api_key, resolve_api_key};
pub use error::{ConfigError, CredentialError, PipelineError, PipelineResult, ReceiptError, Result};
pub use ledger::{RecordStatus, UsageLedger, UsageRecord};
pub use llm::{create_provider, LlmProvider};
pub use pipeline::{plan_batches, Batch, ExtractOptions, Extractor, FileDiscovery};
pub use pricing::PricingTable;
pub use types::{BatchOutcome, FileOutcome, ProcessingMode, RunSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
