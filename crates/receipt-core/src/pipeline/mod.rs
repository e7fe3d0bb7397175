//! Extraction pipeline components.
//!
//! - **discovery**: Find receipt images in a directory
//! - **batch**: Partition files into fixed-size batches
//! - **reconcile**: Match a batch response back to its images
//! - **extractor**: Orchestrates requests, results and the usage ledger

pub mod batch;
pub mod discovery;
pub mod extractor;
pub mod reconcile;

pub use batch::{plan_batches, Batch};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use extractor::{ExtractOptions, Extractor};
pub use reconcile::{reconcile, strip_code_fences, Reconciled, ReconciledEntry};
