//! Fixed-size partitioning of input files into batches.

use std::path::PathBuf;

/// A group of files submitted in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based position of this batch in the run
    pub number: usize,
    /// Number of batches in the run
    pub total: usize,
    pub files: Vec<PathBuf>,
}

/// Split `files` into consecutive groups of `size`; the last may be shorter.
///
/// A `size` of 0 is treated as 1.
pub fn plan_batches(files: &[PathBuf], size: usize) -> Vec<Batch> {
    let size = size.max(1);
    let total = files.len().div_ceil(size);
    files
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            number: i + 1,
            total,
            files: chunk.to_vec(),
        })
        .collect()
}
