//! Progress bar and end-of-run summary.

use receipt_core::{ProcessingMode, RunSummary};
use std::path::Path;
use std::time::Duration;

/// Create a progress bar for the images of a run.
pub fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("=> "),
    );
    pb
}

/// Print the run totals to stderr.
pub fn print_summary(
    mode: ProcessingMode,
    summary: &RunSummary,
    rate: f64,
    report: &Path,
    elapsed: Duration,
) {
    let mode_label = match mode {
        ProcessingMode::Single => "single",
        ProcessingMode::Batched => "batched",
        ProcessingMode::Individual => "individual",
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("        Summary ({mode_label})");
    eprintln!("  ====================================");
    eprintln!("    Images:       {:>10}", summary.images);
    eprintln!("    Succeeded:    {:>10}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>10}", summary.failed);
    }
    eprintln!("    Requests:     {:>10}", summary.requests);
    eprintln!("  ------------------------------------");
    eprintln!("    Tokens:       {:>10}", summary.total_tokens);
    eprintln!("    Cost:         {:>10.6} USD", summary.total_cost_usd);
    eprintln!("    Avg tokens:   {:>10}", summary.avg_tokens());
    eprintln!("    Avg cost:     {:>10.6} USD", summary.avg_cost_usd());
    eprintln!("    Rate:         {:>10.4} USD/1M", rate);
    eprintln!("    Duration:     {:>9.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
    if matches!(mode, ProcessingMode::Batched) {
        eprintln!("    Batch usage is attributed across the files of each batch.");
    }
    eprintln!("    Usage report: {}", report.display());
}
