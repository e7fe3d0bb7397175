//! The `extract`, `batch` and `individual` commands.

mod setup;
mod summary;

use clap::Args;
use receipt_core::pipeline::FileDiscovery;
use receipt_core::{ProcessingMode, RecordStatus};
use std::path::{Path, PathBuf};
use std::time::Instant;

use setup::{build_context, load_config};
use summary::{create_progress_bar, print_summary};

/// Flags shared by every extraction command.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Gemini model to use (overrides the config file)
    #[arg(long)]
    pub model: Option<String>,

    /// API key for this run only (takes precedence over env and credential file)
    #[arg(long)]
    pub api_key: Option<String>,

    /// File holding the API key
    #[arg(long)]
    pub credential_file: Option<PathBuf>,

    /// Usage report CSV (defaults to a file in the input directory)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the `extract` command.
#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Receipt image to extract
    #[arg(required = true)]
    pub image: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the `batch` command.
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Directory of receipt images
    #[arg(required = true)]
    pub dir: PathBuf,

    /// Images per request (defaults to processing.batch_size)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: Option<u32>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the `individual` command.
#[derive(Args, Debug, Clone)]
pub struct IndividualArgs {
    /// Directory of receipt images
    #[arg(required = true)]
    pub dir: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Extract a single image.
pub async fn execute_single(args: ExtractArgs) -> anyhow::Result<()> {
    if !args.image.is_file() {
        anyhow::bail!(
            "Image not found: {:?}\n\n  Hint: Check the file path and try again.",
            args.image
        );
    }

    let config = load_config(&args.common)?;
    let input_dir = args
        .image
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let ctx = build_context(config, &args.common, input_dir)?;

    tracing::info!("Extracting {} with {}", args.image.display(), ctx.extractor.model());
    let outcome = ctx.extractor.extract_single(&args.image, &ctx.ledger).await;

    if outcome.succeeded() {
        if let Some(output) = &outcome.output {
            eprintln!("  Saved {}", output.display());
        }
        eprintln!(
            "  Tokens: {}  Cost: ${:.6}",
            outcome.tokens, outcome.cost_usd
        );
        eprintln!("  Usage recorded in {}", ctx.ledger.path().display());
        Ok(())
    } else {
        anyhow::bail!(
            "Extraction failed for {}: {}",
            args.image.display(),
            outcome.note.unwrap_or_default()
        )
    }
}

/// Extract every image of a directory in fixed-size batches.
pub async fn execute_batch(args: BatchArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    let batch_size = args
        .batch_size
        .map(|n| n as usize)
        .unwrap_or(config.processing.batch_size);
    let Some(files) = discover(&args.dir, &config)? else {
        return Ok(());
    };
    let ctx = build_context(config, &args.common, &args.dir)?;

    tracing::info!(
        "Processing {} image(s) in batches of {} with {}",
        files.len(),
        batch_size,
        ctx.extractor.model()
    );

    let start = Instant::now();
    let pb = create_progress_bar(files.len() as u64);
    let summary = ctx
        .extractor
        .extract_batched(&files, batch_size, &ctx.ledger, |batch| {
            pb.inc(batch.files.len() as u64);
            pb.set_message(format!("batch {}/{}", batch.number, batch.total));
        })
        .await;
    pb.finish_and_clear();

    print_summary(
        ProcessingMode::Batched,
        &summary,
        ctx.extractor.rate(),
        ctx.ledger.path(),
        start.elapsed(),
    );
    Ok(())
}

/// Extract every image of a directory with one request each.
pub async fn execute_individual(args: IndividualArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    let Some(files) = discover(&args.dir, &config)? else {
        return Ok(());
    };
    let ctx = build_context(config, &args.common, &args.dir)?;

    tracing::info!(
        "Processing {} image(s) individually with {}",
        files.len(),
        ctx.extractor.model()
    );

    let start = Instant::now();
    let pb = create_progress_bar(files.len() as u64);
    let summary = ctx
        .extractor
        .extract_individually(&files, &ctx.ledger, |outcome| {
            pb.inc(1);
            if outcome.status == RecordStatus::Error {
                pb.println(format!(
                    "  ✗ {}: {}",
                    outcome.path.display(),
                    outcome.note.as_deref().unwrap_or("failed")
                ));
            }
        })
        .await;
    pb.finish_and_clear();

    print_summary(
        ProcessingMode::Individual,
        &summary,
        ctx.extractor.rate(),
        ctx.ledger.path(),
        start.elapsed(),
    );
    Ok(())
}

/// Find the images of `dir`. `None` when there is nothing to process.
fn discover(dir: &Path, config: &receipt_core::Config) -> anyhow::Result<Option<Vec<PathBuf>>> {
    if !dir.is_dir() {
        anyhow::bail!(
            "Directory not found: {:?}\n\n  Hint: Pass a directory containing receipt images.",
            dir
        );
    }

    let discovery = FileDiscovery::new(config.processing.clone());
    let files = discovery.discover(dir);
    if files.is_empty() {
        tracing::warn!(
            "No images found in {} (looking for {})",
            dir.display(),
            discovery.describe_formats()
        );
        return Ok(None);
    }

    let total_size = FileDiscovery::total_size(&files);
    tracing::info!(
        "Found {} image(s) ({:.1} MB)",
        files.len(),
        total_size as f64 / 1_000_000.0
    );
    Ok(Some(files.into_iter().map(|f| f.path).collect()))
}
