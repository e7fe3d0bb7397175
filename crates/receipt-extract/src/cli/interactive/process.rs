//! Guided extraction flows.
//!
//! Each flow prompts for its inputs (with the defaults of the classic
//! menu), builds the matching command arguments and delegates to
//! `cli::extract`.

use console::Style;
use dialoguer::Input;
use receipt_core::Config;
use std::path::{Path, PathBuf};

use super::theme::receipt_theme;
use crate::cli::extract::{self, BatchArgs, CommonArgs, ExtractArgs, IndividualArgs};

/// Batch size used when the prompt gets no usable answer.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// File offered by the single-image flow.
const DEFAULT_IMAGE_NAME: &str = "receipt.png";

pub async fn guided_single(config: &Config) -> anyhow::Result<()> {
    let default = config.general.default_input_dir.join(DEFAULT_IMAGE_NAME);
    let Some(image) = prompt_path("Path to receipt image", &default)? else {
        return Ok(());
    };

    extract::execute_single(ExtractArgs {
        image,
        common: CommonArgs::default(),
    })
    .await
}

pub async fn guided_batch(config: &Config) -> anyhow::Result<()> {
    let Some(dir) = prompt_path("Directory of receipts", &config.general.default_input_dir)? else {
        return Ok(());
    };

    let Some(raw) = super::handle_interrupt(
        Input::<String>::with_theme(&receipt_theme())
            .with_prompt("Images per batch")
            .default(DEFAULT_BATCH_SIZE.to_string())
            .interact_text(),
    )?
    else {
        return Ok(());
    };

    let batch_size = parse_batch_size(&raw).unwrap_or_else(|| {
        let warn = Style::new().for_stderr().yellow();
        eprintln!(
            "  {}",
            warn.apply_to(format!(
                "Invalid batch size {raw:?}, using {DEFAULT_BATCH_SIZE}"
            ))
        );
        DEFAULT_BATCH_SIZE
    });

    extract::execute_batch(BatchArgs {
        dir,
        batch_size: Some(batch_size as u32),
        common: CommonArgs::default(),
    })
    .await
}

pub async fn guided_individual(config: &Config) -> anyhow::Result<()> {
    let Some(dir) = prompt_path("Directory of receipts", &config.general.default_input_dir)? else {
        return Ok(());
    };

    extract::execute_individual(IndividualArgs {
        dir,
        common: CommonArgs::default(),
    })
    .await
}

/// Parse a batch size answer. `None` for anything that is not a positive
/// integer that fits a request.
pub fn parse_batch_size(input: &str) -> Option<usize> {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .map(|n| n as usize)
}

/// Prompt for a path with a default. Returns `Ok(None)` on interrupt.
fn prompt_path(prompt: &str, default: &Path) -> anyhow::Result<Option<PathBuf>> {
    let Some(raw) = super::handle_interrupt(
        Input::<String>::with_theme(&receipt_theme())
            .with_prompt(prompt)
            .default(default.display().to_string())
            .interact_text(),
    )?
    else {
        return Ok(None);
    };
    Ok(Some(PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_size_accepts_positive() {
        assert_eq!(parse_batch_size("3"), Some(3));
        assert_eq!(parse_batch_size(" 12 "), Some(12));
    }

    #[test]
    fn test_parse_batch_size_rejects_invalid() {
        assert_eq!(parse_batch_size("0"), None);
        assert_eq!(parse_batch_size("-2"), None);
        assert_eq!(parse_batch_size("five"), None);
        assert_eq!(parse_batch_size(""), None);
    }
}
