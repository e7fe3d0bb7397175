//! Dialoguer theme and banner for interactive mode.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Returns the `ColorfulTheme` used by every interactive prompt.
///
/// - Prompt prefix: cyan `?`
/// - Active item indicator: cyan `▸`
/// - Success prefix: green `✓`
/// - Error prefix: red `✗`
pub fn receipt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        active_item_prefix: style("▸".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().cyan(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Prints the banner with the version and configured model to stderr.
pub fn print_banner(model: &str) {
    let version_line = format!("Receipt Extract v{}", receipt_core::VERSION);
    let model_line = format!("model: {model}");
    let inner_width = version_line.len().max(model_line.len()) + 4;

    let cyan = Style::new().for_stderr().cyan();

    eprintln!();
    eprintln!("{}", cyan.apply_to(format!("  ╔{:═<inner_width$}╗", "")));
    eprintln!("{}", cyan.apply_to(format!("  ║{version_line:^inner_width$}║")));
    eprintln!("{}", cyan.apply_to(format!("  ║{model_line:^inner_width$}║")));
    eprintln!("{}", cyan.apply_to(format!("  ╚{:═<inner_width$}╝", "")));
    eprintln!();
}
