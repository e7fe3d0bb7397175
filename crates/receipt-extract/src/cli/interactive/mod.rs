//! Interactive CLI mode for bare `receipt-extract` invocation.
//!
//! When no subcommand is given on a TTY, a menu offers the three processing
//! modes and delegates to the same handlers as the flag-based commands.

pub mod process;
pub mod theme;

use console::Style;
use dialoguer::Select;
use receipt_core::Config;

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Main menu options presented to the user.
const MENU_ITEMS: &[&str] = &[
    "Extract a single image",
    "Extract a directory in batches",
    "Extract a directory one image at a time",
    "Exit",
];

/// Entry point for interactive mode.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    theme::print_banner(&config.model.name);

    let theme = theme::receipt_theme();

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(0)
            .interact_opt()?;

        let result = match selection {
            Some(0) => process::guided_single(config).await,
            Some(1) => process::guided_batch(config).await,
            Some(2) => process::guided_individual(config).await,
            Some(3) | None => break,
            _ => unreachable!(),
        };

        // A failed run returns to the menu instead of ending the session
        if let Err(e) = result {
            let err = Style::new().for_stderr().red();
            eprintln!("  {} {e:#}", err.apply_to("✗"));
            eprintln!();
        }
    }

    Ok(())
}
