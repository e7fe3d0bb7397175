//! The `receipt-extract pricing` command.

use receipt_core::{Config, PricingTable};

/// Print the effective per-model rates to stdout.
pub async fn execute() -> anyhow::Result<()> {
    let config = Config::load()?;
    let table = PricingTable::from_config(&config.pricing);
    print!("{}", render(&table, &config.model.name));
    Ok(())
}

fn render(table: &PricingTable, current_model: &str) -> String {
    let mut out = format!("{:<40} {:>12}\n", "MODEL", "USD / 1M");
    for (model, rate) in table.entries() {
        let marker = if model == current_model { " *" } else { "" };
        out.push_str(&format!("{model:<40} {rate:>12.4}{marker}\n"));
    }
    out.push_str(&format!("{:<40} {:>12.4}\n", "(other models)", table.default_rate()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_current_model() {
        let out = render(&PricingTable::default(), "gemini-2.5-flash");
        let line = out
            .lines()
            .find(|l| l.starts_with("gemini-2.5-flash "))
            .unwrap();
        assert!(line.contains("0.3000"));
        assert!(line.ends_with('*'));
        assert!(out.lines().last().unwrap().contains("0.1000"));
    }
}
