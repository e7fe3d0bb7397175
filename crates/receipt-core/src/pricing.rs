//! Per-model token pricing.
//!
//! Rates are USD per million tokens, taken from the public Gemini price list
//! (input rate). The same rate is applied to prompt and response tokens.

use crate::config::PricingConfig;
use std::collections::BTreeMap;

/// Built-in rates in USD per million tokens.
const BUILTIN_RATES: &[(&str, f64)] = &[
    ("gemini-2.5-flash-lite-preview-06-17", 0.10),
    ("gemini-2.5-flash", 0.30),
    ("gemini-2.0-flash", 0.10),
    ("gemini-2.0-flash-lite", 0.075),
    ("gemini-1.5-flash", 0.075),
    ("gemini-1.5-flash-8b", 0.0375),
    ("gemini-1.5-pro", 1.25),
    ("gemini-2.5-pro", 1.25),
];

/// Rate used for models missing from the table.
pub const DEFAULT_RATE: f64 = 0.10;

/// Model -> rate lookup with a fallback rate.
#[derive(Debug, Clone)]
pub struct PricingTable {
    rates: BTreeMap<String, f64>,
    default_rate: f64,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            rates: BUILTIN_RATES
                .iter()
                .map(|(model, rate)| (model.to_string(), *rate))
                .collect(),
            default_rate: DEFAULT_RATE,
        }
    }
}

impl PricingTable {
    /// Built-in table with config overrides applied.
    pub fn from_config(config: &PricingConfig) -> Self {
        let mut table = Self::default();
        table.default_rate = config.default_rate;
        for (model, rate) in &config.rates {
            table.rates.insert(model.clone(), *rate);
        }
        table
    }

    /// USD per million tokens for `model`, falling back to the default rate.
    pub fn rate(&self, model: &str) -> f64 {
        match self.rates.get(model) {
            Some(rate) => *rate,
            None => {
                tracing::debug!(
                    "No price for model '{model}', using default ${}/1M",
                    self.default_rate
                );
                self.default_rate
            }
        }
    }

    /// Cost in USD of `tokens` tokens on `model`.
    pub fn cost_usd(&self, tokens: u64, model: &str) -> f64 {
        tokens as f64 / 1_000_000.0 * self.rate(model)
    }

    /// Whether `model` has an explicit rate.
    pub fn contains(&self, model: &str) -> bool {
        self.rates.contains_key(model)
    }

    /// All explicit rates, sorted by model identifier.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(model, rate)| (model.as_str(), *rate))
    }

    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }
}
