//! Run setup: config overrides, credentials, provider and ledger.

use receipt_core::{
    create_provider, resolve_api_key, Config, ExtractOptions, Extractor, PricingTable, UsageLedger,
};
use std::path::Path;

use super::CommonArgs;

/// Everything a run needs once the inputs are known.
pub(crate) struct RunContext {
    pub extractor: Extractor,
    pub ledger: UsageLedger,
}

/// Load the config file and apply command-line overrides.
pub fn load_config(common: &CommonArgs) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if let Some(path) = &common.credential_file {
        config.general.credential_file = path.clone();
    }
    if let Some(model) = &common.model {
        config.model.name = model.clone();
    }
    Ok(config)
}

/// Resolve the API key once and assemble the extractor and ledger.
pub fn build_context(
    config: Config,
    common: &CommonArgs,
    input_dir: &Path,
) -> anyhow::Result<RunContext> {
    let api_key = resolve_api_key(&config, common.api_key.as_deref()).map_err(|e| {
        anyhow::anyhow!(
            "{e}\n\n  Hint: Put your Gemini API key in {} or set {}.",
            config.credential_file().display(),
            config.general.api_key_env
        )
    })?;

    let pricing = PricingTable::from_config(&config.pricing);
    if !pricing.contains(&config.model.name) {
        tracing::warn!(
            "No price known for {}, using ${}/1M tokens",
            config.model.name,
            pricing.default_rate()
        );
    }

    let provider = create_provider(&config, &api_key, None);
    let extractor = Extractor::new(provider, pricing, ExtractOptions::from_config(&config));

    let ledger = match &common.report {
        Some(path) => UsageLedger::new(path.clone()),
        None => UsageLedger::in_dir(input_dir, &config.report.file_name),
    };
    tracing::debug!("Usage report: {:?}", ledger.path());

    Ok(RunContext { extractor, ledger })
}
