//! API key loading.
//!
//! The key comes from, in order: a key supplied for this session, the
//! configured environment variable, then the credential file.

use crate::config::Config;
use crate::error::CredentialError;
use std::path::Path;

/// Read an API key from a text file, trimming surrounding whitespace.
pub fn load_api_key(path: &Path, env_var: &str) -> Result<String, CredentialError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CredentialError::NotFound {
                path: path.to_path_buf(),
                env_var: env_var.to_string(),
            });
        }
        Err(source) => {
            return Err(CredentialError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let key = content.trim();
    if key.is_empty() {
        return Err(CredentialError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(key.to_string())
}

/// Resolve `${ENV_VAR}` references and bare variable names to their values.
pub fn resolve_env_var(value: &str) -> Option<String> {
    let var_name = if value.starts_with("${") && value.ends_with('}') {
        &value[2..value.len() - 1]
    } else {
        value
    };
    if var_name.is_empty() {
        return None;
    }
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the API key for this run.
pub fn resolve_api_key(
    config: &Config,
    session_key: Option<&str>,
) -> Result<String, CredentialError> {
    if let Some(key) = session_key.map(str::trim).filter(|k| !k.is_empty()) {
        tracing::debug!("Using API key supplied for this session");
        return Ok(key.to_string());
    }

    if let Some(key) = resolve_env_var(&config.general.api_key_env) {
        tracing::debug!("Using API key from {}", config.general.api_key_env);
        return Ok(key);
    }

    let path = config.credential_file();
    tracing::debug!("Loading API key from {:?}", path);
    load_api_key(&path, &config.general.api_key_env)
}
