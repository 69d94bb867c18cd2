use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config_manager::Config;

/// Supported on-disk config formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    JsonLd,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        let lower = path.to_string_lossy().to_lowercase();
        if lower.ends_with(".jsonld") || lower.ends_with(".json") {
            ConfigFormat::JsonLd
        } else {
            ConfigFormat::Yaml
        }
    }
}

/// Read a config file, substitute `${VAR}` references and parse it.
pub fn read_config(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        anyhow::bail!("Configuration file not found: {}", config_path.display());
    }

    let content = load_text_file_with_guess_encoding(config_path)?;
    if content.trim().is_empty() {
        anyhow::bail!("Configuration file is empty: {}", config_path.display());
    }

    let content = substitute_env_vars(&content, |name| std::env::var(name).ok())?;
    parse_config(&content, ConfigFormat::from_path(config_path))
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))
}

/// Parse config text that already had its environment references resolved
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<Config> {
    let mut value: Value = match format {
        ConfigFormat::JsonLd => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    // JSON-LD vocabulary is not part of the config model
    if let Value::Object(ref mut obj) = value {
        obj.remove("@context");
    }

    let config: Config = serde_json::from_value(value)?;
    Ok(config)
}

/// Replace environment variables: ${VAR_NAME}. Unknown variables are left as-is.
pub fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match lookup(var_name) {
            Some(value) => value,
            None => {
                debug!("Config references unset variable {}", var_name);
                caps[0].to_string()
            }
        }
    });
    Ok(replaced.into_owned())
}

/// Load text file, stripping a UTF-8 BOM and decoding lossily if it is not valid UTF-8
pub fn load_text_file_with_guess_encoding(file_path: &Path) -> Result<String> {
    let mut bytes = fs::read(file_path)
        .with_context(|| format!("Failed to read {}", file_path.display()))?;

    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(0..3);
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            let (cow, encoding, had_errors) = encoding_rs::UTF_8.decode(&bytes);
            debug!(
                "Decoded {} as {} (replacement characters: {})",
                file_path.display(),
                encoding.name(),
                had_errors
            );
            Ok(cow.into_owned())
        }
    }
}
