// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::core::MutatorConfig;
use super::validation::ConfigValidator;

pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = Self::detect_format(&path)?;

        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn with_format<P: AsRef<Path>>(config_path: P, format: ConfigFormat) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            format,
        }
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file format"))?;

        match extension {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(anyhow::anyhow!("Unsupported config file format: {}", extension)),
        }
    }

    fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let parsed = match self.format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(&content).context("Failed to parse YAML config")?
            }
            ConfigFormat::Toml => toml::from_str(&content).context("Failed to parse TOML config")?,
            ConfigFormat::Json => {
                serde_json::from_str(&content).context("Failed to parse JSON config")?
            }
        };

        Ok(parsed)
    }

    pub fn load_config(&self) -> Result<MutatorConfig> {
        let mut config: MutatorConfig = self.parse()?;

        apply_env_overrides(&mut config)?;

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load a flat header name → value map
    pub fn load_header_overrides(&self) -> Result<BTreeMap<String, String>> {
        let headers: BTreeMap<String, String> = self
            .parse()
            .with_context(|| format!("Invalid header override file: {:?}", self.config_path))?;

        ConfigValidator::validate_headers(&headers)?;

        Ok(headers)
    }
}

/// Environment overrides: MUTATOR_PROXY, MUTATOR_TIMEOUT, MUTATOR_INSECURE
pub fn apply_env_overrides(config: &mut MutatorConfig) -> Result<()> {
    if let Ok(proxy) = std::env::var("MUTATOR_PROXY") {
        config.http.proxy = (!proxy.is_empty()).then_some(proxy);
    }

    if let Ok(timeout) = std::env::var("MUTATOR_TIMEOUT") {
        config.http.timeout_secs = timeout.parse().context("Invalid MUTATOR_TIMEOUT")?;
    }

    if let Ok(insecure) = std::env::var("MUTATOR_INSECURE") {
        config.http.accept_invalid_certs = insecure.parse().context("Invalid MUTATOR_INSECURE")?;
    }

    Ok(())
}
