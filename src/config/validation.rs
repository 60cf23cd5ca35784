// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeMap;
use validator::Validate;

use super::core::MutatorConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &MutatorConfig) -> Result<()> {
        config.validate().context("Configuration validation failed")?;

        Self::validate_http_config(config)?;
        Self::validate_headers(&config.headers)?;

        Ok(())
    }

    fn validate_http_config(config: &MutatorConfig) -> Result<()> {
        if let Some(proxy) = &config.http.proxy {
            if !proxy.starts_with("http://")
                && !proxy.starts_with("https://")
                && !proxy.starts_with("socks5://")
            {
                return Err(anyhow::anyhow!(
                    "Proxy URL must start with http://, https:// or socks5://"
                ));
            }
        }

        if config.http.follow_redirects && config.http.max_redirects == 0 {
            return Err(anyhow::anyhow!(
                "Max redirects must be greater than 0 when redirects are followed"
            ));
        }

        Ok(())
    }

    /// Every override must be a legal HTTP header
    pub fn validate_headers(headers: &BTreeMap<String, String>) -> Result<()> {
        for (name, value) in headers {
            HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {}", name))?;
            HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {}", name))?;
        }
        Ok(())
    }
}
