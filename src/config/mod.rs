// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;
pub mod loader;
pub mod validation;

pub use self::core::{EngineConfig, HttpConfig, MutatorConfig};
pub use loader::{apply_env_overrides, ConfigFormat, ConfigLoader};
pub use validation::ConfigValidator;

use anyhow::Result;

impl MutatorConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = MutatorConfig::default();
        apply_env_overrides(&mut config)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}
