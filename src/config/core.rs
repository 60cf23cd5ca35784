// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::mutation::DEFAULT_MAX_DEPTH;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MutatorConfig {
    #[validate(nested)]
    #[serde(default)]
    pub http: HttpConfig,

    #[validate(nested)]
    #[serde(default)]
    pub engine: EngineConfig,

    /// Header overrides merged into every request before mutation
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HttpConfig {
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub follow_redirects: bool,

    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[validate(url)]
    #[serde(default)]
    pub proxy: Option<String>,

    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            follow_redirects: true,
            max_redirects: default_max_redirects(),
            proxy: None,
            accept_invalid_certs: false,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    #[validate(range(min = 1, max = 1024))]
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_max_redirects() -> usize {
    10
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
