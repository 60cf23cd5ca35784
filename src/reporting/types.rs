// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::Serialize;

use crate::request::Section;

/// Baseline and mutated rendering of the section being tested
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantReport {
    pub section: Section,
    /// Path of the mutated slot, e.g. `user.tags[1]` or `root/item@id`
    pub field: String,
    pub modifier: String,
    pub before: String,
    pub now: String,
}

/// Result of dispatching one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Status(u16),
    Failed(String),
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Status(code) => write!(f, "Response Code: {}", code),
            Outcome::Failed(reason) => write!(f, "Request failed: {}", reason),
        }
    }
}
