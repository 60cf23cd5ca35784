// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Request Input
 * Loads URL lists and exported request files into normalized requests
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod exported;
pub mod normalize;
pub mod url_list;

pub use exported::{load_exported, parse_exported, parse_header_block};
pub use normalize::{normalize_params, normalize_query, ContentKind, Normalized};
pub use url_list::{load_url_list, parse_url_list, request_from_url};

use anyhow::Result;
use std::path::PathBuf;

use crate::request::FuzzRequest;

/// Where the batch of requests comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    UrlList(PathBuf),
    Exported(PathBuf),
}

impl InputSource {
    pub fn load(&self) -> Result<Vec<FuzzRequest>> {
        match self {
            InputSource::UrlList(path) => load_url_list(path),
            InputSource::Exported(path) => load_exported(path),
        }
    }
}
