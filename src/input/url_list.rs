// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use serde_json::Map;
use std::path::Path;
use tracing::{debug, warn};
use url::{Position, Url};

use super::normalize::insert_param;
use crate::errors::{MutatorError, MutatorResult};
use crate::request::{FuzzRequest, RequestRecord};

/// Load a file with one URL per line
pub fn load_url_list<P: AsRef<Path>>(path: P) -> Result<Vec<FuzzRequest>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL list: {:?}", path))?;

    Ok(parse_url_list(&content))
}

/// Parse URL list content. Invalid lines are reported and skipped.
pub fn parse_url_list(content: &str) -> Vec<FuzzRequest> {
    let mut requests = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match request_from_url(line) {
            Ok(request) => requests.push(request),
            Err(e) => warn!("Skipping line {}: {}", number + 1, e),
        }
    }

    debug!("Loaded {} requests from URL list", requests.len());
    requests
}

/// GET request for one URL; the query string becomes the query section
pub fn request_from_url(raw: &str) -> MutatorResult<FuzzRequest> {
    let url = Url::parse(raw).map_err(|_| MutatorError::Schema {
        field: "url".to_string(),
    })?;

    let mut query = Map::new();
    for (key, value) in url.query_pairs() {
        if value.is_empty() {
            continue;
        }
        insert_param(&mut query, key.into_owned(), value.into_owned());
    }

    FuzzRequest::from_record(RequestRecord {
        method: Some("GET".to_string()),
        url: Some(url[..Position::AfterPath].to_string()),
        query,
        ..Default::default()
    })
}
