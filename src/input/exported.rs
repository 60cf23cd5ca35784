// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

use super::normalize::{normalize_params, normalize_query};
use crate::errors::MutatorResult;
use crate::request::{parse_cookies, Body, FuzzRequest, RequestRecord, Section};

/// One row of an exported request file
#[derive(Debug, Deserialize)]
pub struct ExportedRow {
    #[serde(rename = "Request", default)]
    pub request: ExportedRequest,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExportedRequest {
    pub method: Option<String>,
    pub host: String,
    pub path: String,
    /// Raw query string, or an already parsed parameter map
    pub query: Value,
    /// Raw header block, one `Name: value` per line
    pub headers: String,
    pub content_type: String,
    /// Raw body, or an already parsed document
    pub body: Value,
    /// Raw `a=b; c=d` cookie string
    pub cookies: String,
}

/// Load a JSON array of exported requests
pub fn load_exported<P: AsRef<Path>>(path: P) -> Result<Vec<FuzzRequest>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read exported requests: {:?}", path))?;

    parse_exported(&content)
}

pub fn parse_exported(content: &str) -> Result<Vec<FuzzRequest>> {
    let rows: Vec<ExportedRow> =
        serde_json::from_str(content).context("Exported requests must be a JSON array")?;

    let mut requests = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match request_from_export(row.request) {
            Ok(request) => requests.push(request),
            Err(e) => warn!("Skipping exported request #{}: {}", index + 1, e),
        }
    }

    debug!("Loaded {} exported requests", requests.len());
    Ok(requests)
}

pub fn request_from_export(export: ExportedRequest) -> MutatorResult<FuzzRequest> {
    let url = format!("{}{}", export.host, export.path);

    let query = match &export.query {
        Value::String(raw) => normalize_query(raw).unwrap_or_else(|e| {
            warn!("Invalid query string for {}: {}", url, e);
            Map::new()
        }),
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    let (body, content_type) = match export.body {
        Value::String(raw) => match normalize_params(&raw, &export.content_type, Section::Body) {
            Ok(normalized) => (normalized.body, normalized.content_type),
            Err(e) => {
                warn!("Invalid body for {}: {}", url, e);
                (Body::Empty, export.content_type)
            }
        },
        Value::Null => (Body::Empty, export.content_type),
        structured => (Body::Structured(structured), export.content_type),
    };

    FuzzRequest::from_record(RequestRecord {
        method: Some(export.method.unwrap_or_else(|| "GET".to_string())),
        url: Some(url),
        query,
        headers: parse_header_block(&export.headers),
        cookies: parse_cookies(&export.cookies),
        body,
        content_type,
    })
}

/// Split a raw header block on the first ':' of each line
pub fn parse_header_block(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
