// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde_json::{Map, Value};
use xmltree::Element;

use crate::errors::{MutatorError, MutatorResult};
use crate::request::{Body, Section};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XML_CONTENT_TYPE: &str = "application/xml";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Encoding of a raw parameter string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Xml,
    Form,
}

impl ContentKind {
    /// Sniff the encoding: JSON first, then XML, form otherwise
    pub fn detect(raw: &str) -> Self {
        if serde_json::from_str::<Value>(raw).is_ok() {
            ContentKind::Json
        } else if Element::parse(raw.as_bytes()).is_ok() {
            ContentKind::Xml
        } else {
            ContentKind::Form
        }
    }

    pub fn from_content_type(content_type: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("json") {
            ContentKind::Json
        } else if content_type.contains("xml") {
            ContentKind::Xml
        } else {
            ContentKind::Form
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ContentKind::Json => JSON_CONTENT_TYPE,
            ContentKind::Xml => XML_CONTENT_TYPE,
            ContentKind::Form => FORM_CONTENT_TYPE,
        }
    }
}

/// Parsed parameters plus the content type they were parsed as
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub body: Body,
    pub content_type: String,
}

/// Parse a raw query string or body.
///
/// The detected encoding wins over `declared`; the declared content type is
/// kept only when it agrees with what the payload actually is.
pub fn normalize_params(raw: &str, declared: &str, section: Section) -> MutatorResult<Normalized> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Normalized {
            body: Body::Empty,
            content_type: declared.to_string(),
        });
    }

    let detected = ContentKind::detect(raw);
    let content_type = if ContentKind::from_content_type(declared) == detected && !declared.is_empty()
    {
        declared.to_string()
    } else {
        detected.mime().to_string()
    };

    let body = match detected {
        ContentKind::Json => Body::Structured(serde_json::from_str(raw)?),
        ContentKind::Xml => Body::Xml(Element::parse(raw.as_bytes()).map_err(|e| {
            MutatorError::Normalize {
                section,
                reason: e.to_string(),
            }
        })?),
        ContentKind::Form => Body::Structured(Value::Object(parse_form(raw, section)?)),
    };

    Ok(Normalized { body, content_type })
}

/// Normalize a query string into a parameter map
pub fn normalize_query(raw: &str) -> MutatorResult<Map<String, Value>> {
    match normalize_params(raw, FORM_CONTENT_TYPE, Section::Query)?.body {
        Body::Empty => Ok(Map::new()),
        Body::Structured(Value::Object(map)) => Ok(map),
        _ => Err(MutatorError::Normalize {
            section: Section::Query,
            reason: "query string is not a parameter map".to_string(),
        }),
    }
}

/// Strict form decoding: every non-empty segment needs a '='
fn parse_form(raw: &str, section: Section) -> MutatorResult<Map<String, Value>> {
    let mut params = Map::new();

    for segment in raw.split('&').filter(|s| !s.is_empty()) {
        if !segment.contains('=') {
            return Err(MutatorError::Normalize {
                section,
                reason: format!("segment '{}' has no '='", segment),
            });
        }

        for (key, value) in url::form_urlencoded::parse(segment.as_bytes()) {
            insert_param(&mut params, key.into_owned(), value.into_owned());
        }
    }

    Ok(params)
}

/// Insert a decoded pair; a repeated key turns into a sequence
pub(crate) fn insert_param(params: &mut Map<String, Value>, key: String, value: String) {
    match params.get_mut(&key) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            params.insert(key, Value::String(value));
        }
    }
}
