// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Request Model
 * Normalized, strongly typed request handed to the mutation engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;
use xmltree::Element;

use crate::errors::{MutatorError, MutatorResult};

/// Part of a request the engine mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Query,
    Body,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Query => write!(f, "query"),
            Section::Body => write!(f, "body"),
        }
    }
}

/// Request body after content-type normalization
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Map, sequence or scalar
    Structured(Value),
    /// Parsed markup document
    Xml(Element),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

/// Loosely typed request as produced by the input loaders
#[derive(Debug, Clone, Default)]
pub struct RequestRecord {
    pub method: Option<String>,
    pub url: Option<String>,
    pub query: Map<String, Value>,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub body: Body,
    pub content_type: String,
}

/// One normalized request. Cloning yields an independent working copy
/// with no shared query or body containers.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzRequest {
    pub method: Method,
    pub url: Url,
    pub query: Map<String, Value>,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub body: Body,
    pub content_type: String,
}

impl FuzzRequest {
    /// Validate a loose record. Method and URL are required.
    pub fn from_record(record: RequestRecord) -> MutatorResult<Self> {
        let method = record
            .method
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| schema_error("method"))?;
        let method = Method::from_bytes(method.trim().to_uppercase().as_bytes())
            .map_err(|_| schema_error("method"))?;

        let url = record
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| schema_error("url"))?;
        let url = Url::parse(url.trim()).map_err(|_| schema_error("url"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(schema_error("url"));
        }

        Ok(Self {
            method,
            url,
            query: record.query,
            headers: record.headers,
            cookies: record.cookies,
            body: record.body,
            content_type: record.content_type,
        })
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace an existing header (case-insensitive) or append it
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Merge header overrides into this request, overriding existing values
    pub fn merge_headers(&mut self, overrides: &BTreeMap<String, String>) {
        for (name, value) in overrides {
            self.set_header(name, value);
        }
    }

    /// Whether the body goes on the wire as a structured document
    pub fn wants_json(&self) -> bool {
        let declared = self.content_type.to_ascii_lowercase();
        let header = self
            .header("Content-Type")
            .unwrap_or("")
            .to_ascii_lowercase();
        declared.contains("json") || header.contains("json")
    }

    /// Cookie header value, if any cookies are set
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Parse a raw `a=b; c=d` cookie string
pub fn parse_cookies(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let pair = pair.trim();
            if pair.is_empty() {
                return None;
            }
            match pair.split_once('=') {
                Some((name, value)) => Some((name.trim().to_string(), value.trim().to_string())),
                None => Some((pair.to_string(), String::new())),
            }
        })
        .collect()
}

fn schema_error(field: &str) -> MutatorError {
    MutatorError::Schema {
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> RequestRecord {
        RequestRecord {
            method: Some("post".to_string()),
            url: Some("https://example.com/api".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_record() {
        let request = FuzzRequest::from_record(record()).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.as_str(), "https://example.com/api");
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_missing_method_is_schema_error() {
        let mut rec = record();
        rec.method = None;
        let err = FuzzRequest::from_record(rec).unwrap_err();
        assert!(matches!(err, MutatorError::Schema { ref field } if field == "method"));
    }

    #[test]
    fn test_missing_url_is_schema_error() {
        let mut rec = record();
        rec.url = Some("   ".to_string());
        let err = FuzzRequest::from_record(rec).unwrap_err();
        assert!(matches!(err, MutatorError::Schema { ref field } if field == "url"));

        let mut rec = record();
        rec.url = Some("ftp://example.com/".to_string());
        assert!(FuzzRequest::from_record(rec).is_err());
    }

    #[test]
    fn test_clone_does_not_alias() {
        let mut rec = record();
        rec.body = Body::Structured(json!({"id": "5"}));
        let original = FuzzRequest::from_record(rec).unwrap();

        let mut copy = original.clone();
        if let Body::Structured(Value::Object(map)) = &mut copy.body {
            map.insert("id".to_string(), json!("6"));
        }
        assert_eq!(original.body, Body::Structured(json!({"id": "5"})));
    }

    #[test]
    fn test_header_merge_is_case_insensitive() {
        let mut rec = record();
        rec.headers = vec![("content-type".to_string(), "text/plain".to_string())];
        let mut request = FuzzRequest::from_record(rec).unwrap();

        let mut overrides = BTreeMap::new();
        overrides.insert("Content-Type".to_string(), "application/json".to_string());
        overrides.insert("X-Api-Key".to_string(), "k".to_string());
        request.merge_headers(&overrides);

        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.header("CONTENT-TYPE"), Some("application/json"));
        assert!(request.wants_json());
    }

    #[test]
    fn test_cookies() {
        let cookies = parse_cookies("session=abc; theme=dark;  flag");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[2], ("flag".to_string(), String::new()));

        let mut rec = record();
        rec.cookies = vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())];
        let request = FuzzRequest::from_record(rec).unwrap();
        assert_eq!(request.cookie_header(), Some("a=1; b=2".to_string()));
    }
}
