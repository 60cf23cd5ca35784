// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Dispatcher
 * Sends one mutated request variant and reports the response status
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::errors::DispatchError;
use crate::mutation::classify::stringify;
use crate::request::{Body, FuzzRequest};
use crate::xml_mutator;

const DEFAULT_USER_AGENT: &str = concat!("lonkero-mutator/", env!("CARGO_PKG_VERSION"));

/// Framing headers describe the recorded body, not the mutated one.
/// reqwest sets them from the body actually sent.
const FRAMING_HEADERS: [&str; 3] = ["content-length", "transfer-encoding", "connection"];

/// Boundary between the engine and the network
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send one request and return the response status code
    async fn send(&self, request: &FuzzRequest) -> Result<u16, DispatchError>;
}

#[derive(Clone)]
pub struct HttpDispatcher {
    client: Arc<Client>,
    timeout: Duration,
}

impl HttpDispatcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Self::with_config(&HttpConfig {
            timeout_secs,
            ..HttpConfig::default()
        })
    }

    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        if config.accept_invalid_certs {
            eprintln!("\n========================================");
            eprintln!("WARNING: INSECURE MODE ENABLED!");
            eprintln!("========================================");
            eprintln!("Certificate validation is DISABLED!");
            eprintln!("Traffic to the target can be intercepted (MITM).");
            eprintln!("Only use this against self-signed test targets.");
            eprintln!("========================================\n");
        }

        let redirect_policy = if config.follow_redirects {
            reqwest::redirect::Policy::limited(config.max_redirects)
        } else {
            reqwest::redirect::Policy::none()
        };

        let mut client_builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(redirect_policy)
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .tcp_nodelay(true);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("Invalid proxy URL: {}", proxy))?;
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn build(&self, request: &FuzzRequest) -> Result<reqwest::RequestBuilder, DispatchError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        if !request.query.is_empty() {
            builder = builder.query(&flatten(&request.query));
        }

        for (name, value) in &request.headers {
            if is_framing_header(name) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(cookies) = request.cookie_header() {
            builder = builder.header(COOKIE, cookies);
        }

        builder = match &request.body {
            Body::Empty => builder,
            Body::Xml(root) => {
                let payload = xml_mutator::serialize(root).map_err(|e| {
                    DispatchError::InvalidRequest {
                        reason: e.to_string(),
                    }
                })?;
                with_content_type(builder, request, "application/xml").body(payload)
            }
            Body::Structured(value) if request.wants_json() => {
                let payload = serde_json::to_vec(value).map_err(|e| {
                    DispatchError::InvalidRequest {
                        reason: e.to_string(),
                    }
                })?;
                with_content_type(builder, request, "application/json").body(payload)
            }
            Body::Structured(value) => {
                // Only maps have a form encoding; anything else goes as its text form
                let encoded = match value {
                    Value::Object(map) => url::form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(flatten(map))
                        .finish(),
                    other => stringify(other),
                };
                with_content_type(builder, request, "application/x-www-form-urlencoded")
                    .body(encoded)
            }
        };

        Ok(builder)
    }

    fn classify_error(&self, err: reqwest::Error) -> DispatchError {
        match DispatchError::from(err) {
            DispatchError::Timeout { url, .. } => DispatchError::Timeout {
                url,
                timeout: self.timeout,
            },
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl Dispatcher for HttpDispatcher {
    async fn send(&self, request: &FuzzRequest) -> Result<u16, DispatchError> {
        let builder = self.build(request)?;

        debug!("Dispatching {}", request.describe());

        let response = builder.send().await.map_err(|e| self.classify_error(e))?;
        let status_code = response.status().as_u16();

        // Drain the body so the connection can be reused
        let _ = response.bytes().await;

        Ok(status_code)
    }
}

/// Only set a Content-Type when the request does not carry one
fn with_content_type(
    builder: reqwest::RequestBuilder,
    request: &FuzzRequest,
    fallback: &str,
) -> reqwest::RequestBuilder {
    if request.header("Content-Type").is_some() {
        return builder;
    }
    let content_type = if request.content_type.is_empty() {
        fallback
    } else {
        request.content_type.as_str()
    };
    builder.header(CONTENT_TYPE, content_type)
}

/// Flatten a parameter map into wire pairs. Sequences become repeated keys.
pub fn flatten(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), stringify(item)));
                }
            }
            other => pairs.push((key.clone(), stringify(other))),
        }
    }
    pairs
}

fn is_framing_header(name: &str) -> bool {
    FRAMING_HEADERS
        .iter()
        .any(|framing| name.eq_ignore_ascii_case(framing))
}
