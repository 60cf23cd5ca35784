// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Campaign Runner Tests
 * End-to-end runs against a scripted dispatcher
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use lonkero_mutator::http_client::Dispatcher;
use lonkero_mutator::modifiers::{Modifier, ModifierCatalog};
use lonkero_mutator::reporting::{MemoryReporter, Outcome, ReportEvent};
use lonkero_mutator::request::{Body, FuzzRequest, RequestRecord, Section};
use lonkero_mutator::runner::{Campaign, Decision, InterruptSource};
use lonkero_mutator::DispatchError;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use xmltree::Element;

/// Records every request; fails or hangs on scripted call numbers
#[derive(Default)]
struct ScriptedDispatcher {
    sent: Mutex<Vec<FuzzRequest>>,
    fail_on: Vec<usize>,
    hang_on: Option<usize>,
    hung: Arc<Notify>,
}

impl ScriptedDispatcher {
    fn sent(&self) -> Vec<FuzzRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Dispatcher for ScriptedDispatcher {
    async fn send(&self, request: &FuzzRequest) -> Result<u16, DispatchError> {
        let call = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(request.clone());
            sent.len()
        };

        if self.hang_on == Some(call) {
            self.hung.notify_one();
            std::future::pending::<()>().await;
        }
        if self.fail_on.contains(&call) {
            return Err(DispatchError::Connection {
                url: request.url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(200)
    }
}

/// Interrupts once the dispatcher reports a hung call
struct OperatorAt {
    hung: Arc<Notify>,
    decision: Decision,
}

#[async_trait::async_trait]
impl InterruptSource for OperatorAt {
    async fn signalled(&self) {
        self.hung.notified().await
    }

    async fn decide(&self) -> Decision {
        self.decision
    }
}

/// Answers every request after 50ms
#[derive(Default)]
struct SlowDispatcher {
    sent: AtomicUsize,
}

#[async_trait::async_trait]
impl Dispatcher for SlowDispatcher {
    async fn send(&self, _request: &FuzzRequest) -> Result<u16, DispatchError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(200)
    }
}

/// Interrupts the first dispatch after 10ms and takes 100ms to answer
struct SlowOperator {
    fired: AtomicBool,
    prompted: AtomicUsize,
    decision: Decision,
}

#[async_trait::async_trait]
impl InterruptSource for SlowOperator {
    async fn signalled(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    async fn decide(&self) -> Decision {
        self.prompted.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.decision
    }
}

fn request(query: Value, body: Body) -> FuzzRequest {
    FuzzRequest::from_record(RequestRecord {
        method: Some("POST".to_string()),
        url: Some("http://localhost/api".to_string()),
        query: query.as_object().cloned().unwrap_or_default(),
        body,
        content_type: "application/json".to_string(),
        ..Default::default()
    })
    .unwrap()
}

fn literal_catalog(value: &str) -> Arc<ModifierCatalog> {
    Arc::new(ModifierCatalog::new(vec![Modifier::literal("x", json!(value))]))
}

fn xml_body(xml: &str) -> Body {
    Body::Xml(Element::parse(xml.as_bytes()).unwrap())
}

#[tokio::test]
async fn test_xml_leaf_dispatched_once() {
    let dispatcher = Arc::new(ScriptedDispatcher::default());
    let reporter = Arc::new(MemoryReporter::new());
    let campaign = Campaign::new(literal_catalog("X"), dispatcher.clone(), reporter.clone());

    let summary = campaign
        .run(vec![request(json!({}), xml_body("<root><id>5</id></root>"))])
        .await;

    assert_eq!(summary.variants_dispatched, 1);
    let sent = dispatcher.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, xml_body("<root><id>X</id></root>"));

    let variants = reporter.variants();
    assert_eq!(variants[0].before, "<root><id>5</id></root>");
    assert_eq!(variants[0].now, "<root><id>X</id></root>");
    assert_eq!(variants[0].field, "root/id");
}

#[tokio::test]
async fn test_query_then_body_and_before_now_lines() {
    let dispatcher = Arc::new(ScriptedDispatcher::default());
    let reporter = Arc::new(MemoryReporter::new());
    let campaign = Campaign::new(literal_catalog("X"), dispatcher.clone(), reporter.clone());

    let original = request(json!({"q": "1"}), Body::Structured(json!({"id": "5"})));
    let summary = campaign.run(vec![original.clone()]).await;

    assert_eq!(summary.requests, 1);
    assert_eq!(summary.variants_dispatched, 2);

    let variants = reporter.variants();
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].section, Section::Query);
    assert_eq!(variants[0].before, r#"{"q":"1"}"#);
    assert_eq!(variants[0].now, r#"{"q":"X"}"#);
    assert_eq!(variants[1].section, Section::Body);
    assert_eq!(variants[1].now, r#"{"id":"X"}"#);

    // the other section is untouched in every variant
    let sent = dispatcher.sent();
    assert_eq!(sent[0].body, original.body);
    assert_eq!(sent[1].query, original.query);
}

#[tokio::test]
async fn test_dispatch_failures_do_not_stop_the_sequence() {
    let dispatcher = Arc::new(ScriptedDispatcher {
        fail_on: vec![1],
        ..Default::default()
    });
    let reporter = Arc::new(MemoryReporter::new());
    let campaign = Campaign::new(literal_catalog("X"), dispatcher.clone(), reporter.clone());

    let summary = campaign
        .run(vec![request(json!({"a": "1", "b": "2"}), Body::Empty)])
        .await;

    assert_eq!(summary.variants_failed, 1);
    assert_eq!(summary.variants_dispatched, 1);
    assert_eq!(
        reporter.outcomes(),
        vec![
            Outcome::Failed(
                "Connection to http://localhost/api failed: connection refused".to_string()
            ),
            Outcome::Status(200),
        ]
    );
}

#[tokio::test]
async fn test_header_overrides_are_merged() {
    let dispatcher = Arc::new(ScriptedDispatcher::default());
    let reporter = Arc::new(MemoryReporter::new());

    let mut overrides = BTreeMap::new();
    overrides.insert("Authorization".to_string(), "Bearer t".to_string());
    let campaign = Campaign::new(literal_catalog("X"), dispatcher.clone(), reporter.clone())
        .with_header_overrides(overrides);

    campaign
        .run(vec![request(json!({"a": "1"}), Body::Empty)])
        .await;

    let sent = dispatcher.sent();
    assert_eq!(sent[0].header("authorization"), Some("Bearer t"));
}

#[tokio::test]
async fn test_too_deep_section_is_skipped_and_run_continues() {
    let mut deep = json!("leaf");
    for _ in 0..10 {
        deep = json!({ "n": deep });
    }

    let dispatcher = Arc::new(ScriptedDispatcher::default());
    let reporter = Arc::new(MemoryReporter::new());
    let campaign = Campaign::new(literal_catalog("X"), dispatcher.clone(), reporter.clone())
        .with_max_depth(4);

    let summary = campaign
        .run(vec![request(json!({"q": "1"}), Body::Structured(deep))])
        .await;

    assert_eq!(summary.sections_skipped, 1);
    assert_eq!(summary.variants_dispatched, 1);
    assert!(reporter
        .events()
        .iter()
        .any(|event| matches!(event, ReportEvent::Skipped(Section::Body, _))));
}

#[tokio::test]
async fn test_skip_abandons_current_request_only() {
    let hung = Arc::new(Notify::new());
    let dispatcher = Arc::new(ScriptedDispatcher {
        hang_on: Some(1),
        hung: Arc::clone(&hung),
        ..Default::default()
    });
    let reporter = Arc::new(MemoryReporter::new());
    let campaign = Campaign::new(literal_catalog("X"), dispatcher.clone(), reporter.clone())
        .with_interrupt(Arc::new(OperatorAt {
            hung,
            decision: Decision::Skip,
        }));

    let summary = campaign
        .run(vec![
            request(json!({"a": "1", "b": "2"}), Body::Empty),
            request(json!({"c": "3", "d": "4"}), Body::Empty),
        ])
        .await;

    assert_eq!(summary.requests, 2);
    assert_eq!(summary.requests_skipped, 1);
    assert_eq!(summary.variants_dispatched, 2);
    assert!(!summary.exited);

    let sent = dispatcher.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent[1].query.contains_key("c"));
}

#[tokio::test]
async fn test_exit_stops_the_run() {
    let hung = Arc::new(Notify::new());
    let dispatcher = Arc::new(ScriptedDispatcher {
        hang_on: Some(2),
        hung: Arc::clone(&hung),
        ..Default::default()
    });
    let reporter = Arc::new(MemoryReporter::new());
    let campaign = Campaign::new(literal_catalog("X"), dispatcher.clone(), reporter.clone())
        .with_interrupt(Arc::new(OperatorAt {
            hung,
            decision: Decision::Exit,
        }));

    let summary = campaign
        .run(vec![
            request(json!({"a": "1", "b": "2"}), Body::Empty),
            request(json!({"c": "3"}), Body::Empty),
        ])
        .await;

    assert!(summary.exited);
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.variants_dispatched, 1);
    assert_eq!(dispatcher.sent().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_answer_is_honored_after_dispatch_would_finish() {
    let dispatcher = Arc::new(SlowDispatcher::default());
    let operator = Arc::new(SlowOperator {
        fired: AtomicBool::new(false),
        prompted: AtomicUsize::new(0),
        decision: Decision::Exit,
    });
    let reporter = Arc::new(MemoryReporter::new());
    let campaign = Campaign::new(literal_catalog("X"), dispatcher.clone(), reporter.clone())
        .with_interrupt(operator.clone());

    let summary = campaign
        .run(vec![
            request(json!({"a": "1", "b": "2", "c": "3"}), Body::Empty),
            request(json!({"d": "4"}), Body::Empty),
        ])
        .await;

    assert!(summary.exited);
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.variants_dispatched, 0);
    assert_eq!(operator.prompted.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.sent.load(Ordering::SeqCst), 1);
    assert!(reporter.outcomes().is_empty());
}

#[tokio::test]
async fn test_nested_body_variants_differ_in_one_slot() {
    let dispatcher = Arc::new(ScriptedDispatcher::default());
    let reporter = Arc::new(MemoryReporter::new());
    let campaign = Campaign::new(
        Arc::new(ModifierCatalog::builtin()),
        dispatcher.clone(),
        reporter.clone(),
    );

    let body = json!({
        "user": {"id": "5", "tags": ["a", 7]},
        "price": "9.99",
        "active": true
    });
    let summary = campaign
        .run(vec![request(json!({}), Body::Structured(body.clone()))])
        .await;

    let sent = dispatcher.sent();
    assert!(!sent.is_empty());
    assert_eq!(summary.variants_dispatched, sent.len());
    assert_eq!(reporter.variants().len(), sent.len());

    for variant in &sent {
        let Body::Structured(mutated) = &variant.body else {
            panic!("body lost its structure");
        };
        assert_eq!(changed_slots(&body, mutated), 1, "{}", mutated);
    }
}

/// Leaves or keys that differ between two documents
fn changed_slots(before: &Value, after: &Value) -> usize {
    match (before, after) {
        (Value::Object(a), Value::Object(b)) => {
            let renamed = a.keys().filter(|key| !b.contains_key(*key)).count();
            let changed: usize = a
                .iter()
                .filter_map(|(key, value)| b.get(key).map(|other| changed_slots(value, other)))
                .sum();
            renamed + changed
        }
        (Value::Array(a), Value::Array(b)) if a.len() == b.len() => a
            .iter()
            .zip(b)
            .map(|(x, y)| changed_slots(x, y))
            .sum(),
        (a, b) => usize::from(a != b),
    }
}
