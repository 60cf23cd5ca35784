// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Campaign Runner
 * Sequential mutate → dispatch → restore loop over a batch of requests
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::errors::MutatorError;
use crate::http_client::Dispatcher;
use crate::modifiers::ModifierCatalog;
use crate::mutation::MutationEngine;
use crate::reporting::{Outcome, Reporter, VariantReport};
use crate::request::{Body, FuzzRequest, Section};
use crate::xml_mutator::{self, XmlMutator};

/// Operator choice after an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Abandon the remaining variants of the current request
    Skip,
    /// Stop the whole run
    Exit,
}

/// Source of operator interrupts.
///
/// Only `signalled` is raced against a dispatch in flight. Once it wins,
/// `decide` is awaited to completion so the answer is never lost.
#[async_trait::async_trait]
pub trait InterruptSource: Send + Sync {
    /// Resolves once the operator has interrupted
    async fn signalled(&self);

    /// What to do about the interrupt that was just signalled
    async fn decide(&self) -> Decision;
}

/// Never interrupts
#[derive(Debug, Default)]
pub struct NoInterrupt;

#[async_trait::async_trait]
impl InterruptSource for NoInterrupt {
    async fn signalled(&self) {
        std::future::pending().await
    }

    async fn decide(&self) -> Decision {
        Decision::Skip
    }
}

/// Ctrl+C followed by a prompt on stdin
///
/// A single listener runs for the whole process. A Ctrl+C that arrives
/// between two dispatches is kept and interrupts the next one.
#[derive(Debug, Clone)]
pub struct CtrlCInterrupt {
    pending: Arc<Notify>,
}

impl CtrlCInterrupt {
    /// Start listening for Ctrl+C. Must be called from within a tokio runtime.
    pub fn install() -> Self {
        let pending = Arc::new(Notify::new());
        let notify = Arc::clone(&pending);

        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Cannot listen for Ctrl+C: {}", e);
                    return;
                }
                notify.notify_one();
            }
        });

        Self { pending }
    }
}

#[async_trait::async_trait]
impl InterruptSource for CtrlCInterrupt {
    async fn signalled(&self) {
        self.pending.notified().await
    }

    async fn decide(&self) -> Decision {
        let mut stdout = tokio::io::stdout();
        let _ = stdout
            .write_all(b"\nSkip current request (S), Exit (E): ")
            .await;
        let _ = stdout.flush().await;

        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        if stdin.read_line(&mut answer).await.is_err() {
            return Decision::Skip;
        }

        parse_decision(&answer)
    }
}

/// `E` exits; any other answer skips
pub fn parse_decision(answer: &str) -> Decision {
    if answer.trim() == "E" {
        Decision::Exit
    } else {
        Decision::Skip
    }
}

/// Counters for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub requests: usize,
    pub variants_dispatched: usize,
    pub variants_failed: usize,
    pub sections_skipped: usize,
    pub sections_aborted: usize,
    pub requests_skipped: usize,
    pub exited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    SkipRequest,
    Exit,
}

/// A section that stopped with an error after `sent` variants went out
#[derive(Debug)]
struct SectionFailure {
    error: MutatorError,
    sent: usize,
}

impl From<MutatorError> for SectionFailure {
    fn from(error: MutatorError) -> Self {
        Self { error, sent: 0 }
    }
}

pub struct Campaign {
    engine: MutationEngine,
    xml: XmlMutator,
    dispatcher: Arc<dyn Dispatcher>,
    reporter: Arc<dyn Reporter>,
    interrupt: Arc<dyn InterruptSource>,
    header_overrides: BTreeMap<String, String>,
}

impl Campaign {
    pub fn new(
        catalog: Arc<ModifierCatalog>,
        dispatcher: Arc<dyn Dispatcher>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            engine: MutationEngine::new(Arc::clone(&catalog)),
            xml: XmlMutator::new(catalog),
            dispatcher,
            reporter,
            interrupt: Arc::new(NoInterrupt),
            header_overrides: BTreeMap::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.engine = self.engine.with_max_depth(max_depth);
        self
    }

    pub fn with_header_overrides(mut self, headers: BTreeMap<String, String>) -> Self {
        self.header_overrides = headers;
        self
    }

    pub fn with_interrupt(mut self, interrupt: Arc<dyn InterruptSource>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Run every request in order: query section first, then body
    pub async fn run(&self, requests: Vec<FuzzRequest>) -> RunSummary {
        let mut summary = RunSummary::default();

        for mut request in requests {
            summary.requests += 1;
            request.merge_headers(&self.header_overrides);
            self.reporter.request_started(&request);

            match self.run_request(&request, &mut summary).await {
                Flow::Continue => {}
                Flow::SkipRequest => {
                    info!("Skipped remaining variants of {}", request.describe());
                    summary.requests_skipped += 1;
                }
                Flow::Exit => {
                    info!("Run stopped by operator");
                    summary.exited = true;
                    break;
                }
            }
        }

        summary
    }

    async fn run_request(&self, request: &FuzzRequest, summary: &mut RunSummary) -> Flow {
        for section in [Section::Query, Section::Body] {
            let result = match (section, &request.body) {
                (Section::Body, Body::Xml(_)) => self.run_xml(request, summary).await,
                _ => self.run_structured(request, section, summary).await,
            };

            match result {
                Ok(Flow::Continue) => {}
                Ok(flow) => return flow,
                Err(failure) => self.record_failure(request, section, failure, summary),
            }
        }

        Flow::Continue
    }

    /// Sections that never dispatched are skipped; the others were aborted
    fn record_failure(
        &self,
        request: &FuzzRequest,
        section: Section,
        failure: SectionFailure,
        summary: &mut RunSummary,
    ) {
        if failure.sent == 0 {
            summary.sections_skipped += 1;
            self.reporter.section_skipped(request, section, &failure.error);
        } else {
            summary.sections_aborted += 1;
            self.reporter
                .section_aborted(request, section, failure.sent, &failure.error);
        }
    }

    async fn run_structured(
        &self,
        original: &FuzzRequest,
        section: Section,
        summary: &mut RunSummary,
    ) -> Result<Flow, SectionFailure> {
        let mut cursor = self.engine.cursor(original, section)?;
        let before = render_section(original, section);
        let mut sent = 0;

        while let Some(step) = cursor.next_variant() {
            let (mutation, variant) = step.map_err(|error| SectionFailure { error, sent })?;
            let report = VariantReport {
                section,
                field: mutation.field(),
                modifier: self.modifier_label(mutation.modifier),
                before: before.clone(),
                now: render_section(&variant, section),
            };

            let flow = self.dispatch(&variant, &report, summary).await;
            sent += 1;
            variant
                .restore()
                .map_err(|error| SectionFailure { error, sent })?;

            if flow != Flow::Continue {
                return Ok(flow);
            }
        }

        Ok(Flow::Continue)
    }

    async fn run_xml(
        &self,
        original: &FuzzRequest,
        summary: &mut RunSummary,
    ) -> Result<Flow, SectionFailure> {
        let Some(mut cursor) = self.xml.cursor(original) else {
            return Ok(Flow::Continue);
        };
        let before = render_section(original, Section::Body);
        let mut sent = 0;

        while let Some(step) = cursor.next_variant() {
            let (mutation, variant) = step.map_err(|error| SectionFailure { error, sent })?;
            let report = VariantReport {
                section: Section::Body,
                field: mutation.field(),
                modifier: self.modifier_label(mutation.modifier),
                before: before.clone(),
                now: render_section(&variant, Section::Body),
            };

            let flow = self.dispatch(&variant, &report, summary).await;
            sent += 1;
            variant
                .restore()
                .map_err(|error| SectionFailure { error, sent })?;

            if flow != Flow::Continue {
                return Ok(flow);
            }
        }

        Ok(Flow::Continue)
    }

    /// Send one variant; an operator interrupt abandons the call in flight
    async fn dispatch(
        &self,
        variant: &FuzzRequest,
        report: &VariantReport,
        summary: &mut RunSummary,
    ) -> Flow {
        self.reporter.variant(report);

        let signalled = tokio::select! {
            biased;
            _ = self.interrupt.signalled() => true,
            result = self.dispatcher.send(variant) => {
                let outcome = match result {
                    Ok(status_code) => {
                        summary.variants_dispatched += 1;
                        Outcome::Status(status_code)
                    }
                    Err(e) => {
                        summary.variants_failed += 1;
                        Outcome::Failed(e.to_string())
                    }
                };
                self.reporter.outcome(report, &outcome);
                false
            }
        };

        if !signalled {
            return Flow::Continue;
        }

        // The call in flight is already abandoned; wait for the answer
        match self.interrupt.decide().await {
            Decision::Skip => Flow::SkipRequest,
            Decision::Exit => Flow::Exit,
        }
    }

    fn modifier_label(&self, index: usize) -> String {
        self.engine
            .catalog()
            .get(index)
            .map(|modifier| modifier.label.clone())
            .unwrap_or_else(|| format!("#{}", index))
    }
}

/// Text rendering of a section for the Before/Now lines
pub fn render_section(request: &FuzzRequest, section: Section) -> String {
    match section {
        Section::Query => Value::Object(request.query.clone()).to_string(),
        Section::Body => match &request.body {
            Body::Empty => String::new(),
            Body::Structured(value) => value.to_string(),
            Body::Xml(root) => xml_mutator::serialize(root)
                .unwrap_or_else(|e| format!("<unserializable: {}>", e)),
        },
    }
}
