// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod console;
pub mod types;

pub use console::ConsoleReporter;
pub use types::{Outcome, VariantReport};

use std::sync::Mutex;

use crate::errors::MutatorError;
use crate::request::{FuzzRequest, Section};

/// Sink for the observable output of a run
pub trait Reporter: Send + Sync {
    fn request_started(&self, request: &FuzzRequest);

    /// Called before the variant is dispatched
    fn variant(&self, report: &VariantReport);

    fn outcome(&self, report: &VariantReport, outcome: &Outcome);

    /// A section could not be traversed; the run continues without it
    fn section_skipped(&self, request: &FuzzRequest, section: Section, error: &MutatorError);

    /// A section failed after `sent` of its variants were already dispatched
    fn section_aborted(
        &self,
        request: &FuzzRequest,
        section: Section,
        sent: usize,
        error: &MutatorError,
    );
}

/// Event recorded by [`MemoryReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Started(String),
    Variant(VariantReport),
    Outcome(VariantReport, Outcome),
    Skipped(Section, String),
    Aborted(Section, usize, String),
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Variants in the order they were reported
    pub fn variants(&self) -> Vec<VariantReport> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Variant(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Outcome(_, outcome) => Some(outcome),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Reporter for MemoryReporter {
    fn request_started(&self, request: &FuzzRequest) {
        self.record(ReportEvent::Started(request.describe()));
    }

    fn variant(&self, report: &VariantReport) {
        self.record(ReportEvent::Variant(report.clone()));
    }

    fn outcome(&self, report: &VariantReport, outcome: &Outcome) {
        self.record(ReportEvent::Outcome(report.clone(), outcome.clone()));
    }

    fn section_skipped(&self, _request: &FuzzRequest, section: Section, error: &MutatorError) {
        self.record(ReportEvent::Skipped(section, error.to_string()));
    }

    fn section_aborted(
        &self,
        _request: &FuzzRequest,
        section: Section,
        sent: usize,
        error: &MutatorError,
    ) {
        self.record(ReportEvent::Aborted(section, sent, error.to_string()));
    }
}
