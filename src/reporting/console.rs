// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::io::Write;
use tracing::{debug, error, warn};

use super::types::{Outcome, VariantReport};
use super::Reporter;
use crate::errors::MutatorError;
use crate::request::{FuzzRequest, Section};

/// Writes the per-variant lines to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        // A closed stdout must not abort the run
        let _ = writeln!(handle, "{}", line);
    }
}

impl Reporter for ConsoleReporter {
    fn request_started(&self, request: &FuzzRequest) {
        let line = format!("Currently testing: {}", request.describe());
        debug!("{}", line);
        self.emit(&line);
    }

    fn variant(&self, report: &VariantReport) {
        debug!(
            "Mutated {} field '{}' with {}",
            report.section, report.field, report.modifier
        );
        self.emit(&format!("Before: {}. Now: {}", report.before, report.now));
    }

    fn outcome(&self, _report: &VariantReport, outcome: &Outcome) {
        debug!("{}", outcome);
        self.emit(&outcome.to_string());
    }

    fn section_skipped(&self, request: &FuzzRequest, section: Section, error: &MutatorError) {
        warn!("Skipping {} of {}: {}", section, request.describe(), error);
    }

    fn section_aborted(
        &self,
        request: &FuzzRequest,
        section: Section,
        sent: usize,
        error: &MutatorError,
    ) {
        error!(
            "Aborted {} of {} after {} variants: {}",
            section,
            request.describe(),
            sent,
            error
        );
    }
}
