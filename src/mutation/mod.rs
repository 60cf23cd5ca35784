// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Mutation Engine
 * Exhaustive single-leaf mutation of query maps and structured bodies
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

pub mod apply;
pub mod classify;
pub mod plan;

pub use apply::{apply, lookup, Applied, AppliedMutation, Undo};
pub use classify::{classify, DataType};
pub use plan::{Mutation, MutationPlan, PathSegment};

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{MutatorError, MutatorResult};
use crate::modifiers::ModifierCatalog;
use crate::request::{Body, FuzzRequest, Section};

/// Default bound on structural nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Drives the modifier catalog over query maps and structured bodies
#[derive(Debug, Clone)]
pub struct MutationEngine {
    catalog: Arc<ModifierCatalog>,
    max_depth: usize,
}

impl MutationEngine {
    pub fn new(catalog: Arc<ModifierCatalog>) -> Self {
        Self {
            catalog,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn catalog(&self) -> &ModifierCatalog {
        &self.catalog
    }

    /// Reject sections nested deeper than the configured bound
    pub fn check_structure(&self, request: &FuzzRequest, section: Section) -> MutatorResult<()> {
        let mut pending: Vec<(&Value, usize)> = Self::roots(request, section)
            .into_iter()
            .map(|(_, value)| (value, 1))
            .collect();

        while let Some((value, depth)) = pending.pop() {
            if depth > self.max_depth {
                return Err(MutatorError::Structure {
                    reason: format!(
                        "{} of {} nests deeper than {} levels",
                        section,
                        request.describe(),
                        self.max_depth
                    ),
                });
            }
            match value {
                Value::Object(map) => pending.extend(map.values().map(|v| (v, depth + 1))),
                Value::Array(items) => pending.extend(items.iter().map(|v| (v, depth + 1))),
                _ => {}
            }
        }

        Ok(())
    }

    /// Lazy plan over every top-level slot of a section
    pub fn plan<'a>(
        &'a self,
        request: &'a FuzzRequest,
        section: Section,
    ) -> MutatorResult<MutationPlan<'a>> {
        self.check_structure(request, section)?;
        Ok(MutationPlan::new(
            &self.catalog,
            section,
            Self::roots(request, section),
        ))
    }

    /// Variant cursor over a section of `original`
    pub fn cursor<'a>(
        &'a self,
        original: &'a FuzzRequest,
        section: Section,
    ) -> MutatorResult<VariantCursor<'a>> {
        Ok(VariantCursor {
            original,
            section,
            plan: self.plan(original, section)?,
            working: original.clone(),
            current_slot: None,
        })
    }

    fn roots(request: &FuzzRequest, section: Section) -> Vec<(PathSegment, &Value)> {
        match section {
            Section::Query => request
                .query
                .iter()
                .map(|(key, value)| (PathSegment::Key(key.clone()), value))
                .collect(),
            Section::Body => match &request.body {
                Body::Structured(Value::Object(map)) => map
                    .iter()
                    .map(|(key, value)| (PathSegment::Key(key.clone()), value))
                    .collect(),
                Body::Structured(Value::Array(items)) => items
                    .iter()
                    .enumerate()
                    .map(|(index, value)| (PathSegment::Index(index), value))
                    .collect(),
                _ => Vec::new(),
            },
        }
    }
}

/// Produces applied variants of one section, one at a time.
///
/// Every top-level slot starts from a fresh copy of the baseline. The
/// returned guard must be restored (or dropped) before the next call.
pub struct VariantCursor<'a> {
    original: &'a FuzzRequest,
    section: Section,
    plan: MutationPlan<'a>,
    working: FuzzRequest,
    current_slot: Option<PathSegment>,
}

impl<'a> VariantCursor<'a> {
    pub fn next_variant(&mut self) -> Option<MutatorResult<(Mutation, AppliedMutation<'_>)>> {
        let mutation = self.plan.next()?;

        if self.current_slot.as_ref() != Some(mutation.top_level()) {
            if self.current_slot.is_some() {
                self.working = self.original.clone();
            }
            debug!(
                "Mutating {} field '{}' of {}",
                self.section,
                mutation.top_level(),
                self.original.describe()
            );
            self.current_slot = Some(mutation.top_level().clone());
        }

        Some(apply(&mut self.working, &mutation).map(|variant| (mutation, variant)))
    }
}
