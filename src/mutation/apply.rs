// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde_json::{Map, Value};
use std::ops::Deref;
use tracing::error;

use super::plan::{Mutation, PathSegment};
use crate::errors::{MutatorError, MutatorResult};
use crate::request::{Body, FuzzRequest, Section};

/// Bookkeeping needed to put a working request back to its baseline
pub trait Undo {
    fn revert(self, request: &mut FuzzRequest) -> MutatorResult<()>;
}

/// Scoped mutation of a working request.
///
/// Derefs to the mutated request (the variant). The edit is reverted when
/// the guard is dropped or explicitly restored, on every exit path.
pub struct Applied<'r, U: Undo> {
    request: &'r mut FuzzRequest,
    undo: Option<U>,
}

impl<'r, U: Undo> Applied<'r, U> {
    pub(crate) fn new(request: &'r mut FuzzRequest, undo: U) -> Self {
        Self {
            request,
            undo: Some(undo),
        }
    }

    /// Revert now and surface any restore failure
    pub fn restore(mut self) -> MutatorResult<()> {
        match self.undo.take() {
            Some(undo) => undo.revert(self.request),
            None => Ok(()),
        }
    }
}

impl<U: Undo> Deref for Applied<'_, U> {
    type Target = FuzzRequest;

    fn deref(&self) -> &FuzzRequest {
        self.request
    }
}

impl<U: Undo> Drop for Applied<'_, U> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            if let Err(e) = undo.revert(self.request) {
                error!("Failed to restore {} after mutation: {}", self.request.describe(), e);
            }
        }
    }
}

/// Applied structured mutation
pub type AppliedMutation<'r> = Applied<'r, StructuredUndo>;

struct RenameUndo {
    renamed: String,
    order: Vec<String>,
    displaced: Option<Value>,
}

/// Undo record for a structured mutation
pub struct StructuredUndo {
    section: Section,
    container: Vec<PathSegment>,
    slot: PathSegment,
    rename: Option<RenameUndo>,
    original_value: Option<Value>,
}

impl Undo for StructuredUndo {
    fn revert(self, request: &mut FuzzRequest) -> MutatorResult<()> {
        match (container_mut(request, self.section, &self.container)?, &self.slot) {
            (ContainerMut::Map(map), PathSegment::Key(key)) => {
                let live_key = self.rename.as_ref().map_or(key, |r| &r.renamed);
                if let Some(original) = self.original_value {
                    let slot = map
                        .get_mut(live_key)
                        .ok_or_else(|| missing_slot(&self.slot))?;
                    *slot = original;
                }
                if let Some(rename) = self.rename {
                    restore_key(map, key, &rename.renamed, &rename.order, rename.displaced);
                }
                Ok(())
            }
            (ContainerMut::Seq(items), PathSegment::Index(index)) => {
                if let Some(original) = self.original_value {
                    let slot = items
                        .get_mut(*index)
                        .ok_or_else(|| missing_slot(&self.slot))?;
                    *slot = original;
                }
                Ok(())
            }
            _ => Err(missing_slot(&self.slot)),
        }
    }
}

/// Apply a mutation to a working request
pub fn apply<'r>(
    request: &'r mut FuzzRequest,
    mutation: &Mutation,
) -> MutatorResult<AppliedMutation<'r>> {
    let mut undo = StructuredUndo {
        section: mutation.section,
        container: mutation.container.clone(),
        slot: mutation.slot.clone(),
        rename: None,
        original_value: None,
    };

    match (
        container_mut(request, mutation.section, &mutation.container)?,
        &mutation.slot,
    ) {
        (ContainerMut::Map(map), PathSegment::Key(key)) => {
            if !map.contains_key(key) {
                return Err(missing_slot(&mutation.slot));
            }

            let mut live_key = key.clone();
            if let Some(renamed) = &mutation.renamed {
                let order = map.keys().cloned().collect();
                let displaced = rename_key(map, key, renamed);
                undo.rename = Some(RenameUndo {
                    renamed: renamed.clone(),
                    order,
                    displaced,
                });
                live_key = renamed.clone();
            }

            if let Some(replacement) = &mutation.replacement {
                if let Some(slot) = map.get_mut(&live_key) {
                    undo.original_value = Some(std::mem::replace(slot, replacement.clone()));
                }
            }
        }
        (ContainerMut::Seq(items), PathSegment::Index(index)) => {
            let slot = items
                .get_mut(*index)
                .ok_or_else(|| missing_slot(&mutation.slot))?;
            if let Some(replacement) = &mutation.replacement {
                undo.original_value = Some(std::mem::replace(slot, replacement.clone()));
            }
        }
        _ => return Err(missing_slot(&mutation.slot)),
    }

    Ok(Applied::new(request, undo))
}

/// Baseline value stored at a slot
pub fn lookup<'a>(
    request: &'a FuzzRequest,
    section: Section,
    container: &[PathSegment],
    slot: &PathSegment,
) -> Option<&'a Value> {
    let mut current: &Value = match section {
        Section::Query => {
            let first = container.first().unwrap_or(slot);
            match first {
                PathSegment::Key(key) => request.query.get(key)?,
                PathSegment::Index(_) => return None,
            }
        }
        Section::Body => match &request.body {
            Body::Structured(value) => child(value, container.first().unwrap_or(slot))?,
            _ => return None,
        },
    };

    if container.is_empty() {
        return Some(current);
    }
    for segment in container.iter().skip(1).chain(std::iter::once(slot)) {
        current = child(current, segment)?;
    }
    Some(current)
}

fn child<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

enum ContainerMut<'r> {
    Map(&'r mut Map<String, Value>),
    Seq(&'r mut Vec<Value>),
}

impl<'r> ContainerMut<'r> {
    fn of(value: &'r mut Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(ContainerMut::Map(map)),
            Value::Array(items) => Some(ContainerMut::Seq(items)),
            _ => None,
        }
    }
}

fn container_mut<'r>(
    request: &'r mut FuzzRequest,
    section: Section,
    path: &[PathSegment],
) -> MutatorResult<ContainerMut<'r>> {
    let mut current = match section {
        Section::Query => ContainerMut::Map(&mut request.query),
        Section::Body => match &mut request.body {
            Body::Structured(value) => ContainerMut::of(value)
                .ok_or_else(|| MutatorError::Path("body is a scalar".to_string()))?,
            _ => {
                return Err(MutatorError::Path(
                    "body has no structured container".to_string(),
                ))
            }
        },
    };

    for segment in path {
        let next: &'r mut Value = match (current, segment) {
            (ContainerMut::Map(map), PathSegment::Key(key)) => {
                map.get_mut(key).ok_or_else(|| missing_slot(segment))?
            }
            (ContainerMut::Seq(items), PathSegment::Index(index)) => {
                items.get_mut(*index).ok_or_else(|| missing_slot(segment))?
            }
            _ => return Err(missing_slot(segment)),
        };
        current = ContainerMut::of(next)
            .ok_or_else(|| MutatorError::Path(format!("'{}' is not a container", segment)))?;
    }

    Ok(current)
}

/// Rename `from` to `to` in place, keeping its position. A sibling already
/// named `to` is displaced and returned.
fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) -> Option<Value> {
    let mut displaced = None;
    for (key, value) in std::mem::take(map) {
        if key == to {
            displaced = Some(value);
        } else if key == from {
            map.insert(to.to_string(), value);
        } else {
            map.insert(key, value);
        }
    }
    displaced
}

/// Rebuild the map in its original key order, undoing `rename_key`
fn restore_key(
    map: &mut Map<String, Value>,
    from: &str,
    to: &str,
    order: &[String],
    mut displaced: Option<Value>,
) {
    let mut entries = std::mem::take(map);
    for key in order {
        let value = if key == from {
            entries.remove(to)
        } else if key == to {
            displaced.take()
        } else {
            entries.remove(key)
        };
        if let Some(value) = value {
            map.insert(key.clone(), value);
        }
    }
}

fn missing_slot(segment: &PathSegment) -> MutatorError {
    MutatorError::Path(format!("no slot '{}' in working request", segment))
}
