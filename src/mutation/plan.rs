// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde_json::Value;
use std::fmt::Write as _;

use super::classify::{classify, DataType};
use crate::modifiers::{Modifier, ModifierCatalog};
use crate::request::Section;

/// One step from a container to one of its slots
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// A single-leaf edit of a section, addressed by path from the section root
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub section: Section,
    /// Path to the container that holds `slot`
    pub container: Vec<PathSegment>,
    pub slot: PathSegment,
    /// New key name; only ever set for map slots
    pub renamed: Option<String>,
    /// New value; None keeps the baseline value
    pub replacement: Option<Value>,
    /// Catalog position of the modifier that produced this edit
    pub modifier: usize,
}

impl Mutation {
    /// Top-level slot of the section this mutation belongs to
    pub fn top_level(&self) -> &PathSegment {
        self.container.first().unwrap_or(&self.slot)
    }

    /// Dotted field path, e.g. `user.id` or `items[0].name`
    pub fn field(&self) -> String {
        let mut field = String::new();
        for segment in self.container.iter().chain(std::iter::once(&self.slot)) {
            match segment {
                PathSegment::Key(key) => {
                    if !field.is_empty() {
                        field.push('.');
                    }
                    field.push_str(key);
                }
                PathSegment::Index(index) => {
                    let _ = write!(field, "[{}]", index);
                }
            }
        }
        field
    }
}

enum Children<'a> {
    Map(serde_json::map::Iter<'a>),
    Seq(std::iter::Enumerate<std::slice::Iter<'a, Value>>),
    Leaf,
}

impl<'a> Children<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Children::Map(map.iter()),
            Value::Array(items) => Children::Seq(items.iter().enumerate()),
            _ => Children::Leaf,
        }
    }

    fn next(&mut self) -> Option<(PathSegment, &'a Value)> {
        match self {
            Children::Map(iter) => iter
                .next()
                .map(|(key, value)| (PathSegment::Key(key.clone()), value)),
            Children::Seq(iter) => iter
                .next()
                .map(|(index, value)| (PathSegment::Index(index), value)),
            Children::Leaf => None,
        }
    }
}

/// Traversal state for one (container, slot, value) triple
struct Frame<'a> {
    container: Vec<PathSegment>,
    slot: PathSegment,
    value: &'a Value,
    tag: DataType,
    next_modifier: usize,
    children: Children<'a>,
}

impl<'a> Frame<'a> {
    fn new(container: Vec<PathSegment>, slot: PathSegment, value: &'a Value) -> Self {
        Self {
            container,
            slot,
            value,
            tag: classify(value),
            next_modifier: 0,
            children: Children::of(value),
        }
    }

    fn mutation(&self, section: Section, index: usize, modifier: &Modifier) -> Option<Mutation> {
        // sequence positions are fixed; only their value may change
        let renamed = match &self.slot {
            PathSegment::Key(key) => modifier.renamed_key(key),
            PathSegment::Index(_) => None,
        };
        let replacement = modifier
            .replacement(self.value)
            .filter(|candidate| candidate != self.value);

        if renamed.is_none() && replacement.is_none() {
            return None;
        }

        Some(Mutation {
            section,
            container: self.container.clone(),
            slot: self.slot.clone(),
            renamed,
            replacement,
            modifier: index,
        })
    }
}

/// Lazy, finite sequence of mutations over a baseline section.
///
/// For each slot the directly applicable modifiers come first, in catalog
/// order, followed by the mutations of the slot's children in container
/// order.
pub struct MutationPlan<'a> {
    catalog: &'a ModifierCatalog,
    section: Section,
    roots: std::vec::IntoIter<(PathSegment, &'a Value)>,
    stack: Vec<Frame<'a>>,
}

impl<'a> MutationPlan<'a> {
    pub(crate) fn new(
        catalog: &'a ModifierCatalog,
        section: Section,
        roots: Vec<(PathSegment, &'a Value)>,
    ) -> Self {
        Self {
            catalog,
            section,
            roots: roots.into_iter(),
            stack: Vec::new(),
        }
    }
}

impl<'a> Iterator for MutationPlan<'a> {
    type Item = Mutation;

    fn next(&mut self) -> Option<Mutation> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                let (slot, value) = self.roots.next()?;
                self.stack.push(Frame::new(Vec::new(), slot, value));
                continue;
            };

            while let Some(modifier) = self.catalog.get(frame.next_modifier) {
                let index = frame.next_modifier;
                frame.next_modifier += 1;

                if !modifier.accepts(frame.tag) {
                    continue;
                }
                if let Some(mutation) = frame.mutation(self.section, index, modifier) {
                    return Some(mutation);
                }
            }

            match frame.children.next() {
                Some((slot, child)) => {
                    let mut container = frame.container.clone();
                    container.push(frame.slot.clone());
                    self.stack.push(Frame::new(container, slot, child));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roots(value: &Value) -> Vec<(PathSegment, &Value)> {
        value
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (PathSegment::Key(k.clone()), v))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_field_paths() {
        let mutation = Mutation {
            section: Section::Body,
            container: vec![
                PathSegment::Key("items".to_string()),
                PathSegment::Index(0),
            ],
            slot: PathSegment::Key("name".to_string()),
            renamed: None,
            replacement: Some(json!("x")),
            modifier: 0,
        };
        assert_eq!(mutation.field(), "items[0].name");
        assert_eq!(mutation.top_level(), &PathSegment::Key("items".to_string()));
    }

    #[test]
    fn test_children_follow_own_modifiers() {
        let catalog = ModifierCatalog::new(vec![Modifier::rename("array-name", "{}[]")]);
        let body = json!({"user": {"id": "5"}});
        let plan: Vec<Mutation> = MutationPlan::new(&catalog, Section::Body, roots(&body)).collect();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].field(), "user");
        assert_eq!(plan[0].renamed.as_deref(), Some("user[]"));
        assert_eq!(plan[1].field(), "user.id");
        assert_eq!(plan[1].renamed.as_deref(), Some("id[]"));
    }

    #[test]
    fn test_sequence_indexes_are_never_renamed() {
        let catalog = ModifierCatalog::new(vec![
            Modifier::rename("array-name", "{}[]"),
            Modifier::literal("marker", json!("X")),
        ]);
        let body = json!({"ids": ["1", "2"]});
        let plan: Vec<Mutation> = MutationPlan::new(&catalog, Section::Body, roots(&body)).collect();

        // ids: rename + literal, each item: literal only
        assert_eq!(plan.len(), 4);
        assert!(plan[2..].iter().all(|m| m.renamed.is_none()));
        assert_eq!(plan[2].slot, PathSegment::Index(0));
        assert_eq!(plan[3].slot, PathSegment::Index(1));
    }

    #[test]
    fn test_no_op_replacements_are_skipped() {
        let catalog = ModifierCatalog::new(vec![Modifier::literal("marker", json!("X"))]);
        let body = json!({"a": "X", "b": "Y"});
        let plan: Vec<Mutation> = MutationPlan::new(&catalog, Section::Body, roots(&body)).collect();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].field(), "b");
    }
}
