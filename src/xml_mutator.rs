// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - XML Mutator
 * Text and attribute mutation of element-tree bodies
 *
 * Element and attribute names are never touched; only text content of
 * leaf elements and attribute values are replaced.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use tracing::debug;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::errors::{MutatorError, MutatorResult};
use crate::modifiers::ModifierCatalog;
use crate::mutation::classify::classify_text;
use crate::mutation::{Applied, Undo};
use crate::request::{Body, FuzzRequest};

/// What an XML mutation replaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlTarget {
    Text,
    Attribute(String),
}

/// One text or attribute replacement, addressed by child indexes from the root
#[derive(Debug, Clone, PartialEq)]
pub struct XmlMutation {
    pub path: Vec<usize>,
    /// Slash-separated element names, e.g. `root/user/id`
    pub element: String,
    pub target: XmlTarget,
    pub original: String,
    pub replacement: String,
    pub modifier: usize,
}

impl XmlMutation {
    pub fn field(&self) -> String {
        match &self.target {
            XmlTarget::Text => self.element.clone(),
            XmlTarget::Attribute(name) => format!("{}@{}", self.element, name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Text,
    Attributes,
    Children,
}

struct XmlFrame<'a> {
    path: Vec<usize>,
    name: String,
    element: &'a Element,
    phase: Phase,
    next_modifier: usize,
    next_attribute: usize,
    next_child: usize,
}

impl<'a> XmlFrame<'a> {
    fn new(path: Vec<usize>, name: String, element: &'a Element) -> Self {
        Self {
            path,
            name,
            element,
            phase: Phase::Text,
            next_modifier: 0,
            next_attribute: 0,
            next_child: 0,
        }
    }
}

/// Lazy sequence of XML mutations in document order. Per element, all
/// text mutations come before any attribute mutation.
pub struct XmlPlan<'a> {
    catalog: &'a ModifierCatalog,
    stack: Vec<XmlFrame<'a>>,
}

impl<'a> XmlPlan<'a> {
    pub fn new(catalog: &'a ModifierCatalog, root: &'a Element) -> Self {
        Self {
            catalog,
            stack: vec![XmlFrame::new(Vec::new(), root.name.clone(), root)],
        }
    }

    fn next_replacement(&self, next_modifier: &mut usize, original: &str) -> Option<(usize, String)> {
        let tag = classify_text(original);
        let start = *next_modifier;
        let candidates = self
            .catalog
            .value_modifiers()
            .skip_while(move |(index, _)| *index < start);

        for (index, modifier) in candidates {
            *next_modifier = index + 1;
            if !modifier.accepts(tag) {
                continue;
            }
            if let Some(replacement) = modifier.text_replacement(original) {
                if replacement != original {
                    return Some((index, replacement));
                }
            }
        }
        *next_modifier = self.catalog.len();
        None
    }
}

impl<'a> Iterator for XmlPlan<'a> {
    type Item = XmlMutation;

    fn next(&mut self) -> Option<XmlMutation> {
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let element = self.stack[depth].element;

            match self.stack[depth].phase {
                Phase::Text => {
                    if is_leaf(element) {
                        let original = text_of(element);
                        let mut cursor = self.stack[depth].next_modifier;
                        let found = self.next_replacement(&mut cursor, &original);
                        self.stack[depth].next_modifier = cursor;

                        if let Some((modifier, replacement)) = found {
                            let frame = &self.stack[depth];
                            return Some(XmlMutation {
                                path: frame.path.clone(),
                                element: frame.name.clone(),
                                target: XmlTarget::Text,
                                original,
                                replacement,
                                modifier,
                            });
                        }
                    }
                    let frame = &mut self.stack[depth];
                    frame.phase = Phase::Attributes;
                    frame.next_modifier = 0;
                }
                Phase::Attributes => {
                    let attribute = element
                        .attributes
                        .iter()
                        .nth(self.stack[depth].next_attribute);

                    let Some((name, value)) = attribute else {
                        self.stack[depth].phase = Phase::Children;
                        continue;
                    };

                    let mut cursor = self.stack[depth].next_modifier;
                    let found = self.next_replacement(&mut cursor, value);

                    let frame = &mut self.stack[depth];
                    match found {
                        Some((modifier, replacement)) => {
                            frame.next_modifier = cursor;
                            return Some(XmlMutation {
                                path: frame.path.clone(),
                                element: frame.name.clone(),
                                target: XmlTarget::Attribute(name.clone()),
                                original: value.clone(),
                                replacement,
                                modifier,
                            });
                        }
                        None => {
                            frame.next_attribute += 1;
                            frame.next_modifier = 0;
                        }
                    }
                }
                Phase::Children => {
                    let frame = &mut self.stack[depth];
                    let next = element
                        .children
                        .iter()
                        .enumerate()
                        .skip(frame.next_child)
                        .find_map(|(index, node)| match node {
                            XMLNode::Element(child) => Some((index, child)),
                            _ => None,
                        });

                    match next {
                        Some((index, child)) => {
                            frame.next_child = index + 1;
                            let mut path = frame.path.clone();
                            path.push(index);
                            let name = format!("{}/{}", frame.name, child.name);
                            self.stack.push(XmlFrame::new(path, name, child));
                        }
                        None => {
                            self.stack.pop();
                        }
                    }
                }
            }
        }
    }
}

/// Undo record for an XML mutation
pub struct XmlUndo {
    path: Vec<usize>,
    original: XmlOriginal,
}

enum XmlOriginal {
    Children(Vec<XMLNode>),
    Attribute(String, String),
}

impl Undo for XmlUndo {
    fn revert(self, request: &mut FuzzRequest) -> MutatorResult<()> {
        let element = element_mut(request, &self.path)?;
        match self.original {
            XmlOriginal::Children(children) => element.children = children,
            XmlOriginal::Attribute(name, value) => {
                element.attributes.insert(name, value);
            }
        }
        Ok(())
    }
}

/// Applied XML mutation
pub type AppliedXmlMutation<'r> = Applied<'r, XmlUndo>;

/// Apply an XML mutation to a working request
pub fn apply_xml<'r>(
    request: &'r mut FuzzRequest,
    mutation: &XmlMutation,
) -> MutatorResult<AppliedXmlMutation<'r>> {
    let element = element_mut(request, &mutation.path)?;

    let original = match &mutation.target {
        XmlTarget::Text => XmlOriginal::Children(std::mem::replace(
            &mut element.children,
            vec![XMLNode::Text(mutation.replacement.clone())],
        )),
        XmlTarget::Attribute(name) => {
            let previous = element
                .attributes
                .insert(name.clone(), mutation.replacement.clone())
                .ok_or_else(|| {
                    MutatorError::Path(format!("no attribute '{}' on {}", name, mutation.element))
                })?;
            XmlOriginal::Attribute(name.clone(), previous)
        }
    };

    Ok(Applied::new(
        request,
        XmlUndo {
            path: mutation.path.clone(),
            original,
        },
    ))
}

/// Serialize an element tree without a document declaration
pub fn serialize(root: &Element) -> MutatorResult<String> {
    let mut buffer = Vec::new();
    root.write_with_config(
        &mut buffer,
        EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(false),
    )
    .map_err(|e| MutatorError::Structure {
        reason: format!("cannot serialize XML body: {}", e),
    })?;
    String::from_utf8(buffer).map_err(|e| MutatorError::Structure {
        reason: format!("XML body is not UTF-8: {}", e),
    })
}

/// Drives the value modifiers over element-tree bodies
#[derive(Debug, Clone)]
pub struct XmlMutator {
    catalog: Arc<ModifierCatalog>,
}

impl XmlMutator {
    pub fn new(catalog: Arc<ModifierCatalog>) -> Self {
        Self { catalog }
    }

    /// Plan over the element tree of a request body, if it has one
    pub fn plan<'a>(&'a self, request: &'a FuzzRequest) -> Option<XmlPlan<'a>> {
        match &request.body {
            Body::Xml(root) => Some(XmlPlan::new(&self.catalog, root)),
            _ => None,
        }
    }

    /// Variant cursor over the element tree of `original`, if it has one
    pub fn cursor<'a>(&'a self, original: &'a FuzzRequest) -> Option<XmlCursor<'a>> {
        let plan = self.plan(original)?;
        debug!("Mutating XML body of {}", original.describe());
        Some(XmlCursor {
            plan,
            working: original.clone(),
        })
    }
}

/// Produces applied XML variants over one deep copy of the body.
///
/// The returned guard must be restored (or dropped) before the next call.
pub struct XmlCursor<'a> {
    plan: XmlPlan<'a>,
    working: FuzzRequest,
}

impl<'a> XmlCursor<'a> {
    pub fn next_variant(&mut self) -> Option<MutatorResult<(XmlMutation, AppliedXmlMutation<'_>)>> {
        let mutation = self.plan.next()?;
        Some(apply_xml(&mut self.working, &mutation).map(|variant| (mutation, variant)))
    }
}

fn is_leaf(element: &Element) -> bool {
    !element
        .children
        .iter()
        .any(|node| matches!(node, XMLNode::Element(_)))
}

fn text_of(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

fn element_mut<'r>(request: &'r mut FuzzRequest, path: &[usize]) -> MutatorResult<&'r mut Element> {
    let Body::Xml(root) = &mut request.body else {
        return Err(MutatorError::Path("body is not an element tree".to_string()));
    };

    let mut current = root;
    for index in path {
        current = match current.children.get_mut(*index) {
            Some(XMLNode::Element(child)) => child,
            _ => return Err(MutatorError::Path(format!("no element at child index {}", index))),
        };
    }
    Ok(current)
}
