// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Modifier Catalog
 * Boundary and injection payload rules for parameter names and values
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use serde_json::{json, Number, Value};
use std::str::FromStr;

use crate::mutation::classify::stringify;
use crate::mutation::DataType;

/// Placeholder substituted by name and value templates
pub const PLACEHOLDER: &str = "{}";

/// How a modifier produces the replacement value
#[derive(Debug, Clone, PartialEq)]
pub enum ValuePattern {
    /// Keep the original value untouched
    Original,
    /// Replace with a fixed structured value
    Literal(Value),
    /// Substitute the stringified original value into a template
    Template(String),
}

/// One payload rule of the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub label: String,
    pub name_pattern: Option<String>,
    pub value_pattern: ValuePattern,
    pub type_filter: Option<Vec<DataType>>,
}

impl Modifier {
    /// Modifier that renames the key and keeps the value
    pub fn rename(label: &str, name_pattern: &str) -> Self {
        Self {
            label: label.to_string(),
            name_pattern: Some(name_pattern.to_string()),
            value_pattern: ValuePattern::Original,
            type_filter: None,
        }
    }

    /// Modifier that replaces the value with a literal
    pub fn literal(label: &str, value: Value) -> Self {
        Self {
            label: label.to_string(),
            name_pattern: None,
            value_pattern: ValuePattern::Literal(value),
            type_filter: None,
        }
    }

    /// Modifier that replaces the value through a template
    pub fn template(label: &str, template: &str) -> Self {
        Self {
            label: label.to_string(),
            name_pattern: None,
            value_pattern: ValuePattern::Template(template.to_string()),
            type_filter: None,
        }
    }

    /// Restrict the modifier to the given data types
    pub fn for_types(mut self, types: &[DataType]) -> Self {
        self.type_filter = Some(types.to_vec());
        self
    }

    /// A modifier without a type filter applies to every tag
    pub fn accepts(&self, tag: DataType) -> bool {
        self.type_filter
            .as_ref()
            .map_or(true, |types| types.contains(&tag))
    }

    /// Whether the modifier touches key names
    pub fn renames_keys(&self) -> bool {
        self.name_pattern
            .as_deref()
            .is_some_and(|pattern| pattern != PLACEHOLDER)
    }

    /// Renamed key, or None when the key stays the same
    pub fn renamed_key(&self, key: &str) -> Option<String> {
        let pattern = self.name_pattern.as_deref()?;
        let renamed = pattern.replace(PLACEHOLDER, key);
        (renamed != key).then_some(renamed)
    }

    /// Replacement for a structured value, or None when the value is kept
    pub fn replacement(&self, original: &Value) -> Option<Value> {
        match &self.value_pattern {
            ValuePattern::Original => None,
            ValuePattern::Literal(value) => Some(value.clone()),
            ValuePattern::Template(template) => Some(Value::String(
                template.replace(PLACEHOLDER, &stringify(original)),
            )),
        }
    }

    /// Replacement for a text node or attribute value
    pub fn text_replacement(&self, original: &str) -> Option<String> {
        match &self.value_pattern {
            ValuePattern::Original => None,
            ValuePattern::Literal(value) => Some(stringify(value)),
            ValuePattern::Template(template) => Some(template.replace(PLACEHOLDER, original)),
        }
    }
}

/// Ordered, immutable list of modifiers. Order is preserved in every
/// emitted sequence.
#[derive(Debug, Clone, Default)]
pub struct ModifierCatalog {
    modifiers: Vec<Modifier>,
}

impl ModifierCatalog {
    pub fn new(modifiers: Vec<Modifier>) -> Self {
        Self { modifiers }
    }

    /// Built-in payload catalog
    pub fn builtin() -> Self {
        let large_integer = pow2_decimal(7000);
        let large_integer = Number::from_str(&large_integer)
            .map(Value::Number)
            .unwrap_or(Value::String(large_integer));

        Self::new(vec![
            // parameter name modifiers
            Modifier::rename("array-name", "{}[]"),
            Modifier::rename("quote-name", "{}'"),
            // parameter value modifiers
            Modifier::literal("array-value", json!([1, 2, 3]))
                .for_types(&[DataType::Integer, DataType::Text]),
            Modifier::literal("object-value", json!({"a": 1}))
                .for_types(&[DataType::Integer, DataType::Text]),
            Modifier::literal("long-string", Value::String(format!("1{}", "0".repeat(4000)))),
            Modifier::literal("large-integer", large_integer),
            Modifier::literal("emoji", json!("😁😛😋🤣")),
            Modifier::literal(
                "unicode-escapes",
                json!(r"\u0000\u0007\u0008\u0009\u000a\u000b\u000c\u000d\u001b\u005c"),
            ),
            Modifier::literal("hex-escapes", json!(r"\x00\x07\x08\x09\x0a\x0b\x0c\x0d\x1b\x5c")),
            Modifier::literal("overlong-utf8", json!("%C0%80%C0%AF%c1%9c%c0%a2")),
            Modifier::literal("special-chars", json!(r#"!@#$%^&*()-_=+[]:'"`<>,./?"#)),
            Modifier::literal("multiscript", json!("ハッキングされた 被黑客入侵 ହ୍ୟାକ୍ହୋଇଛି")),
            Modifier::template("sql-breakout", r#"{}'")"#),
            Modifier::literal(
                "xxe",
                json!(r#"<?xml version="1.0" encoding="UTF-8"?><!DOCTYPE foo [<!ENTITY test "HACKED"> ]><root><tag>&test;</tag></root>"#),
            ),
        ])
    }

    /// Modifiers applicable to a tag, with their catalog position
    pub fn for_type(&self, tag: DataType) -> impl Iterator<Item = (usize, &Modifier)> + '_ {
        self.modifiers
            .iter()
            .enumerate()
            .filter(move |(_, modifier)| modifier.accepts(tag))
    }

    /// Modifiers that never rename keys
    pub fn value_modifiers(&self) -> impl Iterator<Item = (usize, &Modifier)> + '_ {
        self.modifiers
            .iter()
            .enumerate()
            .filter(|(_, modifier)| !modifier.renames_keys())
    }

    pub fn get(&self, index: usize) -> Option<&Modifier> {
        self.modifiers.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Modifier> {
        self.modifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

/// Decimal digits of 2^exp
fn pow2_decimal(exp: u32) -> String {
    // little-endian base 10^9 limbs
    const BASE: u64 = 1_000_000_000;
    let mut limbs: Vec<u64> = vec![1];

    for _ in 0..exp {
        let mut carry = 0;
        for limb in limbs.iter_mut() {
            let doubled = *limb * 2 + carry;
            *limb = doubled % BASE;
            carry = doubled / BASE;
        }
        if carry > 0 {
            limbs.push(carry);
        }
    }

    let mut digits = String::with_capacity(limbs.len() * 9);
    let mut iter = limbs.iter().rev();
    if let Some(top) = iter.next() {
        digits.push_str(&top.to_string());
    }
    for limb in iter {
        digits.push_str(&format!("{:09}", limb));
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_order() {
        let catalog = ModifierCatalog::builtin();
        assert_eq!(catalog.len(), 14);

        let labels: Vec<&str> = catalog.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels[0], "array-name");
        assert_eq!(labels[1], "quote-name");
        assert_eq!(labels[12], "sql-breakout");
        assert_eq!(labels[13], "xxe");
    }

    #[test]
    fn test_type_filter() {
        let catalog = ModifierCatalog::builtin();
        let for_map: Vec<usize> = catalog.for_type(DataType::Map).map(|(i, _)| i).collect();
        assert!(!for_map.contains(&2));
        assert!(!for_map.contains(&3));
        assert_eq!(for_map.len(), 12);

        let for_text = catalog.for_type(DataType::Text).count();
        assert_eq!(for_text, 14);
    }

    #[test]
    fn test_value_modifiers_exclude_renames() {
        let catalog = ModifierCatalog::builtin();
        assert_eq!(catalog.value_modifiers().count(), 12);
        assert!(catalog.value_modifiers().all(|(_, m)| m.name_pattern.is_none()));
    }

    #[test]
    fn test_rename_and_templates() {
        let modifier = Modifier::rename("array-name", "{}[]");
        assert_eq!(modifier.renamed_key("id"), Some("id[]".to_string()));
        assert_eq!(modifier.replacement(&json!("5")), None);

        let identity = Modifier::rename("identity", "{}");
        assert!(!identity.renames_keys());
        assert_eq!(identity.renamed_key("id"), None);

        let sqli = Modifier::template("sql-breakout", r#"{}'")"#);
        assert_eq!(sqli.replacement(&json!(5)), Some(json!(r#"5'")"#)));
        assert_eq!(sqli.text_replacement("abc"), Some(r#"abc'")"#.to_string()));

        let array = Modifier::literal("array-value", json!([1, 2, 3]));
        assert_eq!(array.text_replacement("5"), Some("[1,2,3]".to_string()));
    }

    #[test]
    fn test_pow2_decimal() {
        assert_eq!(pow2_decimal(0), "1");
        assert_eq!(pow2_decimal(10), "1024");
        assert_eq!(pow2_decimal(64), "18446744073709551616");
        assert_eq!(pow2_decimal(7000).len(), 2108);
    }

    #[test]
    fn test_large_integer_is_a_number() {
        let catalog = ModifierCatalog::builtin();
        let modifier = catalog.get(5).unwrap();
        match &modifier.value_pattern {
            ValuePattern::Literal(Value::Number(n)) => assert!(n.to_string().starts_with("1")),
            other => panic!("unexpected pattern {:?}", other),
        }
    }
}
