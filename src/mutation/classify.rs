// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of data-type tags used to gate modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Map,
    Sequence,
    Integer,
    Float,
    Text,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Map => write!(f, "map"),
            DataType::Sequence => write!(f, "sequence"),
            DataType::Integer => write!(f, "integer"),
            DataType::Float => write!(f, "float"),
            DataType::Text => write!(f, "text"),
        }
    }
}

/// Classify a structured value. Never fails: anything that is neither a
/// container nor numeric text is `Text`.
pub fn classify(value: &Value) -> DataType {
    match value {
        Value::Object(_) => DataType::Map,
        Value::Array(_) => DataType::Sequence,
        Value::String(s) => classify_text(s),
        Value::Number(n) => classify_text(&n.to_string()),
        Value::Bool(_) | Value::Null => DataType::Text,
    }
}

/// Classify the textual form of a scalar.
///
/// All ASCII digits is `Integer`; anything else that parses as a real number
/// (sign, decimal point, exponent, `inf`, `nan`) is `Float`. Non-ASCII digits
/// such as fullwidth `１２` are `Text`.
pub fn classify_text(text: &str) -> DataType {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return DataType::Integer;
    }

    if text.trim().parse::<f64>().is_ok() {
        DataType::Float
    } else {
        DataType::Text
    }
}

/// Stringified form of a value, as substituted into value templates
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
