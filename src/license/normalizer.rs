//! Reduces raw `license` / `licenses` manifest values to a canonical
//! SPDX-like expression.
//!
//! Layers, each tried only when the previous one does not apply:
//! 1. absence → [`UNKNOWN`]
//! 2. lists are normalized element-wise and joined with `OR`; legacy
//!    `{ "type": ... }` objects are unwrapped
//! 3. strings with a whitespace-delimited `OR`/`AND` always take the
//!    heuristic path, so that neither operand is lost
//! 4. single expressions are corrected and parsed by the grammar service,
//!    then serialized from the tree
//! 5. heuristic: per-operand alias table, correction and catalog lookup,
//!    falling back to the operand text itself
//!
//! Normalization never fails. Every degradation yields a less canonical but
//! non-empty string.

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use super::expression::{Conjunction, ExpressionError};
use super::grammar::{self, LicenseGrammarService};
use crate::models::UNKNOWN;

/// A license declaration exactly as found in a package manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLicense {
    Absent,
    Text(String),
    List(Vec<RawLicense>),
    /// Legacy object form; carries its `type` field when present.
    Legacy(Option<Box<RawLicense>>),
}

impl From<&Value> for RawLicense {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RawLicense::Absent,
            Value::String(s) => RawLicense::Text(s.clone()),
            Value::Array(items) => RawLicense::List(items.iter().map(RawLicense::from).collect()),
            Value::Object(map) => RawLicense::Legacy(
                map.get("type")
                    .map(|kind| Box::new(RawLicense::from(kind))),
            ),
            Value::Bool(_) | Value::Number(_) => RawLicense::Text(value.to_string()),
        }
    }
}

impl From<&str> for RawLicense {
    fn from(value: &str) -> Self {
        RawLicense::Text(value.to_string())
    }
}

impl<T: Into<RawLicense>> From<Vec<T>> for RawLicense {
    fn from(items: Vec<T>) -> Self {
        RawLicense::List(items.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, PartialEq)]
enum Segment {
    Operand(String),
    Operator(Conjunction),
}

fn conjunction_of(word: &str) -> Option<Conjunction> {
    if word.eq_ignore_ascii_case("or") {
        Some(Conjunction::Or)
    } else if word.eq_ignore_ascii_case("and") {
        Some(Conjunction::And)
    } else {
        None
    }
}

/// Split on `OR`/`AND` words (any case) that have text on both sides.
fn split_operators(expr: &str) -> Vec<Segment> {
    let words: Vec<&str> = expr.split_whitespace().collect();
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for (i, word) in words.iter().enumerate() {
        match conjunction_of(word) {
            Some(conjunction) if !current.is_empty() && i + 1 < words.len() => {
                segments.push(Segment::Operand(current.join(" ")));
                current.clear();
                segments.push(Segment::Operator(conjunction));
            }
            _ => current.push(word),
        }
    }
    if !current.is_empty() {
        segments.push(Segment::Operand(current.join(" ")));
    }
    segments
}

/// Aliases checked before any grammar service is consulted.
fn alias(lower: &str) -> Option<&'static str> {
    match lower {
        "mit" => Some("MIT"),
        "isc" => Some("ISC"),
        "apache-2.0" | "apache" => Some("Apache-2.0"),
        "gpl" => Some("GPL"),
        "agpl" => Some("AGPL"),
        "lgpl" => Some("LGPL"),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Normalizer {
    grammar: Arc<dyn LicenseGrammarService>,
}

impl Normalizer {
    pub fn new(grammar: Arc<dyn LicenseGrammarService>) -> Self {
        Self { grammar }
    }

    /// Normalizer over the process-wide grammar service.
    pub fn global() -> Self {
        Self::new(grammar::global())
    }

    pub fn grammar_name(&self) -> &'static str {
        self.grammar.name()
    }

    pub fn normalize(&self, raw: &RawLicense) -> String {
        match raw {
            RawLicense::Absent => UNKNOWN.to_string(),
            RawLicense::Text(text) => self.normalize_str(text),
            RawLicense::List(items) if items.is_empty() => UNKNOWN.to_string(),
            RawLicense::List(items) => items
                .iter()
                .map(|item| self.normalize(item))
                .collect::<Vec<_>>()
                .join(" OR "),
            RawLicense::Legacy(Some(kind)) => self.normalize(kind),
            RawLicense::Legacy(None) => UNKNOWN.to_string(),
        }
    }

    pub fn normalize_str(&self, raw: &str) -> String {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return UNKNOWN.to_string();
        }

        let segments = split_operators(&collapsed);
        let has_operator = segments
            .iter()
            .any(|s| matches!(s, Segment::Operator(_)));

        if !has_operator {
            if let Some(canonical) = self.formal(&collapsed) {
                return canonical;
            }
        }

        self.heuristic(&segments)
    }

    fn formal(&self, expr: &str) -> Option<String> {
        let corrected = self
            .grammar
            .correct(expr)
            .unwrap_or_else(|| expr.to_string());
        match self.grammar.parse(&corrected) {
            Ok(tree) => Some(tree.to_string()),
            Err(ExpressionError::Unavailable) => None,
            Err(err) => {
                trace!(expr, %err, "formal parse failed; using heuristics");
                None
            }
        }
    }

    fn heuristic(&self, segments: &[Segment]) -> String {
        segments
            .iter()
            .map(|segment| match segment {
                Segment::Operator(conjunction) => conjunction.to_string(),
                Segment::Operand(token) => self.heuristic_token(token),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn heuristic_token(&self, token: &str) -> String {
        if let Some(id) = alias(&token.to_lowercase()) {
            return id.to_string();
        }

        let token = token.trim();
        let corrected = self
            .grammar
            .correct(token)
            .unwrap_or_else(|| token.to_string());

        self.grammar.lookup(&corrected).unwrap_or(corrected)
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("grammar", &self.grammar.name())
            .finish()
    }
}
