//! Routing context value model
//!
//! A routing context is a string-keyed mapping of loosely-shaped facts gathered
//! during a conversation (`languages`, `frameworks`, `project_name`, ...). Values
//! form a closed tagged union so merge and requirement evaluation can match on
//! every shape explicitly.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved key holding per-subsystem records, each identified by a `name` field
pub const MODULES_KEY: &str = "modules";

/// Field identifying a record inside [`MODULES_KEY`]
pub const MODULE_NAME_FIELD: &str = "name";

/// String-keyed mapping of context values
pub type ContextMap = BTreeMap<String, ContextValue>;

/// A single routing context value
///
/// Serialized untagged so contexts read naturally in TOML and JSON:
/// `"rust"`, `["rust", "go"]`, `true`, `null`, `{ ... }` and `[{ name = "api" }]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ContextValue {
    Flag(bool),
    Text(String),
    /// Set-like sequence; order is preserved on first insertion
    List(Vec<String>),
    /// Sequence of named records (the shape of [`MODULES_KEY`])
    Records(Vec<ContextMap>),
    Map(ContextMap),
    /// Explicitly unset
    Absent,
}

impl ContextValue {
    /// Build a list value from anything string-like
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContextValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ContextValue::Absent)
    }

    /// Truthiness used as the last resort of requirement evaluation
    pub fn is_truthy(&self) -> bool {
        match self {
            ContextValue::Flag(flag) => *flag,
            ContextValue::Text(text) => !text.is_empty(),
            ContextValue::List(items) => !items.is_empty(),
            ContextValue::Records(records) => !records.is_empty(),
            ContextValue::Map(_) => true,
            ContextValue::Absent => false,
        }
    }

    /// Length of a string (in characters) or a sequence; `None` for other shapes
    pub fn len(&self) -> Option<usize> {
        match self {
            ContextValue::Text(text) => Some(text.chars().count()),
            ContextValue::List(items) => Some(items.len()),
            ContextValue::Records(records) => Some(records.len()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContextValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ContextValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// The comparable terms of this value: a string is a single term, a list is its items
    pub fn terms(&self) -> Vec<&str> {
        match self {
            ContextValue::Text(text) => vec![text.as_str()],
            ContextValue::List(items) => items.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// True when both values share at least one term
    pub fn overlaps(&self, other: &ContextValue) -> bool {
        let theirs = other.terms();
        self.terms().iter().any(|term| theirs.contains(term))
    }

    /// Lower-case every term and drop whitespace so profile and task values compare equal
    pub fn normalised(&self) -> ContextValue {
        match self {
            ContextValue::Text(text) => ContextValue::Text(normalise_term(text)),
            ContextValue::List(items) => {
                let mut normalised: Vec<String> = Vec::with_capacity(items.len());
                for item in items.iter().map(|item| normalise_term(item)) {
                    if !normalised.contains(&item) {
                        normalised.push(item);
                    }
                }
                ContextValue::List(normalised)
            }
            ContextValue::Map(map) => ContextValue::Map(normalise_map(map)),
            ContextValue::Records(records) => {
                ContextValue::Records(records.iter().map(normalise_map).collect())
            }
            other => other.clone(),
        }
    }
}

fn normalise_term(term: &str) -> String {
    term.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalise every value of a mapping, leaving keys untouched
pub fn normalise_map(map: &ContextMap) -> ContextMap {
    map.iter()
        .map(|(key, value)| (key.clone(), value.normalised()))
        .collect()
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Flag(value)
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        ContextValue::List(value)
    }
}

impl From<Vec<&str>> for ContextValue {
    fn from(value: Vec<&str>) -> Self {
        ContextValue::list(value)
    }
}

impl From<ContextMap> for ContextValue {
    fn from(value: ContextMap) -> Self {
        ContextValue::Map(value)
    }
}

impl From<Vec<ContextMap>> for ContextValue {
    fn from(value: Vec<ContextMap>) -> Self {
        ContextValue::Records(value)
    }
}
