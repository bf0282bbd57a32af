//! Requirement predicates over a routing context
//!
//! Requirements gate routing candidates and workflow steps. A requirement names a
//! context key and an optional condition; a list of requirements is satisfied
//! when every entry is (logical AND, so an empty list always passes).
//!
//! Conditions are written as a number or a string and decoded once into
//! [`Condition`]:
//!
//! | written         | meaning                                              |
//! |-----------------|------------------------------------------------------|
//! | *(omitted)*     | key present with a value other than `null`           |
//! | `"undefined"`   | key missing, or present as `null`                    |
//! | `3`             | string or sequence of length ≥ 3                     |
//! | `"!cobol"`      | sequence that does not contain `cobol`               |
//! | `"/^v\d+$/"`    | string matching the regular expression               |
//! | `"rust"`        | sequence containing `rust`                           |
//!
//! Anything that falls outside these shapes is decided by the value's truthiness.

use super::value::{ContextMap, ContextValue};
use regex::Regex;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

const ABSENT_CONDITION: &str = "undefined";

/// One named requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Requirement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Requirement {
    /// Requires `name` to be present with a defined value
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: None,
        }
    }

    pub fn with_condition(name: impl Into<String>, condition: Condition) -> Self {
        Self {
            name: name.into(),
            condition: Some(condition),
        }
    }

    /// Parse the `name[:condition]` shorthand used on the command line
    pub fn parse(shorthand: &str) -> Self {
        match shorthand.split_once(':') {
            Some((name, condition)) => Self::with_condition(name, Condition::parse(condition)),
            None => Self::present(shorthand),
        }
    }
}

/// Decoded requirement condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    /// Key must be missing or explicitly unset
    Absent,
    /// String or sequence of at least this length
    MinLength(usize),
    /// Sequence that must not contain the item
    Excludes(String),
    /// Regular expression a string value must match
    Pattern(String),
    /// Item a sequence must contain
    Contains(String),
}

impl Condition {
    /// Decode the textual condition syntax
    pub fn parse(raw: &str) -> Self {
        if let Ok(min) = raw.parse::<usize>() {
            return Condition::MinLength(min);
        }
        Self::from_text(raw)
    }

    fn from_text(raw: &str) -> Self {
        if raw == ABSENT_CONDITION {
            Condition::Absent
        } else if let Some(item) = raw.strip_prefix('!') {
            Condition::Excludes(item.to_string())
        } else if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
            Condition::Pattern(raw[1..raw.len() - 1].to_string())
        } else {
            Condition::Contains(raw.to_string())
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Absent => write!(f, "{ABSENT_CONDITION}"),
            Condition::MinLength(min) => write!(f, "{min}"),
            Condition::Excludes(item) => write!(f, "!{item}"),
            Condition::Pattern(pattern) => write!(f, "/{pattern}/"),
            Condition::Contains(item) => write!(f, "{item}"),
        }
    }
}

impl JsonSchema for Condition {
    fn schema_name() -> String {
        "Condition".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        RawCondition::json_schema(gen)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
enum RawCondition {
    Length(usize),
    Text(String),
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        match raw {
            RawCondition::Length(min) => Condition::MinLength(min),
            RawCondition::Text(text) => Condition::from_text(&text),
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::MinLength(min) => RawCondition::Length(min),
            other => RawCondition::Text(other.to_string()),
        }
    }
}

/// Evaluate every requirement against the context
pub fn requirements_met(context: &ContextMap, requirements: &[Requirement]) -> bool {
    requirements
        .iter()
        .all(|requirement| requirement_met(context, requirement))
}

/// Evaluate a single requirement
pub fn requirement_met(context: &ContextMap, requirement: &Requirement) -> bool {
    let Some(value) = context.get(&requirement.name) else {
        return requirement.condition == Some(Condition::Absent);
    };

    let Some(condition) = &requirement.condition else {
        return !value.is_absent();
    };

    match condition {
        Condition::Absent => value.is_absent(),
        Condition::MinLength(min) => value.len().is_some_and(|len| len >= *min),
        Condition::Excludes(item) => match value {
            ContextValue::List(items) => !items.contains(item),
            _ => false,
        },
        Condition::Contains(item) => match value {
            ContextValue::List(items) => items.contains(item),
            _ => value.is_truthy(),
        },
        Condition::Pattern(pattern) => match value {
            ContextValue::Text(text) => match Regex::new(pattern) {
                Ok(regex) => regex.is_match(text),
                Err(e) => {
                    warn!(
                        requirement = %requirement.name,
                        pattern = %pattern,
                        error = %e,
                        "Invalid requirement pattern, treating as unmet"
                    );
                    false
                }
            },
            _ => value.is_truthy(),
        },
    }
}
