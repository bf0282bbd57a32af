//! Shared routing context
//!
//! The routing context is the conversational memory agents are matched against:
//! facts such as `languages`, `platforms` or `project_name`, plus per-subsystem
//! `modules`. It only changes through [`merge`], so a merge either fully applies
//! or not at all.

pub mod conversation;
pub mod merge;
pub mod requirements;
pub mod value;

pub use conversation::{AllowAll, ConversationContext, PermissionHandler};
pub use merge::{merge, merge_modules};
pub use requirements::{requirement_met, requirements_met, Condition, Requirement};
pub use value::{normalise_map, ContextMap, ContextValue, MODULES_KEY, MODULE_NAME_FIELD};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A routing context mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RoutingContext(ContextMap);

impl RoutingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &ContextMap {
        &self.0
    }

    pub fn into_map(self) -> ContextMap {
        self.0
    }

    /// Return a new context with `delta` merged in
    pub fn merged(&self, delta: &ContextMap) -> RoutingContext {
        RoutingContext(merge(&self.0, delta))
    }

    /// Merge `delta` into this context
    pub fn merge_from(&mut self, delta: &ContextMap) {
        self.0 = merge(&self.0, delta);
    }

    /// Keep only `keys`; `None` keeps everything
    pub fn filter(&self, keys: Option<&[String]>) -> RoutingContext {
        match keys {
            None => self.clone(),
            Some(keys) => RoutingContext(
                keys.iter()
                    .filter_map(|key| self.0.get(key).map(|value| (key.clone(), value.clone())))
                    .collect(),
            ),
        }
    }

    /// Lower-cased, whitespace-free copy of every term
    pub fn normalised(&self) -> RoutingContext {
        RoutingContext(normalise_map(&self.0))
    }

    /// Evaluate requirements against this context
    pub fn satisfies(&self, requirements: &[Requirement]) -> bool {
        requirements_met(&self.0, requirements)
    }
}

impl From<ContextMap> for RoutingContext {
    fn from(map: ContextMap) -> Self {
        RoutingContext(map)
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for RoutingContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RoutingContext(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
