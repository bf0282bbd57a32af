//! Test helpers and utilities for integration tests

use agent_router::agent::{Agent, AgentDescriptor};
use agent_router::context::{ContextMap, ContextValue};
use agent_router::directory::AgentDirectory;
use agent_router::testing::MockAgent;
use std::sync::Arc;

/// Register `agent` under `descriptor`, panicking on failure
#[allow(dead_code)]
pub fn register(directory: &mut AgentDirectory, descriptor: AgentDescriptor, agent: Arc<MockAgent>) {
    directory
        .register(descriptor, agent as Arc<dyn Agent>)
        .expect("registration should succeed");
}

/// Build a context map from `(key, [values])` pairs
#[allow(dead_code)]
pub fn context_map(entries: &[(&str, &[&str])]) -> ContextMap {
    entries
        .iter()
        .map(|(key, values)| (key.to_string(), ContextValue::list(values.iter().copied())))
        .collect()
}

/// A named module record for the `modules` key
#[allow(dead_code)]
pub fn module(name: &str, entries: &[(&str, &[&str])]) -> ContextMap {
    let mut record = context_map(entries);
    record.insert("name".to_string(), ContextValue::from(name));
    record
}
