//! Agent directory
//!
//! An explicitly constructed registry of agents, indexed by name and by role.
//! Several independent directories can coexist (one per tenant, one per test).
//!
//! Mutation takes `&mut self` and holds no lock. Once a directory is shared
//! behind an `Arc` it is read-only unless the embedding application
//! serialises writes itself.

pub mod search;
pub mod selection_tool;

pub use search::{RankedCandidate, SearchOptions};
pub use selection_tool::{build_selection_tool, SELECT_AGENT_TOOL};

use crate::agent::{Agent, AgentDescriptor};
use crate::error::{RouterError, RouterResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Role value that matches every registered agent
pub const WILDCARD_ROLE: &str = "?";

pub(crate) fn is_wildcard(role: &str) -> bool {
    matches!(role.trim(), "" | WILDCARD_ROLE | "*")
}

struct DirectoryEntry {
    descriptor: AgentDescriptor,
    instance: Arc<dyn Agent>,
}

/// Registry of agent descriptors and their live instances
#[derive(Default)]
pub struct AgentDirectory {
    entries: HashMap<String, DirectoryEntry>,
    /// Agent names in registration order
    order: Vec<String>,
    roles: HashMap<String, Vec<String>>,
    /// Role names in first-registration order
    role_order: Vec<String>,
}

impl fmt::Debug for AgentDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDirectory")
            .field("agents", &self.order)
            .field("roles", &self.role_order)
            .finish()
    }
}

impl AgentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from descriptors, creating each instance with `factory`
    pub fn from_descriptors<I, F>(descriptors: I, mut factory: F) -> RouterResult<Self>
    where
        I: IntoIterator<Item = AgentDescriptor>,
        F: FnMut(&AgentDescriptor) -> Arc<dyn Agent>,
    {
        let mut directory = Self::new();
        for descriptor in descriptors {
            let instance = factory(&descriptor);
            directory.register(descriptor, instance)?;
        }
        Ok(directory)
    }

    /// Register an agent under its unique name and index it by every role
    pub fn register(
        &mut self,
        descriptor: AgentDescriptor,
        instance: Arc<dyn Agent>,
    ) -> RouterResult<()> {
        if self.entries.contains_key(&descriptor.name) {
            return Err(RouterError::duplicate_agent(descriptor.name));
        }
        if instance.name() != descriptor.name {
            return Err(RouterError::invalid_input(format!(
                "agent instance '{}' registered under descriptor '{}'",
                instance.name(),
                descriptor.name
            )));
        }

        let descriptor = descriptor.normalised();
        let name = descriptor.name.clone();

        for role in &descriptor.roles {
            let members = self.roles.entry(role.clone()).or_insert_with(|| {
                self.role_order.push(role.clone());
                Vec::new()
            });
            members.push(name.clone());
        }

        info!(agent = %name, roles = ?descriptor.roles, "Registered agent");
        self.order.push(name.clone());
        self.entries.insert(
            name,
            DirectoryEntry {
                descriptor,
                instance,
            },
        );
        Ok(())
    }

    /// Remove an agent and every reference to it held elsewhere in the directory
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Agent>> {
        let entry = self.entries.remove(name)?;

        self.order.retain(|registered| registered != name);

        for members in self.roles.values_mut() {
            members.retain(|member| member != name);
        }
        self.roles.retain(|_, members| !members.is_empty());
        let roles = &self.roles;
        self.role_order.retain(|role| roles.contains_key(role));

        for other in self.entries.values_mut() {
            other.descriptor.fallbacks.retain(|fallback| fallback != name);
            other.descriptor.team.retain(|member| member != name);
        }

        info!(agent = %name, "Unregistered agent");
        Some(entry.instance)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.entries.get(name).map(|entry| entry.instance.clone())
    }

    pub fn descriptor(&self, name: &str) -> Option<&AgentDescriptor> {
        self.entries.get(name).map(|entry| &entry.descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Agent names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn roles(&self) -> &[String] {
        &self.role_order
    }

    /// Names registered for `role`, in registration order
    pub fn agents_for_role(&self, role: &str) -> &[String] {
        self.roles.get(role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Resolve an agent's fallback names to the instances registered right now
    pub fn resolve_fallbacks(&self, name: &str) -> Vec<Arc<dyn Agent>> {
        let Some(entry) = self.entries.get(name) else {
            return Vec::new();
        };

        entry
            .descriptor
            .fallbacks
            .iter()
            .filter_map(|fallback| {
                let resolved = self.get(fallback);
                if resolved.is_none() {
                    debug!(agent = %name, fallback = %fallback, "Skipping unregistered fallback");
                }
                resolved
            })
            .collect()
    }

    fn descriptors_in_order(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| &entry.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockAgent;

    fn agent(name: &str) -> Arc<dyn Agent> {
        Arc::new(MockAgent::new(name))
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut directory = AgentDirectory::new();
        directory
            .register(AgentDescriptor::new("dev").with_roles(["developer"]), agent("dev"))
            .unwrap();

        let error = directory
            .register(AgentDescriptor::new("dev").with_roles(["tester"]), agent("dev"))
            .unwrap_err();

        assert!(matches!(error, RouterError::DuplicateAgent { .. }));
        assert_eq!(directory.len(), 1);
        assert!(directory.agents_for_role("tester").is_empty());
    }

    #[test]
    fn test_register_rejects_mismatched_instance() {
        let mut directory = AgentDirectory::new();
        let error = directory
            .register(AgentDescriptor::new("dev"), agent("other"))
            .unwrap_err();
        assert!(matches!(error, RouterError::InvalidInput { .. }));
        assert!(directory.is_empty());
    }

    #[test]
    fn test_role_index_in_registration_order() {
        let mut directory = AgentDirectory::new();
        directory
            .register(AgentDescriptor::new("a").with_roles(["developer"]), agent("a"))
            .unwrap();
        directory
            .register(
                AgentDescriptor::new("b").with_roles(["tester", "developer"]),
                agent("b"),
            )
            .unwrap();

        assert_eq!(directory.agents_for_role("developer"), ["a", "b"]);
        assert_eq!(directory.roles(), ["developer", "tester"]);
        assert_eq!(directory.names(), ["a", "b"]);
    }

    #[test]
    fn test_unregister_purges_every_reference() {
        let mut directory = AgentDirectory::new();
        directory
            .register(AgentDescriptor::new("a").with_roles(["developer"]), agent("a"))
            .unwrap();
        directory
            .register(
                AgentDescriptor::new("b")
                    .with_roles(["developer"])
                    .with_fallbacks(["a"])
                    .with_team(["a"]),
                agent("b"),
            )
            .unwrap();

        assert!(directory.unregister("a").is_some());
        assert!(directory.unregister("a").is_none());

        assert!(!directory.contains("a"));
        assert_eq!(directory.agents_for_role("developer"), ["b"]);
        let b = directory.descriptor("b").unwrap();
        assert!(b.fallbacks.is_empty());
        assert!(b.team.is_empty());
    }

    #[test]
    fn test_empty_roles_are_dropped() {
        let mut directory = AgentDirectory::new();
        directory
            .register(AgentDescriptor::new("a").with_roles(["designer"]), agent("a"))
            .unwrap();
        directory.unregister("a");
        assert!(directory.roles().is_empty());
    }

    #[test]
    fn test_fallbacks_resolve_lazily() {
        let mut directory = AgentDirectory::new();
        directory
            .register(
                AgentDescriptor::new("primary").with_fallbacks(["late", "missing"]),
                agent("primary"),
            )
            .unwrap();

        assert!(directory.resolve_fallbacks("primary").is_empty());

        directory
            .register(AgentDescriptor::new("late"), agent("late"))
            .unwrap();

        let resolved = directory.resolve_fallbacks("primary");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "late");
        assert!(directory.resolve_fallbacks("unknown").is_empty());
    }

    #[test]
    fn test_from_descriptors() {
        let directory = AgentDirectory::from_descriptors(
            vec![AgentDescriptor::new("a"), AgentDescriptor::new("b")],
            |descriptor| agent(&descriptor.name),
        )
        .unwrap();
        assert_eq!(directory.len(), 2);

        let duplicate = AgentDirectory::from_descriptors(
            vec![AgentDescriptor::new("a"), AgentDescriptor::new("a")],
            |descriptor| agent(&descriptor.name),
        );
        assert!(duplicate.is_err());
    }
}
