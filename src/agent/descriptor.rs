//! Declarative agent descriptions

use crate::context::{Requirement, RoutingContext};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Static description of an agent, used for lookup and ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentDescriptor {
    /// Unique agent name
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Capability tags, e.g. "developer"
    #[serde(default)]
    pub roles: Vec<String>,
    /// Profile the agent works within; only used for ranking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<RoutingContext>,
    /// Baseline ranking score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    /// Conditions the task context must meet before the agent is a candidate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requirement>,
    /// Agents preferred for the next hop once this one hands off
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<String>,
    /// Agents to hand over to when no candidate qualifies after this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context(mut self, context: RoutingContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_rank(mut self, rank: i64) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_requirements(mut self, requires: Vec<Requirement>) -> Self {
        self.requires = requires;
        self
    }

    pub fn with_team<I, S>(mut self, team: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.team = team.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fallbacks<I, S>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallbacks = fallbacks.into_iter().map(Into::into).collect();
        self
    }

    pub fn baseline_rank(&self) -> i64 {
        self.rank.unwrap_or(0)
    }

    /// Copy with a normalised profile and de-duplicated roles
    pub fn normalised(&self) -> Self {
        let mut roles: Vec<String> = Vec::with_capacity(self.roles.len());
        for role in &self.roles {
            if !roles.contains(role) {
                roles.push(role.clone());
            }
        }

        Self {
            roles,
            context: self.context.as_ref().map(RoutingContext::normalised),
            ..self.clone()
        }
    }

    /// Text shown to the selection model for this agent
    pub fn description_for_routing(&self) -> String {
        let mut parts = Vec::new();
        if !self.description.is_empty() {
            parts.push(self.description.clone());
        }
        if let Some(context) = self.context.as_ref().filter(|context| !context.is_empty()) {
            let profile = serde_json::to_string(context).unwrap_or_default();
            parts.push(format!(
                "This agent can work within the following context: {}",
                profile
            ));
        }
        if !self.roles.is_empty() {
            parts.push(format!("Specialising in roles: {}", self.roles.join(", ")));
        }
        parts.join("\n")
    }
}
