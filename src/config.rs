//! Router configuration
//!
//! A single TOML file declares the router settings, the model used to break
//! ranking ties, the agents to register, and the initial routing context of
//! every new session.

use crate::agent::AgentDescriptor;
use crate::context::RoutingContext;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RouterConfig {
    #[serde(default)]
    pub router: RouterSection,
    #[serde(default)]
    pub selection: SelectionSection,
    #[serde(default)]
    pub agents: Vec<AgentDescriptor>,
    /// Routing context every new session starts with
    #[serde(default)]
    pub context: RoutingContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RouterSection {
    #[serde(default = "default_router_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Allow-list of candidate agent names; empty means every agent
    #[serde(default)]
    pub team: Vec<String>,
    /// Agents tried, in rank order, when no candidate matches
    #[serde(default)]
    pub fallbacks: Vec<String>,
    /// Agent used when neither candidates nor fallbacks are available
    #[serde(default)]
    pub default_agent: Option<String>,
    /// Restrict ranking to these context keys
    #[serde(default)]
    pub context_keys: Option<Vec<String>>,
    /// Upper bound on agent hops per message
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    /// Overrides the built-in selection prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            name: default_router_name(),
            description: String::new(),
            team: Vec::new(),
            fallbacks: Vec::new(),
            default_agent: None,
            context_keys: None,
            max_hops: default_max_hops(),
            system_prompt: None,
        }
    }
}

fn default_router_name() -> String {
    "router".to_string()
}

fn default_max_hops() -> usize {
    32
}

/// Model settings for LLM-assisted selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct SelectionSection {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Environment variable holding the provider API key, read at runtime
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            api_key_env: None,
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid agent name: {0}")]
    InvalidAgentName(String),
    #[error("Agent '{0}' is declared more than once")]
    DuplicateAgent(String),
    #[error("{field} references unknown agent '{name}'")]
    UnknownAgent { field: String, name: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RouterConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut declared = HashSet::new();
        for agent in &self.agents {
            validate_agent_name(&agent.name)?;
            if !declared.insert(agent.name.as_str()) {
                return Err(ConfigError::DuplicateAgent(agent.name.clone()));
            }
        }

        let check = |field: &str, name: &str| {
            if declared.contains(name) {
                Ok(())
            } else {
                Err(ConfigError::UnknownAgent {
                    field: field.to_string(),
                    name: name.to_string(),
                })
            }
        };

        if let Some(default_agent) = &self.router.default_agent {
            check("router.default_agent", default_agent)?;
        }
        for name in &self.router.team {
            check("router.team", name)?;
        }
        for name in &self.router.fallbacks {
            check("router.fallbacks", name)?;
        }

        if self.router.max_hops == 0 {
            return Err(ConfigError::InvalidConfig(
                "router.max_hops must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Read the selection API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.selection.api_key_env {
            None => Ok(None),
            Some(name) => std::env::var(name)
                .map(Some)
                .map_err(|_| ConfigError::EnvVarNotFound(name.clone())),
        }
    }

    /// JSON Schema of the configuration file
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(RouterConfig);
        serde_json::to_value(schema).unwrap_or_default()
    }
}

/// Agent names must match `[a-zA-Z0-9._-]+`
fn validate_agent_name(name: &str) -> Result<(), ConfigError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if name.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidAgentName(format!(
            "Agent name '{name}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
