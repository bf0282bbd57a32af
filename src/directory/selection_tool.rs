//! Function-call schema offered to the model when ranking is ambiguous

use super::AgentDirectory;
use crate::agent::Agent;
use crate::llm::ToolDescription;
use serde_json::{json, Value};
use std::sync::Arc;

/// Name of the generated selection tool
pub const SELECT_AGENT_TOOL: &str = "select_agent";

impl AgentDirectory {
    /// Build the selection tool for `candidates`, or for every registered agent
    pub fn build_selection_tool(&self, candidates: Option<&[Arc<dyn Agent>]>) -> ToolDescription {
        let names: Vec<String> = match candidates {
            Some(candidates) => candidates
                .iter()
                .map(|agent| agent.name().to_string())
                .collect(),
            None => self.names().to_vec(),
        };
        build_selection_tool(self, &names)
    }
}

/// Build the selection tool for the named agents of `directory`
pub fn build_selection_tool(directory: &AgentDirectory, names: &[String]) -> ToolDescription {
    let mut roles: Vec<&str> = Vec::new();
    let mut catalogue = Vec::with_capacity(names.len());

    for name in names {
        let Some(descriptor) = directory.descriptor(name) else {
            continue;
        };
        for role in &descriptor.roles {
            if !roles.contains(&role.as_str()) {
                roles.push(role);
            }
        }
        let details = descriptor.description_for_routing();
        if details.is_empty() {
            catalogue.push(format!("- {}", name));
        } else {
            catalogue.push(format!("- {}: {}", name, details.replace('\n', " ")));
        }
    }

    let mut properties = serde_json::Map::new();
    properties.insert(
        "agent".to_string(),
        json!({
            "type": "string",
            "description": format!(
                "Name of the agent that should handle the message. Available agents:\n{}",
                catalogue.join("\n")
            ),
            "enum": names,
        }),
    );
    if !roles.is_empty() {
        properties.insert(
            "role".to_string(),
            json!({
                "type": "string",
                "description": "Role the chosen agent will play",
                "enum": roles,
            }),
        );
    }
    properties.insert(
        "set_context".to_string(),
        json!({
            "type": "object",
            "description": "Update the conversation context with relevant facts from the request",
            "properties": {
                "context": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "description": "Context category, preferably one of languages, frameworks, \
                                        platforms, dependencies, os, regions",
                        "additionalProperties": {
                            "type": "array",
                            "items": {
                                "type": "string",
                                "pattern": "^[a-z-]+$",
                                "description": "Lower-case terms without spaces"
                            }
                        }
                    }
                }
            }
        }),
    );

    ToolDescription {
        name: SELECT_AGENT_TOOL.to_string(),
        description: "Select the agent best suited to handle the user's message".to_string(),
        parameters: json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": ["agent"],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentDescriptor;
    use crate::testing::mocks::MockAgent;

    fn directory() -> AgentDirectory {
        let mut directory = AgentDirectory::new();
        for (name, roles) in [("web", vec!["developer"]), ("qa", vec!["tester", "developer"])] {
            directory
                .register(
                    AgentDescriptor::new(name)
                        .with_description(format!("{} agent", name))
                        .with_roles(roles),
                    Arc::new(MockAgent::new(name)),
                )
                .unwrap();
        }
        directory
    }

    #[test]
    fn test_tool_enumerates_every_agent_by_default() {
        let tool = directory().build_selection_tool(None);

        assert_eq!(tool.name, SELECT_AGENT_TOOL);
        let properties = &tool.parameters["properties"];
        assert_eq!(properties["agent"]["enum"], json!(["web", "qa"]));
        assert_eq!(properties["role"]["enum"], json!(["developer", "tester"]));
        assert_eq!(tool.parameters["required"], json!(["agent"]));

        let description = properties["agent"]["description"].as_str().unwrap();
        assert!(description.contains("- web: web agent Specialising in roles: developer"));
    }

    #[test]
    fn test_tool_restricted_to_candidates() {
        let directory = directory();
        let candidates = vec![directory.get("qa").unwrap()];
        let tool = directory.build_selection_tool(Some(&candidates));

        assert_eq!(tool.parameters["properties"]["agent"]["enum"], json!(["qa"]));
        assert_eq!(
            tool.parameters["properties"]["set_context"]["properties"]["context"]["items"]
                ["additionalProperties"]["type"],
            "array"
        );
    }
}
