//! Typed decoding of the selection model's reply
//!
//! Tool-call payloads are decoded once, here. The router only branches on
//! [`SelectionOutcome`].

use super::gateway::GatewayReply;
use crate::context::{merge, ContextMap};
use crate::directory::SELECT_AGENT_TOOL;
use serde::Deserialize;
use serde_json::Value;

/// What the model decided
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    AgentSelected {
        name: String,
        role: Option<String>,
        context_updates: Option<ContextMap>,
    },
    /// Prose instead of a tool call
    Ambiguous { text: String },
    /// A tool call that could not be decoded
    Unparseable { reason: String },
}

#[derive(Debug, Deserialize)]
struct SelectAgentArgs {
    agent: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    set_context: Option<ContextUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContextUpdate {
    /// `{"context": [{"languages": [...]}, {"platforms": [...]}]}`
    Wrapped { context: Vec<ContextMap> },
    /// `{"languages": [...]}`
    Direct(ContextMap),
}

impl ContextUpdate {
    fn into_map(self) -> ContextMap {
        match self {
            ContextUpdate::Direct(map) => map,
            ContextUpdate::Wrapped { context } => context
                .iter()
                .fold(ContextMap::new(), |acc, part| merge(&acc, part)),
        }
    }
}

impl SelectionOutcome {
    pub fn decode(reply: GatewayReply) -> Self {
        let call = match reply {
            GatewayReply::Content { text } => return SelectionOutcome::Ambiguous { text },
            GatewayReply::ToolCall(call) => call,
        };

        if call.name != SELECT_AGENT_TOOL {
            return SelectionOutcome::Unparseable {
                reason: format!("unexpected tool '{}'", call.name),
            };
        }

        // Some providers hand the arguments over as an encoded string
        let arguments = match call.arguments {
            Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
                Ok(value) => value,
                Err(e) => {
                    return SelectionOutcome::Unparseable {
                        reason: format!("arguments are not JSON: {}", e),
                    }
                }
            },
            other => other,
        };

        match serde_json::from_value::<SelectAgentArgs>(arguments) {
            Ok(args) => SelectionOutcome::AgentSelected {
                name: args.agent,
                role: args.role,
                context_updates: args
                    .set_context
                    .map(ContextUpdate::into_map)
                    .filter(|updates| !updates.is_empty()),
            },
            Err(e) => SelectionOutcome::Unparseable {
                reason: format!("invalid {} arguments: {}", SELECT_AGENT_TOOL, e),
            },
        }
    }
}
