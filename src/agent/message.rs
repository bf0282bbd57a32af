//! Messages exchanged with agents

use crate::llm::Message;
use serde::{Deserialize, Serialize};

/// Body of an incoming message: plain text or a prepared conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Messages(Vec<Message>),
}

/// Message delivered to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInput {
    pub content: MessageContent,
    /// Slash command the user invoked, without the leading `/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl AgentInput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: MessageContent::Text(content.into()),
            command: None,
        }
    }

    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            content: MessageContent::Messages(messages),
            command: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Drop the slash command so the input can be replayed without re-triggering it
    pub fn strip_command(&mut self) {
        self.command = None;
    }

    /// Convert to LLM messages; text input gets the optional system prompt prepended,
    /// a prepared conversation is passed through unchanged
    pub fn to_llm_messages(&self, system_prompt: Option<&str>) -> Vec<Message> {
        match &self.content {
            MessageContent::Text(text) => {
                let user = Message::user(text.clone());
                match system_prompt {
                    Some(system) => vec![Message::system(system), user],
                    None => vec![user],
                }
            }
            MessageContent::Messages(messages) => messages.clone(),
        }
    }
}

/// Outcome reported by an agent alongside its reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    NeedsUserInput,
    NeedsDebugging,
    InProgress,
    /// Continue with the next step without waiting for the user
    NextStep,
    #[default]
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub content: String,
}

/// Suggested next prompt offered to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Another participant to send the prompt to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
}

/// An agent's answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub reply: ReplyMessage,
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followups: Vec<FollowUp>,
}

impl AgentResponse {
    pub fn new(content: impl Into<String>, status: ResponseStatus) -> Self {
        Self {
            reply: ReplyMessage {
                content: content.into(),
            },
            status,
            followups: Vec::new(),
        }
    }

    pub fn done(content: impl Into<String>) -> Self {
        Self::new(content, ResponseStatus::Done)
    }

    /// Empty reply asking the router to carry on without new input
    pub fn next_step() -> Self {
        Self::new(String::new(), ResponseStatus::NextStep)
    }

    pub fn with_followups(mut self, followups: Vec<FollowUp>) -> Self {
        self.followups = followups;
        self
    }

    pub fn has_content(&self) -> bool {
        !self.reply.content.is_empty()
    }
}
