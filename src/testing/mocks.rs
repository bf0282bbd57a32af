//! Mock implementations for testing
//!
//! Scripted agents, selection gateways and LLM providers, plus a progress sink
//! that remembers what it was sent. None of them need a network or a model.

use crate::agent::{Agent, AgentInput, AgentResponse};
use crate::context::{ContextMap, ConversationContext};
use crate::directory::SELECT_AGENT_TOOL;
use crate::error::{RouterError, RouterResult};
use crate::llm::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, Message, ToolCall,
    ToolDescription,
};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::routing::{GatewayReply, SelectionGateway};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Agent that replays scripted responses
///
/// Responses are returned in order; the last one repeats once the script runs out.
#[derive(Debug, Default)]
pub struct MockAgent {
    name: String,
    responses: Vec<AgentResponse>,
    cursor: Arc<Mutex<usize>>,
    received: Arc<Mutex<Vec<AgentInput>>>,
    context_update: Option<ContextMap>,
    failure: Option<String>,
    hang: bool,
}

impl MockAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Always reply with `content` and status DONE
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.with_responses(vec![AgentResponse::done(content)])
    }

    pub fn with_responses(mut self, responses: Vec<AgentResponse>) -> Self {
        self.responses = responses;
        self
    }

    /// Merge `update` into the routing context on every call
    pub fn with_context_update(mut self, update: ContextMap) -> Self {
        self.context_update = Some(update);
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Never answer
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Every input received so far
    pub async fn calls(&self) -> Vec<AgentInput> {
        self.received.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.received.lock().await.len()
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn receive_message(
        &self,
        input: &AgentInput,
        context: &mut ConversationContext,
    ) -> RouterResult<AgentResponse> {
        self.received.lock().await.push(input.clone());

        if let Some(update) = &self.context_update {
            context.merge_routing(update);
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(message) = &self.failure {
            return Err(RouterError::agent_failed(&self.name, message.clone()));
        }

        let mut cursor = self.cursor.lock().await;
        let response = match self.responses.len() {
            0 => AgentResponse::done(format!("{} handled the message", self.name)),
            len => self.responses[(*cursor).min(len - 1)].clone(),
        };
        *cursor += 1;
        Ok(response)
    }
}

/// Selection gateway that replays scripted replies and records every prompt
#[derive(Debug, Default)]
pub struct MockSelectionGateway {
    replies: Mutex<Vec<Result<GatewayReply, LlmError>>>,
    prompts: Mutex<Vec<Vec<Message>>>,
    tools: Mutex<Vec<Vec<ToolDescription>>>,
    hang: bool,
}

impl MockSelectionGateway {
    pub fn new(replies: Vec<GatewayReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    /// Fail every request with `error`
    pub fn failing(error: LlmError) -> Self {
        Self {
            replies: Mutex::new(vec![Err(error)]),
            ..Default::default()
        }
    }

    /// Only answer once cancelled
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    /// A `select_agent` tool call choosing `agent`
    pub fn select(agent: &str, set_context: Option<Value>) -> GatewayReply {
        let mut arguments = json!({ "agent": agent });
        if let Some(set_context) = set_context {
            arguments["set_context"] = set_context;
        }
        GatewayReply::ToolCall(ToolCall {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: SELECT_AGENT_TOOL.to_string(),
            arguments,
        })
    }

    /// A prose reply instead of a tool call
    pub fn prose(text: &str) -> GatewayReply {
        GatewayReply::Content {
            text: text.to_string(),
        }
    }

    pub async fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().await.clone()
    }

    pub async fn tools(&self) -> Vec<Vec<ToolDescription>> {
        self.tools.lock().await.clone()
    }
}

#[async_trait]
impl SelectionGateway for MockSelectionGateway {
    async fn send_selection_prompt(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDescription>,
        cancellation: &CancellationToken,
    ) -> Result<GatewayReply, LlmError> {
        self.prompts.lock().await.push(messages);
        self.tools.lock().await.push(tools);

        if self.hang {
            cancellation.cancelled().await;
            return Err(LlmError::Cancelled);
        }

        let mut replies = self.replies.lock().await;
        match replies.len() {
            0 => Err(LlmError::InvalidResponse("no scripted reply".to_string())),
            1 => replies[0].clone(),
            _ => replies.remove(0),
        }
    }
}

/// LLM provider that replays scripted completions
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    responses: Mutex<Vec<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
    hang: bool,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            ..Default::default()
        }
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().await.push(request);

        if self.hang {
            std::future::pending::<()>().await;
        }

        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Err(LlmError::InvalidResponse("no scripted response".to_string()));
        }
        Ok(responses.remove(0))
    }
}

/// Progress sink that keeps every event
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: std::sync::Mutex<Vec<(Uuid, ProgressEvent)>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.iter().map(|(_, event)| event.clone()).collect())
            .unwrap_or_default()
    }

    /// Text of every progress and markdown event, in order
    pub fn contents(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| event.content().map(str::to_string))
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, session_id: Uuid, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push((session_id, event));
        }
    }
}
