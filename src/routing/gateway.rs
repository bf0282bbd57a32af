//! LLM selection gateway
//!
//! The router asks a model to break ties through [`SelectionGateway`], which
//! always answers with one of two shapes: free text or a tool call.

use crate::config::SelectionSection;
use crate::llm::{
    CompletionRequest, LlmError, LlmProvider, Message, ToolCall, ToolDescription,
};
use crate::selection_span;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

/// Raw reply from the selection model
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayReply {
    /// The model answered in prose instead of calling a tool
    Content { text: String },
    ToolCall(ToolCall),
}

#[async_trait]
pub trait SelectionGateway: Send + Sync {
    /// Send the selection prompt; must return `LlmError::Cancelled` once
    /// `cancellation` fires
    async fn send_selection_prompt(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDescription>,
        cancellation: &CancellationToken,
    ) -> Result<GatewayReply, LlmError>;
}

/// Gateway backed by an [`LlmProvider`]
pub struct LlmSelectionGateway {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmSelectionGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: 500,
        }
    }

    pub fn from_settings(
        provider: Arc<dyn LlmProvider>,
        settings: &SelectionSection,
    ) -> Self {
        Self::new(provider, settings.model.clone())
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl SelectionGateway for LlmSelectionGateway {
    async fn send_selection_prompt(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDescription>,
        cancellation: &CancellationToken,
    ) -> Result<GatewayReply, LlmError> {
        let request = CompletionRequest {
            messages,
            model: self.model.clone(),
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            tool_choice: (!tools.is_empty()).then(|| "required".to_string()),
            tools: Some(tools),
            metadata: HashMap::new(),
        };

        let span = selection_span!(provider = %self.provider.name(), model = %self.model);
        let response = async {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(LlmError::Cancelled),
                response = self.provider.complete(request) => response,
            }
        }
        .instrument(span)
        .await?;

        debug!(
            model = %response.model,
            finish_reason = ?response.finish_reason,
            total_tokens = response.usage.total_tokens,
            "Selection response received"
        );

        if let Some(call) = response.tool_calls.and_then(|calls| calls.into_iter().next()) {
            return Ok(GatewayReply::ToolCall(call));
        }
        Ok(GatewayReply::Content {
            text: response.content.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, FinishReason, TokenUsage};
    use crate::testing::mocks::MockLlmProvider;
    use serde_json::json;

    fn response(content: Option<&str>, tool_calls: Option<Vec<ToolCall>>) -> CompletionResponse {
        CompletionResponse {
            content: content.map(str::to_string),
            model: "test-model".to_string(),
            usage: TokenUsage::default(),
            finish_reason: FinishReason::Stop,
            tool_calls,
        }
    }

    #[tokio::test]
    async fn test_tool_call_is_returned() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "select_agent".to_string(),
            arguments: json!({"agent": "web"}),
        };
        let provider = Arc::new(MockLlmProvider::new(vec![response(None, Some(vec![call.clone()]))]));
        let gateway = LlmSelectionGateway::new(provider.clone(), "test-model");

        let tool = ToolDescription {
            name: "select_agent".to_string(),
            description: String::new(),
            parameters: json!({}),
        };
        let reply = gateway
            .send_selection_prompt(vec![Message::user("hi")], vec![tool], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply, GatewayReply::ToolCall(call));
        let requests = provider.requests().await;
        assert_eq!(requests[0].tool_choice.as_deref(), Some("required"));
        assert_eq!(requests[0].temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_content_reply() {
        let provider = Arc::new(MockLlmProvider::new(vec![response(Some("I think web"), None)]));
        let gateway = LlmSelectionGateway::new(provider, "test-model");

        let reply = gateway
            .send_selection_prompt(vec![], vec![], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            reply,
            GatewayReply::Content {
                text: "I think web".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_reply() {
        let provider = Arc::new(MockLlmProvider::new(vec![]).hanging());
        let gateway = LlmSelectionGateway::new(provider, "test-model");
        let token = CancellationToken::new();
        token.cancel();

        let result = gateway.send_selection_prompt(vec![], vec![], &token).await;
        assert!(matches!(result, Err(LlmError::Cancelled)));
    }
}
