//! Agent contract
//!
//! The router never runs agent logic itself. Anything that can answer a
//! message implements [`Agent`] and is registered in an
//! [`AgentDirectory`](crate::directory::AgentDirectory) together with its
//! [`AgentDescriptor`].

pub mod descriptor;
pub mod message;

pub use descriptor::AgentDescriptor;
pub use message::{
    AgentInput, AgentResponse, FollowUp, MessageContent, ReplyMessage, ResponseStatus,
};

use crate::context::ConversationContext;
use crate::error::RouterResult;
use async_trait::async_trait;

/// A live handler bound to one descriptor
#[async_trait]
pub trait Agent: Send + Sync {
    /// Must equal the name of the descriptor the agent is registered under
    fn name(&self) -> &str;

    /// Handle one message. The agent may merge facts into the conversation's
    /// routing context while doing so.
    async fn receive_message(
        &self,
        input: &AgentInput,
        context: &mut ConversationContext,
    ) -> RouterResult<AgentResponse>;
}
