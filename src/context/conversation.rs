//! Per-session conversation state
//!
//! One [`ConversationContext`] exists per active task or chat session. It owns
//! the routing context and carries the collaborators supplied by the host: a
//! cancellation token, a progress sink, and a permission handler.

use super::{ContextMap, RoutingContext};
use crate::progress::{NoOpProgress, ProgressEvent, ProgressSink};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Asks the user to approve an action
#[async_trait]
pub trait PermissionHandler: Send + Sync {
    async fn ask(&self, message: &str) -> bool;
}

/// Grants every request, logging that nobody was asked
pub struct AllowAll;

#[async_trait]
impl PermissionHandler for AllowAll {
    async fn ask(&self, message: &str) -> bool {
        info!("{}", message);
        warn!("No permission handler configured, allowing by default");
        true
    }
}

/// State owned by a single conversation
pub struct ConversationContext {
    session_id: Uuid,
    routing: RoutingContext,
    cancellation: CancellationToken,
    progress: Arc<dyn ProgressSink>,
    permissions: Arc<dyn PermissionHandler>,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            routing: RoutingContext::new(),
            cancellation: CancellationToken::new(),
            progress: Arc::new(NoOpProgress),
            permissions: Arc::new(AllowAll),
        }
    }

    pub fn with_routing(mut self, routing: RoutingContext) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionHandler>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn routing(&self) -> &RoutingContext {
        &self.routing
    }

    /// Merge `delta` into the routing context and return the result
    pub fn merge_routing(&mut self, delta: &ContextMap) -> &RoutingContext {
        self.routing.merge_from(delta);
        debug!(session = %self.session_id, routing = ?self.routing, "Routing context updated");
        &self.routing
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn emit(&self, event: ProgressEvent) {
        self.progress.emit(self.session_id, event);
    }

    pub async fn ask_permission(&self, message: &str) -> bool {
        self.permissions.ask(message).await
    }
}
