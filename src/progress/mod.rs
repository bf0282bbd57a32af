//! Progress reporting for routed conversations
//!
//! Progress is fire-and-forget: sinks never fail and nothing they return is
//! consumed. The router emits the chosen agent and every non-empty reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// A single progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProgressEvent {
    /// A piece of the response, rendered as markdown
    Markdown { content: String },
    /// A transient status line ("Using agent: developer")
    Progress { content: String },
    /// A resource the agent used while processing
    Reference { uri: String },
    /// A command the user can trigger
    Button { title: String, command: String },
}

impl ProgressEvent {
    pub fn markdown(content: impl Into<String>) -> Self {
        ProgressEvent::Markdown {
            content: content.into(),
        }
    }

    pub fn progress(content: impl Into<String>) -> Self {
        ProgressEvent::Progress {
            content: content.into(),
        }
    }

    /// Text carried by markdown and progress events
    pub fn content(&self) -> Option<&str> {
        match self {
            ProgressEvent::Markdown { content } | ProgressEvent::Progress { content } => {
                Some(content)
            }
            _ => None,
        }
    }
}

/// Progress event stamped with its session and time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: ProgressEvent,
}

impl ProgressMessage {
    pub fn new(session_id: Uuid, event: ProgressEvent) -> Self {
        Self {
            session_id,
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Destination for progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, session_id: Uuid, event: ProgressEvent);
}

pub struct NoOpProgress;

impl ProgressSink for NoOpProgress {
    fn emit(&self, _session_id: Uuid, _event: ProgressEvent) {}
}

/// Writes progress to the log
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, session_id: Uuid, event: ProgressEvent) {
        match &event {
            ProgressEvent::Progress { content } => info!(session = %session_id, "{}", content),
            other => debug!(session = %session_id, event = ?other, "Progress event"),
        }
    }
}

/// Forwards progress to an unbounded channel
///
/// A dropped receiver is not an error; events are simply discarded.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<ProgressMessage>,
}

impl ChannelProgress {
    pub fn new(sender: mpsc::UnboundedSender<ProgressMessage>) -> Self {
        Self { sender }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, session_id: Uuid, event: ProgressEvent) {
        let _ = self.sender.send(ProgressMessage::new(session_id, event));
    }
}
