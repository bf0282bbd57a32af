//! Agent router
//!
//! Decides which of a directory of autonomous agents should handle an incoming
//! message, and keeps a shared routing context that accumulates facts across
//! handoffs.
//!
//! # Overview
//!
//! - [`context`]: the routing context value model, its merge rules and the
//!   requirement predicate language
//! - [`directory`]: registry of agents by name and role, with ranked search
//!   and the LLM selection tool
//! - [`routing`]: the per-session dispatch loop and the selection gateway
//! - [`config`]: TOML configuration
//! - [`progress`]: progress sinks the router reports to
//!
//! # Quick Start
//!
//! ```rust
//! use agent_router::agent::{AgentDescriptor, AgentInput};
//! use agent_router::context::{ConversationContext, RoutingContext};
//! use agent_router::directory::AgentDirectory;
//! use agent_router::routing::Router;
//! use agent_router::testing::{MockAgent, MockSelectionGateway};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let mut directory = AgentDirectory::new();
//! directory.register(
//!     AgentDescriptor::new("rust-dev")
//!         .with_roles(["developer"])
//!         .with_context(RoutingContext::new().with("languages", vec!["rust"])),
//!     Arc::new(MockAgent::new("rust-dev").with_reply("On it")),
//! )?;
//!
//! let gateway = Arc::new(MockSelectionGateway::new(vec![]));
//! let mut router = Router::new(Arc::new(directory), gateway);
//! let mut session = ConversationContext::new();
//!
//! let response = router.receive(AgentInput::text("Fix my build"), &mut session).await?;
//! assert_eq!(response.reply.content, "On it");
//! # Ok::<(), agent_router::RouterError>(())
//! # }).unwrap();
//! ```

pub mod agent;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod llm;
pub mod observability;
pub mod progress;
pub mod routing;
pub mod testing;

pub use agent::{Agent, AgentDescriptor, AgentInput, AgentResponse, ResponseStatus};
pub use config::{ConfigError, RouterConfig};
pub use context::{ConversationContext, RoutingContext};
pub use directory::AgentDirectory;
pub use error::{RouterError, RouterResult};
pub use routing::Router;
