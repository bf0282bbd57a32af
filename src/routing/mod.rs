//! Message routing
//!
//! [`Router`] owns the dispatch loop of one conversation. Ranking comes from the
//! [`AgentDirectory`](crate::directory::AgentDirectory); ties go to a model
//! through a [`SelectionGateway`] whose reply is decoded into a
//! [`SelectionOutcome`].

pub mod gateway;
pub mod router;
pub mod selection;

pub use gateway::{GatewayReply, LlmSelectionGateway, SelectionGateway};
pub use router::{Router, APOLOGY, DEFAULT_SELECTION_PROMPT};
pub use selection::SelectionOutcome;
