//! LLM provider abstraction used for agent selection
//!
//! The router never talks to a model directly; it goes through a provider
//! implementing [`LlmProvider`], wrapped by the selection gateway.

pub mod provider;

pub use provider::*;
