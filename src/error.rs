//! Error types for agent routing
//!
//! Merging and requirement evaluation never fail; everything else reports
//! through [`RouterError`]. Errors that reach a user are converted into a
//! sanitised reply with [`RouterError::to_response`].

use crate::agent::{AgentResponse, ResponseStatus};
use crate::llm::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Main error type for routing operations
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Agent '{name}' is already registered")]
    DuplicateAgent { name: String },

    #[error("No agent available for '{role}'")]
    NotFound { role: String },

    #[error("Request cancelled while awaiting {stage}")]
    Cancelled { stage: String },

    #[error("Agent '{agent}' failed: {message}")]
    AgentFailed { agent: String, message: String },

    #[error("Routing exceeded {max} hops without a reply")]
    HopLimitExceeded { max: usize },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl RouterError {
    pub fn duplicate_agent<S: Into<String>>(name: S) -> Self {
        Self::DuplicateAgent { name: name.into() }
    }

    pub fn not_found<S: Into<String>>(role: S) -> Self {
        Self::NotFound { role: role.into() }
    }

    pub fn cancelled<S: Into<String>>(stage: S) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    pub fn agent_failed<A: Into<String>, M: Into<String>>(agent: A, message: M) -> Self {
        Self::AgentFailed {
            agent: agent.into(),
            message: message.into(),
        }
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Render the error as a reply that is safe to show the user
    pub fn to_response(&self) -> AgentResponse {
        AgentResponse::new(
            sanitize_error_message(&self.to_string()),
            ResponseStatus::NeedsDebugging,
        )
    }
}

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("path pattern is valid")
});

const MAX_MESSAGE_LEN: usize = 500;
const TRUNCATE_SUFFIX: &str = "...[truncated]";

/// Redact secrets and sensitive paths, then cap the length
fn sanitize_error_message(message: &str) -> String {
    let sanitized = SECRET_PATTERN.replace_all(message, "${1}=***");
    let mut sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .into_owned();

    if sanitized.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN - TRUNCATE_SUFFIX.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str(TRUNCATE_SUFFIX);
    }

    sanitized
}

/// Result type for routing operations
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_and_display() {
        assert_eq!(
            RouterError::duplicate_agent("dev").to_string(),
            "Agent 'dev' is already registered"
        );
        assert_eq!(
            RouterError::not_found("tester").to_string(),
            "No agent available for 'tester'"
        );
        assert_eq!(
            RouterError::cancelled("selection").to_string(),
            "Request cancelled while awaiting selection"
        );
        assert!(RouterError::cancelled("agent").is_cancelled());
        assert!(!RouterError::invalid_input("x").is_cancelled());
    }

    #[test]
    fn test_llm_error_converts() {
        let error: RouterError = LlmError::RequestFailed("timeout".to_string()).into();
        assert!(matches!(error, RouterError::Llm(_)));
        assert_eq!(error.to_string(), "LLM provider error: Request failed: timeout");
    }

    #[test]
    fn test_to_response_is_sanitised() {
        let error = RouterError::agent_failed("cli", "auth failed: token=abc456");
        let response = error.to_response();

        assert_eq!(response.status, ResponseStatus::NeedsDebugging);
        assert!(!response.reply.content.contains("abc456"));
        assert!(response.reply.content.contains("token=***"));
    }

    #[test]
    fn test_sanitize_paths() {
        let sanitized = sanitize_error_message("Failed to read /home/user/.ssh/id_rsa");
        assert!(sanitized.contains("/***REDACTED***/"));
        assert!(!sanitized.contains("id_rsa"));
    }

    #[test]
    fn test_long_message_truncation() {
        let sanitized = sanitize_error_message(&"x".repeat(600));
        assert!(sanitized.len() <= MAX_MESSAGE_LEN);
        assert!(sanitized.ends_with(TRUNCATE_SUFFIX));

        let exact = sanitize_error_message(&"x".repeat(MAX_MESSAGE_LEN));
        assert_eq!(exact.len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let sanitized = sanitize_error_message(&"é".repeat(400));
        assert!(sanitized.ends_with(TRUNCATE_SUFFIX));
        assert!(sanitized.len() <= MAX_MESSAGE_LEN);
    }
}
