//! Per-session message router
//!
//! ```text
//! receive(input)
//!   └─ active agent? ── no ──> choose_agent: rank ─┬─ 0 ─> fallbacks / default / apology
//!        │                                         ├─ 1 ─> that agent
//!        │                                         └─ n ─> LLM selection tool
//!        └─ forward to agent ─> empty reply + NEXT_STEP? ── yes ─> loop
//!                                                      └─ no ──> return reply
//! ```
//!
//! The loop suspends only while waiting for the selection model or the chosen
//! agent, and both waits race the session's cancellation token.

use super::gateway::SelectionGateway;
use super::selection::SelectionOutcome;
use crate::agent::{Agent, AgentDescriptor, AgentInput, AgentResponse, ResponseStatus};
use crate::config::RouterSection;
use crate::context::{normalise_map, ConversationContext, RoutingContext};
use crate::directory::{AgentDirectory, SearchOptions, WILDCARD_ROLE};
use crate::error::{RouterError, RouterResult};
use crate::llm::LlmError;
use crate::progress::ProgressEvent;
use crate::route_span;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Selection prompt used unless the configuration overrides it
pub const DEFAULT_SELECTION_PROMPT: &str = "You are a routing agent within a system of LLM agents. \
I need you to select the most appropriate agent to handle this request.\n\
Along with the agent, fill in `set_context` with information for the conversation's context \
based on what you know about the user's request and why you selected the agent. \
You must respond with a function calling/tool response answering the following questions:\n\
1: Which agent is best matched to service this call?\n\
2: Have they mentioned any specific languages or technologies?";

/// Reply given when no agent can take the message
pub const APOLOGY: &str = "Sorry, I'm not sure how to help.";

/// Dispatches messages of one conversation to agents
pub struct Router {
    directory: Arc<AgentDirectory>,
    gateway: Arc<dyn SelectionGateway>,
    settings: RouterSection,
    active_agent: Option<Arc<dyn Agent>>,
    /// Last agent a message was forwarded to; its team and fallbacks steer the next choice
    previous_agent: Option<String>,
}

impl Router {
    pub fn new(directory: Arc<AgentDirectory>, gateway: Arc<dyn SelectionGateway>) -> Self {
        Self {
            directory,
            gateway,
            settings: RouterSection::default(),
            active_agent: None,
            previous_agent: None,
        }
    }

    pub fn with_settings(mut self, settings: RouterSection) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &RouterSection {
        &self.settings
    }

    pub fn directory(&self) -> &Arc<AgentDirectory> {
        &self.directory
    }

    /// Agent currently holding the conversation
    pub fn active_agent(&self) -> Option<&Arc<dyn Agent>> {
        self.active_agent.as_ref()
    }

    /// Forget the active agent so the next message is routed from scratch
    pub fn reset(&mut self) {
        self.active_agent = None;
        self.previous_agent = None;
    }

    /// Route one message and return the reply meant for the caller
    ///
    /// Fails only on cancellation, agent failure or the hop limit; running
    /// out of candidates produces the apology reply instead.
    pub async fn receive(
        &mut self,
        input: AgentInput,
        context: &mut ConversationContext,
    ) -> RouterResult<AgentResponse> {
        let span = route_span!(
            session = %context.session_id(),
            router = %self.settings.name,
            command = ?input.command
        );
        self.route(input, context).instrument(span).await
    }

    async fn route(
        &mut self,
        mut input: AgentInput,
        context: &mut ConversationContext,
    ) -> RouterResult<AgentResponse> {
        let mut hops = 0;

        loop {
            if hops >= self.settings.max_hops {
                warn!(max_hops = self.settings.max_hops, "Hop limit reached");
                self.active_agent = None;
                return Err(RouterError::HopLimitExceeded {
                    max: self.settings.max_hops,
                });
            }
            hops += 1;

            let agent = match self.active_agent.clone() {
                Some(agent) => agent,
                None => match self.choose_agent(&input, context).await? {
                    Some(agent) => {
                        self.active_agent = Some(agent.clone());
                        agent
                    }
                    None => {
                        info!("No agent available, apologising");
                        context.emit(ProgressEvent::markdown(APOLOGY));
                        return Ok(AgentResponse::done(APOLOGY));
                    }
                },
            };

            debug!(agent = %agent.name(), hop = hops, "Forwarding message");
            self.previous_agent = Some(agent.name().to_string());
            let cancellation = context.cancellation().clone();
            let response = tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    info!(agent = %agent.name(), "Cancelled while awaiting agent");
                    return Err(RouterError::cancelled("agent"));
                }
                response = agent.receive_message(&input, context) => response?,
            };

            if response.has_content() {
                context.emit(ProgressEvent::markdown(response.reply.content.clone()));
            } else {
                self.active_agent = None;
            }

            if response.status == ResponseStatus::NextStep && !response.has_content() {
                debug!(agent = %agent.name(), "Agent asked to continue");
                input.strip_command();
                continue;
            }

            info!(agent = %agent.name(), status = ?response.status, hops, "Reply ready");
            return Ok(response);
        }
    }

    fn search_options(&self, routing: &RoutingContext) -> SearchOptions {
        SearchOptions {
            context: Some(routing.clone()),
            context_keys: self.settings.context_keys.clone(),
            team: Some(self.settings.team.clone()).filter(|team| !team.is_empty()),
        }
    }

    /// Pick the agent for `input`; `None` when nothing, not even a default, is available
    async fn choose_agent(
        &self,
        input: &AgentInput,
        context: &mut ConversationContext,
    ) -> RouterResult<Option<Arc<dyn Agent>>> {
        let options = self.search_options(context.routing());
        let mut candidates = self.directory.search(WILDCARD_ROLE, &options);

        let team = self.previous_descriptor().map(|previous| previous.team.as_slice());
        if let Some(team) = team.filter(|team| !team.is_empty()) {
            let preferred: Vec<Arc<dyn Agent>> = candidates
                .iter()
                .filter(|agent| team.iter().any(|member| member == agent.name()))
                .cloned()
                .collect();
            if !preferred.is_empty() {
                debug!(preferred = preferred.len(), "Preferring team of previous agent");
                candidates = preferred;
            }
        }
        debug!(candidates = candidates.len(), "Ranked candidates");

        let chosen = match candidates.len() {
            0 => self.fallback_agent(context.routing()),
            1 => candidates.first().cloned(),
            _ => Some(self.select_with_llm(input, context, &candidates).await?),
        };

        if let Some(agent) = &chosen {
            info!(agent = %agent.name(), "Selected agent");
            context.emit(ProgressEvent::progress(format!(
                "Using agent: {}",
                agent.name()
            )));
        }
        Ok(chosen)
    }

    fn previous_descriptor(&self) -> Option<&AgentDescriptor> {
        self.previous_agent
            .as_deref()
            .and_then(|name| self.directory.descriptor(name))
    }

    /// Fallbacks of the previous agent, then the router's, each ranked by the
    /// session context; finally the default agent
    fn fallback_agent(&self, routing: &RoutingContext) -> Option<Arc<dyn Agent>> {
        let own_fallbacks: Vec<String> = match &self.previous_agent {
            Some(previous) => self
                .directory
                .resolve_fallbacks(previous)
                .iter()
                .map(|agent| agent.name().to_string())
                .collect(),
            None => Vec::new(),
        };

        for fallbacks in [own_fallbacks, self.settings.fallbacks.clone()] {
            if fallbacks.is_empty() {
                continue;
            }
            let options = SearchOptions {
                team: Some(fallbacks),
                ..self.search_options(routing)
            };
            if let Some(agent) = self.directory.search(WILDCARD_ROLE, &options).first() {
                info!(agent = %agent.name(), "Using fallback agent");
                return Some(agent.clone());
            }
        }

        let default_agent = self.settings.default_agent.as_deref()?;
        let agent = self.directory.get(default_agent);
        if agent.is_none() {
            warn!(agent = %default_agent, "Default agent is not registered");
        }
        agent
    }

    fn selection_prompt(&self, routing: &RoutingContext) -> String {
        let mut prompt = self
            .settings
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SELECTION_PROMPT.to_string());
        if !routing.is_empty() {
            if let Ok(json) = serde_json::to_string(routing) {
                prompt.push_str("\nContext: ");
                prompt.push_str(&json);
            }
        }
        prompt
    }

    /// Ask the selection model to break the tie; falls back to the top-ranked candidate
    async fn select_with_llm(
        &self,
        input: &AgentInput,
        context: &mut ConversationContext,
        candidates: &[Arc<dyn Agent>],
    ) -> RouterResult<Arc<dyn Agent>> {
        let first = candidates[0].clone();

        let filtered = context
            .routing()
            .filter(self.settings.context_keys.as_deref());
        let messages = input.to_llm_messages(Some(&self.selection_prompt(&filtered)));
        let tool = self.directory.build_selection_tool(Some(candidates));

        let cancellation = context.cancellation().clone();
        let reply = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(LlmError::Cancelled),
            reply = self.gateway.send_selection_prompt(messages, vec![tool], &cancellation) => reply,
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(LlmError::Cancelled) => {
                info!("Cancelled while awaiting selection");
                return Err(RouterError::cancelled("selection"));
            }
            Err(e) => {
                warn!(error = %e, fallback = %first.name(), "Selection request failed");
                return Ok(first);
            }
        };

        match SelectionOutcome::decode(reply) {
            SelectionOutcome::AgentSelected {
                name,
                role,
                context_updates,
            } => {
                if let Some(updates) = context_updates {
                    let routing = context.merge_routing(&normalise_map(&updates));
                    debug!(routing = ?routing, "Merged selection context");
                }

                // Only names offered in the tool are acceptable
                let recognised = candidates.iter().find(|agent| agent.name() == name).cloned();
                match recognised {
                    Some(agent) => {
                        debug!(agent = %name, role = ?role, "Model selected agent");
                        Ok(agent)
                    }
                    None => {
                        warn!(agent = %name, fallback = %first.name(), "Model selected unknown agent");
                        Ok(first)
                    }
                }
            }
            SelectionOutcome::Ambiguous { text } => {
                warn!(reply = %text, fallback = %first.name(), "Expected a tool call from the selection model");
                Ok(first)
            }
            SelectionOutcome::Unparseable { reason } => {
                warn!(reason = %reason, fallback = %first.name(), "Could not decode selection");
                Ok(first)
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("settings", &self.settings)
            .field("active_agent", &self.active_agent.as_ref().map(|agent| agent.name()))
            .field("previous_agent", &self.previous_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentDescriptor;
    use crate::llm::MessageRole;
    use crate::testing::mocks::{MockAgent, MockSelectionGateway};

    fn directory(agents: Vec<(AgentDescriptor, Arc<MockAgent>)>) -> Arc<AgentDirectory> {
        let mut directory = AgentDirectory::new();
        for (descriptor, agent) in agents {
            directory.register(descriptor, agent).unwrap();
        }
        Arc::new(directory)
    }

    #[tokio::test]
    async fn test_single_candidate_skips_the_model() {
        let agent = Arc::new(MockAgent::new("solo").with_reply("hello"));
        let gateway = Arc::new(MockSelectionGateway::new(vec![]));
        let mut router = Router::new(
            directory(vec![(AgentDescriptor::new("solo"), agent.clone())]),
            gateway.clone(),
        );
        let mut context = ConversationContext::new();

        let response = router
            .receive(AgentInput::text("hi"), &mut context)
            .await
            .unwrap();

        assert_eq!(response.reply.content, "hello");
        assert!(gateway.prompts().await.is_empty());
        assert_eq!(router.active_agent().map(|a| a.name()), Some("solo"));
    }

    #[tokio::test]
    async fn test_selection_prompt_carries_filtered_context() {
        let a = Arc::new(MockAgent::new("a").with_reply("from a"));
        let b = Arc::new(MockAgent::new("b").with_reply("from b"));
        let gateway = Arc::new(MockSelectionGateway::new(vec![]));
        let mut router = Router::new(
            directory(vec![
                (AgentDescriptor::new("a"), a),
                (AgentDescriptor::new("b"), b),
            ]),
            gateway.clone(),
        )
        .with_settings(RouterSection {
            context_keys: Some(vec!["languages".to_string()]),
            ..RouterSection::default()
        });
        let mut context = ConversationContext::new().with_routing(
            RoutingContext::new()
                .with("languages", vec!["rust"])
                .with("secret_plan", "x"),
        );

        router
            .receive(AgentInput::text("build it"), &mut context)
            .await
            .unwrap();

        let prompts = gateway.prompts().await;
        assert_eq!(prompts.len(), 1);
        let system = &prompts[0][0];
        assert_eq!(system.role, MessageRole::System);
        assert!(system.content.starts_with("You are a routing agent"));
        assert!(system.content.ends_with("\nContext: {\"languages\":[\"rust\"]}"));
        assert_eq!(prompts[0][1].content, "build it");
    }

    #[tokio::test]
    async fn test_active_agent_is_kept_until_it_goes_quiet() {
        let agent = Arc::new(MockAgent::new("chatty").with_responses(vec![
            AgentResponse::new("question?", ResponseStatus::NeedsUserInput),
            AgentResponse::new("", ResponseStatus::Done),
        ]));
        let mut router = Router::new(
            directory(vec![(AgentDescriptor::new("chatty"), agent.clone())]),
            Arc::new(MockSelectionGateway::new(vec![])),
        );
        let mut context = ConversationContext::new();

        router
            .receive(AgentInput::text("one"), &mut context)
            .await
            .unwrap();
        assert!(router.active_agent().is_some());

        let response = router
            .receive(AgentInput::text("two"), &mut context)
            .await
            .unwrap();
        assert!(!response.has_content());
        assert!(router.active_agent().is_none());
        assert_eq!(agent.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_reset_clears_active_agent() {
        let agent = Arc::new(MockAgent::new("solo").with_reply("hello"));
        let mut router = Router::new(
            directory(vec![(AgentDescriptor::new("solo"), agent)]),
            Arc::new(MockSelectionGateway::new(vec![])),
        );
        router
            .receive(AgentInput::text("hi"), &mut ConversationContext::new())
            .await
            .unwrap();

        router.reset();
        assert!(router.active_agent().is_none());
    }
}
