//! Candidate search and ranking

use super::{is_wildcard, AgentDirectory};
use crate::agent::{Agent, AgentDescriptor};
use crate::context::RoutingContext;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Optional filters and ranking input for [`AgentDirectory::search`]
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Task context to rank and qualify candidates against
    pub context: Option<RoutingContext>,
    /// Only compare these keys; all task context keys when unset
    pub context_keys: Option<Vec<String>>,
    /// Allow-list of agent names
    pub team: Option<Vec<String>>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: RoutingContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_context_keys(mut self, keys: Vec<String>) -> Self {
        self.context_keys = Some(keys);
        self
    }

    pub fn with_team(mut self, team: Vec<String>) -> Self {
        self.team = Some(team);
        self
    }
}

/// A search hit with its ranking score
#[derive(Clone)]
pub struct RankedCandidate {
    pub name: String,
    pub score: i64,
    pub agent: Arc<dyn Agent>,
}

impl fmt::Debug for RankedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankedCandidate")
            .field("name", &self.name)
            .field("score", &self.score)
            .finish()
    }
}

impl AgentDirectory {
    /// Ordered live instances able to handle `role`
    ///
    /// Never fails: an unknown role yields an empty list and the caller decides
    /// what "nothing matched" means.
    pub fn search(&self, role: &str, options: &SearchOptions) -> Vec<Arc<dyn Agent>> {
        self.search_ranked(role, options)
            .into_iter()
            .map(|candidate| candidate.agent)
            .collect()
    }

    /// Same as [`search`](Self::search), keeping the scores
    pub fn search_ranked(&self, role: &str, options: &SearchOptions) -> Vec<RankedCandidate> {
        if let Some(entry) = self.entries.get(role) {
            return vec![RankedCandidate {
                name: entry.descriptor.name.clone(),
                score: score(&entry.descriptor, options),
                agent: entry.instance.clone(),
            }];
        }

        let mut candidates: Vec<&AgentDescriptor> = if is_wildcard(role) {
            self.descriptors_in_order().collect()
        } else {
            self.agents_for_role(role)
                .iter()
                .filter_map(|name| self.descriptor(name))
                .collect()
        };

        if let Some(team) = options.team.as_ref().filter(|team| !team.is_empty()) {
            candidates.retain(|descriptor| team.contains(&descriptor.name));
        }

        let empty = RoutingContext::new();
        let task = options.context.as_ref().unwrap_or(&empty);
        candidates.retain(|descriptor| {
            let qualified = task.satisfies(&descriptor.requires);
            if !qualified {
                debug!(agent = %descriptor.name, "Requirements not met");
            }
            qualified
        });

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter_map(|descriptor| {
                self.get(&descriptor.name).map(|agent| RankedCandidate {
                    name: descriptor.name.clone(),
                    score: score(descriptor, options),
                    agent,
                })
            })
            .collect();

        if options.context.is_some() {
            // sort_by is stable: equal scores keep registration order
            ranked.sort_by(|a, b| b.score.cmp(&a.score));
        }

        debug!(
            role = %role,
            candidates = ranked.len(),
            ranking = ?ranked.iter().map(|c| (c.name.as_str(), c.score)).collect::<Vec<_>>(),
            "Searched directory"
        );
        ranked
    }
}

/// Baseline rank plus one point per compared key where profile and task overlap
fn score(descriptor: &AgentDescriptor, options: &SearchOptions) -> i64 {
    let mut score = descriptor.baseline_rank();

    let (Some(task), Some(profile)) = (options.context.as_ref(), descriptor.context.as_ref())
    else {
        return score;
    };

    let keys: Vec<&String> = match &options.context_keys {
        Some(keys) => keys.iter().collect(),
        None => task.keys().collect(),
    };

    for key in keys {
        if let (Some(wanted), Some(offered)) = (task.get(key), profile.get(key)) {
            if offered.overlaps(wanted) {
                score += 1;
            }
        }
    }
    score
}
