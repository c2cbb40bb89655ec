//! Handler registry keyed by agent id.

use saga_core::AgentId;
use saga_interface::TurnHandler;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Maps each known agent to the handler that serves it.
///
/// Keys are [`AgentId`]s, so only agents from the known set can be registered.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<AgentId, Box<dyn TurnHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own agent id, replacing any previous one.
    pub fn register(&mut self, handler: Box<dyn TurnHandler>) {
        let agent = handler.agent();
        if self.handlers.insert(agent, handler).is_some() {
            warn!(%agent, "Replacing registered handler");
        } else {
            debug!(%agent, "Handler registered");
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, handler: Box<dyn TurnHandler>) -> Self {
        self.register(handler);
        self
    }

    /// The handler for `agent`.
    pub fn get(&self, agent: AgentId) -> Option<&dyn TurnHandler> {
        self.handlers.get(&agent).map(|h| h.as_ref())
    }

    /// Whether `agent` has a handler.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.handlers.contains_key(&agent)
    }

    /// Registered agent ids, in a stable order.
    pub fn agents(&self) -> Vec<AgentId> {
        let mut agents: Vec<AgentId> = self.handlers.keys().copied().collect();
        agents.sort();
        agents
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("agents", &self.agents())
            .finish()
    }
}
