//! CONTINUITY: checks the story for consistency.

use super::generate;
use crate::service::NarrativeService;
use async_trait::async_trait;
use saga_core::{
    AgentId, GameState, GenerationRequest, HandlerOutput, TurnContext, TurnResults,
    output_format,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Consistency findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContinuityReport {
    /// Contradictions found
    pub continuity_issues: Vec<String>,
    /// Past events worth referencing
    pub suggested_references: Vec<String>,
    /// Story points to keep in mind
    pub important_reminders: Vec<String>,
}

/// Checks recent history, story flags and world state for contradictions.
#[derive(Debug)]
pub struct ContinuityHandler {
    service: Arc<NarrativeService>,
}

impl ContinuityHandler {
    /// A continuity handler.
    pub fn new(service: Arc<NarrativeService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TurnHandler for ContinuityHandler {
    fn agent(&self) -> AgentId {
        AgentId::Continuity
    }

    async fn execute(
        &self,
        state: &GameState,
        _results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let recent = &state.history[state.history.len().saturating_sub(5)..];
        let request = GenerationRequest::builder()
            .system_context(format!(
                "You keep the story of {} consistent.\n\n\
                 Check for continuity errors, references to past events, NPC consistency \
                 and world-state logic.",
                state.world.name
            ))
            .task("Verify continuity and suggest references.")
            .data(serde_json::json!({
                "recentHistory": recent,
                "storyFlags": state.story_flags,
                "worldState": state.world.world_state,
            }))
            .output_format(output_format::<ContinuityReport>())
            .max_tokens(1000u32);

        let report = generate::<ContinuityReport>(&self.service, ctx, AgentId::Continuity, request)
            .await
            .unwrap_or_default();
        Ok(HandlerOutput::from_serializable(&report)?)
    }
}
