//! COMBAT: resolves threats reported by the world builder.

use super::generate;
use super::world_builder::SceneDocument;
use crate::service::NarrativeService;
use async_trait::async_trait;
use saga_core::{
    AgentId, ConsequenceOutcome, GameState, GenerationRequest, HandlerOutput, ImmediateEffects,
    StateMutation, TurnContext, TurnResults, output_format,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Health lost when combat cannot be narrated.
const FALLBACK_HEALTH_CHANGE: i32 = -10;

/// A resolved encounter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CombatReport {
    /// Whether a fight took place
    #[serde(default)]
    pub combat_occurred: bool,
    /// What happened
    #[serde(default)]
    pub outcome: String,
    /// Health delta for the player, zero or negative
    #[serde(default)]
    pub health_change: i32,
    /// Enemies defeated
    #[serde(default)]
    pub enemies_defeated: Vec<String>,
}

/// Resolves combat when the scene holds threats.
#[derive(Debug)]
pub struct CombatHandler {
    service: Arc<NarrativeService>,
}

impl CombatHandler {
    /// A combat handler.
    pub fn new(service: Arc<NarrativeService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TurnHandler for CombatHandler {
    fn agent(&self) -> AgentId {
        AgentId::Combat
    }

    #[instrument(skip_all, fields(turn = state.turn))]
    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let threats = results
            .get_as::<SceneDocument>(AgentId::WorldBuilder)
            .map(|s| s.threats_present)
            .unwrap_or_default();
        if threats.is_empty() {
            return Ok(HandlerOutput::from_serializable(&CombatReport::default())?);
        }

        let allies = state.npcs.iter().filter(|n| n.in_group && n.alive).count();
        let request = GenerationRequest::builder()
            .system_context(format!(
                "Combat encounter in {}.\nPlayer health: {}\nThreats: {}\nAllies: {}\n\n\
                 Resolve the combat in narrative style.",
                state.world.name,
                state.player_stats.health,
                threats.join(", "),
                allies
            ))
            .task("Resolve the combat.")
            .output_format(output_format::<CombatReport>())
            .max_tokens(800u32);

        let mut report = generate::<CombatReport>(&self.service, ctx, AgentId::Combat, request)
            .await
            .unwrap_or_else(|| CombatReport {
                outcome: "You engage in combat".to_string(),
                health_change: FALLBACK_HEALTH_CHANGE,
                ..CombatReport::default()
            });
        report.combat_occurred = true;
        report.health_change = report.health_change.min(0);

        let outcome = ConsequenceOutcome {
            outcome: report.outcome.clone(),
            success: true,
            consequence_level: "moderate".to_string(),
            immediate_effects: ImmediateEffects {
                player_health: report.health_change,
                ..ImmediateEffects::default()
            },
            ..ConsequenceOutcome::default()
        };
        Ok(HandlerOutput::from_serializable(&report)?
            .with_mutation(StateMutation::Consequence(outcome)))
    }
}
