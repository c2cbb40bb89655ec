//! CONSEQUENCE: resolves the player's choice into an outcome.

use super::generate;
use super::npc_personality::NpcSceneReport;
use super::scene_composer::ComposedScene;
use crate::context::game_digest;
use crate::service::NarrativeService;
use async_trait::async_trait;
use rand::Rng;
use saga_core::{
    AgentId, ConsequenceOutcome, GameState, GenerationRequest, HandlerOutput, StateMutation,
    TurnContext, TurnResults, output_format,
};
use saga_error::{HandlerError, HandlerErrorKind, SagaResult};
use saga_interface::TurnHandler;
use std::sync::Arc;
use tracing::{info, instrument};

/// Probability that a choice succeeds when no outcome could be generated.
const FALLBACK_SUCCESS_CHANCE: f64 = 0.7;

/// Determines what the player's choice leads to.
#[derive(Debug)]
pub struct ConsequenceHandler {
    service: Arc<NarrativeService>,
}

impl ConsequenceHandler {
    /// A consequence handler.
    pub fn new(service: Arc<NarrativeService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TurnHandler for ConsequenceHandler {
    fn agent(&self) -> AgentId {
        AgentId::Consequence
    }

    #[instrument(skip_all, fields(turn = state.turn))]
    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let Some(choice) = &results.player_choice else {
            return Err(HandlerError::new(
                AgentId::Consequence.to_string(),
                HandlerErrorKind::MissingInput("player choice".to_string()),
            )
            .into());
        };

        let scene = results
            .get_as::<ComposedScene>(AgentId::SceneComposer)
            .map(|s| s.final_scene)
            .unwrap_or_else(|| state.current_scene.description.clone());
        let present: Vec<String> = match results.get_as::<NpcSceneReport>(AgentId::NpcPersonality) {
            Some(report) => report
                .npcs_in_scene
                .into_iter()
                .map(|v| format!("{} (id {})", v.name, v.id))
                .collect(),
            None => state
                .npcs_in_scene()
                .iter()
                .map(|n| format!("{} (id {})", n.name, n.id))
                .collect(),
        };

        let request = GenerationRequest::builder()
            .system_context(format!(
                "You determine the outcome of a player's choice.\n\n\
                 World: {}\nTurn: {}/{}\nStage: {}/5\n\nCurrent scene:\n{}\n\n\
                 Player choice: {} ({})\nNPCs present: {}\n\n\
                 Consider the choice type, NPC relationships, active quests, world state, \
                 stage difficulty and past consequences. Key relationship changes by NPC id.",
                state.world.name,
                state.turn,
                state.total_turns,
                state.stage,
                scene,
                choice.text,
                choice.personality_mapping,
                if present.is_empty() {
                    "None".to_string()
                } else {
                    present.join(", ")
                }
            ))
            .task("Determine the immediate outcome and ripple effects.")
            .data(serde_json::json!({
                "playerChoice": choice.text,
                "turn": state.turn,
                "gameContext": game_digest(state, 5),
            }))
            .output_format(output_format::<ConsequenceOutcome>())
            .max_tokens(1500u32);

        let outcome = match generate::<ConsequenceOutcome>(
            &self.service,
            ctx,
            AgentId::Consequence,
            request,
        )
        .await
        {
            Some(outcome) => outcome,
            None => {
                let mut outcome = ConsequenceOutcome::narrative(
                    format!("Your choice to {} has consequences.", choice.text),
                    ctx.rng.gen_bool(FALLBACK_SUCCESS_CHANCE),
                );
                outcome.consequence_level = "moderate".to_string();
                outcome
            }
        };

        info!(success = outcome.success, level = %outcome.consequence_level, "Choice resolved");
        Ok(HandlerOutput::from_serializable(&outcome)?
            .with_mutation(StateMutation::Consequence(outcome)))
    }
}
