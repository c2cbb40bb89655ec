//! SCENE_COMPOSER: the final scene and the player's choices.

use super::dialogue::DialogueReport;
use super::generate;
use super::npc_personality::NpcSceneReport;
use super::quest_manager::QuestReport;
use super::world_builder::SceneDocument;
use crate::service::NarrativeService;
use async_trait::async_trait;
use saga_core::{
    ActionKind, AgentId, GameState, GenerationRequest, HandlerOutput, PlayerChoice,
    StateMutation, TurnContext, TurnResults, output_format,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use saga_progression::infer_action_kind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// The composed scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComposedScene {
    /// Complete scene description, 3-4 sentences
    pub final_scene: String,
    /// How NPCs are positioned and acting
    #[serde(default)]
    pub npc_presence: String,
    /// Subtle quest hints
    #[serde(default)]
    pub quest_hints: String,
    /// Four choices, each mapped to a personality type
    pub choices: Vec<PlayerChoice>,
}

fn choice(text: &str, mapping: &str, risk: &str, action: ActionKind) -> PlayerChoice {
    PlayerChoice {
        text: text.to_string(),
        personality_mapping: mapping.to_string(),
        risk_level: risk.to_string(),
        likely_outcome: String::new(),
        action,
        target: None,
    }
}

/// The four stock choices offered when no scene could be composed.
pub fn fallback_choices() -> Vec<PlayerChoice> {
    vec![
        choice("Push forward aggressively", "AGGRESSIVE", "high", ActionKind::Combat),
        choice("Proceed with caution", "CAUTIOUS", "low", ActionKind::Discovery),
        choice("Seek diplomatic solution", "DIPLOMATIC", "medium", ActionKind::Dialogue),
        choice("Try creative approach", "CREATIVE", "medium", ActionKind::Other),
    ]
}

/// Combines every earlier document into the scene the player sees.
#[derive(Debug)]
pub struct SceneComposerHandler {
    service: Arc<NarrativeService>,
}

impl SceneComposerHandler {
    /// A scene composer.
    pub fn new(service: Arc<NarrativeService>) -> Self {
        Self { service }
    }

    fn fallback(state: &GameState) -> ComposedScene {
        ComposedScene {
            final_scene: format!("You continue your journey through {}.", state.world.name),
            npc_presence: "None nearby".to_string(),
            quest_hints: String::new(),
            choices: fallback_choices(),
        }
    }
}

#[async_trait]
impl TurnHandler for SceneComposerHandler {
    fn agent(&self) -> AgentId {
        AgentId::SceneComposer
    }

    #[instrument(skip_all, fields(turn = state.turn))]
    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let world = results.get_as::<SceneDocument>(AgentId::WorldBuilder);
        let npcs = results
            .get_as::<NpcSceneReport>(AgentId::NpcPersonality)
            .map(|r| r.npcs_in_scene.into_iter().map(|v| v.name).collect::<Vec<_>>())
            .unwrap_or_default();
        let dialogue = results.get_as::<DialogueReport>(AgentId::Dialogue);
        let quests = results.get_as::<QuestReport>(AgentId::QuestManager);

        let request = GenerationRequest::builder()
            .system_context(format!(
                "You compose the final scene from every agent's output.\n\n\
                 World scene: {}\nAtmosphere: {}\nNPCs present: {}\nActive quests: {}\n\
                 Turn: {}/{}\n\n\
                 Create 4 player choices that fit the scene, map to different personality \
                 types (AGGRESSIVE, CAUTIOUS, DIPLOMATIC, CREATIVE, LEADERSHIP, LOYAL, \
                 INDEPENDENT, MORAL), have clear consequences and advance the story.",
                world
                    .as_ref()
                    .map(|w| w.scene_description.as_str())
                    .unwrap_or(state.world.description.as_str()),
                world
                    .as_ref()
                    .map(|w| w.atmosphere.as_str())
                    .unwrap_or(state.world.atmosphere.as_str()),
                if npcs.is_empty() {
                    "None".to_string()
                } else {
                    npcs.join(", ")
                },
                quests.as_ref().map(|q| q.active_quests.len()).unwrap_or(0),
                state.turn,
                state.total_turns
            ))
            .task("Compose the scene and generate 4 choices.")
            .data(serde_json::json!({
                "turn": state.turn,
                "dialogues": dialogue.map(|d| d.dialogues),
            }))
            .output_format(output_format::<ComposedScene>())
            .max_tokens(2000u32);

        let mut scene = generate::<ComposedScene>(&self.service, ctx, AgentId::SceneComposer, request)
            .await
            .filter(|s| !s.choices.is_empty())
            .unwrap_or_else(|| Self::fallback(state));

        for choice in scene.choices.iter_mut() {
            if choice.action == ActionKind::Other {
                choice.action = infer_action_kind(&choice.text);
            }
        }

        Ok(HandlerOutput::from_serializable(&scene)?.with_mutation(
            StateMutation::ChoicesPresented {
                description: scene.final_scene.clone(),
                choices: scene.choices.clone(),
            },
        ))
    }
}
