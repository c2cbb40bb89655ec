//! NPC_PERSONALITY: who is in the scene and how they feel about the player.

use super::generate;
use super::world_builder::SceneDocument;
use crate::context::game_digest;
use crate::service::NarrativeService;
use async_trait::async_trait;
use saga_core::{
    AgentId, GameState, GenerationRequest, HandlerOutput, Npc, NpcArchetype, StateMutation,
    TurnContext, TurnResults, output_format,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use saga_progression::{estimate_attitude, fallback_npc, npc_from_archetype, should_appear_in_scene};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Below this many known NPCs a new one is introduced every turn.
const NEW_NPC_THRESHOLD: usize = 5;
/// Memories considered when analyzing an attitude.
const ATTITUDE_MEMORY_WINDOW: usize = 5;

/// An NPC's stance toward the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttitudeReading {
    /// hostile, unfriendly, neutral, friendly or trusted
    pub attitude: String,
    /// 0 to 1
    pub trust_level: f64,
    /// Whether the NPC would help the player
    pub willing_to_help: bool,
    /// 0 to 1
    pub betrayal_risk: f64,
    /// Current mood
    #[serde(default)]
    pub current_mood: String,
}

impl AttitudeReading {
    fn from_relationship(relationship: i32) -> Self {
        let estimate = estimate_attitude(relationship);
        Self {
            current_mood: estimate.attitude.clone(),
            attitude: estimate.attitude,
            trust_level: estimate.trust_level,
            willing_to_help: estimate.willing_to_help,
            betrayal_risk: estimate.betrayal_risk,
        }
    }
}

/// A newly generated character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NpcDraft {
    /// Character name
    pub name: String,
    /// WARRIOR, ROGUE, SAGE, MERCHANT, REBEL or NOBLE
    pub archetype: String,
    /// 2-3 sentence description
    pub description: String,
    /// Trait values, 0 to 1 (aggression, caution, morality, loyalty, greed, courage)
    #[serde(default)]
    pub traits: BTreeMap<String, f64>,
    /// Skills
    #[serde(default)]
    pub skills: Vec<String>,
    /// Whether the character could ever betray the player
    #[serde(default = "default_true")]
    pub can_betray: bool,
}

fn default_true() -> bool {
    true
}

impl NpcDraft {
    /// Build an NPC met at the player's location this turn.
    fn into_npc(self, state: &GameState) -> Npc {
        let archetype = NpcArchetype::from_str(self.archetype.trim()).unwrap_or(NpcArchetype::Warrior);
        let mut npc = npc_from_archetype(self.name, archetype, state);
        npc.description = self.description;
        if !self.traits.is_empty() {
            npc.traits = self
                .traits
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value.clamp(0.0, 1.0)))
                .collect();
        }
        if !self.skills.is_empty() {
            npc.skills = self.skills;
        }
        npc.can_betray = self.can_betray;
        npc
    }
}

/// An NPC as seen in this scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcView {
    /// NPC id
    pub id: String,
    /// Display name
    pub name: String,
    /// Archetype label
    pub archetype: String,
    /// Relationship, -100 to 100
    pub relationship: i32,
    /// Current stance
    pub attitude: AttitudeReading,
}

/// Who is in the scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcSceneReport {
    /// NPCs present, in roster order
    pub npcs_in_scene: Vec<NpcView>,
    /// Name of the NPC introduced this turn
    pub new_npc: Option<String>,
}

/// Decides scene presence, analyzes attitudes, and introduces new NPCs.
#[derive(Debug)]
pub struct NpcPersonalityHandler {
    service: Arc<NarrativeService>,
    max_npcs: usize,
}

impl NpcPersonalityHandler {
    /// A handler that never grows the roster past `max_npcs`.
    pub fn new(service: Arc<NarrativeService>, max_npcs: usize) -> Self {
        Self { service, max_npcs }
    }

    async fn attitude(&self, npc: &Npc, state: &GameState, ctx: &mut TurnContext) -> AttitudeReading {
        if npc.memory.is_empty() {
            return AttitudeReading::from_relationship(npc.relationship);
        }
        let recent = &npc.memory[npc.memory.len().saturating_sub(ATTITUDE_MEMORY_WINDOW)..];
        let request = GenerationRequest::builder()
            .system_context(format!(
                "You are analyzing NPC \"{}\" ({}) and their attitude toward the player.\n\n\
                 Traits: {}\nCurrent relationship: {} (-100 to 100)",
                npc.name,
                npc.archetype,
                serde_json::to_string(&npc.traits).unwrap_or_default(),
                npc.relationship
            ))
            .task("Determine the NPC's current attitude and intentions.")
            .data(serde_json::json!({
                "npcName": npc.name,
                "recentInteractions": recent,
                "gameContext": game_digest(state, 3),
            }))
            .output_format(output_format::<AttitudeReading>())
            .max_tokens(1000u32);
        generate(&self.service, ctx, AgentId::NpcPersonality, request)
            .await
            .unwrap_or_else(|| AttitudeReading::from_relationship(npc.relationship))
    }

    async fn create_npc(&self, state: &GameState, scene: Option<&SceneDocument>, ctx: &mut TurnContext) -> Npc {
        let request = GenerationRequest::builder()
            .system_context(format!(
                "You are creating a character for {}.\n\nCurrent scene: {}\nStage: {}/5\nTurn: {}\n\n\
                 Create a memorable NPC that fits the world and situation, avoids duplicating \
                 existing characters, and has potential for alliance or betrayal.",
                state.world.name,
                scene
                    .map(|s| s.scene_description.as_str())
                    .unwrap_or(state.world.description.as_str()),
                state.stage,
                state.turn
            ))
            .task("Generate a new NPC character.")
            .data(serde_json::json!({
                "worldName": state.world.name,
                "currentNpcs": state
                    .npcs
                    .iter()
                    .map(|n| serde_json::json!({ "name": n.name, "archetype": n.archetype }))
                    .collect::<Vec<_>>(),
            }))
            .output_format(output_format::<NpcDraft>())
            .max_tokens(1500u32);
        match generate::<NpcDraft>(&self.service, ctx, AgentId::NpcPersonality, request).await {
            Some(draft) => draft.into_npc(state),
            None => fallback_npc(state, &mut ctx.rng),
        }
    }
}

#[async_trait]
impl TurnHandler for NpcPersonalityHandler {
    fn agent(&self) -> AgentId {
        AgentId::NpcPersonality
    }

    #[instrument(skip_all, fields(turn = state.turn, known = state.npcs.len()))]
    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let present: Vec<&Npc> = state
            .npcs
            .iter()
            .filter(|npc| should_appear_in_scene(npc, state, &mut ctx.rng))
            .collect();
        debug!(present = present.len(), "Scene presence decided");

        let mut report = NpcSceneReport::default();
        for npc in &present {
            let attitude = self.attitude(npc, state, ctx).await;
            report.npcs_in_scene.push(NpcView {
                id: npc.id.clone(),
                name: npc.name.clone(),
                archetype: npc.archetype.clone(),
                relationship: npc.relationship,
                attitude,
            });
        }

        let scene = results.get_as::<SceneDocument>(AgentId::WorldBuilder);
        let world_asks = scene.as_ref().is_some_and(|s| s.npcs_needed) && present.is_empty();
        let wants_new = state.npcs.len() < NEW_NPC_THRESHOLD || world_asks;

        let mut mutations = Vec::new();
        if wants_new && state.npcs.len() < self.max_npcs {
            let npc = self.create_npc(state, scene.as_ref(), ctx).await;
            info!(npc = %npc.name, archetype = %npc.archetype, "New NPC created");
            report.new_npc = Some(npc.name.clone());
            report.npcs_in_scene.push(NpcView {
                id: npc.id.clone(),
                name: npc.name.clone(),
                archetype: npc.archetype.clone(),
                relationship: npc.relationship,
                attitude: AttitudeReading::from_relationship(npc.relationship),
            });
            mutations.push(StateMutation::NpcsIntroduced(vec![npc]));
        }

        let ids = report.npcs_in_scene.iter().map(|v| v.id.clone()).collect();
        mutations.push(StateMutation::NpcsPresent(ids));

        let mut output = HandlerOutput::from_serializable(&report)?;
        output.mutations = mutations;
        Ok(output)
    }
}
