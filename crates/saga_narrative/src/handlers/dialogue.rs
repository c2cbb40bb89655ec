//! DIALOGUE: what each NPC in the scene says.

use super::generate;
use super::npc_personality::NpcSceneReport;
use super::world_builder::SceneDocument;
use crate::service::NarrativeService;
use async_trait::async_trait;
use saga_core::{
    AgentId, GameState, GenerationRequest, HandlerOutput, Npc, TurnContext, TurnResults,
    output_format,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use saga_progression::RelationshipLevel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// One NPC's line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DialogueLine {
    /// Spoken words, 2-4 sentences
    pub dialogue: String,
    /// friendly, neutral, cautious, hostile, betrayed or grateful
    pub tone: String,
    /// Nonverbal cues
    #[serde(default)]
    pub body_language: String,
    /// Current emotion
    #[serde(default)]
    pub emotional_state: String,
    /// What goes unsaid
    #[serde(default)]
    pub subtext: String,
    /// Sign of trust
    #[serde(default)]
    pub trust_indicator: String,
}

impl DialogueLine {
    /// Stock line chosen by relationship.
    pub fn fallback(npc: &Npc) -> Self {
        let (dialogue, tone) = match npc.relationship {
            r if r > 50 => (
                format!("{} greets you warmly, clearly happy to see you.", npc.name),
                "friendly",
            ),
            r if r < -50 => (
                format!("{} glares at you with evident distrust.", npc.name),
                "hostile",
            ),
            _ => (format!("{} greets you.", npc.name), "neutral"),
        };
        Self {
            dialogue,
            tone: tone.to_string(),
            body_language: "Standard body language".to_string(),
            emotional_state: tone.to_string(),
            subtext: "Unknown".to_string(),
            trust_indicator: if npc.relationship > 0 {
                "Seems willing to talk"
            } else {
                "Guarded"
            }
            .to_string(),
        }
    }
}

/// Dialogue for the whole scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueReport {
    /// Lines keyed by NPC id
    pub dialogues: BTreeMap<String, DialogueLine>,
    /// NPC ids that spoke, in scene order
    pub npcs_present: Vec<String>,
}

/// Generates dialogue for every NPC in the scene.
#[derive(Debug)]
pub struct DialogueHandler {
    service: Arc<NarrativeService>,
}

impl DialogueHandler {
    /// A dialogue handler.
    pub fn new(service: Arc<NarrativeService>) -> Self {
        Self { service }
    }

    async fn line(&self, npc: &Npc, situation: &str, ctx: &mut TurnContext) -> DialogueLine {
        let recent = &npc.memory[npc.memory.len().saturating_sub(3)..];
        let level = RelationshipLevel::from_relationship(npc.relationship);
        let request = GenerationRequest::builder()
            .system_context(format!(
                "You are writing dialogue for \"{}\", a {}.\n\n{}\n\
                 Personality: {}\nRelationship with the player: {} ({})\n\n\
                 Match the personality, reference past interactions when relevant, \
                 let the tone follow the relationship, and stay in character. 2-4 sentences.",
                npc.name,
                npc.archetype,
                npc.description,
                serde_json::to_string(&npc.traits).unwrap_or_default(),
                npc.relationship,
                level
            ))
            .task("Generate dialogue for this NPC in this situation.")
            .data(serde_json::json!({
                "situation": situation,
                "recentMemories": recent,
                "memoryCount": npc.memory.len(),
            }))
            .output_format(output_format::<DialogueLine>())
            .max_tokens(800u32);
        generate(&self.service, ctx, AgentId::Dialogue, request)
            .await
            .unwrap_or_else(|| DialogueLine::fallback(npc))
    }
}

#[async_trait]
impl TurnHandler for DialogueHandler {
    fn agent(&self) -> AgentId {
        AgentId::Dialogue
    }

    #[instrument(skip_all, fields(turn = state.turn))]
    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let ids: Vec<String> = match results.get_as::<NpcSceneReport>(AgentId::NpcPersonality) {
            Some(report) => report.npcs_in_scene.into_iter().map(|v| v.id).collect(),
            None => state.current_scene.npcs_present.clone(),
        };
        let situation = results
            .get_as::<SceneDocument>(AgentId::WorldBuilder)
            .map(|s| s.scene_description)
            .unwrap_or_else(|| state.world.description.clone());

        let mut report = DialogueReport::default();
        for npc in ids.iter().filter_map(|id| state.npc(id)) {
            let line = self.line(npc, &situation, ctx).await;
            report.dialogues.insert(npc.id.clone(), line);
            report.npcs_present.push(npc.id.clone());
        }

        Ok(HandlerOutput::from_serializable(&report)?)
    }
}
