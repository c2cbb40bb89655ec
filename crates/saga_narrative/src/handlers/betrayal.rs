//! BETRAYAL: checks whether an NPC in the scene turns on the player.

use super::generate;
use super::npc_personality::NpcSceneReport;
use crate::service::NarrativeService;
use async_trait::async_trait;
use saga_core::{
    AgentId, GameState, GenerationRequest, HandlerOutput, Npc, StateMutation, TurnContext,
    TurnResults, output_format,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use saga_progression::{estimate_betrayal_risk, should_betray};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// How a betrayal unfolds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BetrayalScene {
    /// The scene
    pub betrayal_scene: String,
    /// Why they did it
    #[serde(default)]
    pub motivation: String,
    /// Immediate consequences
    #[serde(default)]
    pub impact: String,
}

/// Betrayal check results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetrayalReport {
    /// Whether someone betrayed the player
    pub betrayal_triggered: bool,
    /// Betrayer's NPC id
    pub betrayer: Option<String>,
    /// The scene, when triggered
    pub details: Option<BetrayalScene>,
    /// Risk per NPC id checked
    pub betrayal_risks: BTreeMap<String, f64>,
}

/// Rolls betrayal for every eligible NPC in the scene; at most one betrays.
#[derive(Debug)]
pub struct BetrayalHandler {
    service: Arc<NarrativeService>,
}

impl BetrayalHandler {
    /// A betrayal handler.
    pub fn new(service: Arc<NarrativeService>) -> Self {
        Self { service }
    }

    async fn scene(&self, npc: &Npc, state: &GameState, ctx: &mut TurnContext) -> BetrayalScene {
        let request = GenerationRequest::builder()
            .system_context(format!(
                "NPC \"{}\" is about to betray the player in {}.\n\n\
                 Traits: {}\nRelationship: {}\nMemories: {} interactions",
                npc.name,
                state.world.name,
                serde_json::to_string(&npc.traits).unwrap_or_default(),
                npc.relationship,
                npc.memory.len()
            ))
            .task("Generate a dramatic betrayal scene.")
            .output_format(output_format::<BetrayalScene>())
            .max_tokens(1000u32);
        generate(&self.service, ctx, AgentId::Betrayal, request)
            .await
            .unwrap_or_else(|| BetrayalScene {
                betrayal_scene: format!("{} has turned against you.", npc.name),
                motivation: "Unknown".to_string(),
                impact: String::new(),
            })
    }
}

#[async_trait]
impl TurnHandler for BetrayalHandler {
    fn agent(&self) -> AgentId {
        AgentId::Betrayal
    }

    #[instrument(skip_all, fields(turn = state.turn, stage = state.stage))]
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

        let mut report = BetrayalReport::default();
        for npc in ids.iter().filter_map(|id| state.npc(id)) {
            if !npc.can_betray || !npc.alive {
                continue;
            }
            report
                .betrayal_risks
                .insert(npc.id.clone(), estimate_betrayal_risk(npc, state.stage));

            if should_betray(npc, state.stage, &mut ctx.rng) {
                info!(npc = %npc.name, "Betrayal triggered");
                let details = self.scene(npc, state, ctx).await;
                report.betrayal_triggered = true;
                report.betrayer = Some(npc.id.clone());
                report.details = Some(details);
                return Ok(HandlerOutput::from_serializable(&report)?.with_mutation(
                    StateMutation::BetrayalSuffered {
                        npc_id: npc.id.clone(),
                    },
                ));
            }
        }

        Ok(HandlerOutput::from_serializable(&report)?)
    }
}
