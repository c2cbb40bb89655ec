//! QUEST_MANAGER: offers side quests and advances the quest log.

use super::generate;
use crate::service::NarrativeService;
use async_trait::async_trait;
use saga_core::{
    ActionEvent, ActionKind, AgentId, ConsequenceOutcome, GameState, GenerationRequest,
    HandlerOutput, Objective, Quest, QuestKind, QuestRewards, RewardBundle, StateMutation,
    TurnContext, TurnResults, output_format, stage,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use saga_progression::{
    SIDE_QUEST_TURNS, fallback_quests, infer_action_kind, newly_completed_rewards, update_all,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A generated objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveDraft {
    /// What the player must do
    pub description: String,
    /// NPC, item or place the objective names
    #[serde(default)]
    pub target: Option<String>,
}

/// A generated side quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestDraft {
    /// Quest name
    pub name: String,
    /// What the player must do
    pub description: String,
    /// Ordered objectives
    pub objectives: Vec<ObjectiveDraft>,
    /// Turn budget
    #[serde(default)]
    pub turns_remaining: Option<u32>,
    /// Promised rewards
    #[serde(default)]
    pub rewards: QuestRewards,
}

impl QuestDraft {
    fn into_quest(self, stage_id: u32) -> Quest {
        let objectives = self
            .objectives
            .into_iter()
            .map(|o| {
                let objective = Objective::new(o.description);
                match o.target.filter(|t| !t.trim().is_empty()) {
                    Some(target) => objective.with_target(target),
                    None => objective,
                }
            })
            .collect();
        let mut quest = Quest::new(self.name, QuestKind::Side, objectives, stage_id);
        quest.description = self.description;
        quest.turns_remaining = Some(self.turns_remaining.unwrap_or(SIDE_QUEST_TURNS));
        quest.rewards = self.rewards;
        quest
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct QuestBatch {
    quests: Vec<QuestDraft>,
}

/// Quest activity this turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestReport {
    /// Names of quests offered this turn
    pub offered: Vec<String>,
    /// Active quests with their progress
    pub active_quests: Vec<(String, f64)>,
    /// Names of quests completed this turn
    pub completed: Vec<String>,
    /// Rewards granted this turn
    pub rewards: Vec<RewardBundle>,
}

/// Offers stage side quests and checks progress against the player's action.
#[derive(Debug)]
pub struct QuestManagerHandler {
    service: Arc<NarrativeService>,
    quests_per_stage: usize,
}

impl QuestManagerHandler {
    /// A quest manager offering `quests_per_stage` side quests at each stage start.
    pub fn new(service: Arc<NarrativeService>, quests_per_stage: usize) -> Self {
        Self {
            service,
            quests_per_stage,
        }
    }

    async fn offer(&self, state: &GameState, ctx: &mut TurnContext) -> Vec<Quest> {
        let stage = stage(state.stage);
        let count = self.quests_per_stage;
        let request = GenerationRequest::builder()
            .system_context(format!(
                "You are generating side quests for stage {} of a {}-turn RPG.\n\n\
                 World: {}\nStage: {} - {}\nQuest types for this stage: {}\nCurrent NPCs: {}\n\n\
                 Quests must fit the stage, be completable within about {} turns, involve \
                 NPCs when possible, and be able to succeed or fail.",
                state.stage,
                state.total_turns,
                state.world.name,
                stage.name(),
                stage.description(),
                stage.quest_types().join(", "),
                state
                    .npcs
                    .iter()
                    .map(|n| n.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                SIDE_QUEST_TURNS
            ))
            .task(format!("Generate {} side quests.", count))
            .data(serde_json::json!({ "stageName": stage.name(), "npcCount": state.npcs.len() }))
            .output_format(output_format::<QuestBatch>())
            .max_tokens(2000u32);

        match generate::<QuestBatch>(&self.service, ctx, AgentId::QuestManager, request).await {
            Some(batch) if !batch.quests.is_empty() => batch
                .quests
                .into_iter()
                .take(count)
                .map(|draft| draft.into_quest(state.stage))
                .collect(),
            _ => fallback_quests(state.stage, &state.world.name, count),
        }
    }
}

#[async_trait]
impl TurnHandler for QuestManagerHandler {
    fn agent(&self) -> AgentId {
        AgentId::QuestManager
    }

    #[instrument(skip_all, fields(turn = state.turn, has_choice = results.player_choice.is_some()))]
    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let mut report = QuestReport::default();
        let mut mutations = Vec::new();

        match &results.player_choice {
            None => {
                let needs_quests = state.is_stage_start()
                    && state.quests.active_side().next().is_none()
                    && self.quests_per_stage > 0;
                if needs_quests {
                    let offered = self.offer(state, ctx).await;
                    info!(count = offered.len(), stage = state.stage, "Side quests offered");
                    report.offered = offered.iter().map(|q| q.name.clone()).collect();
                    report
                        .active_quests
                        .extend(offered.iter().map(|q| (q.name.clone(), q.progress)));
                    mutations.push(StateMutation::QuestsOffered(offered));
                }
                report.active_quests.extend(
                    state
                        .quests
                        .active()
                        .iter()
                        .map(|q| (q.name.clone(), q.progress)),
                );
            }
            Some(choice) => {
                let success = results
                    .get_as::<ConsequenceOutcome>(AgentId::Consequence)
                    .map(|o| o.success)
                    .unwrap_or(true);
                let mut action = ActionEvent::from_choice(choice, success);
                if action.kind == ActionKind::Other {
                    action.kind = infer_action_kind(&choice.text);
                }
                debug!(action = %action.kind, success, "Checking quest progress");

                let log = update_all(&state.quests, &action);
                let rewards = newly_completed_rewards(&state.quests, &log);
                report.completed = rewards
                    .iter()
                    .filter_map(|r| {
                        log.main
                            .iter()
                            .chain(log.completed.iter())
                            .find(|q| q.id == r.quest_id)
                            .map(|q| q.name.clone())
                    })
                    .collect();
                report.active_quests = log
                    .active()
                    .iter()
                    .map(|q| (q.name.clone(), q.progress))
                    .collect();
                report.rewards = rewards.clone();
                mutations.push(StateMutation::QuestLogUpdated { log, rewards });
            }
        }

        let mut output = HandlerOutput::from_serializable(&report)?;
        output.mutations = mutations;
        Ok(output)
    }
}
