//! Folding a successful handler's mutations into the game state.

use saga_core::{AgentId, ConsequenceOutcome, GameState, StateMutation};
use saga_progression::{activate, apply, apply_rewards, update_profile};
use tracing::{debug, info, instrument, warn};

/// Relationship penalty applied to an NPC that betrays the player.
const BETRAYAL_RELATIONSHIP_PENALTY: i32 = -50;

/// Apply every mutation in order. Called only after the handler succeeded.
#[instrument(skip(state, mutations), fields(turn = state.turn, count = mutations.len()))]
pub fn commit(state: &mut GameState, agent: AgentId, mutations: Vec<StateMutation>) {
    for mutation in mutations {
        match mutation {
            StateMutation::SceneSet {
                description,
                atmosphere,
                location,
            } => {
                state.world.description = description.clone();
                state.world.atmosphere = atmosphere;
                if let Some(location) = location.filter(|l| !l.trim().is_empty()) {
                    state.world.current_location = location;
                }
                state.current_scene.description = description;
            }
            StateMutation::Consequence(outcome) => {
                apply(state, &outcome);
            }
            StateMutation::NpcsIntroduced(npcs) => {
                for npc in npcs {
                    if state.npc(&npc.id).is_some() {
                        warn!(npc_id = %npc.id, "NPC already known, not added twice");
                        continue;
                    }
                    info!(npc = %npc.name, archetype = %npc.archetype, "NPC introduced");
                    state.npcs.push(npc);
                }
            }
            StateMutation::NpcsPresent(ids) => {
                let turn = state.turn;
                let known: Vec<String> = ids
                    .into_iter()
                    .filter(|id| state.npc(id).is_some())
                    .collect();
                for id in &known {
                    if let Some(npc) = state.npc_mut(id) {
                        npc.last_seen = turn;
                    }
                }
                state.current_scene.npcs_present = known;
            }
            StateMutation::QuestsOffered(quests) => {
                for quest in quests {
                    info!(quest = %quest.name, "Side quest accepted");
                    state.quests.side.push(activate(&quest));
                }
            }
            StateMutation::QuestLogUpdated { log, rewards } => {
                state.quests = log;
                for bundle in &rewards {
                    apply_rewards(state, bundle);
                }
            }
            StateMutation::ChoicesPresented {
                description,
                choices,
            } => {
                state.current_scene.description = description;
                state.current_scene.choices = choices;
            }
            StateMutation::ProfileChoice(choice_type) => {
                state.profile = update_profile(&state.profile, &choice_type);
            }
            StateMutation::BetrayalSuffered { npc_id } => {
                let Some(npc) = state.npc_mut(&npc_id) else {
                    warn!(%npc_id, "Betrayal by unknown NPC ignored");
                    continue;
                };
                npc.in_group = false;
                npc.can_betray = false;
                state.player_stats.betrayals_suffered += 1;
                apply(state, &betrayal_outcome(&npc_id));
                info!(%npc_id, "Betrayal recorded");
            }
        }
    }
    debug!(%agent, "Mutations committed");
}

fn betrayal_outcome(npc_id: &str) -> ConsequenceOutcome {
    let mut outcome = ConsequenceOutcome::narrative(format!("{} turned on you", npc_id), false);
    outcome
        .immediate_effects
        .npc_relationship_changes
        .insert(npc_id.to_string(), BETRAYAL_RELATIONSHIP_PENALTY);
    outcome.npcs_affected.push(npc_id.to_string());
    outcome.betrayal_triggered = true;
    outcome.story_flags_set.push(format!("betrayed_by_{}", npc_id));
    outcome
}
