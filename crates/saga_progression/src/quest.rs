//! Quest progression model.

use saga_core::{
    ActionEvent, ActionKind, Objective, ObjectiveKind, Quest, QuestKind, QuestLog, QuestRewards,
    QuestState, RewardBundle, stage,
};
use tracing::{debug, instrument, warn};

/// Whether an action satisfies an objective.
///
/// The action kind must match the objective kind, a defeat needs a
/// successful combat, and a targeted objective needs the same target.
pub fn action_satisfies(objective: &Objective, action: &ActionEvent) -> bool {
    if objective.completed || objective.kind.satisfied_by() != Some(action.kind) {
        return false;
    }
    if objective.kind == ObjectiveKind::Defeat && !action.success {
        return false;
    }
    match (&objective.target, &action.target) {
        (None, _) => true,
        (Some(wanted), Some(actual)) => wanted.trim().eq_ignore_ascii_case(actual.trim()),
        (Some(_), None) => false,
    }
}

/// Advance one quest by one player action.
///
/// Inactive quests come back unchanged. Completed objectives never revert.
/// When a turn budget exists it ticks down by one; running out without
/// completing expires the quest.
#[instrument(skip_all, fields(quest = %quest.name, action = %action.kind))]
pub fn check_progress(quest: &Quest, action: &ActionEvent) -> Quest {
    if !quest.is_active() {
        return quest.clone();
    }

    let mut updated = quest.clone();
    for objective in updated.objectives.iter_mut() {
        if action_satisfies(objective, action) {
            debug!(objective = %objective.description, "Objective completed");
            objective.completed = true;
        }
    }
    updated.progress = updated.derived_progress();

    let complete = updated.all_objectives_complete();
    if complete {
        updated.state = QuestState::Completed;
    }

    if let Some(remaining) = updated.turns_remaining {
        let remaining = remaining.saturating_sub(1);
        updated.turns_remaining = Some(remaining);
        if remaining == 0 && !complete {
            debug!("Quest expired");
            updated.state = QuestState::Expired;
        }
    }

    updated
}

/// Advance every quest in the log by one action.
///
/// The main quest stays in its slot whatever its state. Side quests that
/// reach a terminal state move to the archive, which is never purged.
#[instrument(skip_all)]
pub fn update_all(log: &QuestLog, action: &ActionEvent) -> QuestLog {
    let main = log.main.as_ref().map(|q| check_progress(q, action));

    let mut side = Vec::new();
    let mut completed = log.completed.clone();
    for quest in &log.side {
        let updated = check_progress(quest, action);
        if updated.state.is_terminal() {
            completed.push(updated);
        } else {
            side.push(updated);
        }
    }

    QuestLog {
        main,
        side,
        completed,
    }
}

/// Rewards for a completed quest. `None` for any other state.
pub fn apply_rewards(quest: &Quest) -> Option<RewardBundle> {
    (quest.state == QuestState::Completed).then(|| RewardBundle {
        quest_id: quest.id.clone(),
        gold: quest.rewards.gold,
        items: quest.rewards.items.clone(),
        reputation: quest.rewards.reputation,
        experience: quest.rewards.experience,
    })
}

/// Rewards of quests that are completed in `after` but were not in `before`.
pub fn newly_completed_rewards(before: &QuestLog, after: &QuestLog) -> Vec<RewardBundle> {
    let was_completed = |id: &str| {
        before
            .main
            .iter()
            .chain(before.side.iter())
            .chain(before.completed.iter())
            .any(|q| q.id == id && q.state == QuestState::Completed)
    };
    after
        .main
        .iter()
        .chain(after.side.iter())
        .chain(after.completed.iter())
        .filter(|q| !was_completed(&q.id))
        .filter_map(apply_rewards)
        .collect()
}

fn transition(quest: &Quest, next: QuestState) -> Quest {
    if !quest.state.can_transition_to(next) {
        warn!(quest = %quest.name, from = %quest.state, to = %next, "Ignoring backward quest transition");
        return quest.clone();
    }
    let mut updated = quest.clone();
    updated.state = next;
    updated
}

/// Make an available quest active.
pub fn activate(quest: &Quest) -> Quest {
    transition(quest, QuestState::Active)
}

/// Fail an active quest.
pub fn fail(quest: &Quest) -> Quest {
    transition(quest, QuestState::Failed)
}

/// Default turn budget for a side quest.
pub const SIDE_QUEST_TURNS: u32 = 10;

/// Locally generated side quests for a stage.
pub fn fallback_quests(stage_id: u32, world_name: &str, count: usize) -> Vec<Quest> {
    let stage = stage(stage_id);
    (0..count)
        .map(|i| {
            let quest_type = stage.quest_types()[i % stage.quest_types().len()];
            let mut quest = Quest::new(
                format!("{}: {}", stage.name(), quest_type.replace('_', " ")),
                QuestKind::Side,
                vec![
                    Objective::of_kind("Explore the area", ObjectiveKind::Find),
                    Objective::of_kind("Speak with someone who knows more", ObjectiveKind::Talk),
                ],
                *stage.id(),
            );
            quest.description = format!("Complete an objective in {}", world_name);
            quest.turns_remaining = Some(SIDE_QUEST_TURNS);
            quest.rewards = QuestRewards {
                gold: 50,
                items: Vec::new(),
                reputation: 10,
                experience: 0,
            };
            quest
        })
        .collect()
}

/// Action kind inferred from free text, for choices that carry no kind.
pub fn infer_action_kind(text: &str) -> ActionKind {
    let text = text.to_lowercase();
    let table: [(&[&str], ActionKind); 5] = [
        (&["attack", "fight", "strike", "charge"], ActionKind::Combat),
        (&["talk", "speak", "ask", "negotiate", "persuade"], ActionKind::Dialogue),
        (&["take", "pick up", "loot", "collect", "buy"], ActionKind::ItemAcquired),
        (&["travel", "go to", "head to", "enter"], ActionKind::LocationReached),
        (&["search", "explore", "investigate", "examine"], ActionKind::Discovery),
    ];
    table
        .iter()
        .find(|(words, _)| words.iter().any(|w| text.contains(w)))
        .map(|(_, kind)| *kind)
        .unwrap_or(ActionKind::Other)
}
