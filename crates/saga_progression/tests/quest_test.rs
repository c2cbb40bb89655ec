//! Tests for the quest progression model.

use saga_core::{
    ActionEvent, ActionKind, Objective, ObjectiveKind, Quest, QuestKind, QuestLog, QuestRewards,
    QuestState,
};
use saga_progression::{
    activate, check_progress, fail, fallback_quests, newly_completed_rewards, quest_rewards,
    update_all,
};

fn active_quest(objectives: Vec<Objective>, turns_remaining: Option<u32>) -> Quest {
    let mut quest = Quest::new("The Missing Ledger", QuestKind::Side, objectives, 1);
    quest.turns_remaining = turns_remaining;
    quest.rewards = QuestRewards {
        gold: 40,
        items: vec!["Ledger".to_string()],
        reputation: 5,
        experience: 10,
    };
    activate(&quest)
}

fn assert_progress_invariant(quest: &Quest) {
    let completed = quest.objectives.iter().filter(|o| o.completed).count() as f64;
    let total = quest.objectives.len() as f64;
    assert!((quest.progress - 100.0 * completed / total).abs() < 1e-9);
}

#[test]
fn test_matching_action_completes_objective() {
    let quest = active_quest(
        vec![
            Objective::of_kind("Find the ledger", ObjectiveKind::Find),
            Objective::of_kind("Talk to the clerk", ObjectiveKind::Talk),
        ],
        None,
    );

    let updated = check_progress(&quest, &ActionEvent::new(ActionKind::Discovery, "found it"));

    assert!(updated.objectives[0].completed);
    assert!(!updated.objectives[1].completed);
    assert_eq!(updated.state, QuestState::Active);
    assert_progress_invariant(&updated);
}

#[test]
fn test_all_objectives_complete_quest() {
    let quest = active_quest(
        vec![
            Objective::of_kind("Find the ledger", ObjectiveKind::Find),
            Objective::of_kind("Talk to the clerk", ObjectiveKind::Talk),
        ],
        Some(5),
    );

    let quest = check_progress(&quest, &ActionEvent::new(ActionKind::Discovery, "search"));
    let quest = check_progress(&quest, &ActionEvent::new(ActionKind::Dialogue, "talk"));

    assert_eq!(quest.state, QuestState::Completed);
    assert_eq!(quest.progress, 100.0);
    assert_eq!(quest.turns_remaining, Some(3));
    assert_progress_invariant(&quest);
}

#[test]
fn test_last_turn_without_progress_expires() {
    let quest = active_quest(
        vec![Objective::of_kind("Defeat the wolf", ObjectiveKind::Defeat)],
        Some(1),
    );

    let updated = check_progress(&quest, &ActionEvent::new(ActionKind::Dialogue, "chat"));

    assert_eq!(updated.state, QuestState::Expired);
    assert_eq!(updated.turns_remaining, Some(0));
    assert_progress_invariant(&updated);
}

#[test]
fn test_completion_on_last_turn_wins_over_expiry() {
    let quest = active_quest(
        vec![Objective::of_kind("Reach the gate", ObjectiveKind::Reach)],
        Some(1),
    );

    let updated = check_progress(&quest, &ActionEvent::new(ActionKind::LocationReached, "arrive"));

    assert_eq!(updated.state, QuestState::Completed);
}

#[test]
fn test_defeat_requires_success_and_target() {
    let quest = active_quest(
        vec![Objective::of_kind("Defeat the wolf", ObjectiveKind::Defeat).with_target("Wolf")],
        None,
    );

    let lost = ActionEvent::new(ActionKind::Combat, "fight")
        .with_target("wolf")
        .with_success(false);
    assert!(!check_progress(&quest, &lost).objectives[0].completed);

    let wrong_target = ActionEvent::new(ActionKind::Combat, "fight").with_target("Bear");
    assert!(!check_progress(&quest, &wrong_target).objectives[0].completed);

    let won = ActionEvent::new(ActionKind::Combat, "fight").with_target("WOLF");
    assert!(check_progress(&quest, &won).objectives[0].completed);
}

#[test]
fn test_custom_objectives_never_auto_complete() {
    let quest = active_quest(
        vec![Objective::of_kind("Earn the king's favor", ObjectiveKind::Custom)],
        None,
    );
    for kind in [
        ActionKind::Combat,
        ActionKind::Dialogue,
        ActionKind::ItemAcquired,
        ActionKind::LocationReached,
        ActionKind::Discovery,
        ActionKind::Other,
    ] {
        let updated = check_progress(&quest, &ActionEvent::new(kind, "anything"));
        assert!(!updated.objectives[0].completed);
    }
}

#[test]
fn test_inactive_quest_unchanged() {
    let available = Quest::new(
        "Rumors",
        QuestKind::Side,
        vec![Objective::of_kind("Find the source", ObjectiveKind::Find)],
        1,
    );
    let updated = check_progress(&available, &ActionEvent::new(ActionKind::Discovery, "look"));
    assert_eq!(updated, available);
}

#[test]
fn test_transitions_are_forward_only() {
    let quest = active_quest(vec![Objective::new("Find the ledger")], None);
    let failed = fail(&quest);
    assert_eq!(failed.state, QuestState::Failed);

    // Cannot reactivate a failed quest
    assert_eq!(activate(&failed).state, QuestState::Failed);
}

#[test]
fn test_update_all_archives_finished_side_quests() {
    let finishing = active_quest(
        vec![Objective::of_kind("Find the ledger", ObjectiveKind::Find)],
        None,
    );
    let expiring = active_quest(
        vec![Objective::of_kind("Talk to the clerk", ObjectiveKind::Talk)],
        Some(1),
    );
    let ongoing = active_quest(
        vec![Objective::of_kind("Reach the harbor", ObjectiveKind::Reach)],
        Some(5),
    );
    let main = active_quest(
        vec![Objective::of_kind("Find the crown", ObjectiveKind::Find)],
        None,
    );

    let log = QuestLog {
        main: Some(main),
        side: vec![finishing.clone(), expiring, ongoing],
        completed: Vec::new(),
    };

    let action = ActionEvent::new(ActionKind::Discovery, "search the archive");
    let updated = update_all(&log, &action);

    assert_eq!(updated.side.len(), 1);
    assert_eq!(updated.completed.len(), 2);
    let main = updated.main.as_ref().unwrap();
    assert_eq!(main.state, QuestState::Completed);

    let rewards = newly_completed_rewards(&log, &updated);
    assert_eq!(rewards.len(), 2);
    assert!(rewards.iter().all(|r| r.gold == 40));

    // A second pass grants nothing new
    let again = update_all(&updated, &action);
    assert!(newly_completed_rewards(&updated, &again).is_empty());
}

#[test]
fn test_rewards_only_for_completed_quests() {
    let quest = active_quest(
        vec![Objective::of_kind("Find the ledger", ObjectiveKind::Find)],
        None,
    );
    assert!(quest_rewards(&quest).is_none());

    let done = check_progress(&quest, &ActionEvent::new(ActionKind::Discovery, "found"));
    let bundle = quest_rewards(&done).unwrap();
    assert_eq!(bundle.gold, 40);
    assert_eq!(bundle.items, vec!["Ledger".to_string()]);
    assert_eq!(bundle.reputation, 5);
    assert_eq!(bundle.experience, 10);
}

#[test]
fn test_fallback_quests_follow_stage_table() {
    let quests = fallback_quests(2, "The Shattered Realm", 3);
    assert_eq!(quests.len(), 3);
    assert!(quests[0].name.contains("alliance"));
    assert!(quests.iter().all(|q| q.stage == 2));
    assert!(quests.iter().all(|q| q.turns_remaining == Some(10)));
    assert!(quests.iter().all(|q| q.state == QuestState::Available));
}
