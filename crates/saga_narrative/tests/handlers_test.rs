mod test_utils;

use saga_cache::{Always, CacheConfig};
use saga_core::{
    ActionKind, AgentId, GameState, HandlerOutput, Npc, PlayerChoice, QuestState,
    StateMutation, TurnContext, TurnResults,
};
use saga_error::{HandlerErrorKind, SagaErrorKind};
use saga_interface::TurnHandler;
use saga_narrative::handlers::{
    CombatHandler, CombatReport, ComposedScene, ConsequenceHandler, DialogueHandler,
    DialogueReport, InventoryHandler, InventoryReport, NpcPersonalityHandler, NpcSceneReport,
    ProfileReport, ProfileTrackerHandler, QuestManagerHandler, QuestReport, SceneComposerHandler,
    SceneDocument, WorldBuilderHandler, fallback_choices, time_of_day,
};
use saga_narrative::{HandlerRegistry, commit};
use serde_json::json;
use std::sync::Arc;
use test_utils::{MockBehavior, MockDriver, offline_service, service, test_settings};

fn choice(text: &str, mapping: &str, action: ActionKind) -> PlayerChoice {
    PlayerChoice {
        text: text.to_string(),
        personality_mapping: mapping.to_string(),
        risk_level: "medium".to_string(),
        likely_outcome: String::new(),
        action,
        target: None,
    }
}

async fn run(
    handler: &dyn TurnHandler,
    state: &GameState,
    results: &TurnResults,
    ctx: &mut TurnContext,
) -> HandlerOutput {
    handler
        .execute(state, results, ctx)
        .await
        .expect("Handler succeeds")
}

#[test]
fn test_time_of_day_cycles() {
    assert_eq!(time_of_day(1), "midday");
    assert_eq!(time_of_day(2), "dusk");
    assert_eq!(time_of_day(3), "night");
    assert_eq!(time_of_day(4), "dawn");
    assert_eq!(time_of_day(5), "midday");
}

#[tokio::test]
async fn test_world_builder_falls_back_offline() {
    let handler = WorldBuilderHandler::new(offline_service(), CacheConfig::default());
    let state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));

    let output = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let scene: SceneDocument = serde_json::from_value(output.document).unwrap();

    assert!(scene.scene_description.contains(&state.world.name));
    assert_eq!(scene.atmosphere, "neutral");
    assert_eq!(ctx.metrics.fallbacks, 1);
    assert!(matches!(
        output.mutations[0],
        StateMutation::SceneSet { .. }
    ));
}

#[tokio::test]
async fn test_world_builder_reuses_cached_scene() {
    let driver = Arc::new(MockDriver::new().route(
        "scene description",
        vec![MockBehavior::json(json!({
            "sceneDescription": "Lanterns sway over the market.",
            "atmosphere": "lively",
            "locationName": "Lantern Market",
            "worldStateUpdates": {"market_open": true}
        }))],
    ));
    let handler = WorldBuilderHandler::new(service(driver.clone()), CacheConfig::default())
        .with_reuse_policy(Box::new(Always));
    let mut state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));

    let first = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    assert_eq!(first.mutations.len(), 2);
    commit(&mut state, AgentId::WorldBuilder, first.mutations);
    assert_eq!(state.world.current_location, "Lantern Market");
    assert_eq!(state.world.world_state.get("market_open"), Some(&json!(true)));

    // The first scene was cached under the starting location
    state.world.current_location = test_settings().starting_location;
    let second = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    assert_eq!(second.document, first.document);
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn test_scene_composer_falls_back_to_stock_choices() {
    let handler = SceneComposerHandler::new(offline_service());
    let state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));

    let output = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let scene: ComposedScene = serde_json::from_value(output.document).unwrap();

    assert_eq!(scene.choices, fallback_choices());
    assert_eq!(scene.choices.len(), 4);
    match &output.mutations[0] {
        StateMutation::ChoicesPresented { choices, .. } => assert_eq!(choices.len(), 4),
        other => panic!("Unexpected mutation {:?}", other),
    }
}

#[tokio::test]
async fn test_scene_composer_infers_missing_action_kinds() {
    let driver = Arc::new(MockDriver::new().route(
        "Compose the scene",
        vec![MockBehavior::json(json!({
            "finalScene": "The gate creaks open.",
            "npcPresence": "",
            "questHints": "",
            "choices": [
                {"text": "Search the gatehouse", "personalityMapping": "CAUTIOUS"},
                {"text": "Charge through the gate", "personalityMapping": "AGGRESSIVE"}
            ]
        }))],
    ));
    let handler = SceneComposerHandler::new(service(driver));
    let state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));

    let output = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let scene: ComposedScene = serde_json::from_value(output.document).unwrap();

    assert_eq!(scene.final_scene, "The gate creaks open.");
    assert_eq!(scene.choices[0].action, ActionKind::Discovery);
    assert_eq!(scene.choices[1].action, ActionKind::Combat);
}

#[tokio::test]
async fn test_consequence_requires_a_choice() {
    let handler = ConsequenceHandler::new(offline_service());
    let state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));

    let err = handler
        .execute(&state, &TurnResults::default(), &mut ctx)
        .await
        .unwrap_err();
    match err.kind() {
        SagaErrorKind::Handler(e) => {
            assert!(matches!(e.kind(), HandlerErrorKind::MissingInput(_)))
        }
        other => panic!("Unexpected error {}", other),
    }
}

#[tokio::test]
async fn test_consequence_fallback_names_the_choice() {
    let handler = ConsequenceHandler::new(offline_service());
    let state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));
    let results = TurnResults::with_choice(choice("Open the chest", "CREATIVE", ActionKind::Other));

    let output = run(&handler, &state, &results, &mut ctx).await;

    assert_eq!(
        output.document["outcome"],
        "Your choice to Open the chest has consequences."
    );
    assert_eq!(output.document["consequenceLevel"], "moderate");
    assert!(matches!(output.mutations[0], StateMutation::Consequence(_)));
}

#[tokio::test]
async fn test_quest_manager_offers_fallback_quests_at_stage_start() {
    let settings = test_settings();
    let handler = QuestManagerHandler::new(offline_service(), settings.side_quests_per_stage);
    let mut state = GameState::new(&settings);
    let mut ctx = TurnContext::new(Some(3));

    let output = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let report: QuestReport = serde_json::from_value(output.document.clone()).unwrap();
    assert_eq!(report.offered.len(), settings.side_quests_per_stage);

    commit(&mut state, AgentId::QuestManager, output.mutations);
    assert_eq!(state.quests.active_side().count(), settings.side_quests_per_stage);

    // Active side quests suppress new offers
    let again = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let report: QuestReport = serde_json::from_value(again.document).unwrap();
    assert!(report.offered.is_empty());
}

#[tokio::test]
async fn test_quest_manager_advances_quests_from_choice() {
    let settings = test_settings();
    let handler = QuestManagerHandler::new(offline_service(), settings.side_quests_per_stage);
    let mut state = GameState::new(&settings);
    let mut ctx = TurnContext::new(Some(3));

    let offer = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    commit(&mut state, AgentId::QuestManager, offer.mutations);
    let gold = state.player_stats.gold;

    // Fallback quests ask for exploring and talking
    for (text, kind) in [
        ("Explore the ruins", ActionKind::Discovery),
        ("Talk to the ferryman", ActionKind::Dialogue),
    ] {
        let results = TurnResults::with_choice(choice(text, "CAUTIOUS", kind));
        let output = run(&handler, &state, &results, &mut ctx).await;
        commit(&mut state, AgentId::QuestManager, output.mutations);
    }

    assert!(state.quests.active_side().next().is_none());
    assert!(
        state
            .quests
            .completed
            .iter()
            .all(|q| q.state == QuestState::Completed)
    );
    assert_eq!(state.quests.completed.len(), settings.side_quests_per_stage);
    assert!(state.player_stats.gold > gold);
}

#[tokio::test]
async fn test_npc_handler_introduces_fallback_npc() {
    let handler = NpcPersonalityHandler::new(offline_service(), 15);
    let mut state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));

    let output = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let report: NpcSceneReport = serde_json::from_value(output.document.clone()).unwrap();
    assert!(report.new_npc.is_some());

    commit(&mut state, AgentId::NpcPersonality, output.mutations);
    assert_eq!(state.npcs.len(), 1);
    assert_eq!(state.current_scene.npcs_present, vec![state.npcs[0].id.clone()]);
}

#[tokio::test]
async fn test_npc_handler_respects_roster_cap() {
    let handler = NpcPersonalityHandler::new(offline_service(), 1);
    let mut state = GameState::new(&test_settings());
    state.npcs.push(Npc {
        name: "Old Tam".to_string(),
        location: state.world.current_location.clone(),
        ..Npc::default()
    });
    let mut ctx = TurnContext::new(Some(3));

    let output = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let report: NpcSceneReport = serde_json::from_value(output.document).unwrap();

    assert!(report.new_npc.is_none());
    assert_eq!(report.npcs_in_scene.len(), 1);
    assert_eq!(report.npcs_in_scene[0].name, "Old Tam");
}

#[tokio::test]
async fn test_dialogue_fallback_follows_relationship() {
    let handler = DialogueHandler::new(offline_service());
    let mut state = GameState::new(&test_settings());
    let friend = Npc {
        name: "Iris".to_string(),
        relationship: 80,
        ..Npc::default()
    };
    let rival = Npc {
        name: "Vask".to_string(),
        relationship: -80,
        ..Npc::default()
    };
    state.current_scene.npcs_present = vec![friend.id.clone(), rival.id.clone()];
    let (friend_id, rival_id) = (friend.id.clone(), rival.id.clone());
    state.npcs.extend([friend, rival]);
    let mut ctx = TurnContext::new(Some(3));

    let output = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let report: DialogueReport = serde_json::from_value(output.document).unwrap();

    assert_eq!(report.dialogues[&friend_id].tone, "friendly");
    assert_eq!(report.dialogues[&rival_id].tone, "hostile");
    assert!(output.mutations.is_empty());
}

#[tokio::test]
async fn test_combat_needs_threats() {
    let handler = CombatHandler::new(offline_service());
    let state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));

    let quiet = run(&handler, &state, &TurnResults::default(), &mut ctx).await;
    let report: CombatReport = serde_json::from_value(quiet.document).unwrap();
    assert!(!report.combat_occurred);
    assert!(quiet.mutations.is_empty());

    let mut results = TurnResults::default();
    results.insert(
        AgentId::WorldBuilder,
        json!({
            "sceneDescription": "Wolves circle the camp.",
            "atmosphere": "tense",
            "locationName": "Camp",
            "threatsPresent": ["wolves"]
        }),
    );
    let fight = run(&handler, &state, &results, &mut ctx).await;
    let report: CombatReport = serde_json::from_value(fight.document).unwrap();
    assert!(report.combat_occurred);
    assert!(report.health_change < 0);
    assert_eq!(fight.mutations.len(), 1);
}

#[tokio::test]
async fn test_profile_tracker_ignores_unknown_mapping() {
    let state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(3));

    let results = TurnResults::with_choice(choice("Dance", "WHIMSICAL", ActionKind::Other));
    let output = run(&ProfileTrackerHandler, &state, &results, &mut ctx).await;
    let report: ProfileReport = serde_json::from_value(output.document).unwrap();
    assert!(!report.profile_updated);
    assert!(output.mutations.is_empty());

    let results = TurnResults::with_choice(choice("Lead the charge", "LEADERSHIP", ActionKind::Combat));
    let output = run(&ProfileTrackerHandler, &state, &results, &mut ctx).await;
    let report: ProfileReport = serde_json::from_value(output.document).unwrap();
    assert!(report.profile_updated);
    assert_eq!(report.dominant_traits.len(), 3);
    assert_eq!(
        output.mutations,
        vec![StateMutation::ProfileChoice("LEADERSHIP".to_string())]
    );
}

#[tokio::test]
async fn test_inventory_reports_items_without_space() {
    let mut settings = test_settings();
    settings.max_inventory_size = 0;
    let state = GameState::new(&settings);
    let mut ctx = TurnContext::new(Some(3));

    let mut results = TurnResults::default();
    results.insert(
        AgentId::Consequence,
        json!({
            "outcome": "You find a lantern.",
            "success": true,
            "consequenceLevel": "minor",
            "immediateEffects": {"itemsGained": ["Lantern"]}
        }),
    );
    let output = run(&InventoryHandler, &state, &results, &mut ctx).await;
    let report: InventoryReport = serde_json::from_value(output.document).unwrap();

    assert!(report.inventory_full);
    assert_eq!(report.available_space, 0);
    assert_eq!(report.items_without_space, vec!["Lantern".to_string()]);
    assert!(report.items_gained.is_empty());
}

#[test]
fn test_standard_registry_covers_every_agent() {
    let settings = test_settings();
    let registry = HandlerRegistry::standard(offline_service(), &settings, CacheConfig::default());
    assert_eq!(registry.len(), 11);
    assert!(registry.contains(AgentId::Continuity));
    assert!(registry.contains(AgentId::Betrayal));
}
