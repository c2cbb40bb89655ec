mod test_utils;

use saga_core::{
    AgentId, Dependency, GameState, Npc, Objective, PlannedAgent, Quest, QuestKind, SceneType,
    UsageMetrics,
};
use saga_error::PlanErrorKind;
use saga_narrative::{
    Orchestrator, PlanDocument, PlannedAgentDocument, check_cycles, default_plan,
    optimize_sequence, validate_agents,
};
use serde_json::json;
use std::sync::Arc;
use test_utils::{MockBehavior, MockDriver, offline_service, service, test_settings};

const PLAN_TASK: &str = "execution plan";

fn fresh_state() -> GameState {
    GameState::new(&test_settings())
}

fn entry(agent: &str, priority: u32, dependencies: &[&str]) -> PlannedAgentDocument {
    PlannedAgentDocument {
        agent: agent.to_string(),
        priority,
        reason: String::new(),
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
    }
}

#[test]
fn test_default_plan_for_empty_scene() {
    let plan = default_plan(&fresh_state());
    assert_eq!(
        plan.execution_order,
        vec![
            AgentId::WorldBuilder,
            AgentId::SceneComposer,
            AgentId::Consequence
        ]
    );
    assert_eq!(plan.scene_type, SceneType::Exploration);
    assert!(
        plan.planned(AgentId::Consequence)
            .unwrap()
            .needs_player_choice()
    );
}

#[test]
fn test_default_plan_adds_npc_handlers_when_npcs_present() {
    let mut state = fresh_state();
    let npc = Npc::default();
    state.current_scene.npcs_present.push(npc.id.clone());
    state.npcs.push(npc);

    let plan = default_plan(&state);
    assert_eq!(
        plan.execution_order,
        vec![
            AgentId::WorldBuilder,
            AgentId::NpcPersonality,
            AgentId::Dialogue,
            AgentId::SceneComposer,
            AgentId::Consequence
        ]
    );
    let dialogue = plan.planned(AgentId::Dialogue).unwrap();
    assert_eq!(
        dialogue.dependencies,
        vec![Dependency::Agent(AgentId::NpcPersonality)]
    );
}

#[test]
fn test_default_plan_adds_quest_manager_when_quests_in_play() {
    let mut state = fresh_state();
    state.quests.main = Some(Quest::new(
        "Reclaim the crown",
        QuestKind::Main,
        vec![Objective::new("Find the crown")],
        1,
    ));

    let plan = default_plan(&state);
    assert_eq!(plan.execution_order[1], AgentId::QuestManager);
    assert_eq!(plan.execution_order.last(), Some(&AgentId::Consequence));
}

#[test]
fn test_validate_agents_rejects_unknown_names() {
    let agents = validate_agents(&["world_builder", "SCENE_COMPOSER"]).unwrap();
    assert_eq!(agents, vec![AgentId::WorldBuilder, AgentId::SceneComposer]);

    let err = validate_agents(&["WORLD_BUILDER", "BARD"]).unwrap_err();
    assert_eq!(err.kind, PlanErrorKind::UnknownAgent("BARD".to_string()));
}

#[test]
fn test_optimize_sequence_orders_by_priority_then_dependencies() {
    let agents = vec![
        PlannedAgent::new(AgentId::SceneComposer, 3, ""),
        PlannedAgent::new(AgentId::Dialogue, 2, ""),
        PlannedAgent::new(AgentId::NpcPersonality, 2, "").depends_on(AgentId::WorldBuilder),
        PlannedAgent::new(AgentId::WorldBuilder, 1, ""),
    ];

    let order: Vec<AgentId> = optimize_sequence(&agents)
        .into_iter()
        .map(|p| p.agent)
        .collect();
    assert_eq!(
        order,
        vec![
            AgentId::WorldBuilder,
            AgentId::NpcPersonality,
            AgentId::Dialogue,
            AgentId::SceneComposer
        ]
    );
}

#[test]
fn test_check_cycles_detects_mutual_dependency() {
    let agents = vec![
        PlannedAgent::new(AgentId::Dialogue, 1, "").depends_on(AgentId::NpcPersonality),
        PlannedAgent::new(AgentId::NpcPersonality, 1, "").depends_on(AgentId::Dialogue),
    ];
    let err = check_cycles(&agents).unwrap_err();
    assert!(matches!(err.kind, PlanErrorKind::DependencyCycle(ref names) if names.len() == 2));

    let self_loop = vec![PlannedAgent::new(AgentId::Combat, 1, "").depends_on(AgentId::Combat)];
    assert!(check_cycles(&self_loop).is_err());

    let acyclic = vec![
        PlannedAgent::new(AgentId::WorldBuilder, 1, ""),
        PlannedAgent::new(AgentId::SceneComposer, 2, "")
            .depends_on(AgentId::WorldBuilder)
            .depends_on(Dependency::PlayerChoice),
    ];
    assert!(check_cycles(&acyclic).is_ok());
}

#[test]
fn test_plan_document_derives_order_when_missing() {
    let document = PlanDocument {
        agents_to_call: vec![
            entry("SCENE_COMPOSER", 5, &["WORLD_BUILDER"]),
            entry("WORLD_BUILDER", 1, &[]),
            entry("CONSEQUENCE", 9, &["PLAYER_CHOICE"]),
        ],
        execution_order: Vec::new(),
        scene_type: "Combat".to_string(),
        urgent_flags: vec!["ambush".to_string()],
    };

    let plan = document.into_plan().unwrap();
    assert_eq!(
        plan.execution_order,
        vec![
            AgentId::WorldBuilder,
            AgentId::SceneComposer,
            AgentId::Consequence
        ]
    );
    assert_eq!(plan.scene_type, SceneType::Combat);
    assert_eq!(plan.urgent_flags, vec!["ambush".to_string()]);
}

#[test]
fn test_plan_document_rejections() {
    let empty = PlanDocument {
        agents_to_call: Vec::new(),
        execution_order: Vec::new(),
        scene_type: String::new(),
        urgent_flags: Vec::new(),
    };
    assert_eq!(empty.into_plan().unwrap_err().kind, PlanErrorKind::EmptyPlan);

    let unknown_dependency = PlanDocument {
        agents_to_call: vec![entry("DIALOGUE", 1, &["MINSTREL"])],
        execution_order: vec!["DIALOGUE".to_string()],
        scene_type: "dialogue".to_string(),
        urgent_flags: Vec::new(),
    };
    assert_eq!(
        unknown_dependency.into_plan().unwrap_err().kind,
        PlanErrorKind::UnknownAgent("MINSTREL".to_string())
    );
}

#[test]
fn test_unrecognized_scene_type_is_unknown() {
    let document = PlanDocument {
        agents_to_call: vec![entry("WORLD_BUILDER", 1, &[])],
        execution_order: vec!["WORLD_BUILDER".to_string()],
        scene_type: "heist".to_string(),
        urgent_flags: Vec::new(),
    };
    assert_eq!(document.into_plan().unwrap().scene_type, SceneType::Unknown);
}

#[tokio::test]
async fn test_orchestrator_falls_back_when_offline() {
    let mut orchestrator = Orchestrator::new(offline_service());
    let mut metrics = UsageMetrics::default();
    let state = fresh_state();

    let plan = orchestrator.determine_turn_flow(&state, &mut metrics).await;

    assert_eq!(plan, default_plan(&state));
    assert_eq!(metrics.fallbacks, 1);
    assert_eq!(metrics.failed_calls, 1);
    assert_eq!(orchestrator.history().len(), 1);
    assert_eq!(orchestrator.history()[0].turn, 1);
}

#[tokio::test]
async fn test_orchestrator_uses_generated_plan() {
    let driver = Arc::new(MockDriver::new().route(
        PLAN_TASK,
        vec![MockBehavior::json(json!({
            "agentsToCall": [
                {"agent": "WORLD_BUILDER", "priority": 1, "reason": "scene", "dependencies": []},
                {"agent": "COMBAT", "priority": 2, "reason": "ambush", "dependencies": ["WORLD_BUILDER"]},
                {"agent": "SCENE_COMPOSER", "priority": 3, "reason": "wrap up", "dependencies": ["COMBAT"]}
            ],
            "executionOrder": ["WORLD_BUILDER", "COMBAT", "SCENE_COMPOSER"],
            "sceneType": "combat",
            "urgentFlags": []
        }))],
    ));
    let mut orchestrator = Orchestrator::new(service(driver.clone()));
    let mut metrics = UsageMetrics::default();

    let plan = orchestrator
        .determine_turn_flow(&fresh_state(), &mut metrics)
        .await;

    assert_eq!(
        plan.execution_order,
        vec![
            AgentId::WorldBuilder,
            AgentId::Combat,
            AgentId::SceneComposer
        ]
    );
    assert_eq!(plan.scene_type, SceneType::Combat);
    assert_eq!(metrics.call_count, 1);
    assert_eq!(metrics.fallbacks, 0);
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn test_orchestrator_falls_back_on_invalid_plans() {
    let driver = Arc::new(MockDriver::new().route(
        PLAN_TASK,
        vec![
            MockBehavior::Text("Let me think about this turn...".to_string()),
            MockBehavior::json(json!({
                "agentsToCall": [{"agent": "BARD", "priority": 1}],
                "executionOrder": ["BARD"],
                "sceneType": "dialogue"
            })),
            MockBehavior::json(json!({
                "agentsToCall": [
                    {"agent": "DIALOGUE", "priority": 1, "dependencies": ["NPC_PERSONALITY"]},
                    {"agent": "NPC_PERSONALITY", "priority": 1, "dependencies": ["DIALOGUE"]}
                ],
                "sceneType": "dialogue"
            })),
        ],
    ));
    let mut orchestrator = Orchestrator::new(service(driver));
    let mut metrics = UsageMetrics::default();
    let state = fresh_state();

    for _ in 0..3 {
        let plan = orchestrator.determine_turn_flow(&state, &mut metrics).await;
        assert_eq!(plan, default_plan(&state));
    }
    assert_eq!(metrics.fallbacks, 3);
}

#[tokio::test]
async fn test_orchestrator_stats() {
    let mut orchestrator = Orchestrator::new(offline_service());
    let empty = orchestrator.stats();
    assert_eq!(empty.total_turns_orchestrated, 0);
    assert_eq!(empty.average_agents_per_turn, 0.0);
    assert_eq!(empty.most_common_scene, None);

    let mut metrics = UsageMetrics::default();
    let mut state = fresh_state();
    orchestrator.determine_turn_flow(&state, &mut metrics).await;
    state.advance_turn();
    orchestrator.determine_turn_flow(&state, &mut metrics).await;

    let stats = orchestrator.stats();
    assert_eq!(stats.total_turns_orchestrated, 2);
    assert_eq!(stats.average_agents_per_turn, 3.0);
    assert_eq!(stats.scene_type_distribution.get("exploration"), Some(&2));
    assert_eq!(stats.most_common_scene.as_deref(), Some("exploration"));
}
