mod test_utils;

use async_trait::async_trait;
use saga_core::{
    AgentId, ActionKind, Dependency, ExecutionPlan, GameState, HandlerOutput, PlannedAgent,
    PlayerChoice, SceneType, StateMutation, TurnContext, TurnResults,
};
use saga_error::{HandlerError, HandlerErrorKind, SagaResult};
use saga_interface::TurnHandler;
use saga_narrative::{HandlerRegistry, Orchestrator, TurnExecutor};
use serde_json::json;
use std::time::Duration;
use test_utils::{offline_service, test_settings};

/// What a stub handler does when executed.
#[derive(Clone)]
enum Stub {
    /// Succeed with a document and mutations
    Succeed(serde_json::Value, Vec<StateMutation>),
    /// Fail with a handler error
    Fail,
    /// Take longer than any reasonable deadline
    Hang,
    /// Succeed only when an upstream document is present
    Requires(AgentId),
}

struct StubHandler {
    agent: AgentId,
    stub: Stub,
}

#[async_trait]
impl TurnHandler for StubHandler {
    fn agent(&self) -> AgentId {
        self.agent
    }

    async fn execute(
        &self,
        _state: &GameState,
        results: &TurnResults,
        _ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        match &self.stub {
            Stub::Succeed(document, mutations) => Ok(HandlerOutput {
                document: document.clone(),
                mutations: mutations.clone(),
            }),
            Stub::Fail => Err(HandlerError::new(
                self.agent.to_string(),
                HandlerErrorKind::Failed("the dice rolled off the table".to_string()),
            )
            .into()),
            Stub::Hang => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(HandlerOutput::from_document(json!({})))
            }
            Stub::Requires(upstream) => match results.get(*upstream) {
                Some(document) => Ok(HandlerOutput::from_document(
                    json!({"saw": document.clone()}),
                )),
                None => Err(HandlerError::new(
                    self.agent.to_string(),
                    HandlerErrorKind::MissingInput(upstream.to_string()),
                )
                .into()),
            },
        }
    }
}

fn stub(agent: AgentId, stub: Stub) -> Box<dyn TurnHandler> {
    Box::new(StubHandler { agent, stub })
}

fn plan(agents: Vec<PlannedAgent>) -> ExecutionPlan {
    ExecutionPlan {
        execution_order: agents.iter().map(|p| p.agent).collect(),
        agents_to_call: agents,
        scene_type: SceneType::Exploration,
        urgent_flags: Vec::new(),
    }
}

fn scene_set(description: &str) -> StateMutation {
    StateMutation::SceneSet {
        description: description.to_string(),
        atmosphere: "tense".to_string(),
        location: Some("Ashen Ford".to_string()),
    }
}

fn choice() -> PlayerChoice {
    PlayerChoice {
        text: "Attack the bandits".to_string(),
        personality_mapping: "AGGRESSIVE".to_string(),
        risk_level: "high".to_string(),
        likely_outcome: String::new(),
        action: ActionKind::Combat,
        target: None,
    }
}

#[tokio::test]
async fn test_failed_handler_does_not_stop_the_turn() {
    let registry = HandlerRegistry::new()
        .with(stub(
            AgentId::WorldBuilder,
            Stub::Succeed(json!({"scene": "a ford"}), vec![scene_set("A ford")]),
        ))
        .with(stub(AgentId::Combat, Stub::Fail))
        .with(stub(
            AgentId::SceneComposer,
            Stub::Requires(AgentId::WorldBuilder),
        ));
    let plan = plan(vec![
        PlannedAgent::new(AgentId::WorldBuilder, 1, ""),
        PlannedAgent::new(AgentId::Combat, 2, ""),
        PlannedAgent::new(AgentId::SceneComposer, 3, ""),
    ]);
    let mut state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(1));

    let report = TurnExecutor::new()
        .execute_plan(&plan, &mut state, &registry, TurnResults::default(), &mut ctx)
        .await;

    assert!(!report.success);
    assert_eq!(report.results.len(), 2);
    assert!(report.results.contains(AgentId::WorldBuilder));
    assert!(report.results.contains(AgentId::SceneComposer));
    assert!(!report.results.contains(AgentId::Combat));
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].agent, AgentId::Combat);
    assert!(report.errors[0].error.contains("dice"));

    assert_eq!(state.current_scene.description, "A ford");
    assert_eq!(state.world.current_location, "Ashen Ford");
}

#[tokio::test]
async fn test_missing_handler_is_skipped() {
    let registry = HandlerRegistry::new().with(stub(
        AgentId::WorldBuilder,
        Stub::Succeed(json!({}), Vec::new()),
    ));
    let plan = plan(vec![
        PlannedAgent::new(AgentId::Betrayal, 1, ""),
        PlannedAgent::new(AgentId::WorldBuilder, 2, ""),
    ]);
    let mut state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(1));

    let report = TurnExecutor::new()
        .execute_plan(&plan, &mut state, &registry, TurnResults::default(), &mut ctx)
        .await;

    assert!(report.success);
    assert_eq!(report.skipped, vec![AgentId::Betrayal]);
    assert!(report.results.contains(AgentId::WorldBuilder));
}

#[tokio::test]
async fn test_choice_dependent_handler_is_deferred_without_choice() {
    let registry = HandlerRegistry::new().with(stub(
        AgentId::Consequence,
        Stub::Succeed(json!({"outcome": "done"}), Vec::new()),
    ));
    let plan = plan(vec![
        PlannedAgent::new(AgentId::Consequence, 10, "").depends_on(Dependency::PlayerChoice),
    ]);
    let mut state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(1));
    let executor = TurnExecutor::new();

    let report = executor
        .execute_plan(&plan, &mut state, &registry, TurnResults::default(), &mut ctx)
        .await;
    assert_eq!(report.deferred, vec![AgentId::Consequence]);
    assert!(report.results.is_empty());
    assert!(report.success);

    let report = executor
        .execute_plan(
            &plan,
            &mut state,
            &registry,
            TurnResults::with_choice(choice()),
            &mut ctx,
        )
        .await;
    assert!(report.deferred.is_empty());
    assert!(report.results.contains(AgentId::Consequence));
}

#[tokio::test]
async fn test_slow_handler_times_out() {
    let registry = HandlerRegistry::new()
        .with(stub(AgentId::Continuity, Stub::Hang))
        .with(stub(
            AgentId::SceneComposer,
            Stub::Succeed(json!({"finalScene": "quiet"}), Vec::new()),
        ));
    let plan = plan(vec![
        PlannedAgent::new(AgentId::Continuity, 1, ""),
        PlannedAgent::new(AgentId::SceneComposer, 2, ""),
    ]);
    let mut state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(1));

    let report = TurnExecutor::new()
        .with_handler_timeout(Duration::from_millis(20))
        .execute_plan(&plan, &mut state, &registry, TurnResults::default(), &mut ctx)
        .await;

    assert!(!report.success);
    assert_eq!(report.errors[0].agent, AgentId::Continuity);
    assert!(report.errors[0].error.contains("timed out"));
    assert!(report.results.contains(AgentId::SceneComposer));
}

#[tokio::test]
async fn test_execute_turn_plans_with_orchestrator() {
    let registry = HandlerRegistry::new()
        .with(stub(
            AgentId::WorldBuilder,
            Stub::Succeed(json!({"scene": "fog"}), vec![scene_set("Fog rolls in")]),
        ))
        .with(stub(
            AgentId::SceneComposer,
            Stub::Requires(AgentId::WorldBuilder),
        ))
        .with(stub(AgentId::Consequence, Stub::Fail));
    let mut orchestrator = Orchestrator::new(offline_service());
    let mut state = GameState::new(&test_settings());
    let mut ctx = TurnContext::new(Some(1));

    let report = TurnExecutor::new()
        .execute_turn(&mut orchestrator, &mut state, &registry, None, &mut ctx)
        .await;

    assert!(report.success);
    assert_eq!(report.deferred, vec![AgentId::Consequence]);
    assert_eq!(report.results.len(), 2);
    assert_eq!(state.current_scene.description, "Fog rolls in");
    assert_eq!(ctx.metrics.fallbacks, 1);
}

#[test]
fn test_registry_lookup() {
    let mut registry = HandlerRegistry::new();
    assert!(registry.is_empty());
    registry.register(stub(AgentId::Inventory, Stub::Fail));
    registry.register(stub(AgentId::Combat, Stub::Fail));
    registry.register(stub(AgentId::Inventory, Stub::Hang));

    assert_eq!(registry.len(), 2);
    assert!(registry.contains(AgentId::Inventory));
    assert!(registry.get(AgentId::Dialogue).is_none());
    assert_eq!(registry.agents(), vec![AgentId::Combat, AgentId::Inventory]);
}
