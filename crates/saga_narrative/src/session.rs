//! The two-phase game cycle: present a turn, then resolve the player's choice.

use crate::executor::{TurnExecutor, TurnReport};
use crate::planner::Orchestrator;
use crate::registry::HandlerRegistry;
use crate::service::NarrativeService;
use saga_core::{
    AgentId, ConsequenceOutcome, ExecutionPlan, GameSettings, GameState, PlannedAgent,
    PlayerChoice, SceneType, TurnContext, TurnResults, TurnSummary, UsageMetrics,
};
use saga_progression::reveal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Handlers that always run once the player has chosen.
const RESOLUTION_AGENTS: [AgentId; 3] = [
    AgentId::QuestManager,
    AgentId::Inventory,
    AgentId::ProfileTracker,
];

#[derive(Debug)]
struct PendingTurn {
    plan: ExecutionPlan,
    results: TurnResults,
    deferred: Vec<AgentId>,
}

/// One game in progress.
///
/// `&mut self` on every step guarantees a turn never starts before the
/// previous one finished.
#[derive(Debug)]
pub struct GameSession {
    settings: GameSettings,
    state: GameState,
    orchestrator: Orchestrator,
    executor: TurnExecutor,
    registry: HandlerRegistry,
    ctx: TurnContext,
    pending: Option<PendingTurn>,
}

impl GameSession {
    /// A fresh game with every standard handler.
    pub fn new(settings: GameSettings, service: Arc<NarrativeService>, ctx: TurnContext) -> Self {
        let registry = HandlerRegistry::standard(service.clone(), &settings, Default::default());
        Self::with_registry(settings, service, registry, ctx)
    }

    /// A fresh game over a custom registry.
    pub fn with_registry(
        settings: GameSettings,
        service: Arc<NarrativeService>,
        registry: HandlerRegistry,
        ctx: TurnContext,
    ) -> Self {
        Self {
            state: GameState::new(&settings),
            settings,
            orchestrator: Orchestrator::new(service),
            executor: TurnExecutor::default(),
            registry,
            ctx,
            pending: None,
        }
    }

    /// Replace the executor, e.g. to change the handler deadline.
    pub fn with_executor(mut self, executor: TurnExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Resume from an existing state.
    pub fn with_state(mut self, state: GameState) -> Self {
        self.state = state;
        self.pending = None;
        self
    }

    /// Plan and run the presentation phase of the current turn.
    ///
    /// Handlers that need the player's choice are deferred until
    /// [`resolve_choice`](Self::resolve_choice).
    #[instrument(skip(self), fields(turn = self.state.turn, stage = self.state.stage))]
    pub async fn present_turn(&mut self) -> TurnReport {
        if self.pending.is_some() {
            warn!("Presenting a new turn before the previous choice was resolved");
        }
        let report = self
            .executor
            .execute_turn(
                &mut self.orchestrator,
                &mut self.state,
                &self.registry,
                None,
                &mut self.ctx,
            )
            .await;

        self.pending = Some(PendingTurn {
            plan: report.plan.clone(),
            results: report.results.clone(),
            deferred: report.deferred.clone(),
        });
        report
    }

    /// Resolve the player's choice and close the turn.
    ///
    /// Runs the deferred handlers and the resolution handlers with the choice
    /// seeded, records the turn in history, reveals the profile at the
    /// configured turn, and advances to the next turn.
    #[instrument(skip(self, choice), fields(turn = self.state.turn, choice = %choice.personality_mapping))]
    pub async fn resolve_choice(&mut self, choice: PlayerChoice) -> TurnReport {
        let pending = self.pending.take().unwrap_or_else(|| PendingTurn {
            plan: ExecutionPlan {
                agents_to_call: Vec::new(),
                execution_order: Vec::new(),
                scene_type: SceneType::Unknown,
                urgent_flags: Vec::new(),
            },
            results: TurnResults::default(),
            deferred: vec![AgentId::Consequence],
        });

        let mut order = pending.deferred.clone();
        for agent in RESOLUTION_AGENTS {
            if !order.contains(&agent) {
                order.push(agent);
            }
        }
        let agents_to_call = order
            .iter()
            .map(|&agent| {
                pending
                    .plan
                    .planned(agent)
                    .cloned()
                    .unwrap_or_else(|| PlannedAgent::new(agent, 10, "Resolve player choice"))
            })
            .collect();
        let plan = ExecutionPlan {
            agents_to_call,
            execution_order: order,
            scene_type: pending.plan.scene_type,
            urgent_flags: pending.plan.urgent_flags.clone(),
        };

        let mut results = pending.results;
        results.player_choice = Some(choice.clone());

        let report = self
            .executor
            .execute_plan(&plan, &mut self.state, &self.registry, results, &mut self.ctx)
            .await;

        let outcome = report
            .results
            .get_as::<ConsequenceOutcome>(AgentId::Consequence)
            .unwrap_or_default();
        self.state.history.push(TurnSummary {
            turn: self.state.turn,
            choice_type: choice.personality_mapping.clone(),
            choice_text: choice.text.clone(),
            consequence: outcome.outcome,
            importance: outcome.consequence_level,
        });

        reveal(
            &mut self.state.profile,
            self.state.turn,
            self.settings.profile_reveal_turn,
        );
        self.state.advance_turn();
        info!(
            next_turn = self.state.turn,
            health = self.state.player_stats.health,
            "Turn complete"
        );
        report
    }

    /// Whether the game has ended: every turn played or the player at zero health.
    pub fn is_finished(&self) -> bool {
        self.state.turn > self.state.total_turns || self.state.player_stats.health <= 0
    }

    /// Current game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Game settings.
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Usage counters for the generation service.
    pub fn metrics(&self) -> &UsageMetrics {
        &self.ctx.metrics
    }

    /// The orchestrator, for plan history and statistics.
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}
