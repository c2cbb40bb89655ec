//! Plan execution.

use crate::commit::commit;
use crate::planner::Orchestrator;
use crate::registry::HandlerRegistry;
use saga_core::{AgentId, ExecutionPlan, GameState, PlayerChoice, TurnContext, TurnResults};
use saga_error::{HandlerError, HandlerErrorKind};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Default deadline for one handler, retries included.
const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(120);

/// A handler that failed during a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerFailure {
    /// Which handler
    pub agent: AgentId,
    /// What went wrong
    pub error: String,
}

/// Everything one execution produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    /// The plan that was walked
    pub plan: ExecutionPlan,
    /// Documents of the handlers that succeeded
    pub results: TurnResults,
    /// Handlers that failed or timed out
    pub errors: Vec<HandlerFailure>,
    /// Handlers waiting for the player's choice
    pub deferred: Vec<AgentId>,
    /// Planned agents without a registered handler
    pub skipped: Vec<AgentId>,
    /// Whether no handler failed
    pub success: bool,
}

/// Walks execution plans over a handler registry.
#[derive(Debug, Clone)]
pub struct TurnExecutor {
    handler_timeout: Duration,
}

impl Default for TurnExecutor {
    fn default() -> Self {
        Self {
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }
}

impl TurnExecutor {
    /// An executor with the default handler deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the per-handler deadline.
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Plan a turn with `orchestrator` and execute it.
    #[instrument(skip_all, fields(turn = state.turn, has_choice = choice.is_some()))]
    pub async fn execute_turn(
        &self,
        orchestrator: &mut Orchestrator,
        state: &mut GameState,
        registry: &HandlerRegistry,
        choice: Option<PlayerChoice>,
        ctx: &mut TurnContext,
    ) -> TurnReport {
        let plan = orchestrator.determine_turn_flow(state, &mut ctx.metrics).await;
        let results = TurnResults {
            player_choice: choice,
            ..TurnResults::default()
        };
        self.execute_plan(&plan, state, registry, results, ctx).await
    }

    /// Walk `plan.execution_order` strictly in order.
    ///
    /// A missing handler is skipped with a warning. A handler that fails or
    /// times out is recorded and the walk continues; its mutations are never
    /// committed. A handler that needs the player's choice while `results`
    /// carries none is deferred.
    #[instrument(skip_all, fields(turn = state.turn, agents = plan.len()))]
    pub async fn execute_plan(
        &self,
        plan: &ExecutionPlan,
        state: &mut GameState,
        registry: &HandlerRegistry,
        mut results: TurnResults,
        ctx: &mut TurnContext,
    ) -> TurnReport {
        let mut errors = Vec::new();
        let mut deferred = Vec::new();
        let mut skipped = Vec::new();

        for &agent in &plan.execution_order {
            let Some(handler) = registry.get(agent) else {
                warn!(%agent, "Agent not found in registry");
                skipped.push(agent);
                continue;
            };

            let needs_choice = plan
                .planned(agent)
                .is_some_and(|p| p.needs_player_choice());
            if needs_choice && results.player_choice.is_none() {
                debug!(%agent, "Deferred until the player chooses");
                deferred.push(agent);
                continue;
            }

            debug!(%agent, "Executing handler");
            let outcome =
                tokio::time::timeout(self.handler_timeout, handler.execute(state, &results, ctx))
                    .await;

            match outcome {
                Ok(Ok(output)) => {
                    commit(state, agent, output.mutations);
                    results.insert(agent, output.document);
                }
                Ok(Err(e)) => {
                    error!(%agent, error = %e, "Handler failed");
                    errors.push(HandlerFailure {
                        agent,
                        error: e.to_string(),
                    });
                }
                Err(_) => {
                    let e = HandlerError::new(
                        agent.to_string(),
                        HandlerErrorKind::TimedOut(self.handler_timeout.as_millis() as u64),
                    );
                    error!(%agent, error = %e, "Handler timed out");
                    errors.push(HandlerFailure {
                        agent,
                        error: e.to_string(),
                    });
                }
            }
        }

        let success = errors.is_empty();
        info!(
            completed = results.len(),
            failed = errors.len(),
            deferred = deferred.len(),
            success,
            "Plan executed"
        );

        TurnReport {
            plan: plan.clone(),
            results,
            errors,
            deferred,
            skipped,
            success,
        }
    }
}
