//! Turn orchestration for the Saga narrative engine.
//!
//! Each turn the [`Orchestrator`] produces an [`ExecutionPlan`], the
//! [`TurnExecutor`] walks it over a [`HandlerRegistry`], and every successful
//! handler's mutations are committed to the game state. [`GameSession`]
//! drives the two-phase present/resolve cycle on top.
//!
//! [`ExecutionPlan`]: saga_core::ExecutionPlan

mod commit;
mod context;
mod executor;
pub mod handlers;
mod planner;
mod registry;
mod service;
mod session;

pub use commit::commit;
pub use context::game_digest;
pub use executor::{HandlerFailure, TurnExecutor, TurnReport};
pub use planner::{
    Orchestrator, OrchestratorStats, PlanDocument, PlanRecord, PlannedAgentDocument,
    check_cycles, default_plan, optimize_sequence, validate_agents,
};
pub use registry::HandlerRegistry;
pub use service::NarrativeService;
pub use session::GameSession;
