//! Core data types for the Saga narrative engine.
//!
//! This crate holds the persistent game state, the per-turn plan and result
//! types, and the request/response contract with the narrative generation
//! service. Logic that moves state forward lives in `saga_progression`.

mod generation;
mod npc;
mod observability;
mod outcome;
mod plan;
mod profile;
mod quest;
mod settings;
mod state;
mod turn;

pub use generation::{
    GenerationRequest, GenerationRequestBuilder, GenerationRequestBuilderError,
    GenerationResponse, output_format, parse_document,
};
pub use npc::{
    Interaction, MemoryEntry, Npc, NpcArchetype, NpcBuilder, NpcBuilderError, RELATIONSHIP_MAX,
    RELATIONSHIP_MIN,
};
pub use observability::init_tracing;
pub use outcome::{ConsequenceOutcome, ImmediateEffects, InteractionReport, ItemGrant};
pub use plan::{AgentId, Dependency, ExecutionPlan, PLAYER_CHOICE, PlannedAgent, SceneType};
pub use profile::{
    ChoiceType, NEUTRAL_TRAIT_VALUE, PersonalityTrait, Profile, ProfileDelta, TraitChange,
};
pub use quest::{
    Objective, ObjectiveKind, Quest, QuestKind, QuestLog, QuestRewards, QuestState, RewardBundle,
};
pub use settings::{GameSettings, Stage, TOTAL_STAGES, stage, stage_for_turn};
pub use state::{
    GameState, Inventory, Item, ItemCategory, PlayerStats, SceneInfo, TurnSummary, World,
};
pub use turn::{
    ActionEvent, ActionKind, HandlerOutput, PlayerChoice, StateMutation, TurnContext,
    TurnResults, UsageMetrics,
};
