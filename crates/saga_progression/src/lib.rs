//! State progression engine for the Saga narrative engine.
//!
//! Local, deterministic rules that move the game forward: the personality
//! profile, NPC memory and relationships, quest objectives, and the
//! consequence applicator that folds outcome documents into [`GameState`].
//! Randomized rules take the caller's RNG so runs can be reproduced.
//!
//! [`GameState`]: saga_core::GameState

mod consequence;
mod npc;
mod profile;
mod quest;

pub use consequence::{ApplyReport, apply, apply_document, apply_rewards};
pub use npc::{
    Attitude, RelationshipLevel, adjust_relationship, estimate_attitude, estimate_betrayal_risk,
    fallback_npc, npc_from_archetype, record_interaction, relationship_delta,
    should_appear_in_scene, should_betray,
};
pub use profile::{
    Archetype, Compatibility, PROFILE_REVEAL_TURN, ProfileEvolution, TraitShift, TraitSummary,
    TraitTrend, WANDERER, archetype, compatibility, dominant_traits, evolution,
    predict_choice_preferences, reveal, reveal_text, summary, update_profile,
};
pub use quest::{
    SIDE_QUEST_TURNS, action_satisfies, activate, apply_rewards as quest_rewards,
    check_progress, fail, fallback_quests, infer_action_kind, newly_completed_rewards,
    update_all,
};
