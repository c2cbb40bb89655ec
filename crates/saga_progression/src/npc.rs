//! NPC memory and relationship model.

use rand::Rng;
use rand::seq::SliceRandom;
use saga_core::{
    GameState, Interaction, MemoryEntry, Npc, NpcArchetype, RELATIONSHIP_MAX, RELATIONSHIP_MIN,
    TOTAL_STAGES,
};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoEnumIterator};
use tracing::{debug, instrument};

/// Relationship change produced by one interaction.
///
/// `round(sentiment * 20 * (0.5 + importance * 0.5))`, with inputs clamped to
/// their nominal ranges. Halves round away from zero.
pub fn relationship_delta(sentiment: f64, importance: f64) -> i32 {
    let sentiment = sentiment.clamp(-1.0, 1.0);
    let importance = importance.clamp(0.0, 1.0);
    (sentiment * 20.0 * (0.5 + importance * 0.5)).round() as i32
}

fn clamp_relationship(value: i32) -> i32 {
    value.clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX)
}

/// Remember an interaction and move the relationship accordingly.
#[instrument(skip(npc, interaction), fields(npc = %npc.name, turn = interaction.turn))]
pub fn record_interaction(npc: &Npc, interaction: &Interaction) -> Npc {
    let delta = relationship_delta(interaction.sentiment, interaction.importance);
    let mut updated = npc.clone();
    updated.memory.push(MemoryEntry {
        turn: interaction.turn,
        action: interaction.action.clone(),
        sentiment: interaction.sentiment,
        importance: interaction.importance,
        category: interaction.category.clone(),
        description: interaction.description.clone(),
        witnesses: interaction.witnesses.clone(),
    });
    updated.last_seen = interaction.turn;
    updated.relationship = clamp_relationship(npc.relationship + delta);
    debug!(delta, relationship = updated.relationship, "Interaction recorded");
    updated
}

/// Apply a direct relationship delta, clamped to the scale.
pub fn adjust_relationship(npc: &Npc, delta: i32) -> Npc {
    let mut updated = npc.clone();
    updated.relationship = clamp_relationship(npc.relationship.saturating_add(delta));
    updated
}

/// Likelihood, 0 to 1, that an NPC turns on the player.
///
/// # Examples
///
/// ```
/// use saga_core::Npc;
/// use saga_progression::estimate_betrayal_risk;
///
/// let mut npc = Npc::default();
/// npc.traits.insert("greed".into(), 0.8);
/// npc.traits.insert("loyalty".into(), 0.1);
/// npc.relationship = -60;
/// assert_eq!(estimate_betrayal_risk(&npc, 5), 1.0);
/// ```
pub fn estimate_betrayal_risk(npc: &Npc, stage: u32) -> f64 {
    let greed = npc.trait_value("greed").unwrap_or(0.0);
    let loyalty = npc.trait_value("loyalty").unwrap_or(0.5);
    let mut risk = greed + (1.0 - loyalty) * 0.5;

    risk += match npc.relationship {
        r if r < -50 => 0.3,
        r if r < 0 => 0.1,
        r if r > 50 => -0.2,
        _ => 0.0,
    };

    risk += stage as f64 / TOTAL_STAGES as f64 * 0.2;
    risk.clamp(0.0, 1.0)
}

const BETRAYAL_RISK_THRESHOLD: f64 = 0.7;
const BETRAYAL_CHANCE: f64 = 0.3;

/// Whether an NPC betrays the player this turn.
pub fn should_betray(npc: &Npc, stage: u32, rng: &mut impl Rng) -> bool {
    npc.can_betray
        && npc.alive
        && estimate_betrayal_risk(npc, stage) > BETRAYAL_RISK_THRESHOLD
        && rng.gen_bool(BETRAYAL_CHANCE)
}

/// Whether an NPC shows up in the current scene.
///
/// Dead NPCs never appear; companions and NPCs at the player's location
/// always do; anyone else appears with probability `0.3 + relationship/200`.
pub fn should_appear_in_scene(npc: &Npc, state: &GameState, rng: &mut impl Rng) -> bool {
    if !npc.alive {
        return false;
    }
    if npc.in_group || npc.location == state.world.current_location {
        return true;
    }
    let chance = (0.3 + npc.relationship as f64 / 200.0).clamp(0.0, 1.0);
    rng.gen_bool(chance)
}

/// Coarse relationship bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipLevel {
    Hostile,
    Unfriendly,
    Neutral,
    Friendly,
    Trusted,
}

impl RelationshipLevel {
    /// Band for a relationship value. Bands match [`estimate_attitude`].
    pub fn from_relationship(relationship: i32) -> Self {
        match relationship {
            r if r <= -60 => RelationshipLevel::Hostile,
            r if r <= -20 => RelationshipLevel::Unfriendly,
            r if r >= 60 => RelationshipLevel::Trusted,
            r if r >= 20 => RelationshipLevel::Friendly,
            _ => RelationshipLevel::Neutral,
        }
    }
}

/// An NPC's stance toward the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attitude {
    /// hostile, unfriendly, neutral, friendly or trusted
    pub attitude: String,
    /// 0 to 1
    pub trust_level: f64,
    /// Whether the NPC would help
    pub willing_to_help: bool,
    /// 0 to 1
    pub betrayal_risk: f64,
}

/// Attitude estimated from the relationship value alone.
pub fn estimate_attitude(relationship: i32) -> Attitude {
    let attitude = match relationship {
        r if r <= -60 => "hostile",
        r if r <= -20 => "unfriendly",
        r if r >= 60 => "trusted",
        r if r >= 20 => "friendly",
        _ => "neutral",
    };
    Attitude {
        attitude: attitude.to_string(),
        trust_level: (relationship as f64 + 100.0) / 200.0,
        willing_to_help: relationship > 0,
        betrayal_risk: ((50.0 - relationship as f64) / 100.0).clamp(0.0, 1.0),
    }
}

/// A placeholder NPC built from a random archetype.
pub fn fallback_npc(state: &GameState, rng: &mut impl Rng) -> Npc {
    let archetypes: Vec<NpcArchetype> = NpcArchetype::iter().collect();
    let archetype = archetypes
        .choose(rng)
        .copied()
        .unwrap_or(NpcArchetype::Warrior);
    npc_from_archetype(
        format!("Stranger {}", state.npcs.len() + 1),
        archetype,
        state,
    )
}

/// An NPC of `archetype` met at the player's location this turn.
pub fn npc_from_archetype(name: impl Into<String>, archetype: NpcArchetype, state: &GameState) -> Npc {
    let label = archetype.to_string();
    Npc {
        name: name.into(),
        description: format!("A mysterious {} you encounter.", label.to_lowercase()),
        archetype: label,
        traits: archetype.default_traits(),
        skills: archetype.skills().iter().map(|s| s.to_string()).collect(),
        location: state.world.current_location.clone(),
        first_met: state.turn,
        last_seen: state.turn,
        ..Npc::default()
    }
}
