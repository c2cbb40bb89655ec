//! Non-player character data.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};

/// Lower bound of the relationship scale.
pub const RELATIONSHIP_MIN: i32 = -100;
/// Upper bound of the relationship scale.
pub const RELATIONSHIP_MAX: i32 = 100;

/// One remembered interaction with the player. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Turn the interaction happened
    pub turn: u32,
    /// What the player did
    pub action: String,
    /// How the NPC felt about it, -1 to 1
    pub sentiment: f64,
    /// How much it mattered, 0 to 1
    pub importance: f64,
    /// Free-form category (help, threat, trade, ...)
    pub category: String,
    /// Narrative description
    pub description: String,
    /// Other NPC ids who saw it
    pub witnesses: Vec<String>,
}

/// An interaction to be remembered by an NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Turn the interaction happened
    pub turn: u32,
    /// What the player did
    pub action: String,
    /// -1 (hostile) to 1 (warm)
    pub sentiment: f64,
    /// 0 (trivial) to 1 (pivotal)
    pub importance: f64,
    /// Free-form category
    #[serde(default)]
    pub category: String,
    /// Narrative description
    #[serde(default)]
    pub description: String,
    /// Other NPC ids who saw it
    #[serde(default)]
    pub witnesses: Vec<String>,
}

/// NPC personality archetypes with their default traits and skills.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum NpcArchetype {
    Warrior,
    Rogue,
    Sage,
    Merchant,
    Rebel,
    Noble,
}

impl NpcArchetype {
    /// Default trait values for a freshly generated NPC of this archetype.
    pub fn default_traits(&self) -> BTreeMap<String, f64> {
        let pairs: &[(&str, f64)] = match self {
            NpcArchetype::Warrior => &[("aggression", 0.8), ("loyalty", 0.7), ("caution", 0.3)],
            NpcArchetype::Rogue => &[("creativity", 0.8), ("independence", 0.9), ("loyalty", 0.3)],
            NpcArchetype::Sage => &[("morality", 0.8), ("caution", 0.7), ("diplomacy", 0.6)],
            NpcArchetype::Merchant => &[("diplomacy", 0.8), ("caution", 0.6), ("morality", 0.4)],
            NpcArchetype::Rebel => &[("independence", 0.9), ("aggression", 0.6), ("loyalty", 0.4)],
            NpcArchetype::Noble => &[("leadership", 0.8), ("morality", 0.7), ("diplomacy", 0.7)],
        };
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    /// Skills an NPC of this archetype starts with.
    pub fn skills(&self) -> &'static [&'static str] {
        match self {
            NpcArchetype::Warrior => &["combat", "intimidation", "protection"],
            NpcArchetype::Rogue => &["stealth", "lockpicking", "deception"],
            NpcArchetype::Sage => &["knowledge", "healing", "persuasion"],
            NpcArchetype::Merchant => &["trading", "appraisal", "networking"],
            NpcArchetype::Rebel => &["guerrilla_tactics", "inspiration", "sabotage"],
            NpcArchetype::Noble => &["command", "etiquette", "resources"],
        }
    }
}

/// A non-player character.
///
/// Relationship and memory are owned by the NPC model in `saga_progression`;
/// NPCs are never removed, only marked dead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
pub struct Npc {
    /// Stable identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Archetype label
    pub archetype: String,
    /// Short character description
    pub description: String,
    /// Personality traits, 0 to 1
    pub traits: BTreeMap<String, f64>,
    /// Skills the NPC brings
    pub skills: Vec<String>,
    /// Attitude toward the player, -100 to 100
    pub relationship: i32,
    /// Dead NPCs stay in the roster
    pub alive: bool,
    /// Whether this NPC may ever betray the player
    pub can_betray: bool,
    /// Travelling with the player
    pub in_group: bool,
    /// Remembered interactions, oldest first
    pub memory: Vec<MemoryEntry>,
    /// Last known location
    pub location: String,
    /// Turn the player first met this NPC
    pub first_met: u32,
    /// Turn the player last saw this NPC
    pub last_seen: u32,
}

impl Default for Npc {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            archetype: NpcArchetype::Warrior.to_string(),
            description: String::new(),
            traits: BTreeMap::new(),
            skills: Vec::new(),
            relationship: 0,
            alive: true,
            can_betray: true,
            in_group: false,
            memory: Vec::new(),
            location: String::new(),
            first_met: 0,
            last_seen: 0,
        }
    }
}

impl Npc {
    /// Creates a builder for `Npc`.
    pub fn builder() -> NpcBuilder {
        NpcBuilder::default()
    }

    /// A trait value, if the NPC has it.
    pub fn trait_value(&self, name: &str) -> Option<f64> {
        self.traits.get(name).copied()
    }
}
