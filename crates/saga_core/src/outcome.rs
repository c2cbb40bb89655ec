//! Consequence outcome documents folded into state by the consequence applicator.

use crate::{Interaction, Item, ItemCategory};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An item granted by a consequence: a bare name or a full item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ItemGrant {
    /// Bare item name, stored as a quest item
    Name(String),
    /// Fully described item
    Item(Item),
}

impl ItemGrant {
    /// Convert to an inventory item.
    pub fn into_item(self) -> Item {
        match self {
            ItemGrant::Name(name) => Item::new(name, ItemCategory::Quest),
            ItemGrant::Item(item) => item,
        }
    }
}

impl From<&str> for ItemGrant {
    fn from(value: &str) -> Self {
        ItemGrant::Name(value.to_string())
    }
}

/// Immediate stat effects of a consequence. Every field defaults to "no change".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ImmediateEffects {
    /// Health delta
    pub player_health: i32,
    /// Relationship delta per NPC id
    pub npc_relationship_changes: BTreeMap<String, i32>,
    /// Items added to the inventory
    pub items_gained: Vec<ItemGrant>,
    /// Item ids or names removed from the inventory
    pub items_lost: Vec<String>,
    /// Gold delta
    pub gold_change: i64,
    /// Reputation delta
    pub reputation_change: i64,
}

/// An interaction an NPC should remember.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InteractionReport {
    /// NPC id
    pub npc_id: String,
    /// What happened
    pub interaction: Interaction,
}

/// Outcome of resolving a player choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsequenceOutcome {
    /// What happened, in prose
    pub outcome: String,
    /// Whether the action succeeded
    pub success: bool,
    /// minor, moderate, major or critical
    pub consequence_level: String,
    /// Stat effects applied now
    pub immediate_effects: ImmediateEffects,
    /// Interactions NPCs remember
    pub npc_interactions: Vec<InteractionReport>,
    /// Effects that play out later
    pub long_term_effects: Vec<String>,
    /// NPC ids touched by the outcome
    pub npcs_affected: Vec<String>,
    /// World-state keys to merge
    pub world_state_changes: BTreeMap<String, serde_json::Value>,
    /// Whether a betrayal was triggered
    pub betrayal_triggered: bool,
    /// Whether someone died
    pub death_occurred: bool,
    /// Flags to add
    pub story_flags_set: Vec<String>,
}

impl ConsequenceOutcome {
    /// An outcome with prose and success only, and no effects.
    pub fn narrative(outcome: impl Into<String>, success: bool) -> Self {
        Self {
            outcome: outcome.into(),
            success,
            consequence_level: "minor".to_string(),
            ..Self::default()
        }
    }
}
