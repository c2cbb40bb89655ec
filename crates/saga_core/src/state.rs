//! The persistent game state aggregate.

use crate::{GameSettings, Npc, Profile, QuestLog, stage_for_turn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{Display, EnumString};

/// Player health, wealth and standing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Current health, `0..=max_health`
    pub health: i32,
    /// Health ceiling
    pub max_health: i32,
    /// Gold, never negative
    pub gold: i64,
    /// Reputation, unbounded
    pub reputation: i64,
    /// Number of betrayals the player has suffered
    pub betrayals_suffered: u32,
}

/// Inventory item categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemCategory {
    Weapon,
    Armor,
    Consumable,
    Quest,
    Key,
    Crafting,
}

impl ItemCategory {
    /// Whether several of this item share one slot.
    pub fn stackable(&self) -> bool {
        matches!(self, ItemCategory::Consumable | ItemCategory::Crafting)
    }

    /// Largest stack allowed in one slot.
    pub fn max_stack(&self) -> u32 {
        match self {
            ItemCategory::Consumable => 10,
            ItemCategory::Crafting => 99,
            _ => 1,
        }
    }
}

/// One inventory slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Item {
    /// Stable identifier
    #[serde(default = "new_item_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    #[serde(default = "default_item_category")]
    pub category: ItemCategory,
    /// Stack size
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_item_category() -> ItemCategory {
    ItemCategory::Quest
}

fn default_quantity() -> u32 {
    1
}

impl Item {
    /// A single item of the given category.
    pub fn new(name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id: new_item_id(),
            name: name.into(),
            category,
            quantity: 1,
        }
    }
}

/// The player's items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Slots, in acquisition order
    pub items: Vec<Item>,
    /// Slot limit
    pub max_size: usize,
}

impl Inventory {
    /// An empty inventory with `max_size` slots.
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Vec::new(),
            max_size,
        }
    }

    /// Free slots.
    pub fn space_remaining(&self) -> usize {
        self.max_size.saturating_sub(self.items.len())
    }

    /// Whether every slot is taken.
    pub fn is_full(&self) -> bool {
        self.space_remaining() == 0
    }
}

/// The world the player moves through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// World name
    pub name: String,
    /// Current scene description
    pub description: String,
    /// Current mood
    pub atmosphere: String,
    /// Where the player is
    pub current_location: String,
    /// Free-form world flags, shallow-merged
    pub world_state: BTreeMap<String, serde_json::Value>,
}

/// One completed turn, as remembered by the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// Turn number
    pub turn: u32,
    /// Personality mapping of the choice
    pub choice_type: String,
    /// What the player chose
    pub choice_text: String,
    /// What happened
    pub consequence: String,
    /// Consequence level label
    pub importance: String,
}

/// What the player currently sees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneInfo {
    /// Scene prose
    pub description: String,
    /// Ids of NPCs in the scene
    pub npcs_present: Vec<String>,
    /// Choices offered this turn
    pub choices: Vec<crate::PlayerChoice>,
}

/// Root aggregate of everything that persists between turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current turn, starting at 1
    pub turn: u32,
    /// Current stage, `1..=5`
    pub stage: u32,
    /// Turns in the game
    pub total_turns: u32,
    /// Turns per stage
    pub turns_per_stage: u32,
    /// Player statistics
    pub player_stats: PlayerStats,
    /// Player inventory
    pub inventory: Inventory,
    /// World description
    pub world: World,
    /// Flags set by consequences; only grows
    pub story_flags: BTreeSet<String>,
    /// Completed turns, oldest first
    pub history: Vec<TurnSummary>,
    /// Every NPC ever met
    pub npcs: Vec<Npc>,
    /// Quest log
    pub quests: QuestLog,
    /// Hidden personality profile
    pub profile: Profile,
    /// Scene shown this turn
    pub current_scene: SceneInfo,
}

impl GameState {
    /// A fresh game at turn 1.
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            turn: 1,
            stage: 1,
            total_turns: settings.total_turns,
            turns_per_stage: settings.turns_per_stage,
            player_stats: PlayerStats {
                health: settings.max_health,
                max_health: settings.max_health,
                gold: settings.starting_gold,
                reputation: 0,
                betrayals_suffered: 0,
            },
            inventory: Inventory::new(settings.max_inventory_size),
            world: World {
                name: settings.world_name.clone(),
                description: String::new(),
                atmosphere: String::new(),
                current_location: settings.starting_location.clone(),
                world_state: BTreeMap::new(),
            },
            story_flags: BTreeSet::new(),
            history: Vec::new(),
            npcs: Vec::new(),
            quests: QuestLog::default(),
            profile: Profile::new(),
            current_scene: SceneInfo::default(),
        }
    }

    /// Move to the next turn and recompute the stage.
    pub fn advance_turn(&mut self) {
        self.turn += 1;
        self.stage = stage_for_turn(self.turn, self.turns_per_stage);
    }

    /// Whether this turn opens a new stage.
    pub fn is_stage_start(&self) -> bool {
        self.turns_per_stage > 0 && self.turn.saturating_sub(1) % self.turns_per_stage == 0
    }

    /// Look up an NPC by id.
    pub fn npc(&self, id: &str) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id == id)
    }

    /// Look up an NPC by id, mutably.
    pub fn npc_mut(&mut self, id: &str) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.id == id)
    }

    /// NPCs named in the current scene, in scene order.
    pub fn npcs_in_scene(&self) -> Vec<&Npc> {
        self.current_scene
            .npcs_present
            .iter()
            .filter_map(|id| self.npc(id))
            .collect()
    }
}
