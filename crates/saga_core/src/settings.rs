//! Game-wide constants and the stage table.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Number of narrative stages in a game.
pub const TOTAL_STAGES: u32 = 5;

/// Tunable game limits.
///
/// Every field has a default so partial TOML tables deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Name of the world the story takes place in
    pub world_name: String,
    /// Turns in a full game
    pub total_turns: u32,
    /// Turns spent in each stage
    pub turns_per_stage: u32,
    /// Side quests offered at the start of each stage
    pub side_quests_per_stage: usize,
    /// Maximum NPCs tracked at once
    pub max_npcs: usize,
    /// Inventory slots
    pub max_inventory_size: usize,
    /// Maximum companions travelling with the player
    pub max_group_size: usize,
    /// Starting and maximum player health
    pub max_health: i32,
    /// Gold the player starts with
    pub starting_gold: i64,
    /// Turn at which the personality profile is revealed
    pub profile_reveal_turn: u32,
    /// Location the player starts in
    pub starting_location: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            world_name: "The Shattered Realm".to_string(),
            total_turns: 50,
            turns_per_stage: 10,
            side_quests_per_stage: 3,
            max_npcs: 15,
            max_inventory_size: 20,
            max_group_size: 8,
            max_health: 100,
            starting_gold: 50,
            profile_reveal_turn: 25,
            starting_location: "The Crossroads".to_string(),
        }
    }
}

/// One coarse phase of the narrative.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Stage {
    id: u32,
    name: &'static str,
    description: &'static str,
    quest_types: &'static [&'static str],
    difficulty_multiplier: f64,
}

const STAGES: [Stage; TOTAL_STAGES as usize] = [
    Stage {
        id: 1,
        name: "The Beginning",
        description: "Establish the world and meet initial characters",
        quest_types: &["recruitment", "exploration", "introduction"],
        difficulty_multiplier: 1.0,
    },
    Stage {
        id: 2,
        name: "Rising Conflict",
        description: "Build alliances or go solo, first betrayals possible",
        quest_types: &["alliance", "resource_gathering", "trust_building"],
        difficulty_multiplier: 1.3,
    },
    Stage {
        id: 3,
        name: "The Turning Point",
        description: "Major plot developments, consequences of past decisions",
        quest_types: &["confrontation", "revelation", "preparation"],
        difficulty_multiplier: 1.6,
    },
    Stage {
        id: 4,
        name: "Escalation",
        description: "Everything converges, alliances tested",
        quest_types: &["betrayal_possible", "final_preparation", "critical_choice"],
        difficulty_multiplier: 2.0,
    },
    Stage {
        id: 5,
        name: "Endgame",
        description: "Final confrontation and resolution",
        quest_types: &["finale", "resolution", "consequence"],
        difficulty_multiplier: 2.5,
    },
];

/// Look up a stage by id, clamping out-of-range ids to the nearest stage.
pub fn stage(id: u32) -> &'static Stage {
    let index = id.clamp(1, TOTAL_STAGES) as usize - 1;
    &STAGES[index]
}

/// Stage for a turn: `ceil(turn / turns_per_stage)`, clamped to `1..=5`.
///
/// # Examples
///
/// ```
/// use saga_core::stage_for_turn;
///
/// assert_eq!(stage_for_turn(1, 10), 1);
/// assert_eq!(stage_for_turn(10, 10), 1);
/// assert_eq!(stage_for_turn(11, 10), 2);
/// assert_eq!(stage_for_turn(99, 10), 5);
/// ```
pub fn stage_for_turn(turn: u32, turns_per_stage: u32) -> u32 {
    let per_stage = turns_per_stage.max(1);
    turn.div_ceil(per_stage).clamp(1, TOTAL_STAGES)
}
