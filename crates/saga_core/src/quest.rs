//! Quest and objective data.

use crate::ActionKind;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle of a quest. Transitions only move forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuestState {
    Locked,
    Available,
    Active,
    Completed,
    Failed,
    Expired,
}

impl QuestState {
    /// Terminal states never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuestState::Completed | QuestState::Failed | QuestState::Expired
        )
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_transition_to(&self, next: QuestState) -> bool {
        use QuestState::*;
        matches!(
            (self, next),
            (Locked, Available)
                | (Available, Active)
                | (Active, Completed)
                | (Active, Failed)
                | (Active, Expired)
        )
    }
}

/// Main storyline or optional side quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Main,
    Side,
}

/// What an objective asks the player to do.
///
/// Each kind is satisfied by a matching [`ActionKind`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ObjectiveKind {
    Find,
    Talk,
    Defeat,
    Collect,
    Reach,
    /// Never completed by an action event
    Custom,
}

impl ObjectiveKind {
    /// Classify a free-text objective once, when the quest is created.
    ///
    /// This is a loose keyword heuristic and will misclassify some
    /// objectives; anything unrecognized becomes [`ObjectiveKind::Custom`].
    pub fn infer(description: &str) -> Self {
        let text = description.to_lowercase();
        let table: [(&[&str], ObjectiveKind); 5] = [
            (&["defeat", "kill", "slay", "fight"], ObjectiveKind::Defeat),
            (&["talk", "speak", "convince", "ask"], ObjectiveKind::Talk),
            (&["collect", "gather", "obtain", "retrieve"], ObjectiveKind::Collect),
            (&["reach", "travel", "arrive", "go to"], ObjectiveKind::Reach),
            (&["find", "explore", "discover", "search"], ObjectiveKind::Find),
        ];
        table
            .iter()
            .find(|(words, _)| words.iter().any(|w| text.contains(w)))
            .map(|(_, kind)| *kind)
            .unwrap_or(ObjectiveKind::Custom)
    }

    /// The action kind that can satisfy this objective.
    pub fn satisfied_by(&self) -> Option<ActionKind> {
        match self {
            ObjectiveKind::Find => Some(ActionKind::Discovery),
            ObjectiveKind::Talk => Some(ActionKind::Dialogue),
            ObjectiveKind::Defeat => Some(ActionKind::Combat),
            ObjectiveKind::Collect => Some(ActionKind::ItemAcquired),
            ObjectiveKind::Reach => Some(ActionKind::LocationReached),
            ObjectiveKind::Custom => None,
        }
    }
}

/// One step of a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    /// Player-facing description
    pub description: String,
    /// What satisfies it
    pub kind: ObjectiveKind,
    /// Optional target that the action must name
    pub target: Option<String>,
    /// Whether the objective is mandatory
    pub required: bool,
    /// Completed objectives stay completed
    pub completed: bool,
}

impl Objective {
    /// A required, incomplete objective whose kind is inferred from its text.
    pub fn new(description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            kind: ObjectiveKind::infer(&description),
            description,
            target: None,
            required: true,
            completed: false,
        }
    }

    /// A required, incomplete objective of an explicit kind.
    pub fn of_kind(description: impl Into<String>, kind: ObjectiveKind) -> Self {
        Self {
            description: description.into(),
            kind,
            target: None,
            required: true,
            completed: false,
        }
    }

    /// Restrict the objective to actions naming `target`.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Rewards promised by a quest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct QuestRewards {
    /// Gold granted
    #[serde(default)]
    pub gold: i64,
    /// Item names granted
    #[serde(default)]
    pub items: Vec<String>,
    /// Reputation granted
    #[serde(default)]
    pub reputation: i64,
    /// Experience granted
    #[serde(default)]
    pub experience: i64,
}

/// Side-effect-free reward bundle for a completed quest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBundle {
    /// Quest that produced the bundle
    pub quest_id: String,
    /// Gold to add
    pub gold: i64,
    /// Items to add
    pub items: Vec<String>,
    /// Reputation to add
    pub reputation: i64,
    /// Experience earned
    pub experience: i64,
}

/// A quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    /// Stable identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// What the player must do
    pub description: String,
    /// Main or side
    pub kind: QuestKind,
    /// Lifecycle state
    pub state: QuestState,
    /// Ordered objectives
    pub objectives: Vec<Objective>,
    /// Cached completion percentage, re-derivable from objectives
    pub progress: f64,
    /// Turn budget, if any
    pub turns_remaining: Option<u32>,
    /// Promised rewards
    pub rewards: QuestRewards,
    /// Stage the quest was created in
    pub stage: u32,
}

impl Quest {
    /// A new quest in the available state.
    pub fn new(
        name: impl Into<String>,
        kind: QuestKind,
        objectives: Vec<Objective>,
        stage: u32,
    ) -> Self {
        let mut quest = Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            kind,
            state: QuestState::Available,
            objectives,
            progress: 0.0,
            turns_remaining: None,
            rewards: QuestRewards::default(),
            stage,
        };
        quest.progress = quest.derived_progress();
        quest
    }

    /// Completion percentage computed from the objectives.
    pub fn derived_progress(&self) -> f64 {
        if self.objectives.is_empty() {
            return 0.0;
        }
        let completed = self.objectives.iter().filter(|o| o.completed).count();
        completed as f64 / self.objectives.len() as f64 * 100.0
    }

    /// Whether every objective is complete.
    pub fn all_objectives_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }

    /// Whether the quest is in the active state.
    pub fn is_active(&self) -> bool {
        self.state == QuestState::Active
    }
}

/// All quests known to the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestLog {
    /// The main storyline quest, if one exists
    pub main: Option<Quest>,
    /// Side quests that are not yet finished
    pub side: Vec<Quest>,
    /// Finished side quests; never purged
    pub completed: Vec<Quest>,
}

impl QuestLog {
    /// Active side quests.
    pub fn active_side(&self) -> impl Iterator<Item = &Quest> {
        self.side.iter().filter(|q| q.is_active())
    }

    /// Main quest (if active) followed by active side quests.
    pub fn active(&self) -> Vec<&Quest> {
        self.main
            .iter()
            .filter(|q| q.is_active())
            .chain(self.active_side())
            .collect()
    }
}
