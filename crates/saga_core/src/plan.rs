//! Execution plans: which handlers run this turn and in what order.

use saga_error::{PlanError, PlanErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Name of the external player-choice input a handler may depend on.
pub const PLAYER_CHOICE: &str = "PLAYER_CHOICE";

/// The known handler set.
///
/// Names parse case-insensitively; anything else is rejected before a plan
/// reaches the executor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AgentId {
    WorldBuilder,
    NpcPersonality,
    Dialogue,
    QuestManager,
    Combat,
    Betrayal,
    Consequence,
    Inventory,
    ProfileTracker,
    Continuity,
    SceneComposer,
}

impl AgentId {
    /// Parse a handler name, failing with an unknown-agent plan error.
    ///
    /// # Examples
    ///
    /// ```
    /// use saga_core::AgentId;
    ///
    /// assert_eq!(AgentId::parse("world_builder").unwrap(), AgentId::WorldBuilder);
    /// assert!(AgentId::parse("BARD").is_err());
    /// ```
    #[track_caller]
    pub fn parse(name: &str) -> Result<Self, PlanError> {
        AgentId::from_str(name.trim())
            .map_err(|_| PlanError::new(PlanErrorKind::UnknownAgent(name.to_string())))
    }
}

/// Something a planned handler waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dependency {
    /// Output of another handler
    Agent(AgentId),
    /// The player's choice for this turn
    PlayerChoice,
}

impl TryFrom<String> for Dependency {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case(PLAYER_CHOICE) {
            Ok(Dependency::PlayerChoice)
        } else {
            AgentId::parse(&value).map(Dependency::Agent)
        }
    }
}

impl From<Dependency> for String {
    fn from(value: Dependency) -> Self {
        match value {
            Dependency::Agent(agent) => agent.to_string(),
            Dependency::PlayerChoice => PLAYER_CHOICE.to_string(),
        }
    }
}

impl From<AgentId> for Dependency {
    fn from(value: AgentId) -> Self {
        Dependency::Agent(value)
    }
}

/// One handler selected for this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAgent {
    /// Which handler
    pub agent: AgentId,
    /// Lower runs earlier
    pub priority: u32,
    /// Why it was selected
    pub reason: String,
    /// What it waits for
    pub dependencies: Vec<Dependency>,
}

impl PlannedAgent {
    /// A planned handler with no dependencies.
    pub fn new(agent: AgentId, priority: u32, reason: impl Into<String>) -> Self {
        Self {
            agent,
            priority,
            reason: reason.into(),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency.
    pub fn depends_on(mut self, dependency: impl Into<Dependency>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Whether the handler needs the player's choice.
    pub fn needs_player_choice(&self) -> bool {
        self.dependencies.contains(&Dependency::PlayerChoice)
    }
}

/// Kind of scene the planner expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SceneType {
    Combat,
    Dialogue,
    Exploration,
    Quest,
    Betrayal,
    #[serde(other)]
    Unknown,
}

/// A transient plan for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Selected handlers
    pub agents_to_call: Vec<PlannedAgent>,
    /// Order the executor walks
    pub execution_order: Vec<AgentId>,
    /// Expected scene kind
    pub scene_type: SceneType,
    /// Notes the planner considers urgent
    pub urgent_flags: Vec<String>,
}

impl ExecutionPlan {
    /// The planned entry for `agent`, if selected.
    pub fn planned(&self, agent: AgentId) -> Option<&PlannedAgent> {
        self.agents_to_call.iter().find(|p| p.agent == agent)
    }

    /// Number of handlers in the execution order.
    pub fn len(&self) -> usize {
        self.execution_order.len()
    }

    /// Whether the execution order is empty.
    pub fn is_empty(&self) -> bool {
        self.execution_order.is_empty()
    }
}
