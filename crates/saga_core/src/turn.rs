//! Per-turn inputs, handler outputs and the explicit turn context.

use crate::{AgentId, ConsequenceOutcome, Npc, Quest, QuestLog, RewardBundle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Structured kinds of player action, matched against objective kinds.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum ActionKind {
    Combat,
    Dialogue,
    ItemAcquired,
    LocationReached,
    Discovery,
    #[default]
    Other,
}

/// A structured description of what the player did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    /// What kind of action
    pub kind: ActionKind,
    /// Who or what it was aimed at
    pub target: Option<String>,
    /// Whether it succeeded
    pub success: bool,
    /// Free text
    pub description: String,
}

impl ActionEvent {
    /// A successful action with no target.
    pub fn new(kind: ActionKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            target: None,
            success: true,
            description: description.into(),
        }
    }

    /// Set the action target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set whether the action succeeded.
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// The action a player choice describes.
    pub fn from_choice(choice: &PlayerChoice, success: bool) -> Self {
        Self {
            kind: choice.action,
            target: choice.target.clone(),
            success,
            description: choice.text.clone(),
        }
    }
}

/// A choice offered to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerChoice {
    /// Choice text
    pub text: String,
    /// Choice type name, e.g. AGGRESSIVE
    pub personality_mapping: String,
    /// low, medium or high
    #[serde(default)]
    pub risk_level: String,
    /// Hint at what follows
    #[serde(default)]
    pub likely_outcome: String,
    /// Structured action kind
    #[serde(default)]
    pub action: ActionKind,
    /// Optional action target
    #[serde(default)]
    pub target: Option<String>,
}

/// Outputs gathered during one turn, keyed by handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResults {
    /// The player's choice, present while resolving a turn
    pub player_choice: Option<PlayerChoice>,
    /// Handler documents
    pub outputs: BTreeMap<AgentId, serde_json::Value>,
}

impl TurnResults {
    /// Results seeded with a player choice.
    pub fn with_choice(choice: PlayerChoice) -> Self {
        Self {
            player_choice: Some(choice),
            outputs: BTreeMap::new(),
        }
    }

    /// The document a handler produced.
    pub fn get(&self, agent: AgentId) -> Option<&serde_json::Value> {
        self.outputs.get(&agent)
    }

    /// The document a handler produced, deserialized. `None` if absent or mismatched.
    pub fn get_as<T: DeserializeOwned>(&self, agent: AgentId) -> Option<T> {
        self.get(agent)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Store a handler's document.
    pub fn insert(&mut self, agent: AgentId, document: serde_json::Value) {
        self.outputs.insert(agent, document);
    }

    /// Whether a handler produced a document.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.outputs.contains_key(&agent)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether no handler produced a document.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// A state change a handler requests. Committed only after the handler succeeds.
#[derive(Debug, Clone, PartialEq)]
pub enum StateMutation {
    /// Replace the scene's description, atmosphere and location
    SceneSet {
        /// Scene prose
        description: String,
        /// Mood
        atmosphere: String,
        /// New location, if it changed
        location: Option<String>,
    },
    /// Fold a consequence outcome through the applicator
    Consequence(ConsequenceOutcome),
    /// Add newly generated NPCs to the roster
    NpcsIntroduced(Vec<Npc>),
    /// Set which NPCs appear in the scene
    NpcsPresent(Vec<String>),
    /// Offer new side quests
    QuestsOffered(Vec<Quest>),
    /// Replace the quest log and grant rewards
    QuestLogUpdated {
        /// Updated log
        log: QuestLog,
        /// Rewards of quests completed this turn
        rewards: Vec<RewardBundle>,
    },
    /// Set the final scene text and choices
    ChoicesPresented {
        /// Final scene prose
        description: String,
        /// Choices for the player
        choices: Vec<PlayerChoice>,
    },
    /// Update the profile with a choice type name
    ProfileChoice(String),
    /// Record that an NPC betrayed the player
    BetrayalSuffered {
        /// The betrayer
        npc_id: String,
    },
}

/// What a handler returns: its document plus requested mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutput {
    /// Document stored under the handler's key
    pub document: serde_json::Value,
    /// Changes to commit
    pub mutations: Vec<StateMutation>,
}

impl HandlerOutput {
    /// A document with no mutations.
    pub fn from_document(document: serde_json::Value) -> Self {
        Self {
            document,
            mutations: Vec::new(),
        }
    }

    /// Serialize `document` and wrap it with no mutations.
    pub fn from_serializable<T: Serialize>(document: &T) -> Result<Self, saga_error::JsonError> {
        Ok(Self::from_document(serde_json::to_value(document)?))
    }

    /// Add a mutation.
    pub fn with_mutation(mut self, mutation: StateMutation) -> Self {
        self.mutations.push(mutation);
        self
    }
}

/// Running usage counters for the generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Successful calls
    pub call_count: u64,
    /// Calls that ended in an error
    pub failed_calls: u64,
    /// Handlers that fell back to local logic
    pub fallbacks: u64,
    /// Estimated input tokens
    pub input_tokens: u64,
    /// Estimated output tokens
    pub output_tokens: u64,
}

const INPUT_COST_PER_1K: f64 = 0.003;
const OUTPUT_COST_PER_1K: f64 = 0.015;

impl UsageMetrics {
    /// Record a successful call. Tokens are estimated at four characters each
    /// unless the provider reported them.
    pub fn record_call(
        &mut self,
        prompt_chars: usize,
        response_chars: usize,
        reported: Option<(u64, u64)>,
    ) {
        let (input, output) = reported
            .unwrap_or((prompt_chars.div_ceil(4) as u64, response_chars.div_ceil(4) as u64));
        self.call_count += 1;
        self.input_tokens += input;
        self.output_tokens += output;
    }

    /// Record a failed call.
    pub fn record_failure(&mut self) {
        self.failed_calls += 1;
    }

    /// Record a handler fallback.
    pub fn record_fallback(&mut self) {
        self.fallbacks += 1;
    }

    /// Estimated spend in dollars.
    pub fn estimated_cost(&self) -> f64 {
        (self.input_tokens as f64 * INPUT_COST_PER_1K
            + self.output_tokens as f64 * OUTPUT_COST_PER_1K)
            / 1000.0
    }

    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: &UsageMetrics) {
        self.call_count += other.call_count;
        self.failed_calls += other.failed_calls;
        self.fallbacks += other.fallbacks;
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Explicit per-session context threaded through handlers.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// Usage counters
    pub metrics: UsageMetrics,
    /// Source of randomness for fallbacks and probabilistic rules
    pub rng: StdRng,
}

impl TurnContext {
    /// A context seeded for reproducible runs, or from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            metrics: UsageMetrics::default(),
            rng,
        }
    }
}

impl Default for TurnContext {
    fn default() -> Self {
        Self::new(None)
    }
}
