//! Player personality profile data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Neutral starting value for every trait.
pub const NEUTRAL_TRAIT_VALUE: f64 = 0.5;

/// The eight tracked personality traits, in declaration order.
///
/// Declaration order breaks ties when ranking traits.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PersonalityTrait {
    /// Tendency to use force and confrontation
    Aggression,
    /// Risk aversion and careful planning
    Caution,
    /// Adherence to ethical principles
    Morality,
    /// Unconventional and innovative thinking
    Creativity,
    /// Ability to lead and inspire others
    Leadership,
    /// Commitment to allies and principles
    Loyalty,
    /// Preference for solo action
    Independence,
    /// Skill in negotiation and compromise
    Diplomacy,
}

impl PersonalityTrait {
    /// Human-readable trait name.
    pub fn label(&self) -> &'static str {
        match self {
            PersonalityTrait::Aggression => "Aggression",
            PersonalityTrait::Caution => "Caution",
            PersonalityTrait::Morality => "Morality",
            PersonalityTrait::Creativity => "Creativity",
            PersonalityTrait::Leadership => "Leadership",
            PersonalityTrait::Loyalty => "Loyalty",
            PersonalityTrait::Independence => "Independence",
            PersonalityTrait::Diplomacy => "Diplomacy",
        }
    }
}

/// Kinds of player choice, each carrying a fixed trait delta vector.
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
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ChoiceType {
    Aggressive,
    Cautious,
    Diplomatic,
    Creative,
    Leadership,
    Loyal,
    Independent,
    Moral,
}

impl ChoiceType {
    /// Trait adjustments applied when the player makes this kind of choice.
    pub fn deltas(&self) -> &'static [(PersonalityTrait, f64)] {
        use PersonalityTrait::*;
        match self {
            ChoiceType::Aggressive => &[(Aggression, 0.15), (Caution, -0.10), (Diplomacy, -0.08)],
            ChoiceType::Cautious => &[(Caution, 0.15), (Aggression, -0.10), (Creativity, -0.05)],
            ChoiceType::Diplomatic => &[(Diplomacy, 0.15), (Morality, 0.08), (Aggression, -0.10)],
            ChoiceType::Creative => &[(Creativity, 0.15), (Independence, 0.08), (Caution, -0.05)],
            ChoiceType::Leadership => &[(Leadership, 0.15), (Independence, -0.08), (Diplomacy, 0.05)],
            ChoiceType::Loyal => &[(Loyalty, 0.15), (Independence, -0.10), (Leadership, 0.05)],
            ChoiceType::Independent => &[(Independence, 0.15), (Loyalty, -0.10), (Leadership, -0.05)],
            ChoiceType::Moral => &[(Morality, 0.15), (Aggression, -0.08), (Loyalty, 0.05)],
        }
    }

    /// The choice type that best expresses a trait.
    pub fn for_trait(personality_trait: PersonalityTrait) -> Self {
        match personality_trait {
            PersonalityTrait::Aggression => ChoiceType::Aggressive,
            PersonalityTrait::Caution => ChoiceType::Cautious,
            PersonalityTrait::Morality => ChoiceType::Moral,
            PersonalityTrait::Creativity => ChoiceType::Creative,
            PersonalityTrait::Leadership => ChoiceType::Leadership,
            PersonalityTrait::Loyalty => ChoiceType::Loyal,
            PersonalityTrait::Independence => ChoiceType::Independent,
            PersonalityTrait::Diplomacy => ChoiceType::Diplomatic,
        }
    }
}

/// Before/after values of one trait in one profile update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitChange {
    /// Value before the update
    pub before: f64,
    /// Value after clamping
    pub after: f64,
    /// Nominal delta from the choice table
    pub delta: f64,
}

/// One immutable entry in the profile history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDelta {
    /// When the update happened
    pub timestamp: DateTime<Utc>,
    /// Choice type that caused it
    pub choice_type: ChoiceType,
    /// Per-trait changes
    pub changes: BTreeMap<PersonalityTrait, TraitChange>,
}

/// The player's accumulated personality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    traits: BTreeMap<PersonalityTrait, f64>,
    revealed: bool,
    history: Vec<ProfileDelta>,
}

impl Profile {
    /// A hidden profile with every trait at the neutral value.
    pub fn new() -> Self {
        Self::with_traits(
            PersonalityTrait::iter().map(|t| (t, NEUTRAL_TRAIT_VALUE)),
        )
    }

    /// A hidden profile with the given trait values, clamped to `[0, 1]`.
    ///
    /// Traits not listed are absent and read as the neutral value.
    pub fn with_traits(traits: impl IntoIterator<Item = (PersonalityTrait, f64)>) -> Self {
        Self {
            traits: traits
                .into_iter()
                .map(|(t, v)| (t, v.clamp(0.0, 1.0)))
                .collect(),
            revealed: false,
            history: Vec::new(),
        }
    }

    /// Current value of a trait, neutral when unset.
    pub fn trait_value(&self, personality_trait: PersonalityTrait) -> f64 {
        self.traits
            .get(&personality_trait)
            .copied()
            .unwrap_or(NEUTRAL_TRAIT_VALUE)
    }

    /// Explicitly stored trait values.
    pub fn traits(&self) -> &BTreeMap<PersonalityTrait, f64> {
        &self.traits
    }

    /// Whether the profile has been revealed to the player.
    pub fn revealed(&self) -> bool {
        self.revealed
    }

    /// Update history, oldest first.
    pub fn history(&self) -> &[ProfileDelta] {
        &self.history
    }

    /// Store a trait value. Callers clamp.
    pub fn set_trait(&mut self, personality_trait: PersonalityTrait, value: f64) {
        self.traits.insert(personality_trait, value);
    }

    /// Append a history record.
    pub fn push_history(&mut self, delta: ProfileDelta) {
        self.history.push(delta);
    }

    /// Mark the profile revealed. There is no inverse.
    pub fn mark_revealed(&mut self) {
        self.revealed = true;
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
