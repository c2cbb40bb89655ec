//! Personality profile model.
//!
//! Everything here is local and deterministic: choices nudge traits by fixed
//! amounts, and the archetype is a lookup on the two strongest traits.

use chrono::Utc;
use saga_core::{
    ChoiceType, NEUTRAL_TRAIT_VALUE, PersonalityTrait, Profile, ProfileDelta, TraitChange,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};

/// Turn at which the profile is revealed by default.
pub const PROFILE_REVEAL_TURN: u32 = 25;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Apply the trait deltas of a choice type to a profile.
///
/// Each affected trait becomes `clamp01(old + delta)` and one history record
/// is appended. An unknown choice type logs a warning and returns the profile
/// unchanged.
///
/// # Examples
///
/// ```
/// use saga_core::{PersonalityTrait, Profile};
/// use saga_progression::update_profile;
///
/// let profile = update_profile(&Profile::new(), "AGGRESSIVE");
/// assert!((profile.trait_value(PersonalityTrait::Aggression) - 0.65).abs() < 1e-9);
/// assert_eq!(profile.history().len(), 1);
/// ```
#[instrument(skip(profile))]
pub fn update_profile(profile: &Profile, choice_type: &str) -> Profile {
    let Ok(choice) = ChoiceType::from_str(choice_type.trim()) else {
        warn!(choice_type, "Unknown choice type, profile unchanged");
        return profile.clone();
    };

    let mut updated = profile.clone();
    let mut changes = BTreeMap::new();
    for &(personality_trait, delta) in choice.deltas() {
        let before = updated.trait_value(personality_trait);
        let after = clamp01(before + delta);
        updated.set_trait(personality_trait, after);
        changes.insert(
            personality_trait,
            TraitChange {
                before,
                after,
                delta,
            },
        );
    }

    debug!(choice = %choice, traits = changes.len(), "Profile updated");
    updated.push_history(ProfileDelta {
        timestamp: Utc::now(),
        choice_type: choice,
        changes,
    });
    updated
}

/// Reveal the profile once `turn` reaches `threshold`.
///
/// Returns `true` only on the call that flips the flag. A revealed profile
/// stays revealed.
pub fn reveal(profile: &mut Profile, turn: u32, threshold: u32) -> bool {
    if profile.revealed() || turn < threshold {
        return false;
    }
    profile.mark_revealed();
    info!(turn, "Personality profile revealed");
    true
}

/// One ranked trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitSummary {
    /// Which trait
    pub personality_trait: PersonalityTrait,
    /// Value, 0 to 1
    pub value: f64,
    /// Rounded percentage
    pub percentage: u32,
}

/// All traits ranked highest first. Ties keep declaration order.
pub fn summary(profile: &Profile) -> Vec<TraitSummary> {
    let mut ranked: Vec<TraitSummary> = PersonalityTrait::iter()
        .map(|t| {
            let value = profile.trait_value(t);
            TraitSummary {
                personality_trait: t,
                value,
                percentage: (value * 100.0).round() as u32,
            }
        })
        .collect();
    // sort_by is stable, so equal values keep declaration order
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked
}

/// The `count` strongest traits.
pub fn dominant_traits(profile: &Profile, count: usize) -> Vec<TraitSummary> {
    summary(profile).into_iter().take(count).collect()
}

/// A named personality archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Archetype {
    /// Display name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
}

/// Fallback when the two strongest traits form no known pair.
pub const WANDERER: Archetype = Archetype {
    name: "The Wanderer",
    description: "Undefined path, many possibilities",
};

const ARCHETYPES: [(PersonalityTrait, PersonalityTrait, Archetype); 8] = {
    use PersonalityTrait::*;
    [
        (
            Aggression,
            Leadership,
            Archetype {
                name: "The Warlord",
                description: "Commands through strength and intimidation",
            },
        ),
        (
            Aggression,
            Independence,
            Archetype {
                name: "The Lone Wolf",
                description: "Fights alone, trusts no one",
            },
        ),
        (
            Diplomacy,
            Leadership,
            Archetype {
                name: "The Diplomat",
                description: "Leads through charisma and negotiation",
            },
        ),
        (
            Diplomacy,
            Morality,
            Archetype {
                name: "The Peacemaker",
                description: "Seeks harmony and ethical solutions",
            },
        ),
        (
            Caution,
            Morality,
            Archetype {
                name: "The Guardian",
                description: "Protects others while avoiding unnecessary risks",
            },
        ),
        (
            Creativity,
            Independence,
            Archetype {
                name: "The Maverick",
                description: "Forges unique paths with unconventional methods",
            },
        ),
        (
            Leadership,
            Loyalty,
            Archetype {
                name: "The Commander",
                description: "Inspires devoted followers through example",
            },
        ),
        (
            Caution,
            Creativity,
            Archetype {
                name: "The Strategist",
                description: "Carefully plans innovative solutions",
            },
        ),
    ]
};

/// Archetype of the two strongest traits, looked up as an unordered pair.
pub fn archetype(profile: &Profile) -> Archetype {
    let top = dominant_traits(profile, 2);
    let [first, second] = [top[0].personality_trait, top[1].personality_trait];
    ARCHETYPES
        .iter()
        .find(|(a, b, _)| (*a == first && *b == second) || (*a == second && *b == first))
        .map(|(_, _, archetype)| *archetype)
        .unwrap_or(WANDERER)
}

/// How strongly a trait moved away from neutral over the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraitShift {
    /// Which trait
    pub personality_trait: PersonalityTrait,
    /// Current value minus the neutral start
    pub change: f64,
}

/// Average recent movement of one trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraitTrend {
    /// Which trait
    pub personality_trait: PersonalityTrait,
    /// Mean nominal delta over the recent window
    pub average_delta: f64,
}

/// Summary of how the profile evolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileEvolution {
    /// Number of recorded updates
    pub total_decisions: usize,
    /// Up to three largest shifts from neutral, largest first
    pub biggest_shifts: Vec<TraitShift>,
    /// Current archetype
    pub archetype: Archetype,
    /// Traits trending consistently over the last five updates
    pub recent_trends: Vec<TraitTrend>,
}

const TREND_WINDOW: usize = 5;
const TREND_THRESHOLD: f64 = 0.05;

/// Analyze the profile history. `None` when there is no history.
pub fn evolution(profile: &Profile) -> Option<ProfileEvolution> {
    let history = profile.history();
    if history.is_empty() {
        return None;
    }

    let mut biggest_shifts: Vec<TraitShift> = PersonalityTrait::iter()
        .map(|t| TraitShift {
            personality_trait: t,
            change: profile.trait_value(t) - NEUTRAL_TRAIT_VALUE,
        })
        .collect();
    biggest_shifts.sort_by(|a, b| b.change.abs().total_cmp(&a.change.abs()));
    biggest_shifts.truncate(3);

    let recent_trends = if history.len() < 2 {
        Vec::new()
    } else {
        let window = &history[history.len().saturating_sub(TREND_WINDOW)..];
        let mut deltas: BTreeMap<PersonalityTrait, Vec<f64>> = BTreeMap::new();
        for entry in window {
            for (t, change) in &entry.changes {
                deltas.entry(*t).or_default().push(change.delta);
            }
        }
        deltas
            .into_iter()
            .map(|(t, values)| TraitTrend {
                personality_trait: t,
                average_delta: values.iter().sum::<f64>() / values.len() as f64,
            })
            .filter(|trend| trend.average_delta.abs() > TREND_THRESHOLD)
            .collect()
    };

    Some(ProfileEvolution {
        total_decisions: history.len(),
        biggest_shifts,
        archetype: archetype(profile),
        recent_trends,
    })
}

/// Choice types the player is most likely to pick next, with likelihood in percent.
pub fn predict_choice_preferences(profile: &Profile) -> Vec<(ChoiceType, u32)> {
    dominant_traits(profile, 3)
        .into_iter()
        .map(|t| (ChoiceType::for_trait(t.personality_trait), t.percentage))
        .collect()
}

/// Player/NPC personality fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compatibility {
    /// 0 to 100
    pub score: u32,
    /// Traits within 0.2 of each other, with similarity
    pub similarities: Vec<(String, f64)>,
    /// Traits further apart, with distance
    pub differences: Vec<(String, f64)>,
    /// Verdict label
    pub verdict: &'static str,
}

/// Compare the player's profile with an NPC's trait map.
///
/// NPC traits the profile does not track (greed, courage) are compared
/// against the neutral value.
pub fn compatibility(profile: &Profile, npc_traits: &BTreeMap<String, f64>) -> Compatibility {
    let mut total = 0.0;
    let mut similarities = Vec::new();
    let mut differences = Vec::new();

    for (name, npc_value) in npc_traits {
        let player_value = PersonalityTrait::from_str(name)
            .map(|t| profile.trait_value(t))
            .unwrap_or(NEUTRAL_TRAIT_VALUE);
        let difference = (player_value - npc_value).abs();
        if difference < 0.2 {
            similarities.push((name.clone(), 1.0 - difference));
            total += 1.0 - difference;
        } else {
            differences.push((name.clone(), difference));
            total -= difference * 0.5;
        }
    }

    let normalized = if npc_traits.is_empty() {
        0.0
    } else {
        (total / npc_traits.len() as f64 * 100.0).clamp(0.0, 100.0)
    };

    Compatibility {
        score: normalized.round() as u32,
        similarities,
        differences,
        verdict: compatibility_verdict(normalized),
    }
}

fn compatibility_verdict(score: f64) -> &'static str {
    match score {
        s if s >= 80.0 => "Highly Compatible",
        s if s >= 60.0 => "Compatible",
        s if s >= 40.0 => "Neutral",
        s if s >= 20.0 => "Incompatible",
        _ => "Highly Incompatible",
    }
}

/// Text shown to the player when the profile is revealed.
pub fn reveal_text(profile: &Profile) -> String {
    let archetype = archetype(profile);
    let dominant = dominant_traits(profile, 3)
        .iter()
        .map(|t| format!("- {}: {}%", t.personality_trait.label(), t.percentage))
        .collect::<Vec<_>>()
        .join("\n");

    let mut text = format!(
        "You are \"{}\": {}\n\nYour dominant traits:\n{}\n",
        archetype.name, archetype.description, dominant
    );

    if let Some(evolution) = evolution(profile) {
        let shifts = evolution
            .biggest_shifts
            .iter()
            .filter(|s| s.change != 0.0)
            .map(|s| {
                let direction = if s.change > 0.0 { "increased" } else { "decreased" };
                format!("- {} has {} significantly", s.personality_trait.label(), direction)
            })
            .collect::<Vec<_>>();
        if !shifts.is_empty() {
            text.push_str("\nYour journey has shaped you:\n");
            text.push_str(&shifts.join("\n"));
            text.push('\n');
        }
    }

    text.push_str("\nThis combination of traits will determine your fate in the final chapters.");
    text
}
