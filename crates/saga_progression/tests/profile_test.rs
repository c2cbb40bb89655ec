//! Tests for the personality profile model.

use saga_core::{PersonalityTrait, Profile};
use saga_progression::{
    PROFILE_REVEAL_TURN, archetype, compatibility, dominant_traits, evolution, reveal,
    reveal_text, update_profile,
};
use std::collections::BTreeMap;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_aggressive_choice_updates_traits_and_history() {
    let profile = Profile::with_traits([
        (PersonalityTrait::Aggression, 0.5),
        (PersonalityTrait::Caution, 0.5),
    ]);

    let updated = update_profile(&profile, "AGGRESSIVE");

    assert!(approx(updated.trait_value(PersonalityTrait::Aggression), 0.65));
    assert!(approx(updated.trait_value(PersonalityTrait::Caution), 0.40));
    assert_eq!(updated.history().len(), profile.history().len() + 1);

    let record = &updated.history()[0];
    let change = record.changes[&PersonalityTrait::Aggression];
    assert!(approx(change.before, 0.5));
    assert!(approx(change.after, 0.65));
    assert!(approx(change.delta, 0.15));
}

#[test]
fn test_choice_type_is_case_insensitive() {
    let updated = update_profile(&Profile::new(), "diplomatic");
    assert!(approx(updated.trait_value(PersonalityTrait::Diplomacy), 0.65));
}

#[test]
fn test_unknown_choice_type_is_noop() {
    let profile = Profile::new();
    let updated = update_profile(&profile, "RECKLESS");
    assert_eq!(updated, profile);
}

#[test]
fn test_traits_stay_in_bounds() {
    let mut profile = Profile::new();
    for _ in 0..20 {
        profile = update_profile(&profile, "AGGRESSIVE");
    }
    assert!(approx(profile.trait_value(PersonalityTrait::Aggression), 1.0));
    assert!(approx(profile.trait_value(PersonalityTrait::Caution), 0.0));
    for value in profile.traits().values() {
        assert!((0.0..=1.0).contains(value));
    }
}

#[test]
fn test_reveal_flips_once_at_threshold() {
    let mut profile = Profile::new();

    assert!(!reveal(&mut profile, 24, PROFILE_REVEAL_TURN));
    assert!(!profile.revealed());

    assert!(reveal(&mut profile, 25, PROFILE_REVEAL_TURN));
    assert!(profile.revealed());

    assert!(!reveal(&mut profile, 26, PROFILE_REVEAL_TURN));
    assert!(!reveal(&mut profile, 1, PROFILE_REVEAL_TURN));
    assert!(profile.revealed());
}

#[test]
fn test_archetype_is_unordered_pair_lookup() {
    let warlord = Profile::with_traits([
        (PersonalityTrait::Leadership, 0.9),
        (PersonalityTrait::Aggression, 0.8),
    ]);
    assert_eq!(archetype(&warlord).name, "The Warlord");

    let reversed = Profile::with_traits([
        (PersonalityTrait::Aggression, 0.9),
        (PersonalityTrait::Leadership, 0.8),
    ]);
    assert_eq!(archetype(&reversed).name, "The Warlord");
}

#[test]
fn test_neutral_profile_is_wanderer() {
    // All ties: aggression and caution lead by declaration order, no pair
    assert_eq!(archetype(&Profile::new()).name, "The Wanderer");
}

#[test]
fn test_dominant_traits_ties_keep_declaration_order() {
    let profile = Profile::with_traits([
        (PersonalityTrait::Diplomacy, 0.9),
        (PersonalityTrait::Morality, 0.9),
    ]);
    let top = dominant_traits(&profile, 2);
    assert_eq!(top[0].personality_trait, PersonalityTrait::Morality);
    assert_eq!(top[1].personality_trait, PersonalityTrait::Diplomacy);
    assert_eq!(top[0].percentage, 90);
}

#[test]
fn test_compatibility_scores_similar_traits_high() {
    let profile = Profile::with_traits([
        (PersonalityTrait::Aggression, 0.8),
        (PersonalityTrait::Loyalty, 0.7),
    ]);
    let mut npc_traits = BTreeMap::new();
    npc_traits.insert("aggression".to_string(), 0.8);
    npc_traits.insert("loyalty".to_string(), 0.7);

    let result = compatibility(&profile, &npc_traits);
    assert_eq!(result.score, 100);
    assert_eq!(result.verdict, "Highly Compatible");
    assert_eq!(result.similarities.len(), 2);

    let mut opposite = BTreeMap::new();
    opposite.insert("aggression".to_string(), 0.0);
    let result = compatibility(&profile, &opposite);
    assert_eq!(result.score, 0);
    assert_eq!(result.verdict, "Highly Incompatible");
}

#[test]
fn test_evolution_and_reveal_text() {
    assert!(evolution(&Profile::new()).is_none());

    let mut profile = Profile::new();
    for _ in 0..3 {
        profile = update_profile(&profile, "MORAL");
    }
    let analysis = evolution(&profile).unwrap();
    assert_eq!(analysis.total_decisions, 3);
    assert_eq!(analysis.biggest_shifts[0].personality_trait, PersonalityTrait::Morality);
    assert!(
        analysis
            .recent_trends
            .iter()
            .any(|t| t.personality_trait == PersonalityTrait::Morality)
    );

    let text = reveal_text(&profile);
    assert!(text.contains("Morality"));
}
