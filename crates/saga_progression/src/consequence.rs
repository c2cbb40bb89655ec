//! Consequence applicator: the single path that folds outcomes into state.

use crate::npc::{adjust_relationship, record_interaction};
use saga_core::{ConsequenceOutcome, GameState, Item, ItemCategory, RewardBundle};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// What an application actually changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    /// Health after clamping minus health before
    pub health_change: i32,
    /// Gold after flooring minus gold before
    pub gold_change: i64,
    /// Reputation delta
    pub reputation_change: i64,
    /// Item names that entered the inventory
    pub items_added: Vec<String>,
    /// Item names dropped for lack of space
    pub items_dropped: Vec<String>,
    /// Item names removed from the inventory
    pub items_removed: Vec<String>,
    /// NPC ids referenced by the outcome but absent from the roster
    pub unknown_npcs: Vec<String>,
    /// Flags newly set
    pub flags_added: Vec<String>,
}

/// Fold an outcome into the game state.
///
/// Health is clamped to `[0, max_health]`, gold is floored at zero, and
/// relationships go through the NPC model. Unknown NPC ids are skipped with
/// a warning. Items beyond the inventory limit are dropped.
#[instrument(skip_all, fields(turn = state.turn, success = outcome.success))]
pub fn apply(state: &mut GameState, outcome: &ConsequenceOutcome) -> ApplyReport {
    let mut report = ApplyReport::default();
    let effects = &outcome.immediate_effects;

    let stats = &mut state.player_stats;
    let before = stats.health;
    stats.health = stats
        .health
        .saturating_add(effects.player_health)
        .clamp(0, stats.max_health);
    report.health_change = stats.health - before;

    for (npc_id, delta) in &effects.npc_relationship_changes {
        match state.npc_mut(npc_id) {
            Some(npc) => *npc = adjust_relationship(npc, *delta),
            None => {
                warn!(npc_id, "Relationship change for unknown NPC skipped");
                report.unknown_npcs.push(npc_id.clone());
            }
        }
    }

    for report_entry in &outcome.npc_interactions {
        match state.npc_mut(&report_entry.npc_id) {
            Some(npc) => *npc = record_interaction(npc, &report_entry.interaction),
            None => {
                warn!(npc_id = %report_entry.npc_id, "Interaction for unknown NPC skipped");
                report.unknown_npcs.push(report_entry.npc_id.clone());
            }
        }
    }

    for grant in &effects.items_gained {
        let item = grant.clone().into_item();
        let name = item.name.clone();
        if add_item(state, item) {
            report.items_added.push(name);
        } else {
            warn!(item = %name, "Inventory full, item dropped");
            report.items_dropped.push(name);
        }
    }

    for lost in &effects.items_lost {
        if let Some(name) = remove_item(state, lost) {
            report.items_removed.push(name);
        } else {
            debug!(item = %lost, "Lost item not in inventory");
        }
    }

    report.gold_change = change_gold(state, effects.gold_change);
    state.player_stats.reputation += effects.reputation_change;
    report.reputation_change = effects.reputation_change;

    for (key, value) in &outcome.world_state_changes {
        state.world.world_state.insert(key.clone(), value.clone());
    }

    for flag in &outcome.story_flags_set {
        if state.story_flags.insert(flag.clone()) {
            report.flags_added.push(flag.clone());
        }
    }

    info!(
        health = state.player_stats.health,
        gold = state.player_stats.gold,
        reputation = state.player_stats.reputation,
        "Consequence applied"
    );
    report
}

/// Apply a JSON outcome document. A malformed document is a logged no-op.
pub fn apply_document(state: &mut GameState, document: &serde_json::Value) -> Option<ApplyReport> {
    match serde_json::from_value::<ConsequenceOutcome>(document.clone()) {
        Ok(outcome) => Some(apply(state, &outcome)),
        Err(e) => {
            warn!(error = %e, "Malformed consequence document ignored");
            None
        }
    }
}

/// Fold a quest reward bundle into the game state.
#[instrument(skip_all, fields(quest_id = %bundle.quest_id))]
pub fn apply_rewards(state: &mut GameState, bundle: &RewardBundle) -> ApplyReport {
    let mut report = ApplyReport {
        gold_change: change_gold(state, bundle.gold),
        reputation_change: bundle.reputation,
        ..ApplyReport::default()
    };
    state.player_stats.reputation += bundle.reputation;

    for name in &bundle.items {
        if add_item(state, Item::new(name.clone(), ItemCategory::Quest)) {
            report.items_added.push(name.clone());
        } else {
            warn!(item = %name, "Inventory full, reward item dropped");
            report.items_dropped.push(name.clone());
        }
    }
    info!(gold = bundle.gold, reputation = bundle.reputation, "Quest rewards applied");
    report
}

fn change_gold(state: &mut GameState, delta: i64) -> i64 {
    let before = state.player_stats.gold;
    state.player_stats.gold = before.saturating_add(delta).max(0);
    state.player_stats.gold - before
}

/// Add an item, stacking stackable items by name. Returns false when no
/// slot is free.
fn add_item(state: &mut GameState, item: Item) -> bool {
    let inventory = &mut state.inventory;
    if item.category.stackable() {
        let max_stack = item.category.max_stack();
        if let Some(slot) = inventory.items.iter_mut().find(|slot| {
            slot.category == item.category
                && slot.name.eq_ignore_ascii_case(&item.name)
                && slot.quantity + item.quantity <= max_stack
        }) {
            slot.quantity += item.quantity;
            return true;
        }
    }
    if inventory.is_full() {
        return false;
    }
    inventory.items.push(item);
    true
}

/// Remove one item by id or, failing that, by name. Returns the removed name.
fn remove_item(state: &mut GameState, id_or_name: &str) -> Option<String> {
    let items = &mut state.inventory.items;
    let index = items
        .iter()
        .position(|i| i.id == id_or_name)
        .or_else(|| {
            items
                .iter()
                .position(|i| i.name.eq_ignore_ascii_case(id_or_name))
        })?;
    if items[index].quantity > 1 {
        items[index].quantity -= 1;
        return Some(items[index].name.clone());
    }
    Some(items.remove(index).name)
}
