//! Compact digest of the game state sent with generation requests.

use saga_core::GameState;
use serde_json::{Value, json};

/// A JSON digest of the state with the last `history_limit` turns.
///
/// The personality profile stays hidden until it has been revealed.
pub fn game_digest(state: &GameState, history_limit: usize) -> Value {
    let recent = &state.history[state.history.len().saturating_sub(history_limit)..];

    let profile = if state.profile.revealed() {
        json!({ "traits": state.profile.traits() })
    } else {
        json!({ "hidden": true })
    };

    let group: Vec<&str> = state
        .npcs
        .iter()
        .filter(|n| n.in_group && n.alive)
        .map(|n| n.name.as_str())
        .collect();

    json!({
        "world": state.world.name,
        "turn": state.turn,
        "stage": state.stage,
        "location": state.world.current_location,
        "playerProfile": profile,
        "group": group,
        "activeQuests": state
            .quests
            .active()
            .iter()
            .map(|q| json!({ "name": q.name, "progress": q.progress }))
            .collect::<Vec<_>>(),
        "recentHistory": recent
            .iter()
            .map(|h| json!({
                "turn": h.turn,
                "choice": h.choice_type,
                "consequence": h.consequence,
            }))
            .collect::<Vec<_>>(),
        "npcsPresent": state
            .npcs_in_scene()
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>(),
        "stats": {
            "health": state.player_stats.health,
            "maxHealth": state.player_stats.max_health,
            "gold": state.player_stats.gold,
            "reputation": state.player_stats.reputation,
        },
    })
}
