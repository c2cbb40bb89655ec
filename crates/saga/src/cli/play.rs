//! Non-interactive play loop.

use super::PlayArgs;
use anyhow::{Result, bail};
use saga::handlers::fallback_choices;
use saga::progression::{archetype, reveal_text};
use saga::{GameSession, SagaConfig};
use tracing::{info, warn};

/// Play a full game, printing each scene and outcome.
pub async fn run_play(args: &PlayArgs) -> Result<()> {
    let mut config = SagaConfig::load(args.config.as_deref())?;
    if let Some(turns) = args.turns {
        if turns == 0 {
            bail!("--turns must be at least 1");
        }
        config.game.total_turns = turns;
    }

    let mut session = config.new_session(args.seed, args.offline);
    info!(
        world = %config.game.world_name,
        turns = config.game.total_turns,
        seed = ?args.seed,
        "Starting game"
    );
    println!("Welcome to {}.", session.state().world.name);

    while !session.is_finished() {
        let presented = session.present_turn().await;
        print_scene(&session);

        let choice = match session.state().current_scene.choices.first() {
            Some(choice) => choice.clone(),
            None => {
                warn!("No choices offered, taking a stock choice");
                fallback_choices().remove(0)
            }
        };
        let was_revealed = session.state().profile.revealed();
        let resolved = session.resolve_choice(choice).await;

        for failure in presented.errors.iter().chain(resolved.errors.iter()) {
            warn!(agent = %failure.agent, error = %failure.error, "Handler failed");
        }
        if let Some(summary) = session.state().history.last() {
            println!("\n> {}\n{}", summary.choice_text, summary.consequence);
        }
        if !was_revealed && session.state().profile.revealed() {
            println!("\n{}", reveal_text(&session.state().profile));
        }
    }

    print_summary(&session)?;
    Ok(())
}

fn print_scene(session: &GameSession) {
    let state = session.state();
    println!(
        "\n=== Turn {}/{} · Stage {} · {} ===",
        state.turn, state.total_turns, state.stage, state.world.current_location
    );
    println!("{}", state.current_scene.description);
    for (i, choice) in state.current_scene.choices.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, choice.personality_mapping, choice.text);
    }
}

fn print_summary(session: &GameSession) -> Result<()> {
    let state = session.state();
    let stats = &state.player_stats;
    let metrics = session.metrics();

    println!("\n=== Journey's end ===");
    if stats.health <= 0 {
        println!("You fell on turn {}.", state.turn.saturating_sub(1));
    } else {
        println!("You survived {} turns.", state.history.len());
    }
    println!(
        "Health {}/{} · Gold {} · Reputation {} · Betrayals {}",
        stats.health, stats.max_health, stats.gold, stats.reputation, stats.betrayals_suffered
    );
    println!(
        "NPCs met {} · Quests completed {}",
        state.npcs.len(),
        state.quests.completed.len()
    );
    println!("Archetype: {}", archetype(&state.profile).name);
    println!(
        "Generation calls {} · failed {} · fallbacks {} · est. cost ${:.4}",
        metrics.call_count,
        metrics.failed_calls,
        metrics.fallbacks,
        metrics.estimated_cost()
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&session.orchestrator().stats())?
    );
    Ok(())
}
