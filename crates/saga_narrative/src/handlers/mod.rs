//! The standard turn handlers.
//!
//! Every handler asks the generation service for a document of a declared
//! type and falls back to local logic when the call fails for any reason.

mod betrayal;
mod combat;
mod consequence;
mod continuity;
mod dialogue;
mod inventory;
mod npc_personality;
mod profile_tracker;
mod quest_manager;
mod scene_composer;
mod world_builder;

pub use betrayal::{BetrayalHandler, BetrayalReport, BetrayalScene};
pub use combat::{CombatHandler, CombatReport};
pub use consequence::ConsequenceHandler;
pub use continuity::{ContinuityHandler, ContinuityReport};
pub use dialogue::{DialogueHandler, DialogueLine, DialogueReport};
pub use inventory::{InventoryHandler, InventoryReport};
pub use npc_personality::{AttitudeReading, NpcDraft, NpcPersonalityHandler, NpcSceneReport, NpcView};
pub use profile_tracker::{ProfileReport, ProfileTrackerHandler};
pub use quest_manager::{ObjectiveDraft, QuestDraft, QuestManagerHandler, QuestReport};
pub use scene_composer::{ComposedScene, SceneComposerHandler, fallback_choices};
pub use world_builder::{SceneDocument, WorldBuilderHandler, time_of_day};

use crate::registry::HandlerRegistry;
use crate::service::NarrativeService;
use saga_cache::CacheConfig;
use saga_core::{AgentId, GameSettings, GenerationRequestBuilder, TurnContext};
use saga_error::{GenerationError, GenerationErrorKind};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

/// Build the request and ask the service for a `T`.
///
/// Any failure is logged, counted as a fallback, and reported as `None`.
pub(crate) async fn generate<T: DeserializeOwned>(
    service: &NarrativeService,
    ctx: &mut TurnContext,
    agent: AgentId,
    request: GenerationRequestBuilder,
) -> Option<T> {
    let result = match request.build() {
        Ok(request) => service.complete::<T>(&mut ctx.metrics, &request).await,
        Err(e) => Err(GenerationError::new(GenerationErrorKind::InvalidRequest(e.to_string())).into()),
    };
    match result {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(%agent, error = %e, "Generation failed, using fallback");
            ctx.metrics.record_fallback();
            None
        }
    }
}

impl HandlerRegistry {
    /// A registry with every standard handler.
    pub fn standard(
        service: Arc<NarrativeService>,
        settings: &GameSettings,
        cache: CacheConfig,
    ) -> Self {
        HandlerRegistry::new()
            .with(Box::new(WorldBuilderHandler::new(service.clone(), cache)))
            .with(Box::new(NpcPersonalityHandler::new(service.clone(), settings.max_npcs)))
            .with(Box::new(DialogueHandler::new(service.clone())))
            .with(Box::new(QuestManagerHandler::new(
                service.clone(),
                settings.side_quests_per_stage,
            )))
            .with(Box::new(CombatHandler::new(service.clone())))
            .with(Box::new(BetrayalHandler::new(service.clone())))
            .with(Box::new(ConsequenceHandler::new(service.clone())))
            .with(Box::new(InventoryHandler))
            .with(Box::new(ProfileTrackerHandler))
            .with(Box::new(ContinuityHandler::new(service.clone())))
            .with(Box::new(SceneComposerHandler::new(service)))
    }
}
