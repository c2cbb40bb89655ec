//! WORLD_BUILDER: scene description, atmosphere and location.

use super::generate;
use crate::context::game_digest;
use crate::service::NarrativeService;
use async_trait::async_trait;
use saga_cache::{CacheConfig, FixedProbability, ReusePolicy, SceneCache, SceneKey};
use saga_core::{
    AgentId, ConsequenceOutcome, GameState, GenerationRequest, HandlerOutput, StateMutation,
    TurnContext, TurnResults, output_format, stage,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// A generated scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    /// Vivid 3-4 sentence description of the environment
    pub scene_description: String,
    /// Current mood (tense, peaceful, ominous, ...)
    pub atmosphere: String,
    /// Specific location name
    pub location_name: String,
    /// Notable features
    #[serde(default)]
    pub notable_features: Vec<String>,
    /// Potential dangers
    #[serde(default)]
    pub threats_present: Vec<String>,
    /// Potential opportunities
    #[serde(default)]
    pub opportunities_present: Vec<String>,
    /// What can be heard
    #[serde(default)]
    pub soundscape: String,
    /// Whether the scene calls for new characters
    #[serde(default)]
    pub npcs_needed: bool,
    /// World-state keys to merge
    #[serde(default)]
    pub world_state_updates: BTreeMap<String, serde_json::Value>,
}

/// Time of day cycling every four turns.
pub fn time_of_day(turn: u32) -> &'static str {
    match turn % 4 {
        0 => "dawn",
        1 => "midday",
        2 => "dusk",
        _ => "night",
    }
}

/// Generates the scene, reusing cached scenes for the same place.
#[derive(Debug)]
pub struct WorldBuilderHandler {
    service: Arc<NarrativeService>,
    cache: Mutex<SceneCache<SceneDocument>>,
    reuse: Box<dyn ReusePolicy>,
}

impl WorldBuilderHandler {
    /// A handler reusing cached scenes 30% of the time.
    pub fn new(service: Arc<NarrativeService>, cache: CacheConfig) -> Self {
        Self {
            service,
            cache: Mutex::new(SceneCache::new(cache)),
            reuse: Box::new(FixedProbability::default()),
        }
    }

    /// Replace the reuse policy.
    pub fn with_reuse_policy(mut self, reuse: Box<dyn ReusePolicy>) -> Self {
        self.reuse = reuse;
        self
    }

    fn fallback(state: &GameState) -> SceneDocument {
        let stage = stage(state.stage);
        SceneDocument {
            scene_description: format!(
                "The journey continues through {}. {}",
                state.world.name,
                stage.description()
            ),
            atmosphere: "neutral".to_string(),
            location_name: state.world.current_location.clone(),
            notable_features: vec!["The path ahead".to_string(), "Your surroundings".to_string()],
            threats_present: Vec::new(),
            opportunities_present: Vec::new(),
            soundscape: "ambient sounds".to_string(),
            npcs_needed: false,
            world_state_updates: BTreeMap::new(),
        }
    }

    async fn generate_scene(&self, state: &GameState, ctx: &mut TurnContext) -> Option<SceneDocument> {
        let stage = stage(state.stage);
        let system = format!(
            "You are the World Builder in a dynamic RPG.\n\n\
             World: {}\nCurrent stage: {} - {}\nTurn: {}/{}\n\n\
             Be vivid and sensory, stay consistent with earlier descriptions, \
             reflect the stage's tone, and set up choices. 3-4 sentences.",
            state.world.name,
            stage.name(),
            stage.description(),
            state.turn,
            state.total_turns
        );
        let request = GenerationRequest::builder()
            .system_context(system)
            .task("Generate the scene description for this turn.")
            .data(serde_json::json!({
                "gameContext": game_digest(state, 3),
                "currentLocation": state.world.current_location,
                "lastEvent": state.history.last().map(|h| h.consequence.as_str()),
                "timeOfDay": time_of_day(state.turn),
            }))
            .output_format(output_format::<SceneDocument>())
            .max_tokens(1200u32);
        generate(&self.service, ctx, AgentId::WorldBuilder, request).await
    }
}

#[async_trait]
impl TurnHandler for WorldBuilderHandler {
    fn agent(&self) -> AgentId {
        AgentId::WorldBuilder
    }

    #[instrument(skip_all, fields(turn = state.turn, location = %state.world.current_location))]
    async fn execute(
        &self,
        state: &GameState,
        _results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let key = SceneKey::new(state.world.name.clone(), state.stage, &state.world.current_location);

        let cached = {
            let mut cache = self.cache.lock().await;
            cache.get(&key).map(|entry| entry.value().clone())
        };

        let scene = match cached {
            Some(scene) if self.reuse.should_reuse(&mut ctx.rng) => {
                debug!("Using cached scene");
                scene
            }
            _ => match self.generate_scene(state, ctx).await {
                Some(scene) => {
                    self.cache.lock().await.insert(key, scene.clone(), None);
                    scene
                }
                None => Self::fallback(state),
            },
        };

        let location = (!scene.location_name.trim().is_empty()).then(|| scene.location_name.clone());
        let mut output = HandlerOutput::from_serializable(&scene)?.with_mutation(StateMutation::SceneSet {
            description: scene.scene_description.clone(),
            atmosphere: scene.atmosphere.clone(),
            location,
        });
        if !scene.world_state_updates.is_empty() {
            output = output.with_mutation(StateMutation::Consequence(ConsequenceOutcome {
                world_state_changes: scene.world_state_updates.clone(),
                ..ConsequenceOutcome::default()
            }));
        }
        Ok(output)
    }
}
