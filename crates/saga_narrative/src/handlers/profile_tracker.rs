//! PROFILE_TRACKER: folds the player's choice into the hidden profile.

use async_trait::async_trait;
use saga_core::{
    AgentId, ChoiceType, GameState, HandlerOutput, StateMutation, TurnContext, TurnResults,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use saga_progression::{archetype, dominant_traits, update_profile};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Profile tracking results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    /// Whether the choice changed the profile
    pub profile_updated: bool,
    /// Archetype after the update
    pub archetype: Option<String>,
    /// Strongest traits after the update, as percentages
    pub dominant_traits: Vec<(String, u32)>,
    /// Whether the profile has been revealed
    pub revealed: bool,
}

/// Applies the choice's personality mapping. Local logic only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileTrackerHandler;

#[async_trait]
impl TurnHandler for ProfileTrackerHandler {
    fn agent(&self) -> AgentId {
        AgentId::ProfileTracker
    }

    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        _ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let revealed = state.profile.revealed();
        let mapping = results
            .player_choice
            .as_ref()
            .map(|c| c.personality_mapping.trim())
            .filter(|m| !m.is_empty());

        let Some(mapping) = mapping else {
            return Ok(HandlerOutput::from_serializable(&ProfileReport {
                revealed,
                ..ProfileReport::default()
            })?);
        };

        if ChoiceType::from_str(mapping).is_err() {
            warn!(mapping, "Choice carries an unknown personality mapping");
            return Ok(HandlerOutput::from_serializable(&ProfileReport {
                revealed,
                ..ProfileReport::default()
            })?);
        }

        let preview = update_profile(&state.profile, mapping);
        let report = ProfileReport {
            profile_updated: true,
            archetype: Some(archetype(&preview).name.to_string()),
            dominant_traits: dominant_traits(&preview, 3)
                .into_iter()
                .map(|t| (t.personality_trait.label().to_string(), t.percentage))
                .collect(),
            revealed,
        };
        Ok(HandlerOutput::from_serializable(&report)?
            .with_mutation(StateMutation::ProfileChoice(mapping.to_string())))
    }
}
