//! INVENTORY: read-only space report.

use async_trait::async_trait;
use saga_core::{
    AgentId, ConsequenceOutcome, GameState, HandlerOutput, TurnContext, TurnResults,
};
use saga_error::SagaResult;
use saga_interface::TurnHandler;
use serde::{Deserialize, Serialize};

/// Inventory space and the items this turn's outcome brings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    /// Free slots
    pub available_space: usize,
    /// Whether every slot is taken
    pub inventory_full: bool,
    /// Item names gained this turn
    pub items_gained: Vec<String>,
    /// Gained items that found no free slot
    pub items_without_space: Vec<String>,
}

/// Reports inventory space. Items are added by the consequence applicator,
/// never by this handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryHandler;

#[async_trait]
impl TurnHandler for InventoryHandler {
    fn agent(&self) -> AgentId {
        AgentId::Inventory
    }

    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        _ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput> {
        let gained: Vec<String> = results
            .get_as::<ConsequenceOutcome>(AgentId::Consequence)
            .map(|o| {
                o.immediate_effects
                    .items_gained
                    .into_iter()
                    .map(|g| g.into_item().name)
                    .collect()
            })
            .unwrap_or_default();

        let names: Vec<&str> = state.inventory.items.iter().map(|i| i.name.as_str()).collect();
        let (items_gained, items_without_space): (Vec<String>, Vec<String>) = gained
            .into_iter()
            .partition(|name| names.iter().any(|n| n.eq_ignore_ascii_case(name)));

        let report = InventoryReport {
            available_space: state.inventory.space_remaining(),
            inventory_full: state.inventory.is_full(),
            items_gained,
            items_without_space,
        };
        Ok(HandlerOutput::from_serializable(&report)?)
    }
}
