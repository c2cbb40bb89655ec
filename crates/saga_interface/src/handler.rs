//! Turn handler trait.

use async_trait::async_trait;
use saga_core::{AgentId, GameState, HandlerOutput, TurnContext, TurnResults};
use saga_error::SagaResult;

/// One specialized step of a turn.
///
/// Handlers read the game state and the documents produced earlier in the
/// turn. They never mutate state directly: requested changes travel in
/// [`HandlerOutput::mutations`] and are committed by the executor only when
/// the handler succeeds.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    /// The registry key this handler serves.
    fn agent(&self) -> AgentId;

    /// Run the handler.
    ///
    /// # Errors
    ///
    /// Any error is recorded against this handler; the turn continues with
    /// the next one.
    async fn execute(
        &self,
        state: &GameState,
        results: &TurnResults,
        ctx: &mut TurnContext,
    ) -> SagaResult<HandlerOutput>;
}
