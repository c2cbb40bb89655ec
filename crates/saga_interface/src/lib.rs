//! Trait definitions for the Saga narrative engine.
//!
//! Two seams separate the engine from the outside world: a
//! [`NarrativeDriver`] talks to a text generation provider, and a
//! [`TurnHandler`] contributes one specialized step to a turn.

mod driver;
mod handler;

pub use driver::NarrativeDriver;
pub use handler::TurnHandler;
