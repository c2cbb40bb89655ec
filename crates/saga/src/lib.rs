//! Saga: a turn-based narrative engine.
//!
//! Each turn an orchestrator asks a text generation service which handlers
//! to run, the handlers produce documents and state mutations, and a local
//! progression engine folds outcomes into the persistent game state. When the
//! service is unavailable every step falls back to deterministic local logic,
//! so a game can always be played to the end.
//!
//! This crate re-exports the workspace crates and adds layered configuration.
//!
//! # Example
//!
//! ```no_run
//! use saga::SagaConfig;
//!
//! # async fn run() -> saga::SagaResult<()> {
//! let config = SagaConfig::load(None)?;
//! let mut session = config.new_session(Some(7), true);
//! while !session.is_finished() {
//!     session.present_turn().await;
//!     let choice = session.state().current_scene.choices[0].clone();
//!     session.resolve_choice(choice).await;
//! }
//! # Ok(())
//! # }
//! ```

mod settings;

pub use settings::{API_KEY_ENV, GenerationSettings, OrchestratorSettings, SagaConfig};

pub use saga_cache::{Always, CacheConfig, FixedProbability, Never, ReusePolicy, SceneCache};
pub use saga_core::*;
pub use saga_error::*;
pub use saga_interface::{NarrativeDriver, TurnHandler};
pub use saga_models::{AnthropicClient, OfflineDriver};
pub use saga_narrative::*;
pub use saga_retry::{CircuitBreaker, RetryPolicy, retry_with_backoff};

/// Local state progression rules.
pub use saga_progression as progression;
