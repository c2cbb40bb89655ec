//! Error types for the Saga narrative engine.
//!
//! Every error carries the file and line where it was raised. Concern-specific
//! errors convert into [`SagaError`] through [`SagaErrorKind`].

mod config;
mod generation;
mod handler;
mod json;
mod plan;

pub use config::ConfigError;
pub use generation::{GenerationError, GenerationErrorKind};
pub use handler::{HandlerError, HandlerErrorKind};
pub use json::JsonError;
pub use plan::{PlanError, PlanErrorKind};

/// Crate-level error variants.
#[derive(Debug, derive_more::From)]
pub enum SagaErrorKind {
    /// Narrative generation service error
    Generation(GenerationError),
    /// Execution plan error
    Plan(PlanError),
    /// Turn handler error
    Handler(HandlerError),
    /// Configuration error
    Config(ConfigError),
    /// JSON serialization/deserialization error
    Json(JsonError),
}

impl std::fmt::Display for SagaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SagaErrorKind::Generation(e) => write!(f, "{}", e),
            SagaErrorKind::Plan(e) => write!(f, "{}", e),
            SagaErrorKind::Handler(e) => write!(f, "{}", e),
            SagaErrorKind::Config(e) => write!(f, "{}", e),
            SagaErrorKind::Json(e) => write!(f, "{}", e),
        }
    }
}

/// Saga error with kind discrimination.
#[derive(Debug)]
pub struct SagaError(Box<SagaErrorKind>);

impl SagaError {
    /// Create a new error from a kind.
    pub fn new(kind: SagaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &SagaErrorKind {
        &self.0
    }

    /// Whether retrying the failed operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            SagaErrorKind::Generation(e) => e.kind.is_retryable(),
            _ => false,
        }
    }
}

impl std::fmt::Display for SagaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Saga Error: {}", self.0)
    }
}

impl std::error::Error for SagaError {}

// Generic From implementation for any type that converts to SagaErrorKind
impl<T> From<T> for SagaError
where
    T: Into<SagaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Saga operations.
pub type SagaResult<T> = std::result::Result<T, SagaError>;
