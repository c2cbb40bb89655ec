//! Narrative generation service error types.

use derive_more::{Display, Error};

/// Specific error conditions for calls to the narrative generation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum GenerationErrorKind {
    /// No driver is able to serve requests.
    #[display("Generation service unavailable: {}", _0)]
    Unavailable(String),

    /// The provider answered with a non-success status.
    #[display("HTTP {status}: {message}")]
    Http {
        /// Status code returned by the provider
        status: u16,
        /// Response body or transport message
        message: String,
    },

    /// A single attempt exceeded its deadline.
    #[display("Generation call timed out after {}ms", _0)]
    Timeout(u64),

    /// The response text is not a JSON document.
    #[display("Unparseable response: {}", _0)]
    Unparseable(String),

    /// The response is JSON but does not match the requested shape.
    #[display("Response does not match requested shape: {}", _0)]
    ShapeMismatch(String),

    /// Too many consecutive failures; calls are short-circuited.
    #[display("Circuit breaker open")]
    CircuitOpen,

    /// The request could not be assembled.
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),
}

impl GenerationErrorKind {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationErrorKind::Http { .. } | GenerationErrorKind::Timeout(_)
        )
    }
}

/// Generation error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Generation Error: {} at {}:{}", kind, file, line)]
pub struct GenerationError {
    /// The specific error kind.
    pub kind: GenerationErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// File where error occurred.
    pub file: &'static str,
}

impl GenerationError {
    /// Creates a new error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
