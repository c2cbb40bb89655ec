//! Turn handler error types.

use derive_more::{Display, Error};

/// Error kinds raised while running a turn handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum HandlerErrorKind {
    /// Handler logic failed.
    #[display("{}", _0)]
    Failed(String),
    /// Handler did not finish within the executor's deadline.
    #[display("timed out after {}ms", _0)]
    TimedOut(u64),
    /// A result the handler requires from an earlier handler is absent.
    #[display("missing input: {}", _0)]
    MissingInput(String),
}

/// Handler error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Handler Error ({}): {} at line {} in {}", agent, kind, line, file)]
pub struct HandlerError {
    agent: String,
    kind: HandlerErrorKind,
    line: u32,
    file: &'static str,
}

impl HandlerError {
    /// Create a new handler error with automatic location tracking.
    #[track_caller]
    pub fn new(agent: impl Into<String>, kind: HandlerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            agent: agent.into(),
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Name of the failing agent.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Get the error kind.
    pub fn kind(&self) -> &HandlerErrorKind {
        &self.kind
    }
}
