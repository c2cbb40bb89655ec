//! Execution plan error types.

/// Specific error conditions for execution plans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanErrorKind {
    /// Plan names a handler outside the known agent set
    UnknownAgent(String),
    /// Plan contains no handlers at all
    EmptyPlan,
    /// Handler dependencies form a cycle
    DependencyCycle(Vec<String>),
}

impl std::fmt::Display for PlanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanErrorKind::UnknownAgent(name) => {
                write!(f, "Agent '{}' is not in the known agent set", name)
            }
            PlanErrorKind::EmptyPlan => write!(f, "Execution plan contains no agents"),
            PlanErrorKind::DependencyCycle(agents) => write!(
                f,
                "Agent dependencies form a cycle: {}",
                agents.join(" -> ")
            ),
        }
    }
}

/// Error type for plan validation.
///
/// # Examples
///
/// ```
/// use saga_error::{PlanError, PlanErrorKind};
///
/// let err = PlanError::new(PlanErrorKind::UnknownAgent("BARD".to_string()));
/// assert!(format!("{}", err).contains("BARD"));
/// ```
#[derive(Debug, Clone)]
pub struct PlanError {
    /// The specific error condition
    pub kind: PlanErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PlanError {
    /// Create a new PlanError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlanErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plan Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for PlanError {}
