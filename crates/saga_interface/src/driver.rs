//! Narrative generation driver trait.

use async_trait::async_trait;
use saga_core::{GenerationRequest, GenerationResponse};
use saga_error::SagaResult;

/// A text generation provider.
///
/// Drivers perform exactly one attempt per call. Retry, timeouts and circuit
/// breaking belong to the caller.
///
/// # Example
///
/// ```rust,ignore
/// use saga_interface::NarrativeDriver;
/// use saga_core::{GenerationRequest, GenerationResponse};
/// use saga_error::SagaResult;
/// use async_trait::async_trait;
///
/// struct Echo;
///
/// #[async_trait]
/// impl NarrativeDriver for Echo {
///     async fn generate(&self, request: &GenerationRequest) -> SagaResult<GenerationResponse> {
///         Ok(GenerationResponse::text(request.task.clone()))
///     }
///
///     fn provider_name(&self) -> &'static str {
///         "echo"
///     }
///
///     fn model_name(&self) -> &str {
///         "echo-1"
///     }
/// }
/// ```
#[async_trait]
pub trait NarrativeDriver: Send + Sync {
    /// Send one request and return the raw completion.
    ///
    /// # Errors
    ///
    /// Returns a generation error when the provider is unreachable, answers
    /// with a non-success status, or the request cannot be assembled.
    async fn generate(&self, request: &GenerationRequest) -> SagaResult<GenerationResponse>;

    /// Provider name, for logging.
    fn provider_name(&self) -> &'static str;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
