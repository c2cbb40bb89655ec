//! Driver for running without a generation provider.

use async_trait::async_trait;
use saga_core::{GenerationRequest, GenerationResponse};
use saga_error::{GenerationError, GenerationErrorKind, SagaResult};
use saga_interface::NarrativeDriver;

/// A driver that always reports the service as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDriver;

#[async_trait]
impl NarrativeDriver for OfflineDriver {
    async fn generate(&self, _request: &GenerationRequest) -> SagaResult<GenerationResponse> {
        Err(GenerationError::new(GenerationErrorKind::Unavailable(
            "running offline".to_string(),
        ))
        .into())
    }

    fn provider_name(&self) -> &'static str {
        "offline"
    }

    fn model_name(&self) -> &str {
        "none"
    }
}
