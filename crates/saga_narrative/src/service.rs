//! Generation service wrapper: timeouts, retry and circuit breaking around a driver.

use saga_core::{GenerationRequest, UsageMetrics, parse_document};
use saga_error::{GenerationError, GenerationErrorKind, SagaResult};
use saga_interface::NarrativeDriver;
use saga_retry::{CircuitBreaker, RetryPolicy, retry_with_backoff};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Default deadline for one generation attempt.
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Calls a [`NarrativeDriver`] with a per-attempt timeout, a bounded retry
/// policy and a circuit breaker, then validates the response against the
/// declared type.
///
/// # Examples
///
/// ```
/// use saga_narrative::NarrativeService;
/// use saga_models::OfflineDriver;
/// use saga_retry::RetryPolicy;
/// use std::sync::Arc;
///
/// let service = NarrativeService::new(Arc::new(OfflineDriver))
///     .with_retry(RetryPolicy::no_retry());
/// assert_eq!(service.provider_name(), "offline");
/// ```
pub struct NarrativeService {
    driver: Arc<dyn NarrativeDriver>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    breaker: Mutex<CircuitBreaker>,
}

impl NarrativeService {
    /// Wrap a driver with the default retry policy, timeout and breaker.
    pub fn new(driver: Arc<dyn NarrativeDriver>) -> Self {
        Self {
            driver,
            retry: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            breaker: Mutex::new(CircuitBreaker::default()),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-attempt deadline.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Replace the circuit breaker.
    pub fn with_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Mutex::new(breaker);
        self
    }

    /// Provider behind this service.
    pub fn provider_name(&self) -> &'static str {
        self.driver.provider_name()
    }

    /// Model behind this service.
    pub fn model_name(&self) -> &str {
        self.driver.model_name()
    }

    /// Send a request and parse the completion as `T`.
    ///
    /// Transport failures are retried per the policy; a response that is not
    /// JSON or does not match `T` fails immediately. `metrics.call_count`
    /// counts responses received, `metrics.failed_calls` counts requests that
    /// ended in any error.
    ///
    /// # Errors
    ///
    /// Returns a generation error when the breaker is open, every attempt
    /// failed, or the response does not parse as `T`.
    #[instrument(skip_all, fields(provider = self.provider_name(), task = %request.task))]
    pub async fn complete<T: DeserializeOwned>(
        &self,
        metrics: &mut UsageMetrics,
        request: &GenerationRequest,
    ) -> SagaResult<T> {
        if !self.breaker.lock().await.allow_request() {
            warn!("Circuit breaker open, skipping generation call");
            metrics.record_failure();
            return Err(GenerationError::new(GenerationErrorKind::CircuitOpen).into());
        }

        let driver = &self.driver;
        let attempt_timeout = self.attempt_timeout;
        let outcome = retry_with_backoff(&self.retry, move || async move {
            match tokio::time::timeout(attempt_timeout, driver.generate(request)).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::new(GenerationErrorKind::Timeout(
                    attempt_timeout.as_millis() as u64,
                ))
                .into()),
            }
        })
        .await;

        let response = match outcome {
            Ok(response) => {
                self.breaker.lock().await.record_success();
                response
            }
            Err(e) => {
                // Only provider faults count against the breaker
                if e.is_retryable() {
                    self.breaker.lock().await.record_failure();
                }
                metrics.record_failure();
                return Err(e);
            }
        };

        metrics.record_call(
            request.render_prompt().len() + request.system_context.len(),
            response.text.len(),
            response.reported_usage(),
        );
        debug!(chars = response.text.len(), "Generation succeeded");

        parse_document::<T>(&response.text).map_err(|e| {
            warn!(error = %e, "Response rejected");
            metrics.record_failure();
            e.into()
        })
    }
}

impl std::fmt::Debug for NarrativeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeService")
            .field("provider", &self.driver.provider_name())
            .field("model", &self.driver.model_name())
            .field("retry", &self.retry)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}
