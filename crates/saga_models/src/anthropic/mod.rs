//! Anthropic Messages API driver.

mod types;

pub use types::{
    AnthropicContent, AnthropicMessage, AnthropicRequest, AnthropicResponse, AnthropicUsage,
};

use async_trait::async_trait;
use reqwest::Client;
use saga_core::{GenerationRequest, GenerationResponse};
use saga_error::{GenerationError, GenerationErrorKind, SagaResult};
use saga_interface::NarrativeDriver;
use tracing::{debug, error, instrument};

/// Messages endpoint.
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Client for the Anthropic Messages API.
///
/// One call is one attempt; timeouts and retries belong to the caller.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicClient {
    /// Creates a client with the default endpoint, 2000 max tokens and
    /// temperature 0.7.
    #[instrument(skip(api_key), fields(model = %model.as_ref()))]
    pub fn new(api_key: impl Into<String>, model: impl AsRef<str>) -> Self {
        debug!("Created Anthropic client");
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.as_ref().to_string(),
            base_url: ANTHROPIC_API_URL.to_string(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }

    /// Override the endpoint, e.g. for a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the default token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Convert a narrative request into an API request.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error if the request cannot be assembled.
    pub fn to_api_request(&self, request: &GenerationRequest) -> SagaResult<AnthropicRequest> {
        let api_request = AnthropicRequest::builder()
            .model(self.model.clone())
            .messages(vec![AnthropicMessage::user(request.render_prompt())])
            .max_tokens(request.max_tokens.unwrap_or(self.max_tokens))
            .system(Some(request.system_context.clone()))
            .temperature(Some(self.temperature))
            .build()
            .map_err(|e| GenerationError::new(GenerationErrorKind::InvalidRequest(e.to_string())))?;
        Ok(api_request)
    }
}

#[async_trait]
impl NarrativeDriver for AnthropicClient {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn generate(&self, request: &GenerationRequest) -> SagaResult<GenerationResponse> {
        let api_request = self.to_api_request(request)?;

        debug!(max_tokens = api_request.max_tokens(), "Sending request");

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "HTTP request failed");
                GenerationError::new(GenerationErrorKind::Http {
                    status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    message: format!("Request failed: {}", e),
                })
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_text, "API error");
            return Err(GenerationError::new(GenerationErrorKind::Http {
                status: status.as_u16(),
                message: error_text,
            })
            .into());
        }

        let api_response: AnthropicResponse = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse response envelope");
            GenerationError::new(GenerationErrorKind::Unparseable(format!(
                "Failed to parse response envelope: {}",
                e
            )))
        })?;

        let usage = api_response.usage().as_ref();
        debug!(
            blocks = api_response.content().len(),
            input_tokens = usage.map(|u| *u.input_tokens()),
            output_tokens = usage.map(|u| *u.output_tokens()),
            "Received response"
        );

        Ok(GenerationResponse {
            text: api_response.text(),
            input_tokens: usage.map(|u| *u.input_tokens()),
            output_tokens: usage.map(|u| *u.output_tokens()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
