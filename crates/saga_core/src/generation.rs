//! Request/response contract with the narrative generation service.

use derive_builder::Builder;
use saga_error::{GenerationError, GenerationErrorKind};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A structured completion request.
///
/// # Examples
///
/// ```
/// use saga_core::GenerationRequest;
///
/// let request = GenerationRequest::builder()
///     .system_context("You narrate a dark fantasy world.")
///     .task("Describe the tavern.")
///     .build()
///     .unwrap();
/// assert!(request.render_prompt().contains("TASK: Describe the tavern."));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), pattern = "owned")]
pub struct GenerationRequest {
    /// Role and background for the model
    pub system_context: String,
    /// What to produce
    pub task: String,
    /// Context data, serialized into the prompt
    #[builder(default)]
    pub data: serde_json::Value,
    /// Declared output shape
    #[builder(default)]
    pub output_format: serde_json::Value,
    /// Per-request token cap
    #[builder(default, setter(strip_option))]
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Creates a builder for `GenerationRequest`.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    /// The user prompt sent to the provider.
    pub fn render_prompt(&self) -> String {
        let data = serde_json::to_string_pretty(&self.data).unwrap_or_default();
        let format = serde_json::to_string_pretty(&self.output_format).unwrap_or_default();
        format!(
            "TASK: {}\n\nCONTEXT DATA:\n{}\n\nREQUIRED OUTPUT FORMAT (JSON):\n{}\n\n\
             Respond ONLY with valid JSON matching the format above. \
             Do not include any explanatory text outside the JSON structure.",
            self.task, data, format
        )
    }
}

/// Raw completion text plus provider-reported usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Completion text
    pub text: String,
    /// Input tokens, if the provider reported them
    pub input_tokens: Option<u64>,
    /// Output tokens, if the provider reported them
    pub output_tokens: Option<u64>,
}

impl GenerationResponse {
    /// A response with no usage data.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            input_tokens: None,
            output_tokens: None,
        }
    }

    /// Provider-reported usage, when both counts are present.
    pub fn reported_usage(&self) -> Option<(u64, u64)> {
        self.input_tokens.zip(self.output_tokens)
    }
}

/// JSON schema of `T`, used as a request's declared output shape.
pub fn output_format<T: JsonSchema>() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default()
}

/// Remove a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the opening fence
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse completion text into the declared type.
///
/// Text that is not JSON is [`GenerationErrorKind::Unparseable`]; JSON of the
/// wrong shape is [`GenerationErrorKind::ShapeMismatch`].
#[track_caller]
pub fn parse_document<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    let body = strip_code_fence(text);
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GenerationError::new(GenerationErrorKind::Unparseable(e.to_string())))?;
    serde_json::from_value(value)
        .map_err(|e| GenerationError::new(GenerationErrorKind::ShapeMismatch(e.to_string())))
}
