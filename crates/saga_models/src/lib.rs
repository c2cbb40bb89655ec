//! Narrative generation drivers.
//!
//! [`AnthropicClient`] talks to the Anthropic Messages API. [`OfflineDriver`]
//! never reaches a provider, so every handler falls back to local logic.

mod anthropic;
mod offline;

pub use anthropic::{
    ANTHROPIC_API_URL, ANTHROPIC_VERSION, AnthropicClient, AnthropicContent, AnthropicMessage,
    AnthropicRequest, AnthropicResponse, AnthropicUsage, DEFAULT_MODEL,
};
pub use offline::OfflineDriver;
