//! services/api/src/adapters/advisory_llm.rs
//!
//! This module contains the adapter for the speed-advisory LLM.
//! It implements the `SpeedAdvisoryService` port from the `core` crate against any
//! OpenAI-compatible chat-completion endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use remotenet_core::ports::{PortError, PortResult, SpeedAdvisoryService};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SpeedAdvisoryService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAdvisoryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAdvisoryAdapter {
    /// Creates a new `OpenAiAdvisoryAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds a client for `api_key`, optionally pointed at a non-OpenAI base URL.
    pub fn from_key(api_key: &str, api_base: Option<&str>, model: String) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Self::new(Client::with_config(config), model)
    }
}

/// The instruction sent for a pair of measured speeds.
pub fn speed_prompt(download_mbps: f64, upload_mbps: f64) -> String {
    format!(
        "Based on a download speed of {:.2} Mbps and an upload speed of {:.2} Mbps, provide a brief, \
         one-sentence, user-friendly summary of what this internet speed is good for. Example: \
         'Your connection is solid for streaming HD videos, browsing, and video calls.' Do not \
         repeat the speeds in your answer. Keep the tone encouraging.",
        download_mbps, upload_mbps
    )
}

//=========================================================================================
// `SpeedAdvisoryService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeedAdvisoryService for OpenAiAdvisoryAdapter {
    async fn analyze_speed(&self, download_mbps: f64, upload_mbps: f64) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content("You are a friendly network assistant. Answer in a single sentence.")
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(speed_prompt(download_mbps, upload_mbps))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!("Requesting speed advisory from model '{}'", self.model);
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Advisory LLM response contained no text content.".to_string())
            })
    }
}
