//! Zhipu GLM provider implementation.
//!
//! Zhipu's open platform exposes an OpenAI-compatible chat completions API;
//! streaming responses are server-sent events terminated by `[DONE]`.

use crate::{
    ChatOptions, CompletionStream, Message, Provider, ProviderError, Result, StopReason,
    StreamEvent,
};
use apirec_core::config::ZHIPU_API_BASE;
use apirec_core::env;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Zhipu GLM chat provider.
pub struct ZhipuProvider {
    /// HTTP client.
    client: Client,

    /// API key.
    api_key: SecretString,

    /// API base URL.
    api_base: String,
}

impl ZhipuProvider {
    /// Create a new provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ProviderError::config("API key is required"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: SecretString::new(api_key),
            api_base: ZHIPU_API_BASE.to_string(),
        })
    }

    /// Create a new provider from the `ZHIPUAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = env::get_var(env::vars::ZHIPUAI_API_KEY).ok_or_else(|| {
            ProviderError::config("ZHIPUAI_API_KEY environment variable not set")
        })?;
        Self::new(api_key)
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request<'a>(
        &self,
        model: &'a str,
        messages: &'a [Message],
        options: ChatOptions,
    ) -> ZhipuRequest<'a> {
        ZhipuRequest {
            model,
            messages: messages
                .iter()
                .map(|m| ZhipuMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stream: true,
        }
    }
}

#[async_trait]
impl Provider for ZhipuProvider {
    fn name(&self) -> &str {
        "zhipu"
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<ChatOptions>,
    ) -> Result<CompletionStream> {
        let request = self.build_request(model, messages, options.unwrap_or_default());

        debug!(model, messages = messages.len(), "Sending streaming request to Zhipu");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let message = match response.json::<ZhipuError>().await {
                Ok(body) => body.error.message,
                Err(_) => "Unknown error".to_string(),
            };

            return Err(ProviderError::from_status(
                status.as_u16(),
                message,
                retry_after,
            ));
        }

        let event_stream = response.bytes_stream().eventsource();

        let stream = event_stream.filter_map(|result| async move {
            match result {
                Ok(event) => {
                    if event.data.is_empty() || event.data == "[DONE]" {
                        return None;
                    }

                    match serde_json::from_str::<ZhipuStreamChunk>(&event.data) {
                        Ok(chunk) => {
                            let choice = chunk.choices.into_iter().next()?;
                            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty())
                            {
                                return Some(Ok(StreamEvent::ContentDelta { delta: content }));
                            }

                            choice.finish_reason.map(|reason| {
                                Ok(StreamEvent::End {
                                    stop_reason: StopReason::from_finish_reason(&reason),
                                })
                            })
                        }
                        Err(e) => {
                            warn!("Failed to parse SSE event: {}", e);
                            None
                        }
                    }
                }
                Err(e) => Some(Err(ProviderError::stream(e.to_string()))),
            }
        });

        Ok(Box::pin(stream))
    }
}

// Internal types for the Zhipu API

#[derive(Serialize)]
struct ZhipuRequest<'a> {
    model: &'a str,
    messages: Vec<ZhipuMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct ZhipuMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ZhipuError {
    error: ZhipuErrorDetail,
}

#[derive(Deserialize)]
struct ZhipuErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct ZhipuStreamChunk {
    choices: Vec<ZhipuStreamChoice>,
}

#[derive(Deserialize)]
struct ZhipuStreamChoice {
    #[serde(default)]
    delta: ZhipuStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Default, Deserialize)]
struct ZhipuStreamDelta {
    content: Option<String>,
}
