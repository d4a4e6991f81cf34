//! Generative chat providers for apirec.
//!
//! The explanation synthesizer talks to a model through the [`Provider`]
//! trait. Currently implemented:
//! - Zhipu GLM (OpenAI-compatible chat completions)
//!
//! # Example
//!
//! ```rust,ignore
//! use apirec_providers::{Message, Provider, ZhipuProvider};
//! use futures::StreamExt;
//!
//! let provider = ZhipuProvider::from_env()?;
//! let mut stream = provider
//!     .chat_stream("glm-4", &[Message::user("你好")], None)
//!     .await?;
//! while let Some(event) = stream.next().await {
//!     println!("{:?}", event?);
//! }
//! ```

mod error;
mod types;

#[cfg(feature = "zhipu")]
pub mod zhipu;

pub use error::{ProviderError, Result};
pub use types::*;

#[cfg(feature = "zhipu")]
pub use zhipu::ZhipuProvider;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Stream of completion events for streaming responses.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// A model provider that can generate chat completions.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get provider name.
    fn name(&self) -> &str;

    /// Generate a streaming chat completion.
    async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<ChatOptions>,
    ) -> Result<CompletionStream>;
}
