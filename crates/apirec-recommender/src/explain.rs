//! Streamed, grounded explanations of a recommendation list.

use crate::error::SynthesisError;
use apirec_core::types::{DESCRIPTION_LABEL, ENDPOINT_LABEL};
use apirec_core::RecommendationRecord;
use apirec_providers::{ChatOptions, CompletionStream, Message, Provider, StreamEvent};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, warn};

/// Instruction establishing the assistant's role.
pub const SYSTEM_PROMPT: &str = "你是一个专业的API推荐助手。根据用户的需求和提供的API列表，\n\
    你需要解释为什么这些API适合用户的需求，并提供使用建议。请确保回答专业、准确、易懂。";

/// Heading of the rendered recommendation block.
const LIST_HEADING: &str = "\n\n推荐的API列表：\n";

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "glm-4";

/// Render recommendations into the block appended to the user turn.
///
/// One entry per record: 1-based index, name, score to two decimals,
/// description, and the endpoint line only when present and non-empty.
pub fn render_recommendations(records: &[RecommendationRecord]) -> String {
    let mut block = String::from(LIST_HEADING);
    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(
            block,
            "{}. {} (相似度: {:.2})",
            i + 1,
            record.api_name,
            record.score
        );
        let _ = writeln!(block, "   {}: {}", DESCRIPTION_LABEL, record.description);
        if let Some(endpoint) = record.display_endpoint() {
            let _ = writeln!(block, "   {}: {}", ENDPOINT_LABEL, endpoint);
        }
    }
    block
}

/// System and user messages for one synthesis call.
pub fn build_messages(query: &str, records: &[RecommendationRecord]) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "用户需求: {}\n{}",
            query,
            render_recommendations(records)
        )),
    ]
}

/// An incremental piece of explanation text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationChunk {
    /// Text delta.
    pub text: String,
}

impl fmt::Display for ExplanationChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Lazy, finite, single-pass stream of explanation chunks.
///
/// The provider stream is released as soon as it ends, errors, or this
/// value is dropped. A provider error ends the stream after the chunks
/// already produced.
pub struct ExplanationStream {
    inner: Option<CompletionStream>,
    produced: usize,
}

impl ExplanationStream {
    /// A stream with no chunks.
    pub fn empty() -> Self {
        Self {
            inner: None,
            produced: 0,
        }
    }

    /// Wrap a provider completion stream.
    pub fn new(inner: CompletionStream) -> Self {
        Self {
            inner: Some(inner),
            produced: 0,
        }
    }

    /// True once the underlying stream has been released.
    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    /// Chunks yielded so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Consume the stream and join all chunks.
    pub async fn collect_text(mut self) -> String {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            text.push_str(&chunk.text);
        }
        text
    }
}

impl Stream for ExplanationStream {
    type Item = ExplanationChunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let Some(inner) = this.inner.as_mut() else {
                return Poll::Ready(None);
            };

            match inner.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(StreamEvent::ContentDelta { delta }))) => {
                    if delta.is_empty() {
                        continue;
                    }
                    this.produced += 1;
                    return Poll::Ready(Some(ExplanationChunk { text: delta }));
                }
                Poll::Ready(Some(Ok(StreamEvent::End { stop_reason }))) => {
                    debug!(?stop_reason, chunks = this.produced, "Explanation complete");
                    this.inner = None;
                }
                Poll::Ready(Some(Err(e))) => {
                    warn!(error = %e, chunks = this.produced, "Explanation stream failed");
                    this.inner = None;
                }
                Poll::Ready(None) => {
                    this.inner = None;
                }
            }
        }
    }
}

impl Drop for ExplanationStream {
    fn drop(&mut self) {
        if self.inner.is_some() {
            debug!(chunks = self.produced, "Explanation stream abandoned");
        }
    }
}

impl fmt::Debug for ExplanationStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplanationStream")
            .field("finished", &self.is_finished())
            .field("produced", &self.produced)
            .finish()
    }
}

/// Builds the grounding prompt and streams the model's explanation.
#[derive(Clone)]
pub struct ExplanationSynthesizer {
    provider: Arc<dyn Provider>,
    model: String,
    options: ChatOptions,
}

impl ExplanationSynthesizer {
    /// Create a synthesizer using the default model.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            model: DEFAULT_CHAT_MODEL.to_string(),
            options: ChatOptions::default(),
        }
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set generation options.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Chat model in use.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a synthesis; a failed request yields an empty stream.
    pub async fn synthesize(
        &self,
        query: &str,
        recommendations: &[RecommendationRecord],
    ) -> ExplanationStream {
        match self.try_synthesize(query, recommendations).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "No explanation available");
                ExplanationStream::empty()
            }
        }
    }

    /// Start a synthesis, surfacing request failures.
    pub async fn try_synthesize(
        &self,
        query: &str,
        recommendations: &[RecommendationRecord],
    ) -> Result<ExplanationStream, SynthesisError> {
        let messages = build_messages(query, recommendations);
        let options = (!self.options.is_empty()).then(|| self.options.clone());

        debug!(
            model = %self.model,
            recommendations = recommendations.len(),
            "Requesting explanation"
        );
        let stream = self
            .provider
            .chat_stream(&self.model, &messages, options)
            .await?;
        Ok(ExplanationStream::new(stream))
    }
}
