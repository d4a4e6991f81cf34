//! In-process fakes shared by the unit tests.

use apirec_memory::{
    EmbeddingError, EmbeddingProvider, IndexError, IndexSpec, IndexedEntry, LocalIndex,
    QueryMatch, VectorIndex,
};
use apirec_providers::{
    ChatOptions, CompletionStream, Message, Provider, ProviderError, Result as ProviderResult,
    StopReason, StreamEvent,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DIM: usize = 3;

/// Embeds known texts to fixed vectors; unknown texts get a hash-derived one.
#[derive(Default)]
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn model(&self) -> &str {
        "fake-embedding"
    }

    fn dimension(&self) -> usize {
        DIM
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|text| {
                if self.failing.contains(text) {
                    return Err(EmbeddingError::api(400, "invalid input"));
                }
                Ok(self.vectors.get(text).cloned().unwrap_or_else(|| {
                    let sum: u32 = text.chars().map(|c| c as u32).sum();
                    vec![1.0, (sum % 97) as f32 / 97.0, (sum % 13) as f32 / 13.0]
                }))
            })
            .collect()
    }
}

/// Local index that records every upsert call.
pub struct RecordingIndex {
    inner: LocalIndex,
    pub upserts: Mutex<Vec<Vec<String>>>,
    pub fail_upserts: AtomicBool,
    pub fail_queries: AtomicBool,
}

impl RecordingIndex {
    pub fn new() -> Self {
        Self {
            inner: LocalIndex::in_memory(IndexSpec::new("apis-test", DIM)),
            upserts: Mutex::new(Vec::new()),
            fail_upserts: AtomicBool::new(false),
            fail_queries: AtomicBool::new(false),
        }
    }

    pub fn upsert_calls(&self) -> Vec<Vec<String>> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    fn spec(&self) -> &IndexSpec {
        self.inner.spec()
    }

    async fn ensure_exists(&self) -> Result<bool, IndexError> {
        self.inner.ensure_exists().await
    }

    async fn delete(&self) -> Result<bool, IndexError> {
        self.inner.delete().await
    }

    async fn upsert(&self, entries: Vec<IndexedEntry>) -> Result<usize, IndexError> {
        self.upserts
            .lock()
            .unwrap()
            .push(entries.iter().map(|e| e.id.clone()).collect());
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(IndexError::Write("quota exceeded".to_string()));
        }
        self.inner.upsert(entries).await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, IndexError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(IndexError::Query("unavailable".to_string()));
        }
        self.inner.query(vector, top_k).await
    }

    async fn count(&self) -> Result<usize, IndexError> {
        self.inner.count().await
    }
}

/// Sets a flag when dropped, to observe stream release.
pub struct DropFlag(pub Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Chat provider that replays scripted deltas.
pub struct ScriptedProvider {
    deltas: Vec<String>,
    fail_request: bool,
    fail_after: Option<usize>,
    pub released: Arc<AtomicBool>,
    pub requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|d| d.to_string()).collect(),
            fail_request: false,
            fail_after: None,
            released: Arc::new(AtomicBool::new(false)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_request: true,
            ..Self::new(&[])
        }
    }

    pub fn failing_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat_stream(
        &self,
        _model: &str,
        messages: &[Message],
        _options: Option<ChatOptions>,
    ) -> ProviderResult<CompletionStream> {
        self.requests.lock().unwrap().push(messages.to_vec());
        if self.fail_request {
            return Err(ProviderError::auth("invalid api key"));
        }

        let mut events: Vec<ProviderResult<StreamEvent>> = Vec::new();
        for (i, delta) in self.deltas.iter().enumerate() {
            if self.fail_after == Some(i) {
                events.push(Err(ProviderError::stream("connection reset")));
            }
            events.push(Ok(StreamEvent::ContentDelta {
                delta: delta.clone(),
            }));
        }
        events.push(Ok(StreamEvent::End {
            stop_reason: StopReason::EndTurn,
        }));

        let guard = DropFlag(self.released.clone());
        let stream = futures::stream::iter(events).map(move |event| {
            let _held = &guard;
            event
        });
        Ok(Box::pin(stream))
    }
}
