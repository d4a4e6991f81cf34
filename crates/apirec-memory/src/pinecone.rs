//! Pinecone serverless index client.
//!
//! Control plane calls (`/indexes`) go to the controller URL; data plane
//! calls go to the per-index host reported by `describe`.

use crate::error::IndexError;
use crate::index::{sort_matches, IndexSpec, IndexedEntry, QueryMatch, VectorIndex};
use apirec_core::config::{Metric, PINECONE_CONTROLLER_URL};
use apirec_core::ApiMetadata;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// API version sent with every request.
const API_VERSION: &str = "2024-07";

/// Pinecone-backed [`VectorIndex`].
pub struct PineconeIndex {
    client: Client,
    api_key: SecretString,
    controller_url: String,
    spec: IndexSpec,
    cloud: String,
    region: String,
    ready_timeout: Duration,
    poll_interval: Duration,
    host: RwLock<Option<String>>,
}

impl PineconeIndex {
    /// Create a client for the index described by `spec`.
    pub fn new(api_key: impl Into<String>, spec: IndexSpec) -> Result<Self, IndexError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(IndexError::Config("API key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| IndexError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: SecretString::new(api_key),
            controller_url: PINECONE_CONTROLLER_URL.to_string(),
            spec,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            ready_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            host: RwLock::new(None),
        })
    }

    /// Set the control plane URL.
    pub fn with_controller_url(mut self, url: impl Into<String>) -> Self {
        self.controller_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set serverless placement.
    pub fn with_serverless(mut self, cloud: impl Into<String>, region: impl Into<String>) -> Self {
        self.cloud = cloud.into();
        self.region = region.into();
        self
    }

    /// Set how long to wait for a new index to become ready.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Set the readiness polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", self.api_key.expose_secret())
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn index_url(&self) -> String {
        format!("{}/indexes/{}", self.controller_url, self.spec.name)
    }

    /// Describe the index, or `None` if it does not exist.
    async fn describe(&self) -> Result<Option<IndexDescription>, IndexError> {
        let response = self
            .authed(self.client.get(self.index_url()))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response, IndexError::Provision).await?;
        Ok(Some(response.json().await?))
    }

    async fn create(&self) -> Result<(), IndexError> {
        let request = CreateIndexRequest {
            name: &self.spec.name,
            dimension: self.spec.dimension,
            metric: self.spec.metric,
            spec: ServerlessSpec {
                serverless: Serverless {
                    cloud: &self.cloud,
                    region: &self.region,
                },
            },
        };

        let response = self
            .authed(self.client.post(format!("{}/indexes", self.controller_url)))
            .json(&request)
            .send()
            .await?;

        // Lost a creation race; readiness polling takes over.
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        check(response, IndexError::Provision).await?;
        Ok(())
    }

    async fn wait_until_ready(&self) -> Result<IndexDescription, IndexError> {
        let started = Instant::now();
        loop {
            if let Some(description) = self.describe().await? {
                if description.status.ready {
                    return Ok(description);
                }
                debug!(index = %self.spec.name, state = %description.status.state, "Waiting for index");
            }

            if started.elapsed() >= self.ready_timeout {
                return Err(IndexError::Provision(format!(
                    "index '{}' not ready after {}s",
                    self.spec.name,
                    self.ready_timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Data plane base URL, resolved once and cached.
    async fn host(&self) -> Result<String, IndexError> {
        if let Some(host) = self.host.read().await.as_ref() {
            return Ok(host.clone());
        }

        let description = self
            .describe()
            .await?
            .ok_or_else(|| IndexError::NotFound(self.spec.name.clone()))?;
        let host = data_plane_url(&description.host);
        *self.host.write().await = Some(host.clone());
        Ok(host)
    }
}

/// Data plane hosts are reported without a scheme.
fn data_plane_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

/// Turn a non-success response into `kind(message)`.
async fn check(
    response: Response,
    kind: fn(String) -> IndexError,
) -> Result<Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error.message)
        .unwrap_or(text);
    Err(kind(format!("{} - {}", status.as_u16(), message)))
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    async fn ensure_exists(&self) -> Result<bool, IndexError> {
        let created = match self.describe().await? {
            Some(existing) => {
                if let Some(reason) = self
                    .spec
                    .incompatibility(existing.dimension, existing.metric)
                {
                    return Err(IndexError::incompatible(&self.spec.name, reason));
                }
                false
            }
            None => {
                info!(
                    index = %self.spec.name,
                    dimension = self.spec.dimension,
                    metric = %self.spec.metric,
                    "Creating Pinecone index"
                );
                self.create().await?;
                true
            }
        };

        let ready = self.wait_until_ready().await?;
        *self.host.write().await = Some(data_plane_url(&ready.host));
        Ok(created)
    }

    async fn delete(&self) -> Result<bool, IndexError> {
        let response = self
            .authed(self.client.delete(self.index_url()))
            .send()
            .await?;
        *self.host.write().await = None;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response, IndexError::Provision).await?;

        // Deletion is asynchronous; wait for the name to be released.
        let started = Instant::now();
        while self.describe().await?.is_some() {
            if started.elapsed() >= self.ready_timeout {
                warn!(index = %self.spec.name, "Index still present after delete");
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Ok(true)
    }

    async fn upsert(&self, entries: Vec<IndexedEntry>) -> Result<usize, IndexError> {
        if entries.is_empty() {
            return Ok(0);
        }
        for entry in &entries {
            self.spec.check_dimension(&entry.vector)?;
        }

        let host = self.host().await?;
        let requested = entries.len();
        let vectors: Vec<PineconeVector<'_>> = entries
            .iter()
            .map(|e| PineconeVector {
                id: &e.id,
                values: &e.vector,
                metadata: &e.metadata,
            })
            .collect();

        let response = self
            .authed(self.client.post(format!("{}/vectors/upsert", host)))
            .json(&UpsertRequest { vectors })
            .send()
            .await
            .map_err(|e| IndexError::Write(e.to_string()))?;
        let response = check(response, IndexError::Write).await?;
        let body: UpsertResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Write(e.to_string()))?;

        if body.upserted_count != requested {
            return Err(IndexError::Write(format!(
                "provider stored {} of {} vectors",
                body.upserted_count, requested
            )));
        }
        Ok(requested)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, IndexError> {
        if top_k == 0 {
            return Err(IndexError::InvalidTopK);
        }
        self.spec.check_dimension(vector)?;

        let host = self.host().await?;
        let response = self
            .authed(self.client.post(format!("{}/query", host)))
            .json(&QueryRequest {
                vector,
                top_k,
                include_metadata: true,
                include_values: false,
            })
            .send()
            .await
            .map_err(|e| IndexError::Query(e.to_string()))?;
        let response = check(response, IndexError::Query).await?;
        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Query(e.to_string()))?;

        let mut matches: Vec<QueryMatch> = body
            .matches
            .into_iter()
            .map(|m| QueryMatch {
                metadata: m
                    .metadata
                    .and_then(|v| serde_json::from_value::<ApiMetadata>(v).ok()),
                id: m.id,
                score: m.score,
            })
            .collect();

        sort_matches(&mut matches);
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let host = self.host().await?;
        let response = self
            .authed(self.client.post(format!("{}/describe_index_stats", host)))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let response = check(response, IndexError::Query).await?;
        let stats: IndexStats = response.json().await?;
        Ok(stats.total_vector_count)
    }
}

// Wire types

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct IndexDescription {
    dimension: usize,
    metric: Metric,
    #[serde(default)]
    host: String,
    status: IndexStatus,
}

#[derive(Deserialize)]
struct IndexStatus {
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    serverless: Serverless<'a>,
}

#[derive(Serialize)]
struct Serverless<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a ApiMetadata,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Deserialize)]
struct PineconeMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: usize,
}
