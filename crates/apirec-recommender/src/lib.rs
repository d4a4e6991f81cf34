//! Catalog ingestion, retrieval and explanation for apirec.
//!
//! - [`IngestionPipeline`] turns a catalog into batched index upserts.
//! - [`RecommendationService`] embeds a query and returns the nearest APIs.
//! - [`ExplanationSynthesizer`] streams a grounded explanation from a chat model.
//! - [`RecommendationEngine`] combines the last two for request boundaries.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod explain;
pub mod ingest;
pub mod recommend;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{Catalog, SkippedRecord};
pub use engine::{RecommendationEngine, RecommendationResponse};
pub use error::{CatalogError, IngestError, RecommendError, SchemaError, SynthesisError};
pub use explain::{ExplanationChunk, ExplanationStream, ExplanationSynthesizer, SYSTEM_PROMPT};
pub use ingest::{BatchPolicy, BatchProgress, FailedBatch, IngestMode, IngestReport, IngestionPipeline};
pub use recommend::{RecommendationService, DEFAULT_TOP_K};
