//! Clients for the external services: document processor (parse, redline) and vector store.

#[cfg(feature = "http")]
pub mod document;
#[cfg(feature = "http")]
mod error;
#[cfg(feature = "http")]
pub mod vector;

#[cfg(feature = "http")]
pub use document::{DocumentChunk, DocumentClient, DocumentMetadata, HealthStatus, ParsedDocument};
#[cfg(feature = "http")]
pub use error::ServiceError;
#[cfg(feature = "http")]
pub use vector::{SearchMatch, SearchResponse, VectorStoreClient};
