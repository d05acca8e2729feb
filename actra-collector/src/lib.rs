//! actra collector library
//!
//! The consumer side of the actra action-logging pipeline: ingests the
//! `action-log` document stream, writes time-partitioned indices, and
//! reconstructs architectural and per-action causal diagrams over them.
//!
//! # Key components
//!
//! - **CollectorIndexer**: batch-consumes a [`index::DocumentSource`] and
//!   upserts into an [`index::ActionStore`], committing only after each
//!   batch is stored
//! - **DiagramService**: arch and per-action Graphviz diagrams
//! - **ApiServer**: the HTTP diagram API
//!
//! # Example
//!
//! ```ignore
//! use actra_collector::index::{CollectorIndexer, MemorySource, MemoryStore};
//! use actra_collector::api::{ApiServer, ServerConfig};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let source = Arc::new(MemorySource::new());
//! let indexer = CollectorIndexer::new(store.clone(), source.clone());
//! let indexer_handle = indexer.start();
//!
//! let mut server = ApiServer::new(ServerConfig::default(), store);
//! server.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod diagram;
pub mod index;

// Re-export key types at crate root for convenience
pub use api::{ApiServer, ServerConfig};
pub use diagram::DiagramService;
pub use index::{ActionStore, CollectorIndexer, MemorySource, MemoryStore};
