//! Indexing of the action-log stream.
//!
//! Two halves: [`ActionStore`] is the query surface over stored documents,
//! partitioned into daily `action-YYYY.MM.DD` indices; [`CollectorIndexer`]
//! keeps it fed from a [`DocumentSource`], committing the source position
//! only after each batch is stored.

mod indexer;
mod store;

#[cfg(feature = "kafka")]
pub use indexer::KafkaSource;
pub use indexer::{
    CollectorIndexer, DocumentSource, IndexerConfig, IndexerHandle, MemorySource, SourceFuture,
};
pub use store::{
    index_name, ActionStore, ArchBucket, MemoryStore, ARCH_ACTION_TERMS, ARCH_APP_TERMS,
    ARCH_CLIENT_TERMS,
};
