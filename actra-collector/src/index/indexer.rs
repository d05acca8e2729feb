//! Consumption of the `action-log` stream into the store.
//!
//! The indexer polls its source in batches, upserts every document into the
//! daily index, and only then commits the source position. A crash between
//! upsert and commit replays the batch; upsert-by-id makes the replay
//! harmless.

use super::store::ActionStore;
use actra_core::error::Result;
use actra_core::ActionDocument;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

/// Boxed future returned by source operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A stream of action documents the indexer can consume.
pub trait DocumentSource: Send + Sync {
    /// Fetch up to `max` documents, waiting at most `timeout_ms` when none
    /// are immediately available. An empty batch is not an error.
    fn poll<'a>(&'a self, max: usize, timeout_ms: u64) -> SourceFuture<'a, Vec<ActionDocument>>;

    /// Acknowledge everything returned by `poll` so far.
    fn commit<'a>(&'a self) -> SourceFuture<'a, ()>;
}

/// In-memory source for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemorySource {
    queue: Mutex<VecDeque<ActionDocument>>,
    notify: Notify,
    commits: AtomicU64,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one document into the source.
    pub fn push(&self, document: ActionDocument) {
        self.queue.lock().push_back(document);
        self.notify.notify_one();
    }

    /// Number of commits performed.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    fn drain(&self, max: usize) -> Vec<ActionDocument> {
        let mut queue = self.queue.lock();
        let take = queue.len().min(max);
        queue.drain(..take).collect()
    }
}

impl DocumentSource for MemorySource {
    fn poll<'a>(&'a self, max: usize, timeout_ms: u64) -> SourceFuture<'a, Vec<ActionDocument>> {
        Box::pin(async move {
            let mut documents = self.drain(max);
            if documents.is_empty() && timeout_ms > 0 {
                let timeout = std::time::Duration::from_millis(timeout_ms);
                let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
                documents = self.drain(max);
            }
            Ok(documents)
        })
    }

    fn commit<'a>(&'a self) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            self.commits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }
}

/// Kafka source over the `action-log` topic.
///
/// Offsets are committed manually, only after the batch landed in the store.
/// Requires the `kafka` feature and librdkafka.
#[cfg(feature = "kafka")]
pub struct KafkaSource {
    consumer: rdkafka::consumer::StreamConsumer,
}

#[cfg(feature = "kafka")]
impl KafkaSource {
    /// Create a consumer subscribed to the `action-log` topic.
    pub fn new(brokers: &str, group_id: &str) -> Result<Self> {
        use actra_core::log::TOPIC_ACTION_LOG;
        use actra_core::ActraError;
        use rdkafka::consumer::Consumer;

        let consumer: rdkafka::consumer::StreamConsumer = rdkafka::ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .create()
            .map_err(|e| ActraError::RemoteService {
                service: "kafka".to_string(),
                cause: format!("failed to create consumer: {}", e),
            })?;
        consumer
            .subscribe(&[TOPIC_ACTION_LOG])
            .map_err(|e| ActraError::RemoteService {
                service: "kafka".to_string(),
                cause: format!("failed to subscribe: {}", e),
            })?;
        Ok(Self { consumer })
    }
}

#[cfg(feature = "kafka")]
impl DocumentSource for KafkaSource {
    fn poll<'a>(&'a self, max: usize, timeout_ms: u64) -> SourceFuture<'a, Vec<ActionDocument>> {
        use actra_core::ActraError;
        use rdkafka::Message;

        Box::pin(async move {
            let mut documents = Vec::new();
            let deadline =
                tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
            while documents.len() < max {
                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match tokio::time::timeout(remaining, self.consumer.recv()).await {
                    Err(_) => break,
                    Ok(Err(e)) => {
                        return Err(ActraError::RemoteService {
                            service: "kafka".to_string(),
                            cause: e.to_string(),
                        });
                    }
                    Ok(Ok(message)) => {
                        let Some(payload) = message.payload() else {
                            continue;
                        };
                        match serde_json::from_slice::<ActionDocument>(payload) {
                            Ok(document) => documents.push(document),
                            Err(e) => {
                                tracing::warn!(error = %e, "skipping malformed action document");
                            }
                        }
                    }
                }
            }
            Ok(documents)
        })
    }

    fn commit<'a>(&'a self) -> SourceFuture<'a, ()> {
        use actra_core::ActraError;
        use rdkafka::consumer::{CommitMode, Consumer};

        Box::pin(async move {
            self.consumer
                .commit_consumer_state(CommitMode::Async)
                .map_err(|e| ActraError::RemoteService {
                    service: "kafka".to_string(),
                    cause: e.to_string(),
                })
        })
    }
}

/// Batch sizing and poll cadence for the indexer.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Maximum documents per batch.
    pub batch_size: usize,
    /// How long one poll waits for documents, in milliseconds.
    pub poll_timeout_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            poll_timeout_ms: 500,
        }
    }
}

/// Consumes the document stream and writes time-partitioned indices.
pub struct CollectorIndexer {
    store: Arc<dyn ActionStore>,
    source: Arc<dyn DocumentSource>,
    config: IndexerConfig,
    indexed: AtomicU64,
}

impl CollectorIndexer {
    /// Create an indexer with default batching.
    pub fn new(store: Arc<dyn ActionStore>, source: Arc<dyn DocumentSource>) -> Arc<Self> {
        Self::with_config(store, source, IndexerConfig::default())
    }

    /// Create an indexer with explicit batching.
    pub fn with_config(
        store: Arc<dyn ActionStore>,
        source: Arc<dyn DocumentSource>,
        config: IndexerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            source,
            config,
            indexed: AtomicU64::new(0),
        })
    }

    /// Total number of documents written to the store.
    pub fn indexed(&self) -> u64 {
        self.indexed.load(Ordering::Relaxed)
    }

    /// Run the consume loop until shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("collector indexer stopped");
                    return;
                }

                batch = self.source.poll(self.config.batch_size, self.config.poll_timeout_ms) => {
                    match batch {
                        Ok(documents) if !documents.is_empty() => {
                            let count = documents.len() as u64;
                            for document in documents {
                                self.store.upsert(document);
                            }
                            // commit only after the whole batch is stored
                            match self.source.commit().await {
                                Ok(()) => {
                                    self.indexed.fetch_add(count, Ordering::Relaxed);
                                    tracing::debug!(count, "indexed action batch");
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "failed to commit source position");
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to poll action documents");
                        }
                    }
                }
            }
        }
    }

    /// Spawn the consume loop on the current tokio runtime.
    pub fn start(self: &Arc<Self>) -> IndexerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let indexer = Arc::clone(self);
        let task = tokio::spawn(indexer.run(shutdown_rx));
        IndexerHandle {
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running indexer task.
pub struct IndexerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl IndexerHandle {
    /// Signal shutdown and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}
