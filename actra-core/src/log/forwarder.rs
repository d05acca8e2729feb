//! Best-effort forwarding of completed action records.
//!
//! Request threads hand completed documents to a bounded in-memory queue and
//! return immediately; a dedicated background task serializes and publishes
//! them. A stuck collector must never stall request threads, so the queue
//! drops its oldest record on overflow. Drops and publish failures are
//! counted in process-wide atomics and surfaced on the next begun action,
//! never on the failing path itself.

use super::document::ActionDocument;
use crate::error::{ActraError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

/// Topic carrying completed action records.
pub const TOPIC_ACTION_LOG: &str = "action-log";
/// Companion topic for process-wide gauges (same transport, separate pipeline).
pub const TOPIC_STAT: &str = "stat";
/// Companion topic for structured business events (same transport, separate pipeline).
pub const TOPIC_EVENT: &str = "event";

/// Default forwarding queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Transport seam for publishing serialized records.
///
/// Publishing is at-least-once: a record for which `publish` returns `Ok`
/// may still be seen more than once by the collector, which upserts by id.
pub trait LogTransport: Send + Sync {
    /// Publish one payload to a topic, optionally keyed for partitioning.
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        key: Option<&'a str>,
        payload: Vec<u8>,
    ) -> TransportFuture<'a, ()>;
}

/// One record captured by [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct PublishedRecord {
    /// Topic the record was published to.
    pub topic: String,
    /// Partition key, if any.
    pub key: Option<String>,
    /// Serialized payload.
    pub payload: Vec<u8>,
}

/// In-memory transport for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    records: Mutex<Vec<PublishedRecord>>,
    failing: std::sync::atomic::AtomicBool,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail (to exercise failure accounting).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all captured records.
    pub fn published(&self) -> Vec<PublishedRecord> {
        self.records.lock().clone()
    }

    /// Get the number of captured records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check whether nothing was published.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogTransport for MemoryTransport {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        key: Option<&'a str>,
        payload: Vec<u8>,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ActraError::RemoteService {
                    service: "memory".to_string(),
                    cause: "transport set to failing".to_string(),
                });
            }
            self.records.lock().push(PublishedRecord {
                topic: topic.to_string(),
                key: key.map(str::to_string),
                payload,
            });
            Ok(())
        })
    }
}

/// Kafka transport backed by an `rdkafka` producer.
///
/// Requires the `kafka` feature and librdkafka.
#[cfg(feature = "kafka")]
pub struct KafkaTransport {
    producer: rdkafka::producer::FutureProducer,
}

#[cfg(feature = "kafka")]
impl KafkaTransport {
    /// Create a producer against the given brokers.
    pub fn new(brokers: &str) -> Result<Self> {
        let producer = rdkafka::ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("linger.ms", "5")
            .set("compression.type", "snappy")
            .create()
            .map_err(|e| ActraError::RemoteService {
                service: "kafka".to_string(),
                cause: format!("failed to create producer: {}", e),
            })?;
        Ok(Self { producer })
    }
}

#[cfg(feature = "kafka")]
impl LogTransport for KafkaTransport {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        key: Option<&'a str>,
        payload: Vec<u8>,
    ) -> TransportFuture<'a, ()> {
        use rdkafka::producer::FutureRecord;
        use rdkafka::util::Timeout;

        Box::pin(async move {
            let mut record = FutureRecord::<str, Vec<u8>>::to(topic).payload(&payload);
            if let Some(key) = key {
                record = record.key(key);
            }
            self.producer
                .send(record, Timeout::After(std::time::Duration::from_secs(10)))
                .await
                .map_err(|(e, _)| ActraError::RemoteService {
                    service: "kafka".to_string(),
                    cause: e.to_string(),
                })?;
            Ok(())
        })
    }
}

/// Bounded multi-producer single-consumer forwarding queue.
pub struct LogForwarder {
    queue: Mutex<VecDeque<ActionDocument>>,
    capacity: usize,
    notify: Notify,
    transport: Arc<dyn LogTransport>,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl LogForwarder {
    /// Create a forwarder over the given transport.
    pub fn new(transport: Arc<dyn LogTransport>, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
            transport,
            dropped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        })
    }

    /// Create a forwarder with the default queue capacity.
    pub fn with_default_capacity(transport: Arc<dyn LogTransport>) -> Arc<Self> {
        Self::new(transport, DEFAULT_QUEUE_CAPACITY)
    }

    /// Enqueue one completed document. Never blocks: on a full queue the
    /// oldest record is dropped and counted.
    pub fn submit(&self, document: ActionDocument) {
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                queue.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(document);
        }
        self.notify.notify_one();
    }

    /// Get the number of queued records.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Check whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Take and reset the count of records dropped on overflow.
    pub fn take_dropped(&self) -> u64 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Take and reset the count of failed publishes.
    pub fn take_failed(&self) -> u64 {
        self.failed.swap(0, Ordering::Relaxed)
    }

    pub(crate) fn pop(&self) -> Option<ActionDocument> {
        self.queue.lock().pop_front()
    }

    /// Run the publishing loop until shutdown; drains the queue on exit.
    pub async fn run(self: Arc<Self>, mut shutdown: oneshot::Receiver<()>) {
        loop {
            self.drain().await;
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = &mut shutdown => {
                    self.drain().await;
                    tracing::debug!("log forwarder stopped");
                    return;
                }
            }
        }
    }

    /// Spawn the publishing loop on the current tokio runtime.
    pub fn start(self: &Arc<Self>) -> ForwarderHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let forwarder = Arc::clone(self);
        let task = tokio::spawn(forwarder.run(shutdown_rx));
        ForwarderHandle {
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    async fn drain(&self) {
        while let Some(document) = self.pop() {
            if let Err(e) = self.publish(document).await {
                // errors inside the logging pipeline never propagate;
                // the count surfaces on the next begun action
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "failed to forward action log");
            }
        }
    }

    async fn publish(&self, document: ActionDocument) -> Result<()> {
        let payload =
            serde_json::to_vec(&document).map_err(|e| ActraError::Serialization(e.to_string()))?;
        self.transport
            .publish(TOPIC_ACTION_LOG, Some(document.app.as_str()), payload)
            .await
    }
}

/// Handle to a running forwarder task.
pub struct ForwarderHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ForwarderHandle {
    /// Signal shutdown and wait for the final drain to complete.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}
