//! Structured action logging.
//!
//! Every inbound unit of work (HTTP request, Kafka batch, scheduled job) runs
//! inside an *action*. The action's lifecycle accumulates one bounded record:
//! identity, timing, correlation, outcome, performance breakdown, contextual
//! key/values, and a size-limited trace. Completed records are forwarded to
//! the `action-log` topic for the collector to index.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐ begin/end ┌────────────┐  submit  ┌──────────────┐
//! │ listener │──────────>│ LogManager │─────────>│ LogForwarder │──> action-log
//! └──────────┘           └────────────┘          └──────────────┘
//!                              │ thread-local
//!                              v
//!                        ┌───────────┐   ┌─────────────┐
//!                        │ ActionLog │──>│ TraceBuffer │
//!                        └───────────┘   └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use actra_core::log::{manager, LogManager, MemoryTransport};
//! use std::sync::Arc;
//!
//! let log_manager = LogManager::new("website", "web-1", Arc::new(MemoryTransport::new()));
//! let handle = log_manager.forwarder().start();
//!
//! log_manager.begin("http:GET:/hello/:name", None);
//! manager::context("customer_id", "c-42");
//! manager::track("db", 1_200_000, 1, 0);
//! log_manager.end(None);
//! ```

mod action;
mod correlation;
mod document;
mod event;
mod filter;
mod forwarder;
mod layer;
pub mod manager;
mod perf;
mod trace;

pub use action::{ActionLog, Trace, MAX_CONTEXT_VALUE_LENGTH};
pub use correlation::{
    Correlation, HeaderAccess, HEADER_CLIENT, HEADER_CORRELATION_ID, HEADER_REF_ID, HEADER_TRACE,
};
pub use document::ActionDocument;
pub use event::{ActionResult, LogEvent, LogLevel};
pub use filter::{LogFilter, MASK};
#[cfg(feature = "kafka")]
pub use forwarder::KafkaTransport;
pub use forwarder::{
    ForwarderHandle, LogForwarder, LogTransport, MemoryTransport, PublishedRecord,
    TransportFuture, DEFAULT_QUEUE_CAPACITY, TOPIC_ACTION_LOG, TOPIC_EVENT, TOPIC_STAT,
};
pub use layer::ActionLogLayer;
pub use manager::LogManager;
pub use perf::{PerformanceStat, PerformanceTracker};
pub use trace::{TraceBuffer, HARD_TRACE_SUFFIX, MAX_TRACE_EVENTS, SOFT_TRACE_SUFFIX};
