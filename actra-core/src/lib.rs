//! actra core library
//!
//! This crate provides the producer side of the actra action-logging
//! pipeline: the per-action accumulator, the thread-binding log manager,
//! correlation propagation, field masking, and best-effort record
//! forwarding to the `action-log` topic.
//!
//! # Key components
//!
//! - **ActionLog**: state machine for a single action (context, stats,
//!   performance breakdown, outcome, trace buffer)
//! - **LogManager**: binds an action to the executing thread, intercepts
//!   logging events, emits the record at action end
//! - **Correlation**: `x-correlation-id`/`x-ref-id`/`x-client`/`x-trace`
//!   propagation across process hops
//! - **LogForwarder**: bounded drop-oldest queue in front of the transport
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
//! log_manager.end(None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod log;
pub mod types;

// Re-export key types at crate root for convenience
pub use config::LogConfig;
pub use error::{ActraError, Result};
pub use log::{
    ActionDocument, ActionLog, ActionResult, Correlation, LogEvent, LogFilter, LogForwarder,
    LogLevel, LogManager, Trace,
};
pub use types::ActionId;
