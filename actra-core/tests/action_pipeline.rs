//! End-to-end tests for the producer pipeline: manager → forwarder →
//! transport, asserting on the JSON documents that actually leave the
//! process.

use actra_core::log::{manager, MemoryTransport, TOPIC_ACTION_LOG};
use actra_core::{ActionDocument, ActionResult, LogEvent, LogManager, Trace};
use std::sync::Arc;

fn published_documents(transport: &MemoryTransport) -> Vec<ActionDocument> {
    transport
        .published()
        .iter()
        .map(|record| {
            assert_eq!(record.topic, TOPIC_ACTION_LOG);
            serde_json::from_slice(&record.payload).expect("published payload is a valid document")
        })
        .collect()
}

#[tokio::test]
async fn ok_action_with_stats() {
    let transport = Arc::new(MemoryTransport::new());
    let log_manager = LogManager::new("website", "web-1", transport.clone());

    log_manager.begin("test", None);
    manager::stat("hit", 1.0);
    manager::stat("hit", 1.0);
    log_manager.end(None);

    let handle = log_manager.forwarder().start();
    handle.shutdown().await;

    let documents = published_documents(&transport);
    assert_eq!(documents.len(), 1);
    let document = &documents[0];
    assert_eq!(document.result, ActionResult::Ok);
    assert!(document.error_code.is_none());
    assert_eq!(document.stats.get("hit").copied(), Some(2.0));
    assert!(document.trace_log.is_none());
    assert!(document.is_root);
}

#[tokio::test]
async fn context_overflow_downgrades_to_warn() {
    let transport = Arc::new(MemoryTransport::new());
    let log_manager = LogManager::new("website", "web-1", transport.clone());

    log_manager.begin("test", None);
    manager::context("k", &"x".repeat(1001));
    log_manager.end(None);

    let handle = log_manager.forwarder().start();
    handle.shutdown().await;

    let documents = published_documents(&transport);
    let document = &documents[0];
    assert_eq!(document.result, ActionResult::Warn);
    assert!(document
        .error_message
        .as_deref()
        .unwrap()
        .contains("context value is too long"));
    assert_eq!(document.context.get("k").unwrap(), &vec![String::new()]);
    assert!(document.trace_log.is_some());
}

#[tokio::test]
async fn warn_event_defaults_error_code() {
    let transport = Arc::new(MemoryTransport::new());
    let log_manager = LogManager::new("website", "web-1", transport.clone());

    log_manager.begin("test", None);
    manager::process(LogEvent::warn("logger", "warn msg"));
    log_manager.end(None);

    let handle = log_manager.forwarder().start();
    handle.shutdown().await;

    let documents = published_documents(&transport);
    let document = &documents[0];
    assert_eq!(document.result, ActionResult::Warn);
    assert_eq!(document.error_code.as_deref(), Some("UNASSIGNED"));
    assert_eq!(document.error_message.as_deref(), Some("warn msg"));
    assert!(document.trace_log.as_deref().unwrap().contains("warn msg"));
}

#[tokio::test]
async fn track_aggregates_per_resource() {
    let transport = Arc::new(MemoryTransport::new());
    let log_manager = LogManager::new("website", "web-1", transport.clone());

    log_manager.begin("test", None);
    assert_eq!(manager::track("db", 1000, 1, 0), Some(1));
    assert_eq!(manager::track("db", 1000, 1, 1), Some(2));
    log_manager.end(None);

    let handle = log_manager.forwarder().start();
    handle.shutdown().await;

    let documents = published_documents(&transport);
    let stat = documents[0].perf_stats.get("db").unwrap();
    assert_eq!(stat.count, 2);
    assert_eq!(stat.total_elapsed, 2000);
    assert_eq!(stat.read_entries, 2);
    assert_eq!(stat.write_entries, 1);
}

#[tokio::test]
async fn cascade_flushes_trace_without_anomalies() {
    let transport = Arc::new(MemoryTransport::new());
    let log_manager = LogManager::new("website", "web-1", transport.clone());

    log_manager.begin("test", None);
    manager::with_current(|log| log.trace = Trace::Cascade);
    log_manager.end(None);

    let handle = log_manager.forwarder().start();
    handle.shutdown().await;

    let documents = published_documents(&transport);
    let document = &documents[0];
    assert_eq!(document.result, ActionResult::Ok);
    assert!(document.trace_log.is_some());
}

#[tokio::test]
async fn records_partitioned_by_app() {
    let transport = Arc::new(MemoryTransport::new());
    let log_manager = LogManager::new("checkout", "web-1", transport.clone());

    log_manager.begin("test", None);
    log_manager.end(None);

    let handle = log_manager.forwarder().start();
    handle.shutdown().await;

    let records = transport.published();
    assert_eq!(records[0].key.as_deref(), Some("checkout"));
}
