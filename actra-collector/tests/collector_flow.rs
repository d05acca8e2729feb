//! End-to-end tests for the collector: producer pipeline → document stream →
//! indexer → store → diagrams.

use actra_collector::diagram::DiagramService;
use actra_collector::index::{CollectorIndexer, IndexerConfig, MemorySource, MemoryStore};
use actra_collector::ActionStore;
use actra_core::log::{manager, Correlation, HeaderAccess, MemoryTransport};
use actra_core::{ActionDocument, LogManager};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct MapHeaders(HashMap<&'static str, String>);

impl HeaderAccess for MapHeaders {
    fn get_header(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Run one root action that fans out to two downstream actions, and return
/// the three emitted documents.
async fn emit_chain() -> Vec<ActionDocument> {
    let transport = Arc::new(MemoryTransport::new());

    let website = LogManager::new("website", "web-1", transport.clone());
    website.begin("http:GET:/checkout", None);
    let outbound = manager::with_current(|log| Correlation::outbound(log, "website")).unwrap();
    website.end(None);
    website.forwarder().start().shutdown().await;

    let headers = MapHeaders(
        outbound
            .iter()
            .map(|(name, value)| (*name, value.clone()))
            .collect(),
    );
    let backend = LogManager::new("backend", "api-1", transport.clone());
    for action in ["api:orders", "api:stock"] {
        backend.begin(action, None);
        let correlation = Correlation::parse(&headers);
        manager::with_current(|log| correlation.apply(log));
        backend.end(None);
    }
    backend.forwarder().start().shutdown().await;

    transport
        .published()
        .iter()
        .map(|record| serde_json::from_slice(&record.payload).unwrap())
        .collect()
}

#[tokio::test]
async fn chain_indexed_and_reconstructed() {
    let documents = emit_chain().await;
    assert_eq!(documents.len(), 3);
    let root_id = documents[0].id.clone();

    // feed the emitted stream through the indexer
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(MemorySource::new());
    for document in documents {
        source.push(document);
    }
    let indexer = CollectorIndexer::with_config(
        store.clone(),
        source.clone(),
        IndexerConfig {
            batch_size: 10,
            poll_timeout_ms: 10,
        },
    );
    let handle = indexer.start();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    handle.shutdown().await;

    assert_eq!(store.len(), 3);
    assert!(source.commits() >= 1);

    // the same causal tree is reachable from the root and from any child
    let diagram = DiagramService::new(store.clone());
    let from_root = diagram.action(&root_id).unwrap();
    assert_eq!(from_root.matches("->").count(), 2);
    assert!(from_root.contains("website:http:GET:/checkout"));
    assert!(from_root.contains("backend:api:orders"));
    assert!(from_root.contains("backend:api:stock"));

    let child_id = store
        .find_by_correlation_ids(&[root_id.clone()], 10)
        .first()
        .unwrap()
        .id
        .clone();
    assert_eq!(diagram.action(&child_id).unwrap(), from_root);
}

#[tokio::test]
async fn arch_diagram_over_emitted_chain() {
    let documents = emit_chain().await;

    let store = Arc::new(MemoryStore::new());
    for document in documents {
        store.upsert(document);
    }

    let diagram = DiagramService::new(store);
    let dot = diagram.arch(24, &HashSet::new());
    assert!(dot.contains("\"website\" -> \"backend\""));
    assert!(dot.contains("api:orders"));
    assert!(dot.contains("\"website\";"));
}

#[tokio::test]
async fn unknown_action_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let diagram = DiagramService::new(store);
    let error = diagram.action("ffffffffffffffffffffffff").unwrap_err();
    assert_eq!(error.error_code(), "NOT_FOUND");
}
