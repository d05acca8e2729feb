//! Time-partitioned storage of action documents.
//!
//! Documents land in daily indices named `action-YYYY.MM.DD` (UTC) and are
//! upserted by id, so at-least-once delivery from the forwarder is safe.
//! The store trait is the narrow interface the diagram service queries; the
//! in-memory implementation backs tests and single-node deployments, a
//! search cluster can stand behind the same trait in production.

use actra_core::ActionDocument;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Terms-aggregation cap on distinct apps.
pub const ARCH_APP_TERMS: usize = 100;
/// Terms-aggregation cap on distinct actions per app.
pub const ARCH_ACTION_TERMS: usize = 500;
/// Terms-aggregation cap on distinct clients per action.
pub const ARCH_CLIENT_TERMS: usize = 100;

/// Name of the daily index a document belongs to, e.g. `action-2026.08.02`.
pub fn index_name(timestamp: &DateTime<Utc>) -> String {
    format!("action-{}", timestamp.format("%Y.%m.%d"))
}

/// One flattened bucket of the `app → action → client` terms aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchBucket {
    /// The app that executed the actions.
    pub app: String,
    /// The action name.
    pub action: String,
    /// The calling app, when the actions were not roots.
    pub client: Option<String>,
    /// Number of actions in this bucket.
    pub count: u64,
}

/// Query surface over stored action documents.
pub trait ActionStore: Send + Sync {
    /// Insert or replace a document by id.
    fn upsert(&self, document: ActionDocument);

    /// Fetch one document by action id.
    fn get_by_id(&self, id: &str) -> Option<ActionDocument>;

    /// Fetch documents by action id.
    fn find_by_ids(&self, ids: &[String]) -> Vec<ActionDocument>;

    /// Fetch documents whose correlation ids intersect the given set.
    fn find_by_correlation_ids(
        &self,
        correlation_ids: &[String],
        limit: usize,
    ) -> Vec<ActionDocument>;

    /// Aggregate `app → action → client` terms over the last `hours`.
    fn arch_terms(&self, hours: u32) -> Vec<ArchBucket>;

    /// Total number of stored documents.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`ActionStore`] partitioned into daily indices.
#[derive(Debug, Default)]
pub struct MemoryStore {
    indices: RwLock<BTreeMap<String, HashMap<String, ActionDocument>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the names of the indices that hold documents.
    pub fn indices(&self) -> Vec<String> {
        self.indices.read().keys().cloned().collect()
    }
}

impl ActionStore for MemoryStore {
    fn upsert(&self, document: ActionDocument) {
        let index = index_name(&document.timestamp);
        let mut indices = self.indices.write();
        indices
            .entry(index)
            .or_default()
            .insert(document.id.clone(), document);
    }

    fn get_by_id(&self, id: &str) -> Option<ActionDocument> {
        let indices = self.indices.read();
        indices.values().find_map(|index| index.get(id).cloned())
    }

    fn find_by_ids(&self, ids: &[String]) -> Vec<ActionDocument> {
        let indices = self.indices.read();
        let mut documents = Vec::with_capacity(ids.len());
        for index in indices.values() {
            for id in ids {
                if let Some(document) = index.get(id) {
                    documents.push(document.clone());
                }
            }
        }
        documents
    }

    fn find_by_correlation_ids(
        &self,
        correlation_ids: &[String],
        limit: usize,
    ) -> Vec<ActionDocument> {
        let indices = self.indices.read();
        let mut documents = Vec::new();
        for index in indices.values() {
            for document in index.values() {
                if documents.len() >= limit {
                    return documents;
                }
                let matched = document
                    .correlation_id
                    .as_ref()
                    .is_some_and(|ids| ids.iter().any(|id| correlation_ids.contains(id)));
                if matched {
                    documents.push(document.clone());
                }
            }
        }
        documents
    }

    fn arch_terms(&self, hours: u32) -> Vec<ArchBucket> {
        let cutoff = Utc::now() - Duration::hours(i64::from(hours));
        // app -> action -> client(optional) -> count
        let mut terms: BTreeMap<String, BTreeMap<String, BTreeMap<Option<String>, u64>>> =
            BTreeMap::new();
        {
            let indices = self.indices.read();
            for index in indices.values() {
                for document in index.values() {
                    if document.timestamp < cutoff {
                        continue;
                    }
                    let actions = terms.entry(document.app.clone()).or_default();
                    let clients = actions.entry(document.action.clone()).or_default();
                    match document.client {
                        Some(ref names) => {
                            for name in names {
                                *clients.entry(Some(name.clone())).or_insert(0) += 1;
                            }
                        }
                        None => *clients.entry(None).or_insert(0) += 1,
                    }
                }
            }
        }

        // keep the largest terms at each level, like a nested terms
        // aggregation; wide fan-out past the caps is silently truncated
        let mut apps: Vec<_> = terms.into_iter().collect();
        apps.sort_by_key(|(_, actions)| {
            std::cmp::Reverse(actions.values().flat_map(|c| c.values()).sum::<u64>())
        });
        apps.truncate(ARCH_APP_TERMS);

        let mut buckets = Vec::new();
        for (app, actions) in apps {
            let mut actions: Vec<_> = actions.into_iter().collect();
            actions.sort_by_key(|(_, clients)| std::cmp::Reverse(clients.values().sum::<u64>()));
            actions.truncate(ARCH_ACTION_TERMS);
            for (action, clients) in actions {
                let mut clients: Vec<_> = clients.into_iter().collect();
                clients.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
                clients.truncate(ARCH_CLIENT_TERMS);
                for (client, count) in clients {
                    buckets.push(ArchBucket {
                        app: app.clone(),
                        action: action.clone(),
                        client,
                        count,
                    });
                }
            }
        }
        buckets
    }

    fn len(&self) -> usize {
        self.indices.read().values().map(HashMap::len).sum()
    }
}
