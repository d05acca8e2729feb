//! Diagram reconstruction over stored actions.
//!
//! Two views: the *arch* diagram aggregates recent actions into an
//! app-to-app call graph; the *action* diagram rebuilds one causal chain
//! from its correlation and ref ids.

mod action;
mod arch;

pub use action::ActionDiagram;
pub use arch::ArchDiagram;

use crate::index::ActionStore;
use actra_core::error::Result;
use actra_core::ActraError;
use std::collections::HashSet;
use std::sync::Arc;

/// Cap on actions fetched per correlation chain.
pub const MAX_CORRELATED_ACTIONS: usize = 10_000;

/// Escape a value for use inside a dot double-quoted string.
///
/// App and action names are not charset-restricted, so quotes, backslashes
/// and newlines must not break out of the literal.
pub(crate) fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// Builds diagrams from the action store.
pub struct DiagramService {
    store: Arc<dyn ActionStore>,
}

impl DiagramService {
    /// Create a service over the given store.
    pub fn new(store: Arc<dyn ActionStore>) -> Self {
        Self { store }
    }

    /// Build the app architecture diagram over the last `hours`.
    pub fn arch(&self, hours: u32, exclude_apps: &HashSet<String>) -> String {
        let buckets = self.store.arch_terms(hours);
        let mut diagram = ArchDiagram::new(exclude_apps.clone());
        diagram.load(&buckets);
        diagram.dot()
    }

    /// Build the causal diagram of the chain containing `action_id`.
    ///
    /// A root action anchors its own chain; a non-root action is resolved
    /// through its correlation ids, which name the chain's root actions.
    pub fn action(&self, action_id: &str) -> Result<String> {
        let action = self
            .store
            .get_by_id(action_id)
            .ok_or_else(|| ActraError::NotFound {
                what: "action".to_string(),
                id: action_id.to_string(),
            })?;

        let mut diagram = ActionDiagram::new();
        let is_root = action.is_root;
        if is_root {
            diagram.add(&action);
        }
        let correlation_ids = if is_root {
            vec![action_id.to_string()]
        } else {
            action.correlation_id.clone().unwrap_or_default()
        };
        for document in self
            .store
            .find_by_correlation_ids(&correlation_ids, MAX_CORRELATED_ACTIONS)
        {
            diagram.add(&document);
        }
        if !is_root {
            // correlation ids name the chain's root actions; fetch them too
            for document in self.store.find_by_ids(&correlation_ids) {
                diagram.add(&document);
            }
        }
        Ok(diagram.dot())
    }
}
