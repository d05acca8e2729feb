//! Per-action causal diagram: one chain of actions, callers to callees.

use super::escape_label;
use actra_core::ActionDocument;
use std::collections::{BTreeMap, BTreeSet};

/// Causal tree of one action chain.
///
/// Nodes are actions labeled `app:action`; edges follow ref ids from caller
/// to callee. Failed actions are highlighted.
#[derive(Debug, Default)]
pub struct ActionDiagram {
    nodes: BTreeMap<String, Node>,
    edges: BTreeSet<(String, String)>,
}

#[derive(Debug)]
struct Node {
    label: String,
    failed: bool,
}

impl ActionDiagram {
    /// Create an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one action to the diagram.
    pub fn add(&mut self, document: &ActionDocument) {
        self.nodes.insert(
            document.id.clone(),
            Node {
                label: format!("{}:{}", document.app, document.action),
                failed: document.result == actra_core::ActionResult::Error,
            },
        );
        if let Some(ref ref_ids) = document.ref_id {
            for ref_id in ref_ids {
                self.edges.insert((ref_id.clone(), document.id.clone()));
            }
        }
    }

    /// Render as Graphviz dot text.
    ///
    /// Edges pointing at actions that were never fetched (truncated fan-out,
    /// records not yet indexed) are dropped rather than rendered as bare ids.
    pub fn dot(&self) -> String {
        let mut dot = String::from("digraph action {\n");
        dot.push_str("    rankdir=LR;\n");
        dot.push_str("    node [shape=box, fontsize=10];\n");
        for (id, node) in &self.nodes {
            let id = escape_label(id);
            let label = escape_label(&node.label);
            if node.failed {
                dot.push_str(&format!("    \"{}\" [label=\"{}\", color=red];\n", id, label));
            } else {
                dot.push_str(&format!("    \"{}\" [label=\"{}\"];\n", id, label));
            }
        }
        for (from, to) in &self.edges {
            if self.nodes.contains_key(from) && self.nodes.contains_key(to) {
                dot.push_str(&format!(
                    "    \"{}\" -> \"{}\";\n",
                    escape_label(from),
                    escape_label(to)
                ));
            }
        }
        dot.push_str("}\n");
        dot
    }
}
