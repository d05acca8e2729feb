//! Architecture diagram: who calls whom, over a time window.

use super::escape_label;
use crate::index::ArchBucket;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Directed app-to-app call graph built from aggregated actions.
///
/// Nodes are apps; an edge `client → app` is labeled with the aggregated
/// action names. Excluded apps disappear along with every edge touching
/// them.
#[derive(Debug)]
pub struct ArchDiagram {
    exclude_apps: HashSet<String>,
    apps: BTreeSet<String>,
    edges: BTreeMap<(String, String), BTreeSet<String>>,
}

impl ArchDiagram {
    /// Create an empty diagram with the given exclusions.
    pub fn new(exclude_apps: HashSet<String>) -> Self {
        Self {
            exclude_apps,
            apps: BTreeSet::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Load the aggregation buckets.
    pub fn load(&mut self, buckets: &[ArchBucket]) {
        for bucket in buckets {
            if self.exclude_apps.contains(&bucket.app) {
                continue;
            }
            self.apps.insert(bucket.app.clone());
            if let Some(ref client) = bucket.client {
                if self.exclude_apps.contains(client) {
                    continue;
                }
                self.apps.insert(client.clone());
                self.edges
                    .entry((client.clone(), bucket.app.clone()))
                    .or_default()
                    .insert(bucket.action.clone());
            }
        }
    }

    /// Render as Graphviz dot text.
    pub fn dot(&self) -> String {
        let mut dot = String::from("digraph arch {\n");
        dot.push_str("    rankdir=LR;\n");
        dot.push_str("    node [shape=box, fontsize=10];\n");
        dot.push_str("    edge [fontsize=8];\n");
        for app in &self.apps {
            dot.push_str(&format!("    \"{}\";\n", escape_label(app)));
        }
        for ((client, app), actions) in &self.edges {
            let label: Vec<String> = actions.iter().map(|action| escape_label(action)).collect();
            dot.push_str(&format!(
                "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
                escape_label(client),
                escape_label(app),
                label.join("\\n")
            ));
        }
        dot.push_str("}\n");
        dot
    }
}
