//! The serialized, immutable record emitted at action end.
//!
//! Documents are JSON-encoded onto the `action-log` topic and indexed by the
//! collector. Field names are fixed for index compatibility:
//! `@timestamp`, `correlation_id`, `ref_id`, `client` and friends are what
//! the index template maps.

use super::event::ActionResult;
use super::perf::PerformanceStat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One completed action, ready for transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDocument {
    /// Wall-clock start time of the action.
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Unique action id (24 hex chars).
    pub id: String,
    /// Name of the emitting application.
    pub app: String,
    /// Host the action ran on.
    pub host: String,
    /// Logical action name.
    pub action: String,
    /// Final outcome.
    pub result: ActionResult,
    /// Whether this action is the root of its causal chain.
    ///
    /// Roots also omit `correlation_id`; branch on this flag, not on the
    /// field's absence.
    pub is_root: bool,
    /// Elapsed wall-clock time in nanoseconds.
    pub elapsed: u64,
    /// CPU time consumed by the owning thread, in nanoseconds.
    pub cpu_time: u64,
    /// Stable error code, present when the result is not `OK`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// First warning/error message, truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Root-action ids of the causal chain; absent for roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Vec<String>>,
    /// Ids of the immediate caller actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<Vec<String>>,
    /// App names of the immediate callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<Vec<String>>,
    /// Contextual key/values.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, Vec<String>>,
    /// Additive named counters.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub stats: HashMap<String, f64>,
    /// Per-resource performance breakdown.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub perf_stats: HashMap<String, PerformanceStat>,
    /// Rendered trace, present only when the action flushed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_log: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ActionDocument {
        ActionDocument {
            timestamp: Utc::now(),
            id: "8f1c3e5a7b9d0f2e4a6c8b1d".to_string(),
            app: "website".to_string(),
            host: "web-1".to_string(),
            action: "http:GET:/hello/:name".to_string(),
            result: ActionResult::Ok,
            is_root: true,
            elapsed: 1_500_000,
            cpu_time: 900_000,
            error_code: None,
            error_message: None,
            correlation_id: None,
            ref_id: None,
            client: None,
            context: HashMap::new(),
            stats: HashMap::new(),
            perf_stats: HashMap::new(),
            trace_log: None,
        }
    }

    #[test]
    fn serde_roundtrip() {
        let mut doc = document();
        doc.context
            .insert("customer_id".to_string(), vec!["c-42".to_string()]);
        doc.stats.insert("hit".to_string(), 2.0);
        doc.perf_stats.insert(
            "db".to_string(),
            PerformanceStat {
                count: 2,
                total_elapsed: 2000,
                read_entries: 2,
                write_entries: 1,
            },
        );

        let json = serde_json::to_string(&doc).unwrap();
        let parsed: ActionDocument = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, doc.id);
        assert_eq!(parsed.result, ActionResult::Ok);
        assert_eq!(parsed.stats.get("hit").copied(), Some(2.0));
        assert_eq!(parsed.perf_stats.get("db").unwrap().count, 2);
    }

    #[test]
    fn root_omits_correlation_id() {
        let doc = document();
        let json = serde_json::to_string(&doc).unwrap();

        assert!(json.contains("\"@timestamp\""));
        assert!(json.contains("\"is_root\":true"));
        assert!(!json.contains("correlation_id"));
        assert!(!json.contains("trace_log"));
    }

    #[test]
    fn non_root_carries_lists() {
        let mut doc = document();
        doc.is_root = false;
        doc.correlation_id = Some(vec!["aaaaaaaaaaaaaaaaaaaaaaaa".to_string()]);
        doc.ref_id = Some(vec!["bbbbbbbbbbbbbbbbbbbbbbbb".to_string()]);
        doc.client = Some(vec!["frontend".to_string()]);

        let json = serde_json::to_string(&doc).unwrap();
        let parsed: ActionDocument = serde_json::from_str(&json).unwrap();

        assert!(!parsed.is_root);
        assert_eq!(parsed.correlation_id.unwrap().len(), 1);
        assert_eq!(parsed.client.unwrap()[0], "frontend");
    }
}
