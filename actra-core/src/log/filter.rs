//! Masking of sensitive fields before record emission.
//!
//! The registry is built once at startup and is immutable afterwards; the
//! log manager applies it to every completed document after truncation and
//! before the record reaches the forwarder.

use super::document::ActionDocument;
use std::collections::HashSet;

/// Replacement written over masked values.
pub const MASK: &str = "******";

/// Registry of context keys whose values must never leave the process.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    masked_keys: HashSet<String>,
}

impl LogFilter {
    /// Create an empty filter (masks nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a context key sensitive.
    pub fn mask(mut self, key: impl Into<String>) -> Self {
        self.masked_keys.insert(key.into());
        self
    }

    /// Check whether a key is masked.
    pub fn is_masked(&self, key: &str) -> bool {
        self.masked_keys.contains(key)
    }

    /// Overwrite sensitive values in a completed document.
    ///
    /// Masks every non-empty value under a masked context key, and the error
    /// message when it quotes one of the masked values.
    pub fn apply(&self, document: &mut ActionDocument) {
        if self.masked_keys.is_empty() {
            return;
        }
        let mut masked_values = Vec::new();
        for (key, values) in &mut document.context {
            if !self.masked_keys.contains(key) {
                continue;
            }
            for value in values {
                if !value.is_empty() {
                    masked_values.push(std::mem::replace(value, MASK.to_string()));
                }
            }
        }
        if let Some(ref mut message) = document.error_message {
            for value in &masked_values {
                if message.contains(value.as_str()) {
                    *message = message.replace(value.as_str(), MASK);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::event::ActionResult;
    use chrono::Utc;
    use std::collections::HashMap;

    fn document_with_context(entries: &[(&str, &str)]) -> ActionDocument {
        let mut context: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in entries {
            context
                .entry((*key).to_string())
                .or_default()
                .push((*value).to_string());
        }
        ActionDocument {
            timestamp: Utc::now(),
            id: "8f1c3e5a7b9d0f2e4a6c8b1d".to_string(),
            app: "website".to_string(),
            host: "web-1".to_string(),
            action: "http:PUT:/user".to_string(),
            result: ActionResult::Ok,
            is_root: true,
            elapsed: 0,
            cpu_time: 0,
            error_code: None,
            error_message: None,
            correlation_id: None,
            ref_id: None,
            client: None,
            context,
            stats: HashMap::new(),
            perf_stats: HashMap::new(),
            trace_log: None,
        }
    }

    #[test]
    fn masks_declared_keys_only() {
        let filter = LogFilter::new().mask("password");
        let mut doc = document_with_context(&[("password", "hunter2"), ("user", "neo")]);

        filter.apply(&mut doc);

        assert_eq!(doc.context.get("password").unwrap()[0], MASK);
        assert_eq!(doc.context.get("user").unwrap()[0], "neo");
    }

    #[test]
    fn masks_every_value_under_a_key() {
        let filter = LogFilter::new().mask("token");
        let mut doc = document_with_context(&[("token", "t1"), ("token", "t2")]);

        filter.apply(&mut doc);

        assert_eq!(doc.context.get("token").unwrap(), &vec![MASK, MASK]);
    }

    #[test]
    fn empty_values_left_alone() {
        let filter = LogFilter::new().mask("password");
        let mut doc = document_with_context(&[]);
        doc.context
            .insert("password".to_string(), vec![String::new()]);

        filter.apply(&mut doc);

        assert_eq!(doc.context.get("password").unwrap()[0], "");
    }

    #[test]
    fn error_message_scrubbed_of_masked_values() {
        let filter = LogFilter::new().mask("password");
        let mut doc = document_with_context(&[("password", "hunter2")]);
        doc.error_message = Some("login rejected for password hunter2".to_string());

        filter.apply(&mut doc);

        let message = doc.error_message.unwrap();
        assert!(!message.contains("hunter2"));
        assert!(message.contains(MASK));
    }

    #[test]
    fn empty_filter_is_a_no_op() {
        let filter = LogFilter::new();
        let mut doc = document_with_context(&[("password", "hunter2")]);

        filter.apply(&mut doc);

        assert_eq!(doc.context.get("password").unwrap()[0], "hunter2");
    }
}
