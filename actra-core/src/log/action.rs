//! The in-memory accumulator for one action.
//!
//! An [`ActionLog`] is created when a boundary listener begins an action and
//! accumulates everything the final record needs: identity, timing,
//! correlation, contextual key/values, additive stats, per-resource
//! performance numbers, the outcome, and the trace buffer. It is owned by
//! exactly one thread at a time and is never mutated concurrently.

use super::event::{ActionResult, LogEvent, LogLevel};
use super::perf::{PerformanceStat, PerformanceTracker};
use super::trace::TraceBuffer;
use crate::types::ActionId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;

/// Maximum length (in chars) of one context value and of the error message.
pub const MAX_CONTEXT_VALUE_LENGTH: usize = 1000;

/// Logger name used for the action's own lifecycle trace lines.
pub(crate) const ACTION_LOGGER: &str = "action_log";

/// Error code recorded for warnings that don't supply one.
const UNASSIGNED_ERROR_CODE: &str = "UNASSIGNED";

/// Trace sampling decision for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trace {
    /// Keep the trace only if the action recorded a warning or error.
    #[default]
    None,
    /// Flush this action's trace regardless of outcome.
    Current,
    /// Flush this action's trace and tell downstream actions to do the same.
    Cascade,
}

impl Trace {
    /// Parse a trace mode from its wire form (`CURRENT`, `CASCADE`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CURRENT" => Some(Self::Current),
            "CASCADE" => Some(Self::Cascade),
            _ => None,
        }
    }

    /// Get the wire form, or `None` for the default mode.
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Current => Some("CURRENT"),
            Self::Cascade => Some("CASCADE"),
        }
    }
}

/// State machine for a single action.
#[derive(Debug)]
pub struct ActionLog {
    /// Unique id of this action.
    pub id: ActionId,
    /// Wall-clock start time.
    pub date: DateTime<Utc>,
    /// Logical action name (e.g. `http:GET:/hello/:name`, `kafka:topic-x`).
    pub action: String,
    /// First error code recorded, if any.
    pub error_code: Option<String>,
    /// First warning/error message recorded, truncated.
    pub error_message: Option<String>,
    /// Contextual key/values; values under one key keep insertion order.
    pub context: HashMap<String, Vec<String>>,
    /// Additive named counters.
    pub stats: HashMap<String, f64>,
    /// Root-action ids of the causal chain; empty means this is a root.
    pub correlation_ids: Vec<String>,
    /// Ids of the immediate caller actions.
    pub ref_ids: Vec<String>,
    /// App names of the immediate callers.
    pub clients: Vec<String>,
    /// Trace sampling decision.
    pub trace: Trace,
    start: Instant,
    result: ActionResult,
    perf: PerformanceTracker,
    trace_buffer: TraceBuffer,
    max_context_value_length: usize,
}

impl ActionLog {
    /// Create the log for a new action; generates an id if none is supplied.
    pub fn new(action: &str, id: Option<ActionId>) -> Self {
        let id = id.unwrap_or_default();
        let mut log = Self {
            id,
            date: Utc::now(),
            action: action.to_string(),
            error_code: None,
            error_message: None,
            context: HashMap::new(),
            stats: HashMap::new(),
            correlation_ids: Vec::new(),
            ref_ids: Vec::new(),
            clients: Vec::new(),
            trace: Trace::None,
            start: Instant::now(),
            result: ActionResult::Ok,
            perf: PerformanceTracker::new(),
            trace_buffer: TraceBuffer::new(),
            max_context_value_length: MAX_CONTEXT_VALUE_LENGTH,
        };
        log.trace_buffer
            .append(LogEvent::info(ACTION_LOGGER, "=== action begin ==="));
        log.trace_buffer.append(LogEvent::debug(
            ACTION_LOGGER,
            format!("[context] id={}, action={}", id, action),
        ));
        log
    }

    /// Override the context value length limit.
    pub fn with_context_limit(mut self, max_context_value_length: usize) -> Self {
        self.max_context_value_length = max_context_value_length;
        self
    }

    /// Append a context value under a key.
    ///
    /// Values longer than the limit are not stored: an empty value takes
    /// their place and the action is downgraded to `WARN`.
    pub fn context(&mut self, key: &str, value: &str) {
        if value.chars().count() > self.max_context_value_length {
            self.process(LogEvent::warn(
                ACTION_LOGGER,
                format!("context value is too long, key={}", key),
            ));
            self.context
                .entry(key.to_string())
                .or_default()
                .push(String::new());
            return;
        }
        self.context
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Add to a named counter; repeated calls sum.
    pub fn stat(&mut self, name: &str, delta: f64) {
        *self.stats.entry(name.to_string()).or_insert(0.0) += delta;
    }

    /// Track one operation against a resource; returns the running count.
    pub fn track(
        &mut self,
        resource: &str,
        elapsed_nanos: u64,
        read_entries: u64,
        write_entries: u64,
    ) -> u64 {
        self.perf
            .track(resource, elapsed_nanos, read_entries, write_entries)
    }

    /// Process one logging event: record it in the trace buffer and, at
    /// warning level or above, escalate the result and capture the error
    /// code/message.
    pub fn process(&mut self, event: LogEvent) {
        if event.level >= LogLevel::Warn {
            self.result = self.result.max(ActionResult::from_level(event.level));
            // the first event at warning level locks the code
            if self.error_code.is_none() {
                self.error_code = Some(
                    event
                        .error_code
                        .clone()
                        .unwrap_or_else(|| UNASSIGNED_ERROR_CODE.to_string()),
                );
            }
            if self.error_message.is_none() && !event.message.is_empty() {
                self.error_message = Some(truncate_chars(
                    &event.message,
                    self.max_context_value_length,
                ));
            }
        }
        self.trace_buffer.append(event);
    }

    /// Get the current outcome.
    pub fn result(&self) -> ActionResult {
        self.result
    }

    /// Render the trace buffer with the given char limits.
    pub fn trace(&self, soft_limit: usize, hard_limit: usize) -> String {
        self.trace_buffer.render(soft_limit, hard_limit)
    }

    /// Decide whether the trace should be part of the emitted record:
    /// sampling asked for it, or something at warning level happened.
    pub fn flush_trace_log(&self) -> bool {
        self.trace != Trace::None || self.result >= ActionResult::Warn
    }

    /// Nanoseconds elapsed since the action began.
    pub fn elapsed_nanos(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    /// Get the per-resource performance stats accumulated so far.
    pub fn performance_stat(&self, resource: &str) -> Option<&PerformanceStat> {
        self.perf.get(resource)
    }

    /// Take ownership of the accumulated performance stats.
    pub fn take_performance_stats(&mut self) -> HashMap<String, PerformanceStat> {
        std::mem::take(&mut self.perf).into_stats()
    }

    /// Append the end marker to the trace buffer.
    pub fn mark_end(&mut self, elapsed_nanos: u64) {
        self.trace_buffer.append(LogEvent::debug(
            ACTION_LOGGER,
            format!(
                "=== action end ===, result={}, elapsed={}ns",
                self.result, elapsed_nanos
            ),
        ));
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_log() -> ActionLog {
        ActionLog::new("test", ActionId::parse("8f1c3e5a7b9d0f2e4a6c8b1d"))
    }

    #[test]
    fn context_value_too_long() {
        let mut log = action_log();
        log.context("key", &"x".repeat(MAX_CONTEXT_VALUE_LENGTH + 1));

        assert_eq!(log.result(), ActionResult::Warn);
        assert!(
            log.error_message
                .as_deref()
                .unwrap()
                .contains("context value is too long")
        );
        assert_eq!(log.context.get("key").unwrap(), &vec![String::new()]);
    }

    #[test]
    fn multiple_context_values_keep_order() {
        let mut log = action_log();
        log.context("key", "value1");
        log.context("key", "value2");

        assert_eq!(
            log.context.get("key").unwrap(),
            &vec!["value1".to_string(), "value2".to_string()]
        );
    }

    #[test]
    fn flush_trace_log_with_sampling() {
        let mut log = action_log();
        assert!(!log.flush_trace_log());

        log.trace = Trace::Current;
        assert!(log.flush_trace_log());

        log.trace = Trace::Cascade;
        assert!(log.flush_trace_log());
    }

    #[test]
    fn flush_trace_log_with_warning() {
        let mut log = action_log();
        log.process(LogEvent::warn("logger", ""));
        assert!(log.flush_trace_log());
    }

    #[test]
    fn result_escalates_and_never_downgrades() {
        let mut log = action_log();
        assert_eq!(log.result().as_str(), "OK");

        log.process(LogEvent::warn("logger", "warn"));
        assert_eq!(log.result().as_str(), "WARN");

        log.process(LogEvent::error("logger", "error"));
        assert_eq!(log.result().as_str(), "ERROR");

        log.process(LogEvent::warn("logger", "another warn"));
        assert_eq!(log.result().as_str(), "ERROR");
    }

    #[test]
    fn warning_without_code_defaults_to_unassigned() {
        let mut log = action_log();
        assert!(log.error_code.is_none());

        log.process(LogEvent::warn("logger", ""));
        assert_eq!(log.error_code.as_deref(), Some("UNASSIGNED"));
    }

    #[test]
    fn first_warning_locks_error_code() {
        let mut log = action_log();
        log.process(LogEvent::warn("logger", "no code yet"));
        assert_eq!(log.error_code.as_deref(), Some("UNASSIGNED"));

        // later events never replace it, even when they supply a real code
        log.process(LogEvent::error("logger", "boom").with_error_code("NOT_FOUND"));
        assert_eq!(log.error_code.as_deref(), Some("UNASSIGNED"));
    }

    #[test]
    fn supplied_error_code_recorded_when_first() {
        let mut log = action_log();
        log.process(LogEvent::error("logger", "boom").with_error_code("NOT_FOUND"));
        assert_eq!(log.error_code.as_deref(), Some("NOT_FOUND"));

        log.process(LogEvent::error("logger", "boom").with_error_code("FORBIDDEN"));
        assert_eq!(log.error_code.as_deref(), Some("NOT_FOUND"));
    }

    #[test]
    fn error_message_is_truncated() {
        let mut log = action_log();
        log.process(LogEvent::warn(
            "logger",
            "x".repeat(MAX_CONTEXT_VALUE_LENGTH + 1),
        ));

        assert_eq!(
            log.error_message.as_deref().unwrap().len(),
            MAX_CONTEXT_VALUE_LENGTH
        );
    }

    #[test]
    fn first_message_is_kept() {
        let mut log = action_log();
        log.process(LogEvent::warn("logger", "first"));
        log.process(LogEvent::error("logger", "second"));

        assert_eq!(log.error_message.as_deref(), Some("first"));
    }

    #[test]
    fn stat_sums() {
        let mut log = action_log();
        log.stat("stat", 1.0);
        assert_eq!(log.stats.get("stat").copied(), Some(1.0));

        log.stat("stat", 1.0);
        assert_eq!(log.stats.get("stat").copied(), Some(2.0));
    }

    #[test]
    fn track_delegates_to_performance_tracker() {
        let mut log = action_log();
        assert_eq!(log.track("db", 1000, 1, 0), 1);
        assert_eq!(log.track("db", 1000, 1, 1), 2);

        let stat = log.performance_stat("db").unwrap();
        assert_eq!(stat.count, 2);
        assert_eq!(stat.total_elapsed, 2000);
        assert_eq!(stat.read_entries, 2);
        assert_eq!(stat.write_entries, 1);
    }

    #[test]
    fn trace_contains_begin_marker() {
        let log = action_log();
        let trace = log.trace(10_000, 20_000);
        assert!(trace.contains("action_log - === action begin ==="));
        assert!(trace.contains("action=test"));
    }

    #[test]
    fn trace_mode_parse() {
        assert_eq!(Trace::parse("CURRENT"), Some(Trace::Current));
        assert_eq!(Trace::parse("cascade"), Some(Trace::Cascade));
        assert_eq!(Trace::parse("nope"), None);
    }
}
