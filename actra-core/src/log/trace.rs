//! Bounded trace buffer for one action.
//!
//! Events are collected in order and only rendered to text once, when the
//! action completes and the trace is flushed. Rendering applies a soft and a
//! hard character limit: past the soft limit only warning/error events are
//! still rendered, and a cut that lands inside a warning line is extended to
//! the end of that line so the anomaly is never half-reported.

use super::event::{LogEvent, LogLevel};

/// Marker appended when rendering stops at the soft limit.
pub const SOFT_TRACE_SUFFIX: &str = "...(soft trace limit reached)\n";

/// Marker appended when rendering stops at the hard limit.
pub const HARD_TRACE_SUFFIX: &str = "...(hard trace limit reached)";

/// Maximum number of events one buffer accumulates.
///
/// Render-time truncation bounds the output, not the memory held while the
/// action runs; this cap guards a runaway loop inside one action.
pub const MAX_TRACE_EVENTS: usize = 5000;

/// Append-only event buffer with render-time truncation.
#[derive(Debug, Default)]
pub struct TraceBuffer {
    events: Vec<LogEvent>,
    overflowed: bool,
}

impl TraceBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    ///
    /// Past [`MAX_TRACE_EVENTS`] the event is dropped; a single warning
    /// marker event records that the cap was hit.
    pub fn append(&mut self, event: LogEvent) {
        if self.events.len() >= MAX_TRACE_EVENTS {
            if !self.overflowed {
                self.overflowed = true;
                self.events.push(LogEvent::warn(
                    "trace_buffer",
                    "...(max trace events reached)",
                ));
            }
            return;
        }
        self.events.push(event);
    }

    /// Get the number of buffered events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render the buffer to text, honoring the soft and hard char limits.
    ///
    /// Events are rendered in order. Once output reaches the soft limit,
    /// events below warning level are skipped (the first skip appends
    /// [`SOFT_TRACE_SUFFIX`]); warning/error events are still rendered in
    /// full. A warning line that itself crosses the soft limit is completed
    /// before the marker is appended. Output never exceeds the hard limit:
    /// when it would, it is cut at exactly `hard_limit` chars and
    /// [`HARD_TRACE_SUFFIX`] is appended.
    pub fn render(&self, soft_limit: usize, hard_limit: usize) -> String {
        let soft_limit = soft_limit.min(hard_limit);
        let mut out = String::new();
        let mut truncated = false;
        for event in &self.events {
            if truncated && event.level < LogLevel::Warn {
                continue;
            }
            let block = event.format_line();
            if event.level < LogLevel::Warn {
                let available = soft_limit.saturating_sub(out.len());
                if block.len() >= available {
                    out.push_str(truncate_at_char_boundary(&block, available));
                    out.push_str(SOFT_TRACE_SUFFIX);
                    truncated = true;
                    continue;
                }
                out.push_str(&block);
            } else {
                out.push_str(&block);
                if out.len() >= hard_limit {
                    let cut = floor_char_boundary(&out, hard_limit);
                    out.truncate(cut);
                    out.push_str(HARD_TRACE_SUFFIX);
                    return out;
                }
                if !truncated && out.len() >= soft_limit {
                    out.push_str(SOFT_TRACE_SUFFIX);
                    truncated = true;
                }
            }
        }
        out
    }
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    &s[..floor_char_boundary(s, max)]
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debug_event(len: usize) -> LogEvent {
        LogEvent::debug("logger", "x".repeat(len))
    }

    #[test]
    fn render_without_limits_hit() {
        let mut buffer = TraceBuffer::new();
        buffer.append(LogEvent::info("logger", "hello"));
        buffer.append(LogEvent::debug("logger", "world"));

        let trace = buffer.render(10_000, 20_000);
        assert!(trace.contains("INFO logger - hello"));
        assert!(trace.contains("DEBUG logger - world"));
    }

    #[test]
    fn soft_cut_is_exact() {
        let mut buffer = TraceBuffer::new();
        buffer.append(debug_event(300));

        let full = buffer.render(10_000, 20_000);
        let trace = buffer.render(100, 1000);
        assert_eq!(trace.len(), 100 + SOFT_TRACE_SUFFIX.len());
        assert!(trace.starts_with(&full[..100]));
        assert!(trace.ends_with(SOFT_TRACE_SUFFIX));
    }

    #[test]
    fn debug_events_skipped_after_soft_cut() {
        let mut buffer = TraceBuffer::new();
        buffer.append(debug_event(300));
        buffer.append(LogEvent::debug("logger", "should not appear"));

        let trace = buffer.render(100, 1000);
        assert_eq!(trace.matches(SOFT_TRACE_SUFFIX).count(), 1);
        assert!(!trace.contains("should not appear"));
    }

    #[test]
    fn warning_still_rendered_after_soft_cut() {
        let mut buffer = TraceBuffer::new();
        buffer.append(debug_event(300));
        buffer.append(LogEvent::warn("logger", "boom"));

        let trace = buffer.render(100, 1000);
        assert!(trace.contains(SOFT_TRACE_SUFFIX));
        assert!(trace.ends_with("boom\n"));
    }

    #[test]
    fn soft_cut_inside_warning_extends_to_event_boundary() {
        let debug = debug_event(100);
        let warning = LogEvent::warn("logger", "boom");
        let debug_len = debug.format_line().len();
        let warning_len = warning.format_line().len();

        let mut buffer = TraceBuffer::new();
        buffer.append(debug);
        buffer.append(warning);

        // the soft limit lands inside the warning line
        let trace = buffer.render(debug_len + 3, 10_000);
        assert_eq!(
            trace.len(),
            debug_len + warning_len + SOFT_TRACE_SUFFIX.len()
        );
        assert!(trace.contains("boom"));
        assert!(trace.ends_with(SOFT_TRACE_SUFFIX));
    }

    #[test]
    fn hard_cut_is_exact() {
        let debug = debug_event(100);
        let warning = LogEvent::warn("logger", "boom");
        let debug_len = debug.format_line().len();
        let warning_len = warning.format_line().len();

        let mut buffer = TraceBuffer::new();
        buffer.append(debug);
        buffer.append(warning);
        buffer.append(LogEvent::warn("logger", "boom again"));

        let hard = debug_len + warning_len + 5;
        let trace = buffer.render(debug_len + 3, hard);
        assert_eq!(trace.len(), hard + HARD_TRACE_SUFFIX.len());
        assert!(trace.ends_with(HARD_TRACE_SUFFIX));
    }

    #[test]
    fn soft_limit_capped_by_hard_limit() {
        let mut buffer = TraceBuffer::new();
        buffer.append(debug_event(300));

        let trace = buffer.render(500, 100);
        assert_eq!(trace.len(), 100 + SOFT_TRACE_SUFFIX.len());
    }

    #[test]
    fn event_cap() {
        let mut buffer = TraceBuffer::new();
        for _ in 0..(MAX_TRACE_EVENTS + 10) {
            buffer.append(LogEvent::debug("logger", "spin"));
        }

        assert_eq!(buffer.len(), MAX_TRACE_EVENTS + 1);
        let trace = buffer.render(usize::MAX, usize::MAX);
        assert!(trace.contains("max trace events reached"));
    }
}
