//! Configuration for the action-log pipeline.

/// Limits applied to the action-log pipeline.
///
/// All limits have production-tested defaults; override per deployment when
/// trace volume or record size warrants it.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Maximum length (in chars) of one context value and of the recorded
    /// error message.
    pub max_context_value_length: usize,
    /// Soft trace limit in chars: rendering past this point only continues
    /// through warning/error events.
    pub soft_trace_limit: usize,
    /// Hard trace limit in chars: rendering never exceeds this.
    pub hard_trace_limit: usize,
    /// Capacity of the forwarding queue; overflow drops the oldest record.
    pub queue_capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_context_value_length: 1000,
            soft_trace_limit: 30_000,
            hard_trace_limit: 3_000_000,
            queue_capacity: 1024,
        }
    }
}
