//! Binding of actions to threads, and record emission at action end.
//!
//! The manager owns the ambient per-thread context: `begin` creates an
//! [`ActionLog`] and binds it to the executing thread, every logging event
//! issued while it is bound is routed into it through [`process`], and `end`
//! finalizes the outcome, applies the field filter, and hands the record to
//! the forwarder. Everything in between finds the current action through the
//! thread-local slot, so application code never threads a handle around.
//!
//! Handing work to a pooled worker is explicit: the caller takes the log with
//! [`take_current`], moves it to the worker, and the worker rebinds it with
//! [`bind`] before running and unbinds on exit.

use super::action::{ActionLog, ACTION_LOGGER};
use super::document::ActionDocument;
use super::event::LogEvent;
use super::filter::LogFilter;
use super::forwarder::{LogForwarder, LogTransport};
use crate::config::LogConfig;
use crate::error::{error_code_from_type, ActraError};
use crate::types::ActionId;
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CURRENT_ACTION: RefCell<Option<ActionLog>> = const { RefCell::new(None) };
}

/// Run a closure against the action bound to the current thread, if any.
pub fn with_current<R>(f: impl FnOnce(&mut ActionLog) -> R) -> Option<R> {
    CURRENT_ACTION.with(|slot| slot.borrow_mut().as_mut().map(f))
}

/// Check whether an action is bound to the current thread.
pub fn is_bound() -> bool {
    CURRENT_ACTION.with(|slot| slot.borrow().is_some())
}

/// Bind an action log to the current thread.
///
/// # Panics
/// Panics if an action is already bound: nested binding without an
/// intervening `end`/`take_current` is a programming error.
pub fn bind(log: ActionLog) {
    CURRENT_ACTION.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            panic!("an action is already bound to the current thread");
        }
        *slot = Some(log);
    });
}

/// Unbind and return the action log bound to the current thread.
pub fn take_current() -> Option<ActionLog> {
    CURRENT_ACTION.with(|slot| slot.borrow_mut().take())
}

/// Append a context value to the current action.
pub fn context(key: &str, value: &str) {
    with_current(|log| log.context(key, value));
}

/// Add to a named counter on the current action.
pub fn stat(name: &str, delta: f64) {
    with_current(|log| log.stat(name, delta));
}

/// Track one resource operation on the current action; returns the running
/// count, or `None` when no action is bound.
pub fn track(resource: &str, elapsed_nanos: u64, read_entries: u64, write_entries: u64) -> Option<u64> {
    with_current(|log| log.track(resource, elapsed_nanos, read_entries, write_entries))
}

/// Route one logging event into the current action.
///
/// Events emitted outside any action are dropped; the process-level
/// `tracing` subscriber still sees them.
pub fn process(event: LogEvent) {
    with_current(|log| log.process(event));
}

/// Creates, finalizes, and emits action logs.
///
/// The manager owns the forwarding queue: it is built from
/// [`LogConfig::queue_capacity`], so all pipeline limits are configured in
/// one place.
pub struct LogManager {
    app: String,
    host: String,
    config: LogConfig,
    filter: LogFilter,
    transport: Arc<dyn LogTransport>,
    forwarder: Arc<LogForwarder>,
}

impl LogManager {
    /// Create a manager for the given app identity, forwarding records over
    /// the given transport.
    pub fn new(
        app: impl Into<String>,
        host: impl Into<String>,
        transport: Arc<dyn LogTransport>,
    ) -> Self {
        let config = LogConfig::default();
        let forwarder = LogForwarder::new(transport.clone(), config.queue_capacity);
        Self {
            app: app.into(),
            host: host.into(),
            config,
            filter: LogFilter::new(),
            transport,
            forwarder,
        }
    }

    /// Override the pipeline limits.
    ///
    /// Rebuilds the forwarding queue with the configured capacity; call
    /// before starting the forwarder.
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.forwarder = LogForwarder::new(self.transport.clone(), config.queue_capacity);
        self.config = config;
        self
    }

    /// Install the sensitive-field filter. Immutable after construction.
    pub fn with_filter(mut self, filter: LogFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Get the app name recorded on every emitted document.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Get the forwarder this manager fills; start it on a tokio runtime to
    /// begin publishing.
    pub fn forwarder(&self) -> Arc<LogForwarder> {
        Arc::clone(&self.forwarder)
    }

    /// Begin a new action and bind it to the current thread.
    ///
    /// Forwarding failures accumulated since the last action surface here as
    /// stats on the new action.
    ///
    /// # Panics
    /// Panics if an action is already bound to this thread.
    pub fn begin(&self, action: &str, id: Option<ActionId>) -> ActionId {
        let mut log =
            ActionLog::new(action, id).with_context_limit(self.config.max_context_value_length);
        let dropped = self.forwarder.take_dropped();
        if dropped > 0 {
            log.stat("log_queue_dropped", dropped as f64);
        }
        let failed = self.forwarder.take_failed();
        if failed > 0 {
            log.stat("log_forward_failed", failed as f64);
        }
        let action_id = log.id;
        tracing::debug!(id = %action_id, action = %action, "action begin");
        bind(log);
        action_id
    }

    /// End the current action, optionally recording an unhandled failure,
    /// and emit its record.
    ///
    /// Calling `end` without a bound action logs a warning and returns; the
    /// logging pipeline never takes the process down.
    pub fn end(&self, error: Option<&ActraError>) {
        let Some(log) = take_current() else {
            tracing::warn!("end called without a bound action");
            return;
        };
        let failure = error.map(|e| Failure {
            error_code: e.error_code().to_string(),
            message: e.to_string(),
            user_fault: e.is_user_fault(),
        });
        self.finish(log, failure);
    }

    /// End the current action with an arbitrary unhandled error.
    ///
    /// [`ActraError`] values contribute their own code; any other error type
    /// gets a stable code derived from its type name and is treated as a
    /// system fault.
    pub fn end_with_error<E: std::error::Error + 'static>(&self, error: &E) {
        let failure = match (error as &dyn std::error::Error).downcast_ref::<ActraError>() {
            Some(e) => Failure {
                error_code: e.error_code().to_string(),
                message: e.to_string(),
                user_fault: e.is_user_fault(),
            },
            None => Failure {
                error_code: error_code_from_type(std::any::type_name::<E>()),
                message: error.to_string(),
                user_fault: false,
            },
        };
        let Some(log) = take_current() else {
            tracing::warn!("end called without a bound action");
            return;
        };
        self.finish(log, Some(failure));
    }

    fn finish(&self, mut log: ActionLog, failure: Option<Failure>) {
        if let Some(failure) = failure {
            let mut event = LogEvent::error(ACTION_LOGGER, failure.message)
                .with_error_code(failure.error_code);
            if !failure.user_fault {
                // user faults keep the trace lean; system and internal
                // faults carry the full stack
                event = event
                    .with_stack_trace(std::backtrace::Backtrace::force_capture().to_string());
            }
            log.process(event);
        }
        let elapsed = log.elapsed_nanos();
        log.mark_end(elapsed);
        let cpu_time = thread_cpu_time_nanos();
        let mut document = self.build_document(log, elapsed, cpu_time);
        self.filter.apply(&mut document);
        tracing::debug!(
            id = %document.id,
            action = %document.action,
            result = %document.result,
            elapsed = document.elapsed,
            "action end"
        );
        self.forwarder.submit(document);
    }

    fn build_document(&self, mut log: ActionLog, elapsed: u64, cpu_time: u64) -> ActionDocument {
        let result = log.result();
        let trace_log = log
            .flush_trace_log()
            .then(|| log.trace(self.config.soft_trace_limit, self.config.hard_trace_limit));
        let perf_stats = log.take_performance_stats();
        let is_root = log.correlation_ids.is_empty();
        ActionDocument {
            timestamp: log.date,
            id: log.id.to_string(),
            app: self.app.clone(),
            host: self.host.clone(),
            action: log.action,
            result,
            is_root,
            elapsed,
            cpu_time,
            error_code: log.error_code,
            error_message: log.error_message,
            correlation_id: if is_root { None } else { Some(log.correlation_ids) },
            ref_id: if log.ref_ids.is_empty() {
                None
            } else {
                Some(log.ref_ids)
            },
            client: if log.clients.is_empty() {
                None
            } else {
                Some(log.clients)
            },
            context: log.context,
            stats: log.stats,
            perf_stats,
            trace_log,
        }
    }
}

struct Failure {
    error_code: String,
    message: String,
    user_fault: bool,
}

/// CPU time consumed by the calling thread, in nanoseconds.
#[cfg(unix)]
fn thread_cpu_time_nanos() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: ts is a valid, writable timespec
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_THREAD_CPUTIME_ID, &mut ts) };
    if rc == 0 {
        ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
    } else {
        0
    }
}

/// CPU time is not available on this platform.
#[cfg(not(unix))]
fn thread_cpu_time_nanos() -> u64 {
    0
}
