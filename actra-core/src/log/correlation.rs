//! Correlation and ref-id propagation across process hops.
//!
//! Four headers knit actions into causal graphs. Their wire names are fixed
//! for interop: `x-correlation-id` carries the root-action id(s),
//! `x-ref-id` the immediate caller's action id, `x-client` the caller's app
//! name, and `x-trace` the trace sampling decision. Values are ASCII; ids
//! are 24 hex chars; multiple ids are comma-separated.

use super::action::{ActionLog, Trace};

/// Header carrying the id(s) of the root action(s) of the causal chain.
pub const HEADER_CORRELATION_ID: &str = "x-correlation-id";
/// Header carrying the immediate caller's action id.
pub const HEADER_REF_ID: &str = "x-ref-id";
/// Header carrying the immediate caller's app name.
pub const HEADER_CLIENT: &str = "x-client";
/// Header carrying the trace sampling decision (`CURRENT`/`CASCADE`).
pub const HEADER_TRACE: &str = "x-trace";

/// Read access to transport headers, implemented per boundary (HTTP headers,
/// Kafka record headers).
pub trait HeaderAccess {
    /// Get a header value by name, if present.
    fn get_header(&self, name: &str) -> Option<String>;
}

/// Parsed correlation state of an inbound request or message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    /// Root-action ids; empty means the new action is itself a root.
    pub correlation_ids: Vec<String>,
    /// Immediate caller action ids.
    pub ref_ids: Vec<String>,
    /// Immediate caller app names.
    pub clients: Vec<String>,
    /// Requested trace mode.
    pub trace: Trace,
}

impl Correlation {
    /// Parse the correlation headers of an inbound hop.
    pub fn parse(headers: &impl HeaderAccess) -> Self {
        Self {
            correlation_ids: split_values(headers.get_header(HEADER_CORRELATION_ID)),
            ref_ids: split_values(headers.get_header(HEADER_REF_ID)),
            clients: split_values(headers.get_header(HEADER_CLIENT)),
            trace: headers
                .get_header(HEADER_TRACE)
                .and_then(|value| Trace::parse(&value))
                .unwrap_or_default(),
        }
    }

    /// Check whether the new action starts a causal chain.
    pub fn is_root(&self) -> bool {
        self.correlation_ids.is_empty()
    }

    /// Populate a freshly begun action log from the parsed headers.
    ///
    /// `CASCADE` always overrides the local trace default; `CURRENT` only
    /// applies when no local sampling decision was made.
    pub fn apply(&self, log: &mut ActionLog) {
        log.correlation_ids = self.correlation_ids.clone();
        log.ref_ids = self.ref_ids.clone();
        log.clients = self.clients.clone();
        match self.trace {
            Trace::Cascade => log.trace = Trace::Cascade,
            Trace::Current => {
                if log.trace == Trace::None {
                    log.trace = Trace::Current;
                }
            }
            Trace::None => {}
        }
    }

    /// Build the outbound headers for a call made from the given action.
    ///
    /// The current action becomes the caller: its id goes out as the ref id,
    /// the app name as the client, and the correlation ids pass through
    /// unchanged (a root emits its own id). `CASCADE` is re-emitted so
    /// downstream actions keep flushing their traces.
    pub fn outbound(log: &ActionLog, app: &str) -> Vec<(&'static str, String)> {
        let correlation_id = if log.correlation_ids.is_empty() {
            log.id.to_string()
        } else {
            log.correlation_ids.join(",")
        };
        let mut headers = vec![
            (HEADER_CORRELATION_ID, correlation_id),
            (HEADER_REF_ID, log.id.to_string()),
            (HEADER_CLIENT, app.to_string()),
        ];
        if log.trace == Trace::Cascade {
            headers.push((HEADER_TRACE, "CASCADE".to_string()));
        }
        headers
    }
}

fn split_values(value: Option<String>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(value) => value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
