//! Error types for actra.
//!
//! Errors carry a stable short code (`error_code()`) that ends up in the
//! emitted action record, so downstream alerting can group on it. The
//! taxonomy distinguishes user faults (validation, not-found, forbidden)
//! from system faults (downstream dependency failures) and internal faults.

use thiserror::Error;

/// The main error type for actra operations.
#[derive(Error, Debug)]
pub enum ActraError {
    /// Request payload or parameter failed validation.
    #[error("validation failed, field={field}: {cause}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Reason for the failure.
        cause: String,
    },

    /// A referenced entity does not exist.
    #[error("{what} not found, id={id}")]
    NotFound {
        /// The kind of entity that was looked up.
        what: String,
        /// The identifier that was not found.
        id: String,
    },

    /// Caller is not allowed to perform the operation.
    #[error("forbidden: {cause}")]
    Forbidden {
        /// Reason for the denial.
        cause: String,
    },

    /// Request is malformed.
    #[error("bad request: {cause}")]
    BadRequest {
        /// Description of the problem.
        cause: String,
    },

    /// Operation conflicts with existing state.
    #[error("conflict: {cause}")]
    Conflict {
        /// Description of the conflict.
        cause: String,
    },

    /// The action was cancelled by the boundary layer (timeout, client gone).
    #[error("action cancelled: {cause}")]
    Cancelled {
        /// Why the action was cancelled.
        cause: String,
    },

    /// A downstream dependency failed.
    #[error("remote service '{service}' failed: {cause}")]
    RemoteService {
        /// Name of the failing dependency (e.g. "kafka", "db").
        service: String,
        /// Reason for the failure.
        cause: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(
        /// The serialization error message.
        String,
    ),

    /// Programming error or unclassified internal failure.
    #[error("internal error: {cause}")]
    Internal {
        /// Description of the failure.
        cause: String,
    },
}

impl ActraError {
    /// Get the stable error code recorded on the action (e.g. `NOT_FOUND`).
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Conflict { .. } => "CONFLICT",
            Self::Cancelled { .. } => "CANCELLED",
            Self::RemoteService { .. } => "REMOTE_SERVICE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal { .. } => "ERROR",
        }
    }

    /// Check whether this error is the caller's fault.
    ///
    /// User faults translate to 4xx at an HTTP boundary and their stack
    /// traces are suppressed from the action trace.
    #[must_use]
    pub fn is_user_fault(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Forbidden { .. }
                | Self::BadRequest { .. }
                | Self::Conflict { .. }
        )
    }
}

/// Result type alias using [`ActraError`].
pub type Result<T> = std::result::Result<T, ActraError>;

/// Derive a stable error code from a Rust type name.
///
/// Used for failures that don't carry their own code: the last path segment
/// of the type name is converted to `SCREAMING_SNAKE_CASE`, so
/// `std::io::Error` becomes `ERROR` and `ConnectionReset` becomes
/// `CONNECTION_RESET`. The mapping only depends on the type name, so the
/// code is stable across runs and hosts.
#[must_use]
pub fn error_code_from_type(type_name: &str) -> String {
    let name = type_name.rsplit("::").next().unwrap_or(type_name);
    let name = name.split('<').next().unwrap_or(name);
    let mut code = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() && !code.is_empty() && !code.ends_with('_') {
            code.push('_');
        }
        code.push(c.to_ascii_uppercase());
    }
    if code.is_empty() {
        code.push_str("ERROR");
    }
    code
}
