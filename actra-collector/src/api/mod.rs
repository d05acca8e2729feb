//! HTTP surface of the collector.
//!
//! - `GET /diagram/arch?hours=N&exclude=a,b` — app architecture diagram
//! - `GET /diagram/action/{id}` — causal diagram of one action chain
//! - `GET /health` — liveness and document count
//!
//! Diagram responses are Graphviz dot (`text/vnd.graphviz`); errors are
//! JSON shaped `{"error": {"code", "message", "status"}}`.

mod error;
mod response;
mod router;
mod server;
mod state;

pub use error::ApiError;
pub use response::GRAPHVIZ_CONTENT_TYPE;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
