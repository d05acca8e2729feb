//! Bridge from the `tracing` facade into the bound action.
//!
//! Installed as a `tracing-subscriber` layer, [`ActionLogLayer`] converts
//! every emitted event into a [`LogEvent`] and routes it to the action bound
//! to the emitting thread. Events emitted outside any action fall through to
//! the other layers only.
//!
//! ```ignore
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(actra_core::log::ActionLogLayer)
//!     .init();
//! ```

use super::event::{LogEvent, LogLevel};
use super::manager;
use std::fmt::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Routes tracing events into the current thread's action log.
pub struct ActionLogLayer;

impl<S: Subscriber> Layer<S> for ActionLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !manager::is_bound() {
            return;
        }
        let level = match *event.metadata().level() {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        };
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut message = visitor.message;
        if !visitor.fields.is_empty() {
            if !message.is_empty() {
                message.push(' ');
            }
            let _ = write!(message, "{{{}}}", visitor.fields.join(", "));
        }

        let mut log_event = LogEvent::new(level, event.metadata().target(), message);
        if let Some(code) = visitor.error_code {
            log_event = log_event.with_error_code(code);
        }
        manager::process(log_event);
    }
}

/// Collects the message, the `error_code` field, and the remaining fields.
#[derive(Default)]
struct EventVisitor {
    message: String,
    error_code: Option<String>,
    fields: Vec<String>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "error_code" => self.error_code = Some(value.to_string()),
            _ => self.fields.push(format!("{}={}", field.name(), value)),
        }
    }
}
