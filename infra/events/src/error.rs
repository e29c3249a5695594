use herald_runtime::RuntimeError;
use std::borrow::Cow;

/// Errors that can occur while delivering an event.
///
/// Bus operations never return these to callers; they are reported through
/// `tracing` and the delivery is dropped.
#[herald_derive::herald_error]
pub enum EventBusError {
    /// The dispatch target refused the delivery job.
    #[error("Dispatch failed{}: {source}", format_context(.context))]
    Dispatch { source: RuntimeError, context: Option<Cow<'static, str>> },
}
