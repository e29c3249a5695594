use std::borrow::Cow;

/// Errors raised while creating or feeding an execution context.
#[herald_derive::herald_error]
pub enum RuntimeError {
    /// The queue no longer accepts jobs (shut down or its worker is gone).
    #[error("Execution context closed{}: {message}", format_context(.context))]
    Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The OS refused to create a worker thread or runtime.
    #[error("Failed to start execution context{}: {source}", format_context(.context))]
    Spawn { source: std::io::Error, context: Option<Cow<'static, str>> },
}
