use herald_derive::herald_error;
use std::borrow::Cow;

#[herald_error]
pub enum QueueError {
    #[error("Spawn failed{}: {source}", format_context(.context))]
    Spawn {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Queue closed: {name}")]
    Closed { name: String },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let from_io: QueueError = std::io::Error::other("boom").into();
    assert!(matches!(from_io, QueueError::Spawn { context: None, .. }));

    let from_str: QueueError = "bad state".into();
    assert_eq!(from_str.to_string(), "Internal error: bad state");

    let closed = QueueError::Closed { name: "ui".to_owned() };
    assert_eq!(closed.to_string(), "Queue closed: ui");
}
