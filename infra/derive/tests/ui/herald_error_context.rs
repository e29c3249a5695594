use herald_derive::herald_error;
use std::borrow::Cow;

#[herald_error]
pub enum LoadError {
    #[error("Io error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), LoadError> {
    Err(std::io::Error::other("missing")).context("Reading settings")
}

fn validate() -> Result<(), LoadError> {
    Err(LoadError::from("empty name")).context("Validating settings")
}

fn main() {
    let err = read().unwrap_err();
    assert_eq!(err.to_string(), "Io error (Reading settings): missing");

    let err = validate().unwrap_err();
    assert_eq!(err.to_string(), "Internal error (Validating settings): empty name");
}
