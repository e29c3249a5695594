use crate::config::ConfigError;
use herald_logger::LoggerError;
use herald_runtime::RuntimeError;
use std::borrow::Cow;

/// Errors raised while bootstrapping herald.
#[herald_derive::herald_error]
pub enum HeraldError {
    #[error("Configuration error{}: {source}", format_context(.context))]
    Config { source: ConfigError, context: Option<Cow<'static, str>> },

    #[error("Logging setup failed{}: {source}", format_context(.context))]
    Logger { source: LoggerError, context: Option<Cow<'static, str>> },

    #[error("Dispatch runtime error{}: {source}", format_context(.context))]
    Runtime { source: RuntimeError, context: Option<Cow<'static, str>> },
}
