use std::borrow::Cow;

/// Errors that can occur while configuring or running the logger.
#[logkit_derive::logkit_error]
pub enum LoggerError {
    /// Failure creating the log folder or opening a log file.
    #[error("Log file I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// Failure while layering settings from files and the environment.
    #[error("Logger settings error{}: {source}", format_context(.context))]
    Settings { source: config::ConfigError, context: Option<Cow<'static, str>> },

    /// Occurs if a global default subscriber has already been installed in this process.
    #[error("Tracing subscriber error{}: {source}", format_context(.context))]
    Subscriber {
        source: tracing::dispatcher::SetGlobalDefaultError,
        context: Option<Cow<'static, str>>,
    },

    /// Invalid configuration supplied to the logger builder.
    #[error("Invalid logger configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal logic errors.
    #[error("Internal logger error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl LoggerError {
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidConfiguration { message: message.into(), context: None }
    }
}
