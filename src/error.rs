use miette::Diagnostic;
use thiserror::Error;

/// Result type for unminifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Custom error types for the unminifier
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum Error {
    #[error("I/O error: {0}")]
    #[diagnostic(code(unminify::io_error))]
    Io(String),

    #[error("Parse error: {message}")]
    #[diagnostic(code(unminify::parse_error))]
    Parse { message: String },

    #[error("Unsupported source type for {path}")]
    #[diagnostic(code(unminify::source_type))]
    SourceType { path: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(unminify::internal_error))]
    Internal { message: String },
}

impl Error {
    /// Create a parse error from the diagnostics the parser reported
    pub fn parse<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let message = messages
            .into_iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Error::Parse { message }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
