use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which lookup step failed, and how.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Resolution,
    NotFound,
    Data,
    Timeout,
    Parse,
    Render,
}

/// Errors raised by a single step of a fruit price lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("Transport error: {message}")]
    Transport { message: String, trace: Vec<String> },

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data error: {message}")]
    Data { message: String, trace: Vec<String> },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rendering error: {message}")]
    Render { message: String, trace: Vec<String> },
}

impl LookupError {
    pub fn transport(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        LookupError::Transport {
            message: message.into(),
            trace: error_chain(cause),
        }
    }

    pub fn data(message: impl Into<String>) -> Self {
        LookupError::Data {
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn data_with_cause(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        LookupError::Data {
            message: message.into(),
            trace: error_chain(cause),
        }
    }

    pub fn render(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        LookupError::Render {
            message: message.into(),
            trace: error_chain(cause),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            LookupError::Transport { .. } => FailureKind::Transport,
            LookupError::Resolution(_) => FailureKind::Resolution,
            LookupError::NotFound(_) => FailureKind::NotFound,
            LookupError::Data { .. } => FailureKind::Data,
            LookupError::Timeout(_) => FailureKind::Timeout,
            LookupError::Parse(_) => FailureKind::Parse,
            LookupError::Render { .. } => FailureKind::Render,
        }
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            LookupError::Transport { message, .. }
            | LookupError::Data { message, .. }
            | LookupError::Render { message, .. } => message,
            LookupError::Resolution(message)
            | LookupError::NotFound(message)
            | LookupError::Timeout(message)
            | LookupError::Parse(message) => message,
        }
    }

    /// Diagnostic trace lines captured from the underlying cause, if any.
    pub fn trace(&self) -> Option<&[String]> {
        match self {
            LookupError::Transport { trace, .. }
            | LookupError::Data { trace, .. }
            | LookupError::Render { trace, .. }
                if !trace.is_empty() =>
            {
                Some(trace.as_slice())
            }
            _ => None,
        }
    }
}

/// Flattens an error and its sources into one line per cause.
pub fn error_chain(err: impl Into<anyhow::Error>) -> Vec<String> {
    err.into().chain().map(|cause| cause.to_string()).collect()
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
