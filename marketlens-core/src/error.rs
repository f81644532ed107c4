//! Structured error types for adapters and the HTTP transport.

use crate::model::DataSource;
use thiserror::Error;

/// Coarse classification used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Disabled,
    InvalidInput,
    Network,
    Timeout,
    Parse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Disabled => "disabled",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Parse => "parse",
        }
    }
}

/// Errors raised by a single adapter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataSourceError {
    #[error("{provider} adapter is disabled")]
    Disabled { provider: DataSource },

    #[error("invalid ZIP code '{0}': expected exactly 5 digits")]
    InvalidZip(String),

    #[error("{provider} request timed out after {timeout_ms}ms")]
    Timeout { provider: DataSource, timeout_ms: u64 },

    #[error("{provider} network error: {message}")]
    Network { provider: DataSource, message: String },

    #[error("{provider} response format unexpected: {message}")]
    Parse { provider: DataSource, message: String },

    #[error("county '{county}' is not supported")]
    UnsupportedCounty { county: String },

    #[error("{source_tag} cannot be built as an adapter")]
    NotAnAdapter { source_tag: DataSource },
}

impl DataSourceError {
    /// Transient failures are worth retrying; configuration and input errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DataSourceError::Timeout { .. }
                | DataSourceError::Network { .. }
                | DataSourceError::Parse { .. }
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DataSourceError::Disabled { .. } => ErrorKind::Disabled,
            DataSourceError::InvalidZip(_)
            | DataSourceError::UnsupportedCounty { .. }
            | DataSourceError::NotAnAdapter { .. } => ErrorKind::InvalidInput,
            DataSourceError::Timeout { .. } => ErrorKind::Timeout,
            DataSourceError::Network { .. } => ErrorKind::Network,
            DataSourceError::Parse { .. } => ErrorKind::Parse,
        }
    }

    pub fn provider(&self) -> Option<DataSource> {
        match self {
            DataSourceError::Disabled { provider }
            | DataSourceError::Timeout { provider, .. }
            | DataSourceError::Network { provider, .. }
            | DataSourceError::Parse { provider, .. } => Some(*provider),
            DataSourceError::UnsupportedCounty { .. } => Some(DataSource::CountyAssessor),
            DataSourceError::InvalidZip(_) | DataSourceError::NotAnAdapter { .. } => None,
        }
    }

    /// Wrap a transport failure, attributing it to `provider`.
    ///
    /// `context` is prefixed to the message (e.g. `"APN 123-456"`).
    pub fn from_transport(provider: DataSource, context: &str, err: TransportError) -> Self {
        let prefix = |msg: String| {
            if context.is_empty() {
                msg
            } else {
                format!("{context}: {msg}")
            }
        };
        match err {
            TransportError::Timeout { timeout_ms } => DataSourceError::Timeout {
                provider,
                timeout_ms,
            },
            TransportError::Connect(msg) => DataSourceError::Network {
                provider,
                message: prefix(msg),
            },
            TransportError::Status { status, reason } => DataSourceError::Network {
                provider,
                message: prefix(format!("HTTP {status} {reason}")),
            },
            TransportError::Body(msg) => DataSourceError::Parse {
                provider,
                message: prefix(msg),
            },
        }
    }
}

/// Failures at the HTTP layer, before any provider-specific interpretation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("invalid response body: {0}")]
    Body(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Timeout { .. } | TransportError::Connect(_) => true,
            TransportError::Status { status, .. } => *status == 429 || *status >= 500,
            TransportError::Body(_) => false,
        }
    }
}
