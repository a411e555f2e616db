//! Error classification: deciding whether a failure is transient.
//!
//! The executor knows nothing about the operation it wraps. It only asks the
//! error three questions through [`RetryableError`]: does it carry a named
//! kind, a status code, or a low-level connection code? The answers are
//! matched against a [`RetryPolicy`](crate::policy::RetryPolicy) by
//! [`classify`], first match wins.

use std::collections::BTreeSet;
use std::error::Error;
use std::io;
use thiserror::Error;

/// An error that can be inspected for retry classification.
///
/// Every accessor defaults to `None`, so an error type that implements this
/// trait with an empty body is always classified as fatal.
///
/// # Examples
///
/// ```rust
/// use retrykit::classify::RetryableError;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("upstream returned {status}")]
/// struct UpstreamError {
///     status: u16,
/// }
///
/// impl RetryableError for UpstreamError {
///     fn status_code(&self) -> Option<u16> {
///         Some(self.status)
///     }
/// }
/// ```
pub trait RetryableError: Error {
    /// Named classification of this error, e.g. `"NetworkError"`.
    fn error_kind(&self) -> Option<&str> {
        None
    }

    /// Status code carried by this error, e.g. an HTTP status.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// Low-level connection failure carried by this error.
    fn io_kind(&self) -> Option<io::ErrorKind> {
        None
    }
}

impl RetryableError for io::Error {
    fn io_kind(&self) -> Option<io::ErrorKind> {
        Some(self.kind())
    }
}

/// Why an error was (or was not) considered retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The error's kind is listed as retryable.
    ErrorKind,
    /// The error's status code is listed as retryable.
    StatusCode,
    /// The connection was reset or timed out.
    Connection,
    /// Nothing matched; the error terminates the retry loop.
    Fatal,
}

impl Classification {
    /// `true` for every classification except [`Classification::Fatal`].
    pub fn is_retryable(self) -> bool {
        !matches!(self, Classification::Fatal)
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Classification::ErrorKind => "error_kind",
            Classification::StatusCode => "status_code",
            Classification::Connection => "connection",
            Classification::Fatal => "fatal",
        }
    }
}

/// Classify an error against the configured retryable kinds and codes.
///
/// Rules are checked in order:
/// 1. error kind in `kinds`
/// 2. status code in `status_codes`
/// 3. connection reset or timed out (always retryable, not configurable)
/// 4. otherwise fatal
pub fn classify(
    error: &dyn RetryableError,
    kinds: &BTreeSet<String>,
    status_codes: &BTreeSet<u16>,
) -> Classification {
    if error.error_kind().is_some_and(|kind| kinds.contains(kind)) {
        return Classification::ErrorKind;
    }
    if error
        .status_code()
        .is_some_and(|code| status_codes.contains(&code))
    {
        return Classification::StatusCode;
    }
    if error.io_kind().is_some_and(is_transient_connection) {
        return Classification::Connection;
    }
    Classification::Fatal
}

/// Connection reset and operation timed out are the only built-in
/// transient connection failures.
pub fn is_transient_connection(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset | io::ErrorKind::TimedOut
    )
}

/// Map a raw socket error code such as `"ECONNRESET"` to an `io::ErrorKind`.
pub fn io_kind_from_code(code: &str) -> Option<io::ErrorKind> {
    match code {
        "ECONNRESET" => Some(io::ErrorKind::ConnectionReset),
        "ETIMEDOUT" => Some(io::ErrorKind::TimedOut),
        "ECONNREFUSED" => Some(io::ErrorKind::ConnectionRefused),
        "ECONNABORTED" => Some(io::ErrorKind::ConnectionAborted),
        "EPIPE" => Some(io::ErrorKind::BrokenPipe),
        _ => None,
    }
}

/// A general-purpose failure carrying classification fields.
///
/// Useful when the wrapped operation talks to a client whose errors are
/// plain values (a message plus optional name, status and code) rather than
/// a dedicated Rust type.
///
/// # Examples
///
/// ```rust
/// use retrykit::classify::{OperationError, RetryableError};
///
/// let err = OperationError::new("service unavailable").with_status(503);
/// assert_eq!(err.status_code(), Some(503));
///
/// let err = OperationError::new("socket hang up").with_code("ECONNRESET");
/// assert_eq!(err.io_kind(), Some(std::io::ErrorKind::ConnectionReset));
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
    kind: Option<String>,
    status: Option<u16>,
    code: Option<String>,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl OperationError {
    /// Create an error with only a message. It classifies as fatal until a
    /// kind, status or code is attached.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            status: None,
            code: None,
            source: None,
        }
    }

    /// Attach a named kind, e.g. `"NetworkError"`.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Attach a status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach a raw connection code, e.g. `"ETIMEDOUT"`.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw connection code, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl RetryableError for OperationError {
    fn error_kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    fn status_code(&self) -> Option<u16> {
        self.status
    }

    fn io_kind(&self) -> Option<io::ErrorKind> {
        self.code.as_deref().and_then(io_kind_from_code)
    }
}
