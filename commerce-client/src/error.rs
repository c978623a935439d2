/// Failures surfaced by the client.
///
/// Cancellation is deliberately absent: a cancelled request resolves to
/// `Ok(None)` so callers can tell "gave up" apart from "went wrong".
///
/// `Clone` is required because a single failed network call is fanned out to
/// every caller waiting on the same in-flight request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Non-2xx response from the backend.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure (DNS, connection refused, client timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request path could not be joined onto the base URL.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    /// The in-flight request this caller was attached to went away or took
    /// too long to settle.
    #[error("request coordination failed: {0}")]
    Dedupe(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Http,
    Network,
    Decode,
    InvalidUrl,
    Dedupe,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http { .. } => ErrorKind::Http,
            Error::Network(_) => ErrorKind::Network,
            Error::Decode(_) => ErrorKind::Decode,
            Error::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Error::Dedupe(_) => ErrorKind::Dedupe,
        }
    }

    /// HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
