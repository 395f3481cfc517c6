use thiserror::Error;

/// Broad category of a service error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was rejected (bad parameters, missing permissions, unknown profile)
    Client,
    /// The service failed to handle a valid request
    Service,
    /// The request was rate limited
    Throttling,
    /// The service could not be reached
    Network,
}

/// An error returned by the remote service
///
/// Carries everything the error panel shows: the service's error code and
/// message, the request id for support tickets, and the HTTP status.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub status: u16,
    pub kind: ErrorKind,
}

impl ApiError {
    pub fn new(kind: ErrorKind, status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            request_id: String::new(),
            status,
            kind,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Classify a service error code and status the way the remote service does.
    pub fn from_code(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let kind = if code.contains("Throttl") || code == "TooManyRequestsException" || status == 429 {
            ErrorKind::Throttling
        } else if status >= 500 {
            ErrorKind::Service
        } else if status == 0 {
            ErrorKind::Network
        } else {
            ErrorKind::Client
        };
        Self::new(kind, status, code, message)
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Service | ErrorKind::Throttling | ErrorKind::Network
        )
    }

    /// Multi-line description for error tooltips.
    pub fn details(&self) -> String {
        let request_id = if self.request_id.is_empty() {
            "-"
        } else {
            &self.request_id
        };
        format!(
            "{}\n{}\nHTTP status: {}\nKind: {:?}\nRequest id: {}",
            self.code, self.message, self.status, self.kind, request_id
        )
    }
}
