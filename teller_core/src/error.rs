use thiserror::Error;

/// Failure signal surfaced by a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether repeating the same request could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) | Self::Other(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient_client_errors_are_not() {
        let busy = TransportError::Status {
            status: 503,
            body: String::new(),
        };
        let bad = TransportError::Status {
            status: 422,
            body: "missing customer_id".to_string(),
        };
        assert!(busy.is_transient());
        assert!(!bad.is_transient());
        assert!(TransportError::Timeout.is_transient());
        assert!(!TransportError::Decode("eof".to_string()).is_transient());
    }

    #[test]
    fn test_status_error_message_includes_body() {
        let err = TransportError::Status {
            status: 500,
            body: "Error processing chat request".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "server returned status 500: Error processing chat request"
        );
    }
}
