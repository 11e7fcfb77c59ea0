use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Any failure of a chat round trip: connect, timeout, non-success status,
/// or a body that doesn't decode. The send lifecycle treats them all alike.
#[derive(Debug, Error)]
#[error("chat request failed: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "could not connect to chat server".to_string()
        } else if err.is_decode() {
            "could not decode chat response".to_string()
        } else {
            err.to_string()
        };
        Self::with_source(message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_includes_message() {
        let err = TransportError::new("server returned 502 Bad Gateway");
        assert_eq!(err.to_string(), "chat request failed: server returned 502 Bad Gateway");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_source_is_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = TransportError::with_source("bad body", io);
        assert_eq!(err.message(), "bad body");
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }
}
