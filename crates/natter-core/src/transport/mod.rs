pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;

use crate::error::TransportError;

/// Delivers one user message to the chat backend and returns the
/// assistant's reply text.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, text: &str) -> Result<String, TransportError>;
}
