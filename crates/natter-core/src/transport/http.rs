use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ChatTransport;
use crate::config::Config;
use crate::error::TransportError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Reply bodies the backend has been seen to return.
/// A `{ "messages": [...] }` full-history body matches neither and is rejected.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChatResponse {
    Reply { reply: String },
    Message { message: ReplyMessage },
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

impl ChatResponse {
    fn into_reply(self) -> String {
        match self {
            ChatResponse::Reply { reply } => reply,
            ChatResponse::Message { message } => message.content,
        }
    }
}

/// `POST {base_url}/chat` with a JSON `{ "message": ... }` body
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, text: &str) -> Result<String, TransportError> {
        let url = self.endpoint();

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message: text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::new(format!(
                "server returned {}: {}",
                status,
                body.trim()
            )));
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response.into_reply())
    }
}
