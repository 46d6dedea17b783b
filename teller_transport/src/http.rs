use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use teller_core::{
    ChatReply, ChatRequest, HealthReport, SessionId, SessionInfo, Transport, TransportError,
};
use tracing::{debug, info};

use crate::retry::{Backoff, retry_with_backoff};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Bodies longer than this are cut when copied into a status error.
const ERROR_BODY_LIMIT: usize = 512;

/// JSON-over-HTTP client for the chat backend.
///
/// Chat submissions are sent exactly once; only the read-only session and
/// health lookups are retried.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    read_backoff: Backoff,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::Other(format!("invalid base url {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::Other(format!(
                "base url {base_url} cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        info!("Creating HttpTransport for {base_url}");
        Ok(Self {
            client,
            base_url,
            auth_token: None,
            read_backoff: Backoff::NONE,
        })
    }

    /// Bearer credential sent with every request.
    #[must_use]
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Retry schedule for session and health lookups.
    #[must_use]
    pub const fn with_read_backoff(mut self, backoff: Backoff) -> Self {
        self.read_backoff = backoff;
        self
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::Other(format!("base url {} has no path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if let Some((cut, _)) = body.char_indices().nth(ERROR_BODY_LIMIT) {
                body.truncate(cut);
            }
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        debug!("GET {url}");
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(classify)?;
        Self::read_json(response).await
    }

    /// Metadata and stored messages for a session.
    pub async fn get_session(&self, session_id: &SessionId) -> Result<SessionInfo, TransportError> {
        let url = self.endpoint(&["sessions", session_id.as_str()])?;
        retry_with_backoff(
            || self.get_json(url.clone()),
            &self.read_backoff,
            TransportError::is_transient,
        )
        .await
    }

    /// Liveness report of the backend.
    pub async fn health(&self) -> Result<HealthReport, TransportError> {
        let url = self.endpoint(&["health"])?;
        retry_with_backoff(
            || self.get_json(url.clone()),
            &self.read_backoff,
            TransportError::is_transient,
        )
        .await
    }

    /// Poll the health endpoint until it answers, using `backoff` instead of
    /// the configured read schedule.
    pub async fn wait_until_reachable(
        &self,
        backoff: &Backoff,
    ) -> Result<HealthReport, TransportError> {
        let url = self.endpoint(&["health"])?;
        retry_with_backoff(|| self.get_json(url.clone()), backoff, |_| true).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let url = self.endpoint(&["chat"])?;
        info!(
            "Sending chat message for {} (session: {})",
            request.customer_id,
            request
                .session_id
                .as_ref()
                .map_or("<new>", SessionId::as_str)
        );

        let response = self
            .authorize(self.client.post(url))
            .json(request)
            .send()
            .await
            .map_err(classify)?;
        let reply: ChatReply = Self::read_json(response).await?;

        info!(
            "Received reply from {} ({} chars)",
            reply.agent_name,
            reply.response.chars().count()
        );
        Ok(reply)
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoints_join_under_base_path() {
        let t = transport("http://localhost:8000/api");
        assert_eq!(
            t.endpoint(&["chat"]).unwrap().as_str(),
            "http://localhost:8000/api/chat"
        );

        let t = transport("http://localhost:8000/api/");
        assert_eq!(
            t.endpoint(&["health"]).unwrap().as_str(),
            "http://localhost:8000/api/health"
        );
    }

    #[test]
    fn test_session_ids_are_percent_encoded() {
        let t = transport("http://localhost:8000");
        assert_eq!(
            t.endpoint(&["sessions", "a/b c"]).unwrap().as_str(),
            "http://localhost:8000/sessions/a%2Fb%20c"
        );
    }

    #[test]
    fn test_invalid_base_urls_are_rejected() {
        assert!(HttpTransport::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpTransport::new("mailto:ops@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_empty_token_means_no_auth() {
        let t = transport(DEFAULT_BASE_URL).with_auth_token(Some(String::new()));
        assert!(t.auth_token.is_none());
    }
}
