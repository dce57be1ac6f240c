//! HTTP GET capability used by the resolvers.
//!
//! [`Transport`] is the seam the decision logic is written against;
//! [`HttpClient`] is the production implementation with the retry policy.
//! Redirects are followed by reqwest, so only the final status is inspected.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::{RETRY_DELAYS, USER_AGENT};
use crate::resolve::error::NetworkError;

/// The parts of a response the resolution core looks at.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Raw `Link` header, when the endpoint paginates.
    pub link: Option<String>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            link: None,
        }
    }
}

/// An HTTP GET capability returning body text, status, and the pagination
/// header, optionally authenticated with a bearer credential.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<HttpResponse, NetworkError>;
}

/// Fetch a URL and return its body with surrounding whitespace removed.
pub async fn body_as_text(
    transport: &dyn Transport,
    url: &str,
    bearer: Option<&str>,
) -> Result<String, NetworkError> {
    let response = transport.get(url, bearer).await?;
    Ok(response.body.trim().to_string())
}

/// reqwest-backed [`Transport`] with up to 3 attempts per request and
/// escalating delays between them.
pub struct HttpClient {
    client: reqwest::Client,
    retry_delays: [std::time::Duration; 3],
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_retry_delays(RETRY_DELAYS)
    }

    /// Same client with a custom retry schedule. Tests pass zero delays.
    pub fn with_retry_delays(retry_delays: [std::time::Duration; 3]) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            retry_delays,
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<HttpResponse, NetworkError> {
        let mut last: Option<(u16, String)> = None;

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            debug!("GET {} (attempt {})", url, attempt + 1);

            let mut request = self.client.get(url);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;

            let status = response.status();
            let link = response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());

            if status.as_u16() < 400 {
                return Ok(HttpResponse {
                    status: status.as_u16(),
                    body: response.text().await?,
                    link,
                });
            }

            warn!("GET {} returned status {}, retrying", url, status);
            last = Some((status.as_u16(), response.text().await.unwrap_or_default()));
            tokio::time::sleep(*delay).await;
        }

        let (status, body) = last.unwrap_or((500, String::new()));
        Err(NetworkError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.retry_delays.len() as u32,
            status,
            body: body.trim().to_string(),
        })
    }
}
