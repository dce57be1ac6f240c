//! Canned-response transport for driving resolvers without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use dlang_toolchain::resolve::error::NetworkError;
use dlang_toolchain::resolve::transport::{HttpResponse, Transport};

/// Transport answering from a URL-keyed response table and recording every
/// request it serves.
pub struct CannedTransport {
    responses: HashMap<String, HttpResponse>,
    requests: Mutex<Vec<String>>,
}

impl CannedTransport {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `body` (trimmed by the caller side) for `url`.
    pub fn with_text(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), HttpResponse::ok(body));
        self
    }

    /// Serve a paginated tag listing rooted at `base`.
    ///
    /// Page `n` is reachable both as `base?page=n` and, for the first page,
    /// as `base` itself; every page except the last links to its successor
    /// the way the GitHub API does.
    pub fn with_tag_pages(mut self, base: &str, pages: &[&[&str]]) -> Self {
        for (index, names) in pages.iter().enumerate() {
            let number = index + 1;
            let tags: Vec<serde_json::Value> = names
                .iter()
                .map(|name| serde_json::json!({"name": name, "commit": {"sha": "0000000"}}))
                .collect();
            let link = (number < pages.len())
                .then(|| format!("<{}?page={}>; rel=\"next\"", base, number + 1));
            let response = HttpResponse {
                status: 200,
                body: serde_json::to_string(&tags).expect("tag pages serialize"),
                link,
            };

            if number == 1 {
                self.responses.insert(base.to_string(), response.clone());
            }
            self.responses
                .insert(format!("{}?page={}", base, number), response);
        }
        self
    }

    /// How many times `url` has been requested.
    pub fn hits(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }

    /// Total number of requests served so far.
    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn get(&self, url: &str, _bearer: Option<&str>) -> Result<HttpResponse, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| NetworkError::InvalidResponse {
                url: url.to_string(),
                reason: "no canned response for this URL".to_string(),
            })
    }
}
