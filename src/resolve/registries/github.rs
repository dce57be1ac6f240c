//! GitHub REST API client: paginated tag crawling and release lookups.

use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::GITHUB_API;
use crate::resolve::error::NetworkError;
use crate::resolve::transport::Transport;

/// One entry of a repository tag listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTag {
    pub name: String,
    pub commit: TagCommit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCommit {
    pub sha: String,
}

/// A release as returned by the `releases/latest` endpoint.
#[derive(Debug, Deserialize)]
pub struct Release {
    pub tag_name: String,
}

/// A release looked up by tag, carrying its downloadable assets.
#[derive(Debug, Deserialize)]
pub struct TaggedRelease {
    pub assets: Option<Vec<ReleaseAsset>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub updated_at: String,
}

/// Signal returned by a tag visitor.
pub enum TagVisit<T> {
    /// Keep visiting.
    Continue,
    /// The wanted tag was found; stop the crawl.
    Accept(T),
    /// No further tag can match; stop the crawl.
    Abort,
}

/// How a crawl ended.
#[derive(Debug, PartialEq, Eq)]
pub enum CrawlOutcome<T> {
    Accepted(T),
    Aborted,
    Exhausted,
}

/// Result of [`visit_tags`]: the termination signal plus how many pages were
/// visited to completion. A page cut short by `Accept`/`Abort` is not
/// counted, so callers can resume a later crawl from `full_pages` onwards.
#[derive(Debug)]
pub struct TagCrawl<T> {
    pub full_pages: usize,
    pub outcome: CrawlOutcome<T>,
}

/// URL of the first tag page of `repo` (e.g. `dlang/dmd`).
pub fn tags_url(repo: &str) -> String {
    format!("{}/repos/{}/tags", GITHUB_API, repo)
}

/// Walk a paginated tag listing, starting at `url`, until the visitor stops
/// the crawl or no `rel="next"` link remains.
///
/// Pages are fetched strictly one after another; retrying a failed page
/// request is the transport's concern, never the crawler's.
pub async fn visit_tags<T, F>(
    transport: &dyn Transport,
    url: &str,
    token: Option<&str>,
    mut visit: F,
) -> Result<TagCrawl<T>, NetworkError>
where
    F: FnMut(&RemoteTag) -> TagVisit<T>,
{
    let next_pattern = Regex::new(r#"(?i)<([^>]*)>;\s*rel="next""#).unwrap();

    let mut url = url.to_string();
    let mut full_pages = 0;

    loop {
        let response = transport.get(&url, token).await?;
        let tags: Vec<RemoteTag> =
            serde_json::from_str(&response.body).map_err(|e| NetworkError::InvalidResponse {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        for tag in &tags {
            match visit(tag) {
                TagVisit::Continue => {}
                TagVisit::Accept(value) => {
                    return Ok(TagCrawl {
                        full_pages,
                        outcome: CrawlOutcome::Accepted(value),
                    });
                }
                TagVisit::Abort => {
                    return Ok(TagCrawl {
                        full_pages,
                        outcome: CrawlOutcome::Aborted,
                    });
                }
            }
        }
        full_pages += 1;

        let next = response
            .link
            .as_deref()
            .and_then(|link| next_pattern.captures(link))
            .map(|captures| captures[1].to_string());
        match next {
            Some(next_url) => {
                debug!("following tag listing to {}", next_url);
                url = next_url;
            }
            None => {
                return Ok(TagCrawl {
                    full_pages,
                    outcome: CrawlOutcome::Exhausted,
                });
            }
        }
    }
}

/// Fetch the release the `releases/latest` endpoint points at.
pub async fn latest_release(
    transport: &dyn Transport,
    token: Option<&str>,
    repo: &str,
) -> Result<Release, NetworkError> {
    let url = format!("{}/repos/{}/releases/latest", GITHUB_API, repo);
    fetch_json(transport, token, &url).await
}

/// Fetch one release by its tag name, including its asset listing.
pub async fn release_by_tag(
    transport: &dyn Transport,
    token: Option<&str>,
    repo: &str,
    tag: &str,
) -> Result<TaggedRelease, NetworkError> {
    let url = format!("{}/repos/{}/releases/tags/{}", GITHUB_API, repo, tag);
    fetch_json(transport, token, &url).await
}

async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    token: Option<&str>,
    url: &str,
) -> Result<T, NetworkError> {
    let response = transport.get(url, token).await?;
    serde_json::from_str(&response.body).map_err(|e| NetworkError::InvalidResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::transport::HttpClient;
    use std::time::Duration;

    fn instant_client() -> HttpClient {
        HttpClient::with_retry_delays([Duration::ZERO; 3])
    }

    fn page_body(names: &[&str]) -> String {
        let tags: Vec<serde_json::Value> = names
            .iter()
            .map(|name| serde_json::json!({"name": name, "commit": {"sha": "0000000"}}))
            .collect();
        serde_json::to_string(&tags).unwrap()
    }

    #[tokio::test]
    async fn visit_tags_follows_next_links_and_counts_full_pages() {
        let mut server = mockito::Server::new_async().await;
        let page1 = server
            .mock("GET", "/page1")
            .with_status(200)
            .with_header(
                "link",
                &format!("<{}/page2>; rel=\"next\"", server.url()),
            )
            .with_body(page_body(&["v1.39.0", "v1.38.0"]))
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/page2")
            .with_status(200)
            .with_body(page_body(&["v1.37.0"]))
            .create_async()
            .await;

        let client = instant_client();
        let mut seen = Vec::new();
        let crawl = visit_tags::<(), _>(&client, &format!("{}/page1", server.url()), None, |tag| {
            seen.push(tag.name.clone());
            TagVisit::Continue
        })
        .await
        .unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(seen, vec!["v1.39.0", "v1.38.0", "v1.37.0"]);
        assert_eq!(crawl.full_pages, 2);
        assert_eq!(crawl.outcome, CrawlOutcome::Exhausted);
    }

    #[tokio::test]
    async fn visit_tags_stops_on_accept_without_fetching_further_pages() {
        let mut server = mockito::Server::new_async().await;
        let page1 = server
            .mock("GET", "/page1")
            .with_status(200)
            .with_header(
                "link",
                &format!("<{}/page2>; rel=\"next\"", server.url()),
            )
            .with_body(page_body(&["v1.39.0", "v1.38.0"]))
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/page2")
            .expect(0)
            .create_async()
            .await;

        let client = instant_client();
        let crawl = visit_tags(&client, &format!("{}/page1", server.url()), None, |tag| {
            if tag.name == "v1.38.0" {
                TagVisit::Accept(tag.name.clone())
            } else {
                TagVisit::Continue
            }
        })
        .await
        .unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        // The interrupted page is not counted as fully visited.
        assert_eq!(crawl.full_pages, 0);
        assert_eq!(
            crawl.outcome,
            CrawlOutcome::Accepted("v1.38.0".to_string())
        );
    }

    #[tokio::test]
    async fn visit_tags_reports_abort_distinctly() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/page1")
            .with_status(200)
            .with_body(page_body(&["v0.4.0"]))
            .create_async()
            .await;

        let client = instant_client();
        let crawl = visit_tags::<(), _>(
            &client,
            &format!("{}/page1", server.url()),
            None,
            |_tag| TagVisit::Abort,
        )
        .await
        .unwrap();

        assert_eq!(crawl.full_pages, 0);
        assert_eq!(crawl.outcome, CrawlOutcome::Aborted);
    }

    #[tokio::test]
    async fn visit_tags_rejects_unparseable_listings() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/page1")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = instant_client();
        let err = visit_tags::<(), _>(
            &client,
            &format!("{}/page1", server.url()),
            None,
            |_tag| TagVisit::Continue,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, NetworkError::InvalidResponse { .. }));
    }
}
