use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// User agent string sent with feed requests.
const FEED_USER_AGENT: &str = "discourse-mention-notifier/0.1";

/// A single post from the Discourse `posts.json` feed.
///
/// Unknown fields in the payload are ignored; `name` and `raw` are missing
/// from some posts and deserialize to `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: u64,
    pub topic_id: u64,
    pub topic_slug: String,
    pub topic_title: String,
    pub post_number: u64,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestPostsResponse {
    #[serde(default)]
    latest_posts: Vec<Post>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("feed returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Client for a Discourse forum's public post feed.
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.discourse_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch one page of posts, newest first.
    ///
    /// Passing the last post id of a page as `before_id` retrieves the next
    /// older page. The feed has no end-of-feed sentinel; exhaustion shows up
    /// as an empty page.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success HTTP status, or a
    /// malformed JSON body.
    pub async fn fetch_page(&self, before_id: Option<u64>) -> Result<Vec<Post>, FetchError> {
        let mut url = format!("{}/posts.json", self.base_url);
        if let Some(id) = before_id {
            url.push_str(&format!("?before={id}"));
        }

        debug!(url = %url, "Fetching feed page");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", FEED_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body: LatestPostsResponse = response.json().await?;
        Ok(body.latest_posts)
    }
}
