// Reddit listing client: unauthenticated GET of a subreddit listing.
//
// Reddit serves `/r/<sub>/hot.json` to anonymous clients but rejects
// browser-like or empty User-Agents from servers. The UA format Reddit asks
// for is `<platform>:<app id>:<version>`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::traits::{DocumentSource, RawDocument};
use crate::pipeline::error::RawPayloadError;

/// Default listing: the 100 hottest posts across all of Reddit.
pub const DEFAULT_REDDIT_URL: &str = "https://www.reddit.com/r/all/hot.json?limit=100";

/// Default non-browser client identification string.
pub const DEFAULT_USER_AGENT: &str = "rust:trend-extractor:v0.1.0";

/// HTTP client for a single Reddit listing endpoint.
pub struct RedditClient {
    client: reqwest::Client,
    listing_url: String,
}

impl RedditClient {
    /// Create a client for `listing_url`, identifying as `user_agent`.
    pub fn new(listing_url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            listing_url: listing_url.to_string(),
        })
    }
}

#[async_trait]
impl DocumentSource for RedditClient {
    async fn fetch(&self) -> Result<Vec<RawDocument>> {
        debug!(url = %self.listing_url, "Fetching Reddit listing");

        let response = self
            .client
            .get(&self.listing_url)
            .send()
            .await
            .context("Reddit request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Reddit response body")?;

        if !status.is_success() {
            return Err(RawPayloadError::new(
                format!(
                    "Reddit API error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                ),
                body,
            )
            .into());
        }

        let listing: Listing = serde_json::from_str(&body).map_err(|e| {
            RawPayloadError::new(format!("Failed to parse Reddit listing: {e}"), body.clone())
        })?;

        let documents = listing.into_documents();
        info!(count = documents.len(), "Fetched Reddit posts");
        Ok(documents)
    }
}

// -- Serde types for the listing payload --
//
// Every level is optional: a missing `data`, `children`, `title`, or
// `selftext` reads as empty, never as an error.

/// Top-level `Listing` object returned by `*.json` endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub data: Option<ListingData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Option<Vec<ListingChild>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingChild {
    #[serde(default)]
    pub data: Option<PostData>,
}

/// The post fields we read. Reddit sends `selftext` as `""` for link posts,
/// but `null` and absent values both occur in the wild.
#[derive(Debug, Default, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
}

impl Listing {
    /// Flatten the listing into documents, keeping listing order.
    pub fn into_documents(self) -> Vec<RawDocument> {
        self.data
            .and_then(|d| d.children)
            .unwrap_or_default()
            .into_iter()
            .map(|child| {
                let post = child.data.unwrap_or_default();
                RawDocument {
                    title: post.title.unwrap_or_default(),
                    body: post.selftext.unwrap_or_default(),
                }
            })
            .collect()
    }
}
