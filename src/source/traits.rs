// Document source trait: the swap-ready abstraction over the upstream feed.

use anyhow::Result;
use async_trait::async_trait;

/// One post as fetched from the upstream source.
///
/// Both fields may be empty (link posts have no body, some sources have
/// no titles) but are never missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    pub title: String,
    pub body: String,
}

/// Trait for fetching a batch of raw documents. Async because every real
/// source is a network call.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the current batch, in source ranking order.
    async fn fetch(&self) -> Result<Vec<RawDocument>>;
}
