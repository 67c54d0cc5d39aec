use crate::error::FetchError;
use crate::instagram::InstagramProvider;
use crate::post::{NormalizedPost, Source};
use crate::twitter::TwitterProvider;
use async_trait::async_trait;

/// Common face of every network wrapper, so a caller can hold a mixed list.
#[async_trait]
pub trait Provider: Send + Sync {
    fn source(&self) -> Source;

    /// One request, one normalized batch. Never retried.
    async fn fetch_posts(&self) -> Result<Vec<NormalizedPost>, FetchError>;
}

#[async_trait]
impl Provider for TwitterProvider {
    fn source(&self) -> Source {
        Source::Twitter
    }

    async fn fetch_posts(&self) -> Result<Vec<NormalizedPost>, FetchError> {
        self.fetch().await
    }
}

#[async_trait]
impl Provider for InstagramProvider {
    fn source(&self) -> Source {
        Source::Instagram
    }

    async fn fetch_posts(&self) -> Result<Vec<NormalizedPost>, FetchError> {
        self.fetch_cached().await
    }
}
