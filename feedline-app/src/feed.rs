use anyhow::{Context, Result};
use feedline_config::{FeedlineConfig, InstagramConfig, ProviderDetails, TwitterConfig};
use feedline_social::instagram::client::INSTAGRAM_API_BASE;
use feedline_social::twitter::client::TWITTER_API_BASE;
use feedline_social::{FetchError, InstagramProvider, NormalizedPost, Provider, TwitterProvider};
use futures::future::join_all;
use std::sync::Arc;

/// One provider per enabled config entry, fetched together.
pub struct Feed {
    providers: Vec<(String, Arc<dyn Provider>)>,
}

pub struct FeedFailure {
    pub provider_id: String,
    pub error: FetchError,
}

#[derive(Default)]
pub struct FeedReport {
    /// Config order, then each provider's own order.
    pub posts: Vec<NormalizedPost>,
    pub failures: Vec<FeedFailure>,
}

impl Feed {
    pub fn build_from_config(cfg: &FeedlineConfig) -> Result<Self> {
        let mut providers = Vec::new();
        for spec in cfg.enabled_providers() {
            let provider: Arc<dyn Provider> = match &spec.details {
                ProviderDetails::Twitter { config } => Arc::new(twitter_provider(config)?),
                ProviderDetails::Instagram { config } => {
                    let mut provider = instagram_provider(config)?;
                    if let Some(token) = &config.access_token {
                        provider = provider.with_access_token(token.clone());
                    } else {
                        tracing::warn!(
                            provider = %spec.id,
                            "instagram provider has no access_token; run `feedline instagram-auth` first"
                        );
                    }
                    Arc::new(provider)
                }
            };
            tracing::debug!(provider = %spec.id, source = %provider.source(), "feed.provider.ready");
            providers.push((spec.id.clone(), provider));
        }
        Ok(Self { providers })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run every provider once, concurrently. A failing provider does not
    /// affect the others and is never retried.
    pub async fn collect(&self) -> FeedReport {
        let results = join_all(self.providers.iter().map(|(id, p)| async move {
            (id.as_str(), p.fetch_posts().await)
        }))
        .await;

        let mut report = FeedReport::default();
        for (id, result) in results {
            match result {
                Ok(posts) => {
                    tracing::info!(provider = %id, count = posts.len(), "feed.provider.ok");
                    report.posts.extend(posts);
                }
                Err(error) => {
                    tracing::warn!(
                        provider = %id,
                        source = error.source_tag(),
                        error = %error,
                        "feed.provider.failed"
                    );
                    report.failures.push(FeedFailure {
                        provider_id: id.to_string(),
                        error,
                    });
                }
            }
        }
        report
    }
}

pub fn twitter_provider(config: &TwitterConfig) -> Result<TwitterProvider> {
    let base = config.base_url.as_deref().unwrap_or(TWITTER_API_BASE);
    TwitterProvider::with_base_url(config.credentials.clone(), base)
        .context("building twitter provider")
}

/// Built without the configured token so `initialize` always exchanges.
pub fn instagram_provider(config: &InstagramConfig) -> Result<InstagramProvider> {
    let base = config.base_url.as_deref().unwrap_or(INSTAGRAM_API_BASE);
    InstagramProvider::with_base_url(config.credentials.clone(), base)
        .context("building instagram provider")
}
