//! Twitter v1.1 timeline provider.
//!
//! Signs a single `statuses/user_timeline` request with the account's OAuth 1.0a
//! keys, prepends a profile summary derived from the first tweet, and hands the
//! combined array to the normalizer.
use crate::error::{FetchError, ProviderError};
use crate::normalize::normalize;
use crate::post::{NormalizedPost, Source};
use crate::twitter::oauth::{self, OAuthKeys, OAuthStamp};
use crate::twitter::types::{ProfileSummary, TwitterUser};
use feedline_http::{AUTHORIZATION, Auth, HeaderValue, HttpClient, RequestOpts};
use serde::Deserialize;
use serde_json::Value;

pub const TWITTER_API_BASE: &str = "https://api.twitter.com/";
const USER_TIMELINE_PATH: &str = "1.1/statuses/user_timeline.json";

#[derive(Clone, Deserialize)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token_key: String,
    pub access_token_secret: String,
    pub screen_name: String,
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("screen_name", &self.screen_name)
            .finish_non_exhaustive()
    }
}

impl TwitterCredentials {
    fn validate(&self) -> Result<(), ProviderError> {
        let fields = [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token_key", &self.access_token_key),
            ("access_token_secret", &self.access_token_secret),
            ("screen_name", &self.screen_name),
        ];
        match fields.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((name, _)) => Err(ProviderError::Credentials(format!(
                "twitter `{name}` must not be empty"
            ))),
            None => Ok(()),
        }
    }

    fn oauth_keys(&self) -> OAuthKeys<'_> {
        OAuthKeys {
            consumer_key: &self.consumer_key,
            consumer_secret: &self.consumer_secret,
            token: &self.access_token_key,
            token_secret: &self.access_token_secret,
        }
    }
}

#[derive(Clone)]
pub struct TwitterProvider {
    http: HttpClient,
    credentials: TwitterCredentials,
}

impl TwitterProvider {
    pub fn new(credentials: TwitterCredentials) -> Result<Self, ProviderError> {
        Self::with_base_url(credentials, TWITTER_API_BASE)
    }

    /// Point the provider at another host (a proxy or a mock server).
    pub fn with_base_url(credentials: TwitterCredentials, base: &str) -> Result<Self, ProviderError> {
        credentials.validate()?;
        let http = HttpClient::new(&format!("{}/", base.trim_end_matches('/')))?;
        Ok(Self { http, credentials })
    }

    pub fn screen_name(&self) -> &str {
        &self.credentials.screen_name
    }

    /// Fetch and normalize the configured account's recent timeline.
    ///
    /// The first element is the account's profile summary unless the timeline
    /// is empty, in which case the result is empty too.
    pub async fn fetch(&self) -> Result<Vec<NormalizedPost>, FetchError> {
        let raw = self
            .user_timeline()
            .await
            .map_err(|e| FetchError::new(Source::Twitter, e))?;

        let records = with_profile_summary(raw);
        let posts = normalize(Source::Twitter, &records);
        tracing::info!(
            screen_name = %self.credentials.screen_name,
            raw_count = records.len(),
            post_count = posts.len(),
            "twitter.fetch.done"
        );
        Ok(posts)
    }

    async fn user_timeline(&self) -> Result<Vec<Value>, ProviderError> {
        let url = self.http.url_for(USER_TIMELINE_PATH)?;
        let screen_name = self.credentials.screen_name.as_str();

        let header = oauth::authorization_header(
            &self.credentials.oauth_keys(),
            "GET",
            &url,
            &[("screen_name", screen_name)],
            &OAuthStamp::now(),
        )?;
        let value = HeaderValue::from_str(&header)
            .map_err(|e| ProviderError::Credentials(format!("unusable OAuth header: {e}")))?;

        let raw: Vec<Value> = self
            .http
            .get_json(
                USER_TIMELINE_PATH,
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: AUTHORIZATION,
                        value,
                    }),
                    query: Some(vec![("screen_name", screen_name.into())]),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(screen_name, count = raw.len(), "twitter.user_timeline");
        Ok(raw)
    }
}

/// Prepend the account's profile summary, taken from `raw[0].user`.
///
/// An empty timeline, or a first element without a usable `user`, is returned
/// unchanged.
pub fn with_profile_summary(mut raw: Vec<Value>) -> Vec<Value> {
    let Some(summary) = raw
        .first()
        .and_then(|first| first.get("user"))
        .and_then(|u| TwitterUser::deserialize(u).ok())
        .and_then(|user| ProfileSummary::from_user(&user))
    else {
        if !raw.is_empty() {
            tracing::debug!("twitter.profile_summary.skipped: first tweet has no user id");
        }
        return raw;
    };

    match serde_json::to_value(summary) {
        Ok(profile) => raw.insert(0, profile),
        Err(e) => tracing::warn!(error = %e, "twitter.profile_summary.encode_failed"),
    }
    raw
}
