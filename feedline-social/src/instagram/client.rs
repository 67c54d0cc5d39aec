//! Instagram provider: one-time OAuth code exchange plus recent-media fetch.
use crate::error::{FetchError, ProviderError};
use crate::instagram::types::TokenResponse;
use crate::normalize::normalize;
use crate::post::{NormalizedPost, Source};
use feedline_http::{Auth, HttpClient, HttpError, RequestOpts, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use tokio::sync::Mutex;

pub const INSTAGRAM_API_BASE: &str = "https://api.instagram.com/";
const TOKEN_PATH: &str = "oauth/access_token";
const RECENT_MEDIA_PATH: &str = "v1/users/self/media/recent/";

#[derive(Clone, Deserialize)]
pub struct InstagramCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for InstagramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstagramCredentials")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

pub struct InstagramProvider {
    http: HttpClient,
    credentials: InstagramCredentials,
    // set at most once; held across the exchange so concurrent first calls share one request
    access_token: Mutex<Option<String>>,
}

impl InstagramProvider {
    pub fn new(credentials: InstagramCredentials) -> Result<Self, ProviderError> {
        Self::with_base_url(credentials, INSTAGRAM_API_BASE)
    }

    /// Point the provider at another host (a proxy or a mock server).
    pub fn with_base_url(
        credentials: InstagramCredentials,
        base: &str,
    ) -> Result<Self, ProviderError> {
        let http = HttpClient::new(&format!("{}/", base.trim_end_matches('/')))?;
        Ok(Self {
            http,
            credentials,
            access_token: Mutex::new(None),
        })
    }

    /// Seed a token obtained earlier. Instagram tokens are long-lived, so the
    /// usual setup persists the one printed by the first exchange and passes it
    /// here instead of exchanging a new code on every start.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Mutex::new(Some(token.into()));
        self
    }

    pub async fn access_token(&self) -> Option<String> {
        self.access_token.lock().await.clone()
    }

    /// Exchange an authorization `code` for an access token.
    ///
    /// Returns the raw token-endpoint body; persisting the token is the
    /// caller's job. When a token is already held it is returned as-is and no
    /// request is made. Failures are the untagged HTTP error.
    pub async fn initialize(&self, code: &str) -> Result<String, HttpError> {
        let mut held = self.access_token.lock().await;
        if let Some(token) = held.as_ref() {
            tracing::debug!("instagram.initialize: token already held, skipping exchange");
            return Ok(token.clone());
        }

        let body = self
            .http
            .post_form_text(
                TOKEN_PATH,
                &[
                    ("client_id", self.credentials.client_id.as_str()),
                    ("client_secret", self.credentials.client_secret.as_str()),
                    ("grant_type", "authorization_code"),
                    ("redirect_uri", self.credentials.redirect_uri.as_str()),
                    ("code", code),
                ],
                RequestOpts {
                    error_status_floor: Some(StatusCode::BAD_REQUEST),
                    ..Default::default()
                },
            )
            .await?;

        match serde_json::from_str::<TokenResponse>(&body) {
            Ok(parsed) => {
                *held = Some(parsed.access_token);
                tracing::info!("instagram.initialize: access token exchanged");
            }
            Err(e) => tracing::warn!(
                error = %e,
                "instagram.initialize: exchange succeeded but body has no access_token"
            ),
        }
        Ok(body)
    }

    /// Fetch and normalize the token owner's recent media.
    pub async fn fetch(&self, access_token: &str) -> Result<Vec<NormalizedPost>, FetchError> {
        let items = self
            .recent_media(access_token)
            .await
            .map_err(|e| FetchError::new(Source::Instagram, e))?;

        let posts = normalize(Source::Instagram, &items);
        tracing::info!(
            raw_count = items.len(),
            post_count = posts.len(),
            "instagram.fetch.done"
        );
        Ok(posts)
    }

    /// [`fetch`](Self::fetch) with the held token.
    pub async fn fetch_cached(&self) -> Result<Vec<NormalizedPost>, FetchError> {
        let token = self
            .access_token()
            .await
            .ok_or_else(|| FetchError::new(Source::Instagram, ProviderError::MissingAccessToken))?;
        self.fetch(&token).await
    }

    async fn recent_media(&self, access_token: &str) -> Result<Vec<Value>, ProviderError> {
        let body: Value = self
            .http
            .get_json(
                RECENT_MEDIA_PATH,
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "access_token",
                        value: Cow::Borrowed(access_token),
                    }),
                    error_status_floor: Some(StatusCode::BAD_REQUEST),
                    ..Default::default()
                },
            )
            .await?;

        extract_data(body)
    }
}

fn extract_data(body: Value) -> Result<Vec<Value>, ProviderError> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(ProviderError::MalformedResponse(format!(
                "`data` is not an array: {other}"
            ))),
            None => Err(ProviderError::MalformedResponse(
                "response has no `data` field".into(),
            )),
        },
        other => Err(ProviderError::MalformedResponse(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_array_is_extracted() {
        let items = extract_data(json!({ "data": [{ "id": "1" }], "meta": { "code": 200 } })).unwrap();
        assert_eq!(items, vec![json!({ "id": "1" })]);
    }

    #[test]
    fn missing_or_wrong_data_is_malformed() {
        assert!(matches!(
            extract_data(json!({ "meta": {} })),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_data(json!({ "data": {} })),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_data(json!([1, 2])),
            Err(ProviderError::MalformedResponse(_))
        ));
    }
}
