use crate::post::Source;
use feedline_http::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure, error status, or undecodable body from the HTTP layer.
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no access token available; exchange an authorization code first")]
    MissingAccessToken,

    #[error("invalid credentials: {0}")]
    Credentials(String),
}

impl ProviderError {
    /// Upstream response body, when the failure was an error status.
    pub fn body(&self) -> Option<&str> {
        match self {
            ProviderError::Http(HttpError::Api { body, .. }) => Some(body),
            _ => None,
        }
    }
}

/// A provider failure tagged with the network it came from.
#[derive(Debug, Error)]
#[error("{provider} fetch failed: {error}")]
pub struct FetchError {
    pub provider: Source,
    #[source]
    pub error: ProviderError,
}

impl FetchError {
    pub fn new(provider: Source, error: impl Into<ProviderError>) -> Self {
        Self {
            provider,
            error: error.into(),
        }
    }

    /// The `"twitter"` / `"instagram"` tag.
    pub fn source_tag(&self) -> &'static str {
        self.provider.as_str()
    }
}
