//! OAuth 1.0a (HMAC-SHA1) request signing for the Twitter v1.1 REST API.
//!
//! Twitter's user-context endpoints expect an `Authorization: OAuth ...` header
//! whose signature covers the method, the base URL (no query) and every query
//! and `oauth_*` parameter, sorted and RFC 3986 percent-encoded.
use crate::error::ProviderError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// The four secrets that identify an app and the user it acts for.
#[derive(Debug, Clone, Copy)]
pub struct OAuthKeys<'a> {
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
    pub token: &'a str,
    pub token_secret: &'a str,
}

/// Per-request values; random/clock-derived in production, fixed in tests.
#[derive(Debug, Clone)]
pub struct OAuthStamp {
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuthStamp {
    pub fn now() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Self {
            nonce,
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
        }
    }
}

fn encode(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn oauth_params<'a>(keys: &OAuthKeys<'a>, stamp: &'a OAuthStamp, ts: &'a str) -> [(&'a str, &'a str); 6] {
    [
        ("oauth_consumer_key", keys.consumer_key),
        ("oauth_nonce", stamp.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", ts),
        ("oauth_token", keys.token),
        ("oauth_version", "1.0"),
    ]
}

/// Compute the base64 HMAC-SHA1 signature for a request.
///
/// `url` must not carry a query string; pass query (and form) parameters in
/// `params` instead.
pub fn signature(
    keys: &OAuthKeys<'_>,
    method: &str,
    url: &Url,
    params: &[(&str, &str)],
    stamp: &OAuthStamp,
) -> Result<String, ProviderError> {
    let ts = stamp.timestamp.to_string();

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .copied()
        .chain(oauth_params(keys, stamp, &ts))
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url.as_str()),
        encode(&param_string)
    );
    let signing_key = format!("{}&{}", encode(keys.consumer_secret), encode(keys.token_secret));

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| ProviderError::Credentials(format!("unusable signing key: {e}")))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the full `Authorization` header value for a signed request.
pub fn authorization_header(
    keys: &OAuthKeys<'_>,
    method: &str,
    url: &Url,
    params: &[(&str, &str)],
    stamp: &OAuthStamp,
) -> Result<String, ProviderError> {
    let sig = signature(keys, method, url, params, stamp)?;
    let ts = stamp.timestamp.to_string();

    let mut fields: Vec<(&str, &str)> = oauth_params(keys, stamp, &ts).to_vec();
    fields.push(("oauth_signature", sig.as_str()));
    fields.sort();

    let rendered = fields
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {rendered}"))
}
