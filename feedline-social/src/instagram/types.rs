use crate::normalize::or_none;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One item of `users/self/media/recent`'s `data` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramMedia {
    pub id: String,
    #[serde(default)]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub caption: Option<Caption>,
    #[serde(default, deserialize_with = "or_none")]
    pub user: Option<InstagramUser>,
    #[serde(default, deserialize_with = "or_none")]
    pub images: Option<Images>,
    /// Unix seconds; the API sends it as a string, older payloads as a number.
    #[serde(default)]
    pub created_time: Option<Value>,
}

impl InstagramMedia {
    pub fn created_unix(&self) -> Option<i64> {
        match self.created_time.as_ref()? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Images {
    #[serde(default, deserialize_with = "or_none")]
    pub standard_resolution: Option<Image>,
    #[serde(default, deserialize_with = "or_none")]
    pub low_resolution: Option<Image>,
    #[serde(default, deserialize_with = "or_none")]
    pub thumbnail: Option<Image>,
}

impl Images {
    /// Largest rendition that has a url.
    pub fn best(&self) -> Option<&str> {
        [&self.standard_resolution, &self.low_resolution, &self.thumbnail]
            .into_iter()
            .flatten()
            .find_map(|image| image.url.as_deref().filter(|u| !u.is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "or_none")]
    pub height: Option<u32>,
}

/// Token-exchange response; only the token itself is read.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}
