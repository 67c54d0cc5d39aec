use crate::normalize::or_none;
use serde::{Deserialize, Serialize};

/// A v1.1 status object as returned by `statuses/user_timeline`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub text: Option<String>,
    /// Present instead of `text` when `tweet_mode=extended`.
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub user: Option<TwitterUser>,
    #[serde(default, deserialize_with = "or_none")]
    pub entities: Option<Entities>,
    #[serde(default, deserialize_with = "or_none")]
    pub extended_entities: Option<Entities>,
}

impl Tweet {
    pub fn id(&self) -> Option<String> {
        self.id_str
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.id.map(|n| n.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterUser {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub profile_image_url_https: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Entities {
    #[serde(default)]
    pub media: Option<Vec<MediaEntity>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntity {
    #[serde(default)]
    pub media_url_https: Option<String>,
    #[serde(default)]
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Account metadata record synthesized from the first tweet's `user`.
///
/// The timeline response has no separate account block, so this is prepended
/// to the raw array before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub handle: String,
    #[serde(default, rename = "profileImage")]
    pub profile_image: Option<String>,
}

impl ProfileSummary {
    /// `None` when the user carries no usable `id_str`.
    pub fn from_user(user: &TwitterUser) -> Option<Self> {
        let id = user.id_str.clone().filter(|id| !id.is_empty())?;
        Some(Self {
            id,
            name: user.name.clone(),
            handle: user.screen_name.clone().unwrap_or_default(),
            profile_image: user.profile_image_url_https.clone(),
        })
    }
}

/// One element of the (profile + timeline) array handed to the normalizer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TwitterRecord {
    Profile(ProfileSummary),
    Tweet(Tweet),
}
