//! Maps provider-native records onto [`NormalizedPost`].
//!
//! Pure and infallible: records that cannot be read, or that carry no
//! identifier, are skipped rather than failing the batch.
use crate::instagram::types::InstagramMedia;
use crate::post::{NormalizedPost, PostKind, Source};
use crate::twitter::types::{ProfileSummary, Tweet, TwitterRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Normalize a batch of raw records from `source`.
///
/// ```
/// use feedline_social::{normalize, PostKind, Source};
/// use serde_json::json;
///
/// let posts = normalize(Source::Twitter, &[json!({
///     "id": "42", "name": "Alice", "handle": "alice", "profileImage": null
/// })]);
/// assert_eq!(posts[0].kind, PostKind::Profile);
/// assert_eq!(posts[0].handle.as_deref(), Some("alice"));
/// ```
pub fn normalize(source: Source, raw_items: &[Value]) -> Vec<NormalizedPost> {
    raw_items
        .iter()
        .filter_map(|item| {
            let post = match source {
                Source::Twitter => normalize_twitter(item),
                Source::Instagram => normalize_instagram(item),
            };
            if post.is_none() {
                tracing::debug!(%source, "normalize.skipped: no recognizable id");
            }
            post
        })
        .collect()
}

fn normalize_twitter(item: &Value) -> Option<NormalizedPost> {
    match TwitterRecord::deserialize(item).ok()? {
        TwitterRecord::Profile(profile) => twitter_profile(profile),
        TwitterRecord::Tweet(tweet) => twitter_post(tweet),
    }
}

fn twitter_profile(profile: ProfileSummary) -> Option<NormalizedPost> {
    if profile.id.is_empty() {
        return None;
    }
    let mut post = NormalizedPost::new(Source::Twitter, PostKind::Profile, profile.id);
    post.permalink = (!profile.handle.is_empty())
        .then(|| format!("https://twitter.com/{}", profile.handle));
    post.author_name = profile.name;
    post.handle = Some(profile.handle).filter(|h| !h.is_empty());
    post.profile_image = profile.profile_image;
    Some(post)
}

fn twitter_post(tweet: Tweet) -> Option<NormalizedPost> {
    let id = tweet.id()?;
    let mut post = NormalizedPost::new(Source::Twitter, PostKind::Post, id);

    if let Some(user) = &tweet.user {
        post.author_name = user.name.clone();
        post.handle = user.screen_name.clone();
        post.profile_image = user.profile_image_url_https.clone();
    }
    post.permalink = post
        .handle
        .as_ref()
        .map(|h| format!("https://twitter.com/{}/status/{}", h, post.id));
    post.content = tweet.full_text.or(tweet.text);
    post.media_url = tweet
        .extended_entities
        .as_ref()
        .or(tweet.entities.as_ref())
        .and_then(|e| e.media.as_ref())
        .and_then(|m| m.iter().find_map(|m| m.media_url_https.clone()));
    post.created_at = tweet.created_at.as_deref().and_then(parse_twitter_date);
    Some(post)
}

fn normalize_instagram(item: &Value) -> Option<NormalizedPost> {
    let media = InstagramMedia::deserialize(item).ok()?;
    if media.id.is_empty() {
        return None;
    }
    let created_unix = media.created_unix();

    let mut post = NormalizedPost::new(Source::Instagram, PostKind::Post, media.id);
    if let Some(user) = media.user {
        post.author_name = user.full_name;
        post.handle = user.username;
        post.profile_image = user.profile_picture;
    }
    post.content = media.caption.and_then(|c| c.text);
    post.permalink = media.link;
    post.media_url = media
        .images
        .as_ref()
        .and_then(|i| i.best())
        .map(str::to_owned);
    post.created_at = created_unix.and_then(unix_to_rfc3339);
    Some(post)
}

/// Nested records that do not match their model read as absent, so one odd
/// field never costs the whole post.
pub(crate) fn or_none<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(d)?;
    Ok(serde_json::from_value(raw).ok())
}

/// `Wed Oct 10 20:19:24 +0000 2018` to RFC 3339.
fn parse_twitter_date(raw: &str) -> Option<String> {
    let format = format_description!(
        "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
    );
    OffsetDateTime::parse(raw, &format)
        .ok()?
        .format(&Rfc3339)
        .ok()
}

fn unix_to_rfc3339(secs: i64) -> Option<String> {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()?
        .format(&Rfc3339)
        .ok()
}
