//! Social network providers used by Feedline.
//!
//! Each provider issues a single request to its network, maps failures into a
//! [`FetchError`] tagged with the network's [`Source`], and normalizes the
//! response into [`NormalizedPost`] records via [`normalize`].
pub mod error;
pub mod instagram;
pub mod normalize;
pub mod post;
pub mod provider;
pub mod twitter;

pub use error::{FetchError, ProviderError};
pub use instagram::{InstagramCredentials, InstagramProvider};
pub use normalize::normalize;
pub use post::{NormalizedPost, PostKind, Source};
pub use provider::Provider;
pub use twitter::{TwitterCredentials, TwitterProvider};
