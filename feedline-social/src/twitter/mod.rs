//! Twitter v1.1 integration: request signing, response models, and the
//! timeline provider.
pub mod client;
pub mod oauth;
pub mod types;

pub use client::{TwitterCredentials, TwitterProvider, with_profile_summary};
