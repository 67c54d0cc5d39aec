//! Instagram (legacy API) integration: token exchange and recent media.
pub mod client;
pub mod types;

pub use client::{InstagramCredentials, InstagramProvider};
