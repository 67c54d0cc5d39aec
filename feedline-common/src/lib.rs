//! Common utilities shared across Feedline crates.
//!
//! Currently this is the tracing/logging initialisation used by the `feedline`
//! binary and by integration tests. It is intentionally lightweight so every
//! crate can depend on it without pulling in the HTTP or provider stacks.
//!
//! # Examples
//!
//! ```rust
//! use feedline_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "feedline");
//! assert_eq!(cfg.default_filter, "info");
//! ```
pub mod observability;
