#![deny(missing_docs)]
//! X media relay bot.
//!
//! Resolves X (Twitter) post links sent to a Telegram bot into the photos and
//! videos attached to the post and replies with them.

/// Telegram transport (dispatcher wiring, handlers, resilient replies).
pub mod bot;
/// Configuration management.
pub mod config;
/// Link matching, media resolution, rate-limit retry and reply dispatch.
pub mod media;
/// X API v2 client and payload model.
pub mod twitter;
/// Utility functions.
pub mod utils;
