//! Migrates Facebook comment threads into Disqus-importable WXR files.
//!
//! A run exchanges app credentials for a token, walks every configured
//! page's comment tree through the Graph API, and writes one import file per
//! page. See [`migration::run`] for the whole flow.

pub mod config;
pub mod disqus;
pub mod export;
pub mod facebook;
pub mod migration;
pub mod pages;
pub mod util;
