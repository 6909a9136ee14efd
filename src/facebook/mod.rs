//! Facebook Graph API access for comment threads.
//!
//! - [`types`] - Wire records (`AccessToken`, `Comment`, `CommentsPage`)
//! - [`parser`] - Strict JSON decoding of response bodies
//! - [`client`] - Token exchange and the reply-tree walk
//!
//! # Example
//!
//! ```ignore
//! use fb2disqus::facebook::{CommentsClient, DEFAULT_BASE_URL};
//!
//! let client = CommentsClient::new(reqwest::Client::new(), DEFAULT_BASE_URL)?;
//! let token = client.get_access_token(&app_id, &app_secret).await?;
//! let comments = client.get_page_comments(&token, "1234567890").await?;
//! ```

pub mod client;
pub mod parser;
pub mod types;

pub use client::{
    ApiError, ClientError, CommentsClient, DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENT_REQUESTS,
};
pub use parser::{parse, ParseError};
pub use types::{AccessToken, Comment, CommentUser, CommentsPage, PageContents};
