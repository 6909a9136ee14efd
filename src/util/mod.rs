//! Utility functions shared by the client, formatter and file collaborators.
//!
//! - **Argument checks**: reject blank required strings before any I/O happens
//!
//! # Examples
//!
//! ```
//! use fb2disqus::util::require_non_blank;
//!
//! assert!(require_non_blank("pageId", "1234").is_ok());
//! assert!(require_non_blank("pageId", "   ").is_err());
//! ```

mod args;

pub use args::{require_non_blank, ArgumentError};
