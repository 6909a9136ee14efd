//! Disqus import file generation.
//!
//! - [`formatter`] - Flattens comment trees into export comments
//! - [`document`] - The WXR document model and its XML serialization

pub mod document;
pub mod formatter;

pub use document::{ExportComment, ExportDocument};
pub use formatter::{CommentsFormatter, DateFormat, FormatError};
