use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::disqus::document::{ExportComment, ExportDocument, NO_PARENT};
use crate::facebook::Comment;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Every comment needs its `from` record to name the author.
    #[error("Comment '{comment_id}' has no author")]
    MissingAuthor { comment_id: String },
}

/// How `comment_date_gmt` is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// `2017-03-20 12:13:14`
    #[default]
    Iso,
    /// Byte-compatible with files produced by the first release of this
    /// tool, which wrote the month where the minutes belong:
    /// `2017-03-20 12:03:14`.
    Legacy,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Iso => "%Y-%m-%d %H:%M:%S",
            DateFormat::Legacy => "%Y-%m-%d %H:%m:%S",
        }
    }

    pub fn format(self, time: &DateTime<Utc>) -> String {
        time.format(self.pattern()).to_string()
    }
}

/// Turns resolved comment trees into Disqus import documents.
///
/// Pure transform: no network or disk access.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentsFormatter {
    date_format: DateFormat,
}

impl CommentsFormatter {
    pub fn new(date_format: DateFormat) -> Self {
        Self { date_format }
    }

    /// Builds the import document for one page.
    ///
    /// `page_title` and `page_id` are written as given, even when empty.
    pub fn convert_comments(
        &self,
        comments: &[Comment],
        page_title: &str,
        page_url: &Url,
        page_id: &str,
    ) -> Result<ExportDocument, FormatError> {
        Ok(ExportDocument {
            title: page_title.to_owned(),
            link: page_url.to_string(),
            thread_identifier: page_id.to_owned(),
            comments: self.create_comments_list(comments)?,
        })
    }

    /// Flattens comment trees into export comments.
    ///
    /// Each top-level comment is followed by all of its replies, at any
    /// depth, in depth-first order. The import format nests only one level,
    /// so every reply points at the top-level comment of its thread.
    /// Unresolved reply lists are treated as empty.
    pub fn create_comments_list(
        &self,
        comments: &[Comment],
    ) -> Result<Vec<ExportComment>, FormatError> {
        let mut list = Vec::with_capacity(comments.len());

        for comment in comments {
            list.push(self.create_comment(comment, None)?);

            let mut pending: Vec<&Comment> = comment.replies().iter().rev().collect();
            while let Some(reply) = pending.pop() {
                list.push(self.create_comment(reply, Some(&comment.id))?);
                pending.extend(reply.replies().iter().rev());
            }
        }

        Ok(list)
    }

    /// Converts a single comment. `parent_id` of `None` marks a top-level
    /// comment (`comment_parent` of `"0"`).
    pub fn create_comment(
        &self,
        comment: &Comment,
        parent_id: Option<&str>,
    ) -> Result<ExportComment, FormatError> {
        let author = comment
            .author
            .as_ref()
            .ok_or_else(|| FormatError::MissingAuthor {
                comment_id: comment.id.clone(),
            })?;

        Ok(ExportComment {
            id: comment.id.clone(),
            author: author.name.clone(),
            date_gmt: comment
                .created_time
                .as_ref()
                .map(|t| self.date_format.format(t))
                .unwrap_or_default(),
            content: comment.message.clone(),
            parent: parent_id.unwrap_or(NO_PARENT).to_owned(),
        })
    }
}
