//! Page descriptor file loading.
//!
//! The input is a tab-separated file, one migration unit per line:
//!
//! ```text
//! <facebook page id>\t<target title>\t<target url>\t<target id>
//! ```
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum PagesError {
    #[error("Failed to read page descriptor file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: expected 4 tab-separated fields, found {found}")]
    MissingFields { line: usize, found: usize },

    #[error("Line {line}: invalid target URL '{url}': {source}")]
    InvalidUrl {
        line: usize,
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// One Facebook comment thread and the page it moves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub facebook_page_id: String,
    pub target_title: String,
    pub target_url: Url,
    pub target_id: String,
}

/// Reads every descriptor in `path`, in file order.
///
/// A missing file yields an empty list. Blank lines are skipped.
pub async fn load_comments_page_info(path: &Path) -> Result<Vec<PageDescriptor>, PagesError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No page descriptor file found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(PagesError::Io(e)),
    };

    let pages = parse_page_descriptors(&content)?;
    tracing::info!(path = %path.display(), count = pages.len(), "Loaded page descriptors");
    Ok(pages)
}

fn parse_page_descriptors(content: &str) -> Result<Vec<PageDescriptor>, PagesError> {
    let mut pages = Vec::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let [page_id, title, url, target_id, ..] = fields.as_slice() else {
            return Err(PagesError::MissingFields {
                line: line_no,
                found: fields.len(),
            });
        };

        let target_url = Url::parse(url.trim()).map_err(|source| PagesError::InvalidUrl {
            line: line_no,
            url: url.to_string(),
            source,
        })?;

        pages.push(PageDescriptor {
            facebook_page_id: page_id.trim().to_owned(),
            target_title: title.to_string(),
            target_url,
            target_id: target_id.trim().to_owned(),
        });
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_in_order() {
        let content = "111\tFirst post\thttps://ignas.me/first/\tfirst\n\
                       222\tSecond post\thttps://ignas.me/second/\tsecond\n";

        let pages = parse_page_descriptors(content).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].facebook_page_id, "111");
        assert_eq!(pages[0].target_title, "First post");
        assert_eq!(pages[0].target_url.as_str(), "https://ignas.me/first/");
        assert_eq!(pages[0].target_id, "first");
        assert_eq!(pages[1].facebook_page_id, "222");
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let content = "111\tTitle\thttps://ignas.me/\tid\r\n\r\n   \n";
        let pages = parse_page_descriptors(content).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].target_id, "id");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let content = "111\tTitle\thttps://ignas.me/\tid\tnotes";
        let pages = parse_page_descriptors(content).unwrap();
        assert_eq!(pages[0].target_id, "id");
    }

    #[test]
    fn test_missing_fields_reports_line() {
        let content = "111\tTitle\thttps://ignas.me/\tid\n222\tOnly title\n";
        let err = parse_page_descriptors(content).unwrap_err();
        assert!(matches!(err, PagesError::MissingFields { line: 2, found: 2 }));
    }

    #[test]
    fn test_invalid_url_reports_line() {
        let content = "111\tTitle\tnot a url\tid";
        let err = parse_page_descriptors(content).unwrap_err();
        assert!(matches!(err, PagesError::InvalidUrl { line: 1, .. }));
        assert!(err.to_string().contains("not a url"));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let path = Path::new("/tmp/fb2disqus_test_nonexistent_pages.tsv");
        let pages = load_comments_page_info(path).await.unwrap();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = std::env::temp_dir().join("fb2disqus_pages_test_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pages.tsv");
        std::fs::write(&path, "111\tTitle\thttps://ignas.me/post\tpost-1\n").unwrap();

        let pages = load_comments_page_info(&path).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].target_url.as_str(), "https://ignas.me/post");

        std::fs::remove_dir_all(&dir).ok();
    }
}
