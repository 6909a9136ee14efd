use crate::facebook::parser::{parse, ParseError};
use crate::facebook::types::{AccessToken, Comment, CommentsPage, PageContents};
use crate::util::{require_non_blank, ArgumentError};
use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;
use url::Url;

/// Root of the public Graph API.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Sibling reply pages fetched at once when no bound is configured.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// The Graph API answered, but not with anything usable.
///
/// Display strings are stable: callers and logs match on them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-2xx status from either endpoint
    #[error("Http client response was not successful.")]
    NotSuccessful { status: u16 },
    /// 2xx with an empty body from the token endpoint
    #[error("Http client response was empty.")]
    EmptyTokenResponse,
    /// 2xx with an empty body from the comments endpoint
    #[error("Http client response is empty.")]
    EmptyCommentsResponse,
    /// Token body did not decode into a token record
    #[error("Token parsing failed.")]
    TokenParsing,
}

/// Everything that can go wrong while talking to the Graph API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Comments body was not valid JSON
    #[error("Comments response could not be decoded: {0}")]
    Parse(#[source] ParseError),
    /// Connection, TLS, timeout or body read failure. Never retried.
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

/// Client for the two Graph API calls the migration needs.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct CommentsClient {
    http: reqwest::Client,
    base_url: Url,
    max_concurrent_requests: usize,
}

impl CommentsClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// App secrets and tokens travel in query strings, so anything other than
    /// HTTPS is refused unless the host is `localhost`/`127.0.0.1`.
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        if base_url.scheme() != "https" {
            let is_localhost = base_url.scheme() == "http"
                && matches!(base_url.host_str(), Some("localhost") | Some("127.0.0.1"));
            if !is_localhost {
                tracing::error!(base_url = %base_url, "Rejecting non-HTTPS Graph API base URL");
                return Err(ClientError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base_url, "Using non-HTTPS Graph API base URL (localhost only)");
        }

        Ok(Self {
            http,
            base_url,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        })
    }

    /// Caps how many sibling reply pages are in flight at once. `1` fetches
    /// them one after another; `0` is treated as `1`.
    pub fn with_max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = limit.max(1);
        self
    }

    /// Exchanges app credentials for an app access token.
    ///
    /// The returned token is passed through as-is and may be empty; deciding
    /// whether an empty token is usable is up to the caller.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Argument`] if either credential is blank (no request is sent)
    /// - [`ApiError::NotSuccessful`] for a non-2xx status
    /// - [`ApiError::EmptyTokenResponse`] for an empty body
    /// - [`ApiError::TokenParsing`] if the body is not a token record
    /// - [`ClientError::Network`] for transport failures
    pub async fn get_access_token(
        &self,
        app_id: &str,
        app_secret: &str,
    ) -> Result<String, ClientError> {
        require_non_blank("appId", app_id)?;
        require_non_blank("appSecret", app_secret)?;

        let mut url = self.endpoint(&["oauth", "access_token"]);
        url.query_pairs_mut()
            .append_pair("client_id", app_id)
            .append_pair("client_secret", app_secret)
            .append_pair("grant_type", "client_credentials");

        tracing::debug!("Requesting app access token");
        let body = self.get_body(url).await?;
        if body.trim().is_empty() {
            return Err(ApiError::EmptyTokenResponse.into());
        }

        match parse::<Option<AccessToken>>(&body) {
            Ok(Some(token)) => Ok(token.value),
            Ok(None) => Err(ApiError::TokenParsing.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Token response is not a token record");
                Err(ApiError::TokenParsing.into())
            }
        }
    }

    /// Fetches the comments on `page_id` with every reply level resolved.
    ///
    /// Each comment's own id is queried as a page to find its replies, until
    /// the API answers with no data. Levels are walked breadth-first; pages
    /// within a level are fetched through an order-preserving stream bounded
    /// by [`with_max_concurrent_requests`](Self::with_max_concurrent_requests),
    /// so the result keeps the API's ordering at every level. Every returned
    /// comment has `children` set.
    ///
    /// The first failure at any level aborts the walk and is returned as-is.
    pub async fn get_page_comments(
        &self,
        access_token: &str,
        page_id: &str,
    ) -> Result<Vec<Comment>, ClientError> {
        require_non_blank("accessToken", access_token)?;
        require_non_blank("pageId", page_id)?;

        let top_level = match self.fetch_page(access_token, page_id).await? {
            PageContents::NoData => {
                tracing::debug!(page_id = %page_id, "Page has no comments");
                return Ok(Vec::new());
            }
            PageContents::Comments(comments) => comments,
        };

        let mut tree = CommentArena::default();
        let roots: Vec<usize> = top_level
            .into_iter()
            .map(|comment| tree.insert(comment, None))
            .collect();

        let mut frontier = roots.clone();
        let mut depth = 0usize;

        while !frontier.is_empty() {
            depth += 1;
            let ids: Vec<String> = frontier.iter().map(|&idx| tree.id(idx).to_owned()).collect();

            let pages: Vec<PageContents> = stream::iter(ids)
                .map(|id| async move { self.fetch_page(access_token, &id).await })
                .buffered(self.max_concurrent_requests)
                .try_collect()
                .await?;

            let mut next = Vec::new();
            for (&parent, page) in frontier.iter().zip(pages) {
                if let PageContents::Comments(replies) = page {
                    for reply in replies {
                        next.push(tree.insert(reply, Some(parent)));
                    }
                }
            }

            tracing::trace!(
                page_id = %page_id,
                depth = depth,
                fetched = frontier.len(),
                replies = next.len(),
                "Resolved reply level"
            );
            frontier = next;
        }

        let total = tree.len();
        let comments = tree.into_tree(&roots);
        tracing::debug!(
            page_id = %page_id,
            top_level = comments.len(),
            total = total,
            levels = depth,
            "Fetched comment tree"
        );
        Ok(comments)
    }

    /// One comments request. No recursion; the caller walks the levels.
    async fn fetch_page(
        &self,
        access_token: &str,
        page_id: &str,
    ) -> Result<PageContents, ClientError> {
        require_non_blank("pageId", page_id)?;

        let mut url = self.endpoint(&["comments"]);
        url.query_pairs_mut()
            .append_pair("id", page_id)
            .append_pair("access_token", access_token);

        let body = self.get_body(url).await?;
        if body.trim().is_empty() {
            return Err(ApiError::EmptyCommentsResponse.into());
        }

        let page = parse::<Option<CommentsPage>>(&body).map_err(ClientError::Parse)?;
        Ok(page
            .map(CommentsPage::into_contents)
            .unwrap_or(PageContents::NoData))
    }

    /// Sends a GET and returns the body of a 2xx response.
    ///
    /// The URL carries credentials and is never logged.
    async fn get_body(&self, url: Url) -> Result<String, ClientError> {
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(status = status, "Graph API request was not successful");
            return Err(ApiError::NotSuccessful { status }.into());
        }

        read_body_capped(response, MAX_RESPONSE_SIZE).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base URLs are rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Flat storage for the walk. A reply is always inserted after its parent,
/// so every child index is greater than its parent's.
#[derive(Default)]
struct CommentArena {
    comments: Vec<Comment>,
    children: Vec<Vec<usize>>,
}

impl CommentArena {
    fn insert(&mut self, comment: Comment, parent: Option<usize>) -> usize {
        let idx = self.comments.len();
        self.comments.push(comment);
        self.children.push(Vec::new());
        if let Some(parent) = parent {
            self.children[parent].push(idx);
        }
        idx
    }

    fn id(&self, idx: usize) -> &str {
        &self.comments[idx].id
    }

    fn len(&self) -> usize {
        self.comments.len()
    }

    /// Rebuilds the nested tree, filling `children` on every node.
    fn into_tree(self, roots: &[usize]) -> Vec<Comment> {
        let mut built: Vec<Option<Comment>> = self.comments.into_iter().map(Some).collect();

        for idx in (0..built.len()).rev() {
            let replies: Vec<Comment> = self.children[idx]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            if let Some(comment) = built[idx].as_mut() {
                comment.children = Some(replies);
            }
        }

        roots.iter().filter_map(|&idx| built[idx].take()).collect()
    }
}

/// Collects the body as UTF-8, giving up as soon as it grows past `limit`.
async fn read_body_capped(response: reqwest::Response, limit: usize) -> Result<String, ClientError> {
    if response
        .content_length()
        .is_some_and(|declared| declared > limit as u64)
    {
        return Err(ClientError::ResponseTooLarge(limit));
    }

    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.try_next().await? {
        if body.len() + chunk.len() > limit {
            return Err(ClientError::ResponseTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }

    String::from_utf8(body).map_err(|_| ClientError::InvalidUtf8)
}
