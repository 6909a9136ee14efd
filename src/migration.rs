//! One migration run: token, page descriptors, then fetch, convert and save
//! each page in file order.
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::Config;
use crate::disqus::{CommentsFormatter, DateFormat, FormatError};
use crate::export::{format_output_file_path, save_as_xml};
use crate::facebook::{ClientError, CommentsClient};
use crate::pages::{load_comments_page_info, PagesError};
use crate::util::ArgumentError;

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ReturnCode {
    UnexpectedError = -1,
    Success = 0,
    AccessTokenError = 1,
    FacebookGetTokenError = 2,
    NoCommentsInfoError = 3,
    FacebookGetCommentsError = 4,
    DisqusConversionError = 5,
}

impl ReturnCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Access token was not retrieved.")]
    EmptyAccessToken,

    #[error("Failed to get access token: {0}")]
    Token(#[source] ClientError),

    #[error("No pages to migrate in '{}'", .0.display())]
    NoPages(PathBuf),

    #[error(transparent)]
    Pages(#[from] PagesError),

    #[error("Failed to get comments for page '{page_id}': {source}")]
    Comments {
        page_id: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to convert comments for '{title}': {source}")]
    Conversion {
        title: String,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    OutputPath(#[from] ArgumentError),

    #[error("Failed to save '{}': {source:#}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl MigrationError {
    /// Only API-level failures get their own code; argument and transport
    /// errors count as unexpected.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            MigrationError::EmptyAccessToken => ReturnCode::AccessTokenError,
            MigrationError::Token(ClientError::Api(_)) => ReturnCode::FacebookGetTokenError,
            MigrationError::NoPages(_) => ReturnCode::NoCommentsInfoError,
            MigrationError::Comments {
                source: ClientError::Api(_),
                ..
            } => ReturnCode::FacebookGetCommentsError,
            MigrationError::Conversion { .. } => ReturnCode::DisqusConversionError,
            MigrationError::Token(_)
            | MigrationError::Pages(_)
            | MigrationError::Comments { .. }
            | MigrationError::OutputPath(_)
            | MigrationError::Save { .. } => ReturnCode::UnexpectedError,
        }
    }
}

/// Everything a run needs besides the client.
pub struct MigrationSettings {
    pub app_id: String,
    pub app_secret: SecretString,
    pub input_file_path: PathBuf,
    pub output_path: PathBuf,
    pub date_format: DateFormat,
}

impl MigrationSettings {
    pub fn from_config(config: &Config) -> Self {
        let credentials = config.credentials();
        Self {
            app_id: credentials.app_id,
            app_secret: credentials.app_secret,
            input_file_path: config.input_file_path.clone(),
            output_path: config.output_path.clone(),
            date_format: config.date_format,
        }
    }
}

/// Runs the migration and reports the outcome as a [`ReturnCode`].
///
/// Stops at the first failing page; files written for earlier pages stay.
pub async fn run(settings: &MigrationSettings, client: &CommentsClient) -> ReturnCode {
    match migrate(settings, client).await {
        Ok(saved) => {
            tracing::info!(pages = saved.len(), "Migration finished");
            ReturnCode::Success
        }
        Err(e) => {
            let code = e.return_code();
            tracing::error!(error = %e, code = code.code(), "Migration failed");
            eprintln!("Error. {e}");
            code
        }
    }
}

/// Runs the migration, returning the paths written in page order.
pub async fn migrate(
    settings: &MigrationSettings,
    client: &CommentsClient,
) -> Result<Vec<PathBuf>, MigrationError> {
    let access_token = client
        .get_access_token(&settings.app_id, settings.app_secret.expose_secret())
        .await
        .map_err(MigrationError::Token)?;
    if access_token.trim().is_empty() {
        return Err(MigrationError::EmptyAccessToken);
    }
    let access_token = SecretString::from(access_token);
    println!("Access token retrieved.");

    let pages = load_comments_page_info(&settings.input_file_path).await?;
    if pages.is_empty() {
        return Err(MigrationError::NoPages(settings.input_file_path.clone()));
    }

    let formatter = CommentsFormatter::new(settings.date_format);
    let output_folder = settings.output_path.to_string_lossy();
    let mut saved = Vec::with_capacity(pages.len());

    for page in &pages {
        let comments = client
            .get_page_comments(access_token.expose_secret(), &page.facebook_page_id)
            .await
            .map_err(|source| MigrationError::Comments {
                page_id: page.facebook_page_id.clone(),
                source,
            })?;
        println!(
            "Page '{}', comments count: {}",
            page.target_title,
            comments.len()
        );

        let document = formatter
            .convert_comments(
                &comments,
                &page.target_title,
                &page.target_url,
                &page.target_id,
            )
            .map_err(|source| MigrationError::Conversion {
                title: page.target_title.clone(),
                source,
            })?;

        let path = format_output_file_path(&output_folder, &page.target_title)?;
        save_as_xml(&document, &path).map_err(|source| MigrationError::Save {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            page_id = %page.facebook_page_id,
            comments = document.comments.len(),
            path = %path.display(),
            "Page migrated"
        );
        println!("Disqus comments saved into: {}", path.display());
        saved.push(path);
    }

    Ok(saved)
}
