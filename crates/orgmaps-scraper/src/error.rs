use thiserror::Error;

/// Errors that escape the scraper.
///
/// Only session setup surfaces errors to the caller. Failures inside the
/// discovery and collection loops are logged and treated as skips.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error("invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("page operation failed: {0}")]
    Page(String),

    #[error("session setup failed: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
