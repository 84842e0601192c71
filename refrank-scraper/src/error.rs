use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("no resolver configured for id type `{0}`")]
    UnknownIdType(String),

    #[error("selector `{0}` matched nothing")]
    NoMatch(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
