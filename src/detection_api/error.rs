use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Message supplied by the service in an error body.
    #[error("{0}")]
    Server(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}
