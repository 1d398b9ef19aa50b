use thiserror::Error;

pub type Result<T> = std::result::Result<T, StackExchangeError>;

#[derive(Debug, Error)]
pub enum StackExchangeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for StackExchangeError {
    fn from(err: reqwest::Error) -> Self {
        StackExchangeError::Network(err.to_string())
    }
}
