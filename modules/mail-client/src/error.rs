use thiserror::Error;

pub type Result<T> = std::result::Result<T, GmailError>;

#[derive(Debug, Error)]
pub enum GmailError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GmailError {
    fn from(err: reqwest::Error) -> Self {
        GmailError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GmailError {
    fn from(err: serde_json::Error) -> Self {
        GmailError::Parse(err.to_string())
    }
}
