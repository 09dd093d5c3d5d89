use thiserror::Error;

pub type Result<T> = std::result::Result<T, YoutubeError>;

#[derive(Debug, Error)]
pub enum YoutubeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Could not extract a channel ID or name from '{0}'")]
    UnrecognizedChannel(String),

    #[error("API key is not configured")]
    MissingApiKey,
}

impl From<reqwest::Error> for YoutubeError {
    fn from(err: reqwest::Error) -> Self {
        YoutubeError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for YoutubeError {
    fn from(err: serde_json::Error) -> Self {
        YoutubeError::Parse(err.to_string())
    }
}
