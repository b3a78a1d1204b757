use thiserror::Error;

/// Errors from the exchange API.
///
/// Everything here is a remote-service failure: the caller logs it, reports
/// it, and waits for the next cycle. Nothing in this enum is fatal.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to build the HTTP client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("exchange error: code {code}, msg: {msg}")]
    Api { code: i64, msg: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
