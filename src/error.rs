use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to Flickr or writing the download to disk.
///
/// Every variant is fatal for the running command. Nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting was given neither as a flag nor in the environment.
    #[error("{name} is not available. Either pass it as an argument or set it in the {env} env var.")]
    ConfigurationMissing {
        name: &'static str,
        env: &'static str,
    },

    #[error("invalid flickr email {email}, user not found: {message}")]
    AccountNotFound { email: String, message: String },

    #[error("album {0} not found")]
    AlbumNotFound(String),

    #[error("failed to create folder {}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fetching a photo or writing it to disk failed.
    #[error("failed to download {target}: {reason}")]
    TransferFailed { target: String, reason: String },

    #[error("no OAuth verifier entered, login aborted")]
    InteractiveAuthAborted,

    #[error("credential file {} is malformed", .0.display())]
    CredentialMalformed(PathBuf),

    /// The service answered with `"stat": "fail"`.
    #[error("flickr api error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("oauth error: {0}")]
    OAuth(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
