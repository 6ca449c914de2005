use thiserror::Error;

use crate::client::TransportError;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("HTTP error {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    /// The response body was not JSON at all.
    #[error("Invalid message from twitch.tv: {body}")]
    Protocol { body: String },
    /// The body was JSON but `streams` was not a list of objects.
    #[error("Unexpected JSON from twitch.tv: {value}")]
    Schema { value: serde_json::Value },
    #[error("Invalid base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CheckError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
