use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
}

/// A request that never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {message}")]
    Timeout { message: String },
    #[error("connection failed: {message}")]
    Connect { message: String },
    #[error("{message}")]
    Other { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Self::Timeout { message }
        } else if err.is_connect() {
            Self::Connect { message }
        } else {
            Self::Other { message }
        }
    }
}
