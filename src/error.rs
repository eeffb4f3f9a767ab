use thiserror::Error;

/// Failures surfaced by the auth and trajectory clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required input was empty or malformed; no request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure or a non-2xx response.
    #[error("network error: {message}")]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// The payload did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The refresh token was rejected; a fresh login is required.
    #[error("session expired: {0}")]
    AuthExpired(String),

    /// The identity check answered with something other than `login`.
    #[error("no account registered for {identity} (next step: {action})")]
    UserNotRegistered { identity: String, action: String },

    #[error("token storage failed: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<rusqlite::Error> for ClientError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
