use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{name} is not set")]
    MissingCredential { name: &'static str },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn missing_credential(name: &'static str) -> Self {
        Self::MissingCredential { name }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
