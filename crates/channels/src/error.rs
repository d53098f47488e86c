use std::error::Error as StdError;

/// Crate-wide result type for platform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed platform errors shared across adapter traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bot lacks the permission needed for the request.
    #[error("missing permission: {context}")]
    Forbidden { context: String },

    /// Any other failed request (network, rate limit, server error).
    #[error("platform request failed: {context}: {source}")]
    Request {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Input payload or parameter is invalid (e.g. a malformed id).
    #[error("invalid channel input: {message}")]
    InvalidInput { message: String },
}

impl Error {
    #[must_use]
    pub fn forbidden(context: impl Into<String>) -> Self {
        Self::Forbidden {
            context: context.into(),
        }
    }

    #[must_use]
    pub fn request(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Request {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}
