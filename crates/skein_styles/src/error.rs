//! Error types for the style registry.

/// Error raised by an [`InjectionSink`](crate::InjectionSink) when a style
/// sheet cannot be made active.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InjectionError {
    message: String,
}

impl InjectionError {
    /// Creates an injection error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The sink's description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by [`StyleRegistry`](crate::StyleRegistry).
#[derive(Debug, Clone, thiserror::Error)]
pub enum StyleError {
    /// The request named neither (or both) of a URL and inline content, or
    /// had no key to count ownership under.
    #[error("invalid style request: {0}")]
    InvalidArgument(String),

    /// The sink failed while injecting the first copy of a style resource.
    #[error("failed to inject style '{key}': {source}")]
    Injection {
        /// Key whose injection failed.
        key: String,
        /// The sink's error.
        #[source]
        source: InjectionError,
    },
}

impl StyleError {
    /// Creates an [`InvalidArgument`](Self::InvalidArgument).
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
