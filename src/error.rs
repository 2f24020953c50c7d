use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("element with id \"{id}\" not found")]
    MissingElement { id: String },

    #[error("required elements not found: {}", .0.join(", "))]
    MissingElements(Vec<String>),

    #[error("input cannot be empty")]
    EmptyInput,

    #[error("app already initialized")]
    AlreadyInitialized,

    #[error("other: {0}")]
    Other(String),
}

impl Error {
    #[inline]
    pub fn missing(id: impl Into<String>) -> Self {
        Self::MissingElement { id: id.into() }
    }

    #[inline]
    pub fn other(text: impl Into<String>) -> Self {
        Self::Other(text.into())
    }

    /// Whether the error came from a failed element lookup.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::MissingElement { .. } | Self::MissingElements(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
