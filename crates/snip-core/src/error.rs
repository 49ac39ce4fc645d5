use thiserror::Error;

/// Errors raised by the rules that guard user input before it reaches the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid validity period: {0}")]
    InvalidValidity(String),
}

impl ValidationError {
    /// Name of the input field the error should be reported against.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidUrl(_) => "long_url",
            ValidationError::InvalidShortCode(_) => "shortcode",
            ValidationError::InvalidValidity(_) => "validity",
        }
    }
}

/// Errors raised by a record store backend.
///
/// Undecodable stored data is never reported here; the record store treats
/// it as an empty record set.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("storage serialization failed: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("shortcode already exists: {0}")]
    DuplicateShortcode(String),
    #[error("no free shortcode found after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error("timestamp out of range: {0}")]
    Timestamp(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ShortenerError {
    /// Name of the input field a caller should attach the error to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ShortenerError::DuplicateShortcode(_) => Some("shortcode"),
            _ => None,
        }
    }
}
