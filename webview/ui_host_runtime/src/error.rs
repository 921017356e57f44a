use thiserror::Error;

/// Errors raised by the UI host runtime.
///
/// Only start-up and transport failures ever reach the caller of [`crate::run`];
/// everything else is recovered inside the front-end (placeholder or no-op).
#[derive(Debug, Error)]
pub enum UiError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("markup error: {0}")]
    Markup(String),

    #[error("content '{location}' unavailable: {reason}")]
    ContentUnavailable { location: String, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid content location: {0}")]
    InvalidLocation(String),
}

pub type UiResult<T> = std::result::Result<T, UiError>;

impl From<roxmltree::Error> for UiError {
    fn from(err: roxmltree::Error) -> Self {
        UiError::Markup(err.to_string())
    }
}
