use thiserror::Error;

/// Errors surfaced by the translation pipeline
#[derive(Debug, Error)]
pub enum TranslateError {
    /// A required request field was absent or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The mapping text was not a JSON object
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),

    /// The source document could not be parsed, or the output could not be written
    #[error("XML error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The mapping proposer failed
    #[error("mapping proposer failed: {0}")]
    Proposer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for TranslateError {
    fn from(err: quick_xml::Error) -> Self {
        TranslateError::Xml(err.to_string())
    }
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        TranslateError::Proposer(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
