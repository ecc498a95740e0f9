use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to parse {format} file \"{path}\": {message}")]
    Parse {
        format: String,
        path: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompareError {
    /// Build a [`CompareError::Parse`] for the given format label and source.
    pub fn parse(
        format: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CompareError::Parse {
            format: format.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl Serialize for CompareError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
