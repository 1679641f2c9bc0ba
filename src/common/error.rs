use rust_tokenizers::error::TokenizerError;
use tch::TchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinetuneError {
    #[error("Endpoint not available error: {0}")]
    FileDownloadError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid record: {0}")]
    RecordError(String),

    #[error("Inconsistent example shape: {0}")]
    ShapeError(String),

    #[error("Label error: {0}")]
    LabelError(String),

    #[error("Encoded sequence length error: {0}")]
    SequenceLengthError(String),

    #[error("Tch tensor error: {0}")]
    TchError(String),

    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    #[error("Invalid configuration error: {0}")]
    InvalidConfigurationError(String),
}

#[cfg(feature = "remote")]
impl From<cached_path::Error> for FinetuneError {
    fn from(error: cached_path::Error) -> Self {
        FinetuneError::FileDownloadError(error.to_string())
    }
}

impl From<std::io::Error> for FinetuneError {
    fn from(error: std::io::Error) -> Self {
        FinetuneError::IOError(error.to_string())
    }
}

impl From<serde_json::Error> for FinetuneError {
    fn from(error: serde_json::Error) -> Self {
        FinetuneError::ParseError(error.to_string())
    }
}

impl From<csv::Error> for FinetuneError {
    fn from(error: csv::Error) -> Self {
        FinetuneError::ParseError(error.to_string())
    }
}

impl From<TokenizerError> for FinetuneError {
    fn from(error: TokenizerError) -> Self {
        FinetuneError::TokenizerError(error.to_string())
    }
}

impl From<TchError> for FinetuneError {
    fn from(error: TchError) -> Self {
        FinetuneError::TchError(error.to_string())
    }
}
