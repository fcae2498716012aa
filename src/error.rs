use thiserror::Error;

use crate::analysis::state::PipelineStage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Empty response from LLM API")]
    EmptyResponse,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("File is not valid UTF-8 text: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition { from: PipelineStage, to: PipelineStage },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
