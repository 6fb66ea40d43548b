//! Error taxonomy for the fetch-aggregate pipeline.

use thiserror::Error;

/// Why a single source was excluded from a search. Never fatal to the search.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("endpoint returned HTTP {0}")]
    Status(u16),

    #[error("endpoint returned an empty body")]
    EmptyBody,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SourceError {
    /// Short label for status badges.
    pub fn badge(&self) -> String {
        match self {
            SourceError::Status(code) => format!("HTTP {code}"),
            SourceError::EmptyBody => "empty response".to_string(),
            SourceError::Malformed(_) => "malformed response".to_string(),
            SourceError::Network(_) => "network error".to_string(),
        }
    }
}

/// Failure of the search as a whole. The dataset is reset when one occurs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid date '{input}': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
