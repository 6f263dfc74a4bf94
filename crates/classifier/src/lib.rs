//! LLM collaborator for classification and response rendering
//!
//! Wraps a chat-completion endpoint behind the core `ClassifierClient`
//! capability. The model is used for exactly two narrow jobs: deciding
//! what a message asks for, and phrasing a structured decision as
//! customer-facing prose. It never picks catalog entities and never
//! supplies facts of its own.

pub mod client;
pub mod prompt;

pub use client::{ClassifierConfig, LlmClassifier};
pub use prompt::{Message, PromptBuilder, Role};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Classifier server error: {0}")]
    Server(String),

    #[error("Classifier API error: {0}")]
    Api(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClassifierError::Timeout
        } else if err.is_connect() {
            ClassifierError::Network(err.to_string())
        } else {
            ClassifierError::Api(err.to_string())
        }
    }
}
