//! Error taxonomy
//!
//! Every component-level failure is converted into one of these before
//! reaching the turn boundary, and the turn boundary converts all of
//! them into natural-language replies. Nothing escapes to the caller as
//! a raw error.

use thiserror::Error;

/// Engine-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Resolution errors
#[derive(Error, Debug)]
pub enum Error {
    /// No catalog match; always user-recoverable
    #[error("no catalog match for '{term}'")]
    NotFound { term: String },

    /// Multiple matches; resolved by asking, not guessing
    #[error("{count} catalog entities match")]
    Ambiguous { count: usize },

    /// External call exceeded its deadline after retries
    #[error("collaborator '{collaborator}' timed out")]
    CollaboratorTimeout { collaborator: &'static str },

    /// External call failed after retries
    #[error("collaborator '{collaborator}' unavailable: {message}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        message: String,
    },

    /// Classifier returned a shape outside the closed contract
    #[error("invalid classifier output: {0}")]
    InvalidClassifierOutput(String),

    /// Session store failure (lease poisoned, etc.)
    #[error("session error: {0}")]
    Session(String),
}

impl Error {
    pub fn unavailable(collaborator: &'static str, message: impl Into<String>) -> Self {
        Error::CollaboratorUnavailable {
            collaborator,
            message: message.into(),
        }
    }

    /// Whether this failure should degrade to the conservative
    /// ask-for-specifics reply instead of a domain reply.
    pub fn is_degraded_fallback(&self) -> bool {
        matches!(
            self,
            Error::CollaboratorTimeout { .. }
                | Error::CollaboratorUnavailable { .. }
                | Error::InvalidClassifierOutput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_classification() {
        assert!(Error::CollaboratorTimeout {
            collaborator: "catalog"
        }
        .is_degraded_fallback());
        assert!(!Error::NotFound {
            term: "taza".into()
        }
        .is_degraded_fallback());
    }
}
