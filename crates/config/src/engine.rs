//! Engine tuning knobs
//!
//! Every field carries a serde default so a partial file (or none at
//! all) yields a working configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for the resolution engine and its collaborator calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-request collaborator timeout in milliseconds
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Retry attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial backoff in milliseconds, doubling per retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Bounded page size for external search; a full page signals more
    /// may exist and the cascade falls through to the catalog scan
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
    /// Maximum candidates kept after relevance ranking
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,
    /// Minimum length of a non-generic token that qualifies a term for
    /// catalog work
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    /// Conversation history ring-buffer capacity
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Recent exchanges handed to the classifier per call
    #[serde(default = "default_classifier_history")]
    pub classifier_history: usize,
}

fn default_call_timeout_ms() -> u64 {
    8_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_search_page_size() -> usize {
    10
}

fn default_candidate_cap() -> usize {
    10
}

fn default_min_token_len() -> usize {
    3
}

fn default_history_capacity() -> usize {
    12
}

fn default_classifier_history() -> usize {
    4
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            search_page_size: default_search_page_size(),
            candidate_cap: default_candidate_cap(),
            min_token_len: default_min_token_len(),
            history_capacity: default_history_capacity(),
            classifier_history: default_classifier_history(),
        }
    }
}

impl EngineConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}
