//! Catalog access for the query resolution engine
//!
//! A REST client over the product catalog, exposing the core
//! `CatalogClient` capability.

pub mod client;

pub use client::{CatalogConfig, HttpCatalogClient};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Catalog server error: {0}")]
    Server(String),

    #[error("Catalog API error: {0}")]
    Api(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Resource not found")]
    NotFound,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout
        } else if err.is_connect() {
            CatalogError::Network(err.to_string())
        } else {
            CatalogError::Api(err.to_string())
        }
    }
}
