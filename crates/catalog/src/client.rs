//! HTTP catalog client
//!
//! Talks to the catalog REST service. Every call carries a bounded
//! timeout and a small fixed retry budget with doubling backoff; 5xx
//! and transport errors retry, 4xx fail immediately. Exhausted retries
//! surface as the core collaborator errors so the turn boundary can
//! degrade gracefully.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use shop_agent_config::Settings;
use shop_agent_core::{
    AttributeSpec, AttributeValue, CatalogClient, CatalogEntity, EntityKind, Error, Result,
    StockState,
};

use crate::CatalogError;

/// Catalog client configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Service base URL
    pub base_url: String,
    /// Optional API key sent as a bearer token
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry attempts after the first failure
    pub max_retries: u32,
    /// Initial backoff, doubling per retry
    pub initial_backoff: Duration,
    /// Page size used when paginating the full catalog
    pub page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            api_key: None,
            timeout: Duration::from_secs(8),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            page_size: 100,
        }
    }
}

impl CatalogConfig {
    /// Build from loaded settings: the engine's call envelope governs
    /// every collaborator.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.endpoints.catalog_url.clone(),
            api_key: settings.endpoints.catalog_api_key.clone(),
            timeout: settings.engine.call_timeout(),
            max_retries: settings.engine.max_retries,
            initial_backoff: settings.engine.initial_backoff(),
            ..Self::default()
        }
    }
}

/// REST catalog client
#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
    config: CatalogConfig,
}

impl HttpCatalogClient {
    pub fn new(config: CatalogConfig) -> std::result::Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.config.base_url, path)
    }

    /// Execute one GET with query params (used by the retry loop)
    async fn execute_get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<reqwest::Response, CatalogError> {
        let mut request = self.client.get(self.api_url(path)).query(query);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(CatalogError::Server(format!("{status}: {body}")));
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(CatalogError::NotFound);
            }
            return Err(CatalogError::Api(format!("{status}: {body}")));
        }
        Ok(response)
    }

    fn is_retryable(error: &CatalogError) -> bool {
        matches!(error, CatalogError::Network(_) | CatalogError::Server(_) | CatalogError::Timeout)
    }

    /// GET with the retry/backoff envelope, deserializing the body
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<T, CatalogError> {
        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    path,
                    attempt,
                    max = self.config.max_retries,
                    "catalog request failed, retrying in {backoff:?}"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_get(path, query).await {
                Ok(response) => {
                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| CatalogError::InvalidResponse(e.to_string()));
                }
                Err(e) if Self::is_retryable(&e) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| CatalogError::Network("max retries exceeded".to_string())))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search_by_term(&self, term: &str, limit: usize) -> Result<Vec<CatalogEntity>> {
        let products: Vec<ProductDto> = self
            .get_json(
                "/products",
                &[("search", term.to_string()), ("per_page", limit.to_string())],
            )
            .await
            .map_err(into_core)?;
        Ok(products.into_iter().map(ProductDto::into_entity).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CatalogEntity>> {
        match self
            .get_json::<ProductDto>(&format!("/products/{id}"), &[])
            .await
        {
            Ok(dto) => Ok(Some(dto.into_entity())),
            Err(CatalogError::NotFound) => Ok(None),
            Err(e) => Err(into_core(e)),
        }
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<CatalogEntity>> {
        let products: Vec<ProductDto> = self
            .get_json("/products", &[("sku", code.to_string())])
            .await
            .map_err(into_core)?;
        Ok(products.into_iter().next().map(ProductDto::into_entity))
    }

    async fn get_variants(&self, parent_id: &str) -> Result<Vec<CatalogEntity>> {
        let variants: Vec<ProductDto> = self
            .get_json(
                &format!("/products/{parent_id}/variations"),
                &[("per_page", self.config.page_size.to_string())],
            )
            .await
            .map_err(into_core)?;
        Ok(variants
            .into_iter()
            .map(|dto| dto.into_variant_of(parent_id))
            .collect())
    }

    async fn list_all(&self, include_stock_price: bool) -> Result<Vec<CatalogEntity>> {
        let mut all = Vec::new();
        let fields = if include_stock_price {
            "id,sku,name,type,attributes,price,stock_quantity,stock_status"
        } else {
            "id,sku,name,type,attributes"
        };

        for page in 1.. {
            let batch: Vec<ProductDto> = self
                .get_json(
                    "/products",
                    &[
                        ("page", page.to_string()),
                        ("per_page", self.config.page_size.to_string()),
                        ("fields", fields.to_string()),
                    ],
                )
                .await
                .map_err(into_core)?;

            let count = batch.len();
            all.extend(batch.into_iter().map(ProductDto::into_entity));
            if count < self.config.page_size {
                break;
            }
        }

        tracing::debug!(total = all.len(), "catalog snapshot fetched");
        Ok(all)
    }

    async fn get_by_tag(&self, tag_ids: &[String], limit: usize) -> Result<Vec<CatalogEntity>> {
        let products: Vec<ProductDto> = self
            .get_json(
                "/products",
                &[
                    ("tag", tag_ids.join(",")),
                    ("per_page", limit.to_string()),
                ],
            )
            .await
            .map_err(into_core)?;
        Ok(products.into_iter().map(ProductDto::into_entity).collect())
    }
}

fn into_core(error: CatalogError) -> Error {
    match error {
        CatalogError::Timeout => Error::CollaboratorTimeout {
            collaborator: "catalog",
        },
        other => Error::unavailable("catalog", other.to_string()),
    }
}

// Catalog wire types

#[derive(Debug, Deserialize)]
struct ProductDto {
    id: serde_json::Value,
    #[serde(default)]
    sku: Option<String>,
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    parent_id: Option<serde_json::Value>,
    #[serde(default)]
    attributes: Vec<AttributeDto>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    stock_quantity: Option<u32>,
    #[serde(default)]
    stock_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttributeDto {
    name: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    option: Option<String>,
}

impl ProductDto {
    fn into_entity(self) -> CatalogEntity {
        let kind = match self.kind.as_deref() {
            Some("variable") => EntityKind::VariableParent,
            Some("variation") => EntityKind::Variant,
            _ => EntityKind::Simple,
        };

        let price_minor = self
            .price
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .map(|p| (p * 100.0).round() as i64)
            .unwrap_or(0);

        let stock_state = match self.stock_status.as_deref() {
            Some("instock") => StockState::InStock,
            Some("outofstock") => StockState::OutOfStock,
            _ => match self.stock_quantity {
                Some(q) if q > 0 => StockState::InStock,
                Some(_) => StockState::OutOfStock,
                None => StockState::Unknown,
            },
        };

        let (attributes, attribute_values) = split_attributes(self.attributes, kind);

        CatalogEntity {
            id: scalar_to_string(&self.id),
            code: self.sku.filter(|s| !s.trim().is_empty()),
            display_name: self.name,
            kind,
            parent_id: self.parent_id.as_ref().map(scalar_to_string),
            attributes,
            attribute_values,
            price_minor,
            stock_quantity: self.stock_quantity,
            stock_state,
        }
    }

    fn into_variant_of(mut self, parent_id: &str) -> CatalogEntity {
        self.kind = Some("variation".to_string());
        let mut entity = self.into_entity();
        entity.parent_id = Some(parent_id.to_string());
        entity
    }
}

fn split_attributes(
    attributes: Vec<AttributeDto>,
    kind: EntityKind,
) -> (Vec<AttributeSpec>, Vec<AttributeValue>) {
    let mut specs = Vec::new();
    let mut values = Vec::new();

    for attribute in attributes {
        if kind == EntityKind::Variant {
            if let Some(option) = attribute.option {
                values.push(AttributeValue {
                    name: attribute.name,
                    value: option,
                });
            }
        } else {
            specs.push(AttributeSpec {
                name: attribute.name,
                allowed_values: attribute.options,
            });
        }
    }

    (specs, values)
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_dto(json: &str) -> ProductDto {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_config_from_settings_carries_engine_envelope() {
        let mut settings = Settings::default();
        settings.engine.call_timeout_ms = 1_500;
        settings.engine.max_retries = 5;
        settings.engine.initial_backoff_ms = 50;
        settings.endpoints.catalog_url = "http://shop.test".to_string();
        settings.endpoints.catalog_api_key = Some("sk-123".to_string());

        let config = CatalogConfig::from_settings(&settings);
        assert_eq!(config.base_url, "http://shop.test");
        assert_eq!(config.api_key.as_deref(), Some("sk-123"));
        assert_eq!(config.timeout, Duration::from_millis(1_500));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_variable_parent_mapping() {
        let dto = parse_dto(
            r#"{
                "id": 42,
                "sku": "K78",
                "name": "Remera Basica",
                "type": "variable",
                "attributes": [{"name": "Color", "options": ["Rojo", "Azul"]}],
                "price": "25.50",
                "stock_status": "instock"
            }"#,
        );
        let entity = dto.into_entity();
        assert_eq!(entity.id, "42");
        assert_eq!(entity.code.as_deref(), Some("K78"));
        assert_eq!(entity.kind, EntityKind::VariableParent);
        assert_eq!(entity.price_minor, 2550);
        assert_eq!(entity.attributes.len(), 1);
        assert!(entity.attribute_values.is_empty());
        assert_eq!(entity.stock_state, StockState::InStock);
    }

    #[test]
    fn test_variant_mapping_collects_values() {
        let dto = parse_dto(
            r#"{
                "id": "43",
                "name": "Remera Basica - Rojo",
                "attributes": [{"name": "Color", "option": "Rojo"}],
                "stock_quantity": 0
            }"#,
        );
        let entity = dto.into_variant_of("42");
        assert_eq!(entity.kind, EntityKind::Variant);
        assert_eq!(entity.parent_id.as_deref(), Some("42"));
        assert_eq!(entity.attribute_value("color"), Some("Rojo"));
        assert_eq!(entity.stock_state, StockState::OutOfStock);
    }

    #[test]
    fn test_blank_sku_becomes_none() {
        let dto = parse_dto(r#"{"id": 1, "sku": "  ", "name": "Taza"}"#);
        assert!(dto.into_entity().code.is_none());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(HttpCatalogClient::is_retryable(&CatalogError::Server(
            "500".into()
        )));
        assert!(!HttpCatalogClient::is_retryable(&CatalogError::Api(
            "400".into()
        )));
        assert!(!HttpCatalogClient::is_retryable(&CatalogError::NotFound));
    }
}
