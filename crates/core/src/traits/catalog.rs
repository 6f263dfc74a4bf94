//! Catalog client trait

use async_trait::async_trait;

use crate::entity::CatalogEntity;
use crate::error::Result;

/// Catalog interface
///
/// Implementations:
/// - `HttpCatalogClient` - REST catalog service (shop-agent-catalog)
/// - in-memory fixtures in tests
///
/// Every method is a fallible network operation: implementations apply
/// a bounded timeout and a small fixed retry count, and surface
/// exhaustion as `CollaboratorTimeout` / `CollaboratorUnavailable`.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Free-text search, bounded to `limit` results
    async fn search_by_term(&self, term: &str, limit: usize) -> Result<Vec<CatalogEntity>>;

    /// Fetch one entity by its opaque catalog id
    async fn get_by_id(&self, id: &str) -> Result<Option<CatalogEntity>>;

    /// Fetch one entity by SKU code (exact, catalog-side)
    async fn get_by_code(&self, code: &str) -> Result<Option<CatalogEntity>>;

    /// Fetch the variant set of a variable parent
    async fn get_variants(&self, parent_id: &str) -> Result<Vec<CatalogEntity>>;

    /// Full catalog snapshot, paginated internally by the implementation
    async fn list_all(&self, include_stock_price: bool) -> Result<Vec<CatalogEntity>>;

    /// Entities carrying any of the given tags, bounded to `limit`
    async fn get_by_tag(&self, tag_ids: &[String], limit: usize) -> Result<Vec<CatalogEntity>>;
}
