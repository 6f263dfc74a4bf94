//! Read-only enrichment store trait

use async_trait::async_trait;

use crate::entity::{CatalogEntity, Enrichment};
use crate::error::Result;

/// Secondary enrichment store
///
/// Supplies per-entity overlays (price/stock corrections, renamed
/// display names) or marks an entity hidden. `None` means the store
/// has nothing for this entity and catalog facts stand as-is.
#[async_trait]
pub trait EnrichmentStore: Send + Sync {
    async fn enrich(&self, entity: &CatalogEntity) -> Result<Option<Enrichment>>;
}
