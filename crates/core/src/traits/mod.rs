//! Collaborator traits for the resolution engine
//!
//! All external collaborators are consumed through these traits to enable:
//! - Pluggable transports (swap implementations without code changes)
//! - Testing with mocks
//!
//! # Trait Hierarchy
//!
//! ```text
//! Catalog:
//!   - CatalogClient: search/fetch/paginate products and variations
//!
//! Language model:
//!   - ClassifierClient: intent classification + prose rendering
//!
//! Enrichment:
//!   - EnrichmentStore: read-only per-entity overlays
//!
//! Sessions:
//!   - ContextStore: exclusive per-user conversation context leases
//! ```

mod catalog;
mod classifier;
mod enrichment;
mod session;

pub use catalog::CatalogClient;
pub use classifier::ClassifierClient;
pub use enrichment::EnrichmentStore;
pub use session::{ContextLease, ContextStore};
