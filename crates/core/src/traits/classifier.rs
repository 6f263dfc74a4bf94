//! Classifier / renderer client trait

use async_trait::async_trait;

use crate::entity::CatalogEntity;
use crate::error::Result;
use crate::intent::Classification;
use crate::turn::ResponseInstruction;

/// Language-model collaborator
///
/// Used exactly twice per turn at most: once to classify the message
/// (when the local gate could not), once to render the engine's
/// structured decision into customer-facing prose. The renderer must
/// only ever see facts carried inside the `ResponseInstruction`.
#[async_trait]
pub trait ClassifierClient: Send + Sync {
    /// Classify one message given recent history and the grounded
    /// entity, if any. Implementations decode the model's intent
    /// string through [`crate::QueryIntent::decode`] so out-of-enum
    /// values never leave the boundary.
    async fn classify(
        &self,
        message: &str,
        recent_history: &[(String, String)],
        grounded_entity: Option<&CatalogEntity>,
    ) -> Result<Classification>;

    /// Render a structured instruction into prose
    async fn render(
        &self,
        instruction: &ResponseInstruction,
        recent_history: &[(String, String)],
    ) -> Result<String>;
}
