//! Variant and attribute resolution
//!
//! Validates attribute questions against the grounded entity's real
//! variant data. The resolver only ever reports values present in the
//! fetched variants; an attribute the parent does not declare and an
//! attribute with zero values are distinct outcomes.

use shop_agent_core::{CatalogClient, CatalogEntity, ConversationContext, EntityKind, Result};
use shop_agent_text::normalize_name;

/// Outcome of one attribute question
#[derive(Debug)]
pub enum VariantResolution {
    /// No grounded entity to ask about
    NoEntity,
    /// The grounded entity does not declare this attribute
    AttributeUnknown { attribute: String },
    /// Distinct values of the attribute across the variant set
    AttributeListed {
        attribute: String,
        values: Vec<String>,
    },
    /// The requested value exists; its variant is now grounded
    ValueValidated { variant: CatalogEntity },
    /// The attribute exists but the requested value does not
    ValueRejected {
        attribute: String,
        requested_value: String,
        available_values: Vec<String>,
    },
}

pub struct VariantResolver<'a> {
    catalog: &'a dyn CatalogClient,
}

impl<'a> VariantResolver<'a> {
    pub fn new(catalog: &'a dyn CatalogClient) -> Self {
        Self { catalog }
    }

    /// Resolve an attribute question against the context's grounded
    /// entity, grounding the matching variant on a validated value.
    pub async fn resolve(
        &self,
        context: &mut ConversationContext,
        attribute: &str,
        requested_value: Option<&str>,
    ) -> Result<VariantResolution> {
        let Some(grounded) = context.grounded_entity().cloned() else {
            return Ok(VariantResolution::NoEntity);
        };

        // a grounded variant re-anchors on its parent for attribute work
        let parent = match (&grounded.kind, &grounded.parent_id) {
            (EntityKind::Variant, Some(parent_id)) => {
                let (parent, variants) = tokio::try_join!(
                    self.catalog.get_by_id(parent_id),
                    self.catalog.get_variants(parent_id)
                )?;
                let Some(parent) = parent else {
                    return Ok(VariantResolution::AttributeUnknown {
                        attribute: attribute.to_string(),
                    });
                };
                // only a variable parent may take over the grounding
                if parent.kind != EntityKind::VariableParent {
                    return Ok(VariantResolution::AttributeUnknown {
                        attribute: attribute.to_string(),
                    });
                }
                context.ground(parent.clone());
                context.cache_variants(variants);
                parent
            }
            _ => grounded,
        };

        if parent.kind != EntityKind::VariableParent || !parent.has_attribute(attribute) {
            return Ok(VariantResolution::AttributeUnknown {
                attribute: attribute.to_string(),
            });
        }

        let variants = match context.grounded_variants() {
            Some(cached) => cached.to_vec(),
            None => {
                let fetched = self.catalog.get_variants(&parent.id).await?;
                context.cache_variants(fetched.clone());
                fetched
            }
        };

        let values = distinct_values(&variants, attribute);

        let Some(wanted) = requested_value else {
            return Ok(VariantResolution::AttributeListed {
                attribute: attribute.to_string(),
                values,
            });
        };

        let wanted_key = normalize_name(wanted);
        let matched = variants.iter().find(|v| {
            v.attribute_value(attribute)
                .is_some_and(|value| normalize_name(value) == wanted_key)
        });

        match matched {
            Some(variant) => {
                tracing::debug!(variant_id = %variant.id, attribute, value = wanted, "variant validated");
                context.ground(variant.clone());
                Ok(VariantResolution::ValueValidated {
                    variant: variant.clone(),
                })
            }
            None => Ok(VariantResolution::ValueRejected {
                attribute: attribute.to_string(),
                requested_value: wanted.to_string(),
                available_values: values,
            }),
        }
    }
}

/// Distinct values of one attribute across a variant set, first-seen
/// order, as spelled by the catalog.
fn distinct_values(variants: &[CatalogEntity], attribute: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for variant in variants {
        if let Some(value) = variant.attribute_value(attribute) {
            if !values.iter().any(|v| normalize_name(v) == normalize_name(value)) {
                values.push(value.to_string());
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FixtureCatalog;
    use shop_agent_core::{AttributeSpec, AttributeValue};

    fn parent_with_colors() -> CatalogEntity {
        let mut parent =
            CatalogEntity::simple("p1", "Remera Basica").with_kind(EntityKind::VariableParent);
        parent.attributes.push(AttributeSpec {
            name: "Color".into(),
            allowed_values: vec!["Rojo".into(), "Azul".into()],
        });
        parent
    }

    fn variant(id: &str, color: &str, stock: u32) -> CatalogEntity {
        let mut v = CatalogEntity::simple(id, format!("Remera Basica - {color}"))
            .with_kind(EntityKind::Variant)
            .with_stock(stock);
        v.parent_id = Some("p1".into());
        v.attribute_values.push(AttributeValue {
            name: "Color".into(),
            value: color.into(),
        });
        v
    }

    fn fixture() -> FixtureCatalog {
        FixtureCatalog::new(vec![parent_with_colors()])
            .with_variants("p1", vec![variant("v1", "Rojo", 3), variant("v2", "Azul", 0)])
    }

    #[tokio::test]
    async fn test_no_grounded_entity() {
        let catalog = fixture();
        let resolver = VariantResolver::new(&catalog);
        let mut ctx = ConversationContext::new();
        match resolver.resolve(&mut ctx, "color", None).await.unwrap() {
            VariantResolution::NoEntity => {}
            other => panic!("expected NoEntity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_attribute_never_lists() {
        let catalog = fixture();
        let resolver = VariantResolver::new(&catalog);
        let mut ctx = ConversationContext::new();
        ctx.ground(parent_with_colors());

        match resolver.resolve(&mut ctx, "talle", None).await.unwrap() {
            VariantResolution::AttributeUnknown { attribute } => assert_eq!(attribute, "talle"),
            other => panic!("expected AttributeUnknown, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lists_only_real_values_and_caches() {
        let catalog = fixture();
        let resolver = VariantResolver::new(&catalog);
        let mut ctx = ConversationContext::new();
        ctx.ground(parent_with_colors());

        match resolver.resolve(&mut ctx, "color", None).await.unwrap() {
            VariantResolution::AttributeListed { values, .. } => {
                assert_eq!(values, vec!["Rojo", "Azul"]);
            }
            other => panic!("expected AttributeListed, got {other:?}"),
        }
        assert!(ctx.grounded_variants().is_some());

        // second question reuses the cache
        let calls_before = catalog.variant_calls();
        resolver.resolve(&mut ctx, "color", None).await.unwrap();
        assert_eq!(catalog.variant_calls(), calls_before);
    }

    #[tokio::test]
    async fn test_value_validation_grounds_the_variant() {
        let catalog = fixture();
        let resolver = VariantResolver::new(&catalog);
        let mut ctx = ConversationContext::new();
        ctx.ground(parent_with_colors());

        match resolver.resolve(&mut ctx, "color", Some("  ROJO ")).await.unwrap() {
            VariantResolution::ValueValidated { variant } => {
                assert_eq!(variant.id, "v1");
                assert_eq!(variant.stock_quantity, Some(3));
            }
            other => panic!("expected ValueValidated, got {other:?}"),
        }
        assert_eq!(ctx.grounded_entity().map(|e| e.id.as_str()), Some("v1"));
    }

    #[tokio::test]
    async fn test_missing_value_is_rejected_with_alternatives() {
        let catalog = fixture();
        let resolver = VariantResolver::new(&catalog);
        let mut ctx = ConversationContext::new();
        ctx.ground(parent_with_colors());

        match resolver.resolve(&mut ctx, "color", Some("verde")).await.unwrap() {
            VariantResolution::ValueRejected {
                requested_value,
                available_values,
                ..
            } => {
                assert_eq!(requested_value, "verde");
                assert_eq!(available_values, vec!["Rojo", "Azul"]);
            }
            other => panic!("expected ValueRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_enumeration_is_not_unknown() {
        let mut parent = parent_with_colors();
        parent.attributes.push(AttributeSpec {
            name: "Talle".into(),
            allowed_values: vec![],
        });
        let catalog = FixtureCatalog::new(vec![parent.clone()])
            .with_variants("p1", vec![variant("v1", "Rojo", 3)]);
        let resolver = VariantResolver::new(&catalog);
        let mut ctx = ConversationContext::new();
        ctx.ground(parent);

        // the attribute is declared but no variant carries a value
        match resolver.resolve(&mut ctx, "talle", None).await.unwrap() {
            VariantResolution::AttributeListed { values, .. } => assert!(values.is_empty()),
            other => panic!("expected AttributeListed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_grounded_variant_reanchors_on_parent() {
        let catalog = fixture();
        let resolver = VariantResolver::new(&catalog);
        let mut ctx = ConversationContext::new();
        ctx.ground(variant("v2", "Azul", 0));

        match resolver.resolve(&mut ctx, "color", None).await.unwrap() {
            VariantResolution::AttributeListed { values, .. } => {
                assert_eq!(values, vec!["Rojo", "Azul"]);
            }
            other => panic!("expected AttributeListed, got {other:?}"),
        }
        assert_eq!(ctx.grounded_entity().map(|e| e.id.as_str()), Some("p1"));
    }

    #[tokio::test]
    async fn test_variant_with_simple_parent_never_caches_variants() {
        // the parent record is not a variable parent, so the re-anchor
        // must not ground it or leave variants cached
        let catalog = FixtureCatalog::new(vec![CatalogEntity::simple("p1", "Remera Basica")])
            .with_variants("p1", vec![variant("v1", "Rojo", 3)]);
        let resolver = VariantResolver::new(&catalog);
        let mut ctx = ConversationContext::new();
        ctx.ground(variant("v1", "Rojo", 3));

        match resolver.resolve(&mut ctx, "color", None).await.unwrap() {
            VariantResolution::AttributeUnknown { attribute } => assert_eq!(attribute, "color"),
            other => panic!("expected AttributeUnknown, got {other:?}"),
        }
        assert!(ctx.grounded_variants().is_none());
        assert_eq!(ctx.grounded_entity().map(|e| e.id.as_str()), Some("v1"));
    }
}
