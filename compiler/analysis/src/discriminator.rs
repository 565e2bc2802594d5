//! Discriminator Normalization
//!
//! Makes every discriminated hierarchy self-consistent: one property name for
//! the whole hierarchy, a unique literal per subtype (defaulting to the schema
//! name), and a discriminator property present on the root.

use std::collections::BTreeMap;

use ir::{Discriminator, ModelError, Property, SchemaGraph, SchemaId, SchemaKind};
use tracing::debug;

use crate::{ensure_string_schema, CompilerContext, CompilerPhase, PhaseResult};

/// Normalizes discriminated hierarchies
pub struct DiscriminatorNormalizer;

impl Default for DiscriminatorNormalizer {
    fn default() -> Self { Self::new() }
}

/// Edits decided for one hierarchy, applied after the read-only analysis
#[derive(Debug, Default)]
struct HierarchyPlan {
    root: String,
    discriminator: Option<Discriminator>,
    literals: BTreeMap<String, String>,
    add_property: bool,
    mark_property: Option<usize>,
}

impl DiscriminatorNormalizer {
    /// Create a new discriminator normalizer
    pub fn new() -> Self { Self }

    fn plan(&self, graph: &SchemaGraph, root_id: SchemaId) -> Result<HierarchyPlan, ModelError> {
        let root = graph.get(root_id);
        let object = root
            .as_object()
            .ok_or_else(|| ModelError::validation(root.path(), "discriminated hierarchy root is not an object"))?;

        let members = graph.descendants(root_id);
        let declared = object.discriminator.clone().or_else(|| {
            members.iter().find_map(|id| graph.get(*id).as_object().and_then(|o| o.discriminator.clone()))
        });
        let mut discriminator = declared.ok_or_else(|| {
            ModelError::validation(root.path(), "discriminated hierarchy is missing a discriminator property")
        })?;
        if discriminator.property_name.trim().is_empty() {
            return Err(ModelError::validation(root.path(), "discriminator property name is empty"));
        }
        if discriminator.serialized_name.trim().is_empty() {
            discriminator.serialized_name = discriminator.property_name.clone();
        }

        for id in &members {
            let member = graph.get(*id);
            if let Some(other) = member.as_object().and_then(|o| o.discriminator.as_ref()) {
                let other_wire =
                    if other.serialized_name.is_empty() { &other.property_name } else { &other.serialized_name };
                if other.property_name != discriminator.property_name || *other_wire != discriminator.serialized_name {
                    return Err(ModelError::validation(
                        member.path(),
                        format!(
                            "discriminator `{}` differs from `{}` declared on {}",
                            other.property_name,
                            discriminator.property_name,
                            root.path()
                        ),
                    ));
                }
            }
        }

        let mut literals = BTreeMap::new();
        let mut owners: BTreeMap<String, String> = BTreeMap::new();
        let mut assign = |key: &str, path: String, literal: String| -> Result<(), ModelError> {
            if let Some(previous) = owners.insert(literal.clone(), key.to_string()) {
                return Err(ModelError::validation(
                    path,
                    format!("discriminator value `{}` is already used by schemas/{}", literal, previous),
                ));
            }
            literals.insert(key.to_string(), literal);
            Ok(())
        };
        if let Some(value) = &object.discriminator_value {
            assign(&root.key, root.path(), value.trim().to_string())?;
        }
        for id in &members {
            let member = graph.get(*id);
            let value = member
                .as_object()
                .and_then(|o| o.discriminator_value.clone())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| member.name.trim().to_string());
            assign(&member.key, member.path(), value)?;
        }

        let existing = object
            .properties
            .iter()
            .position(|p| p.name == discriminator.property_name || p.serialized_name == discriminator.serialized_name);

        Ok(HierarchyPlan {
            root: root.key.clone(),
            discriminator: Some(discriminator),
            literals,
            add_property: existing.is_none(),
            mark_property: existing,
        })
    }
}

impl CompilerPhase for DiscriminatorNormalizer {
    fn name(&self) -> &str { "DiscriminatorNormalizer" }

    fn description(&self) -> &str { "Make discriminated hierarchies consistent and unambiguous" }

    fn run(&self, ctx: &mut CompilerContext) -> PhaseResult {
        let graph = SchemaGraph::from_code_model(&ctx.model)?;

        let mut roots = Vec::new();
        for id in graph.ids() {
            let polymorphic = graph.get(id).as_object().is_some_and(|o| o.is_polymorphic());
            if polymorphic {
                let root = graph.root(id)?;
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        let plans = roots.into_iter().map(|root| self.plan(&graph, root)).collect::<Result<Vec<_>, _>>()?;
        drop(graph);

        let needs_string = plans.iter().any(|p| p.add_property);
        let string_schema = if needs_string { Some(ensure_string_schema(&mut ctx.model)) } else { None };

        for plan in &plans {
            debug!(root = %plan.root, subtypes = plan.literals.len(), "normalized discriminated hierarchy");
            for schema in ctx.model.schemas.iter_mut() {
                let SchemaKind::Object(object) = &mut schema.kind else { continue };
                if schema.key == plan.root {
                    object.discriminator = plan.discriminator.clone();
                    if let Some(index) = plan.mark_property {
                        object.properties[index].is_discriminator = true;
                        object.properties[index].required = true;
                    }
                    if plan.add_property {
                        if let (Some(discriminator), Some(string)) = (&plan.discriminator, &string_schema) {
                            let mut property = Property::new(discriminator.property_name.clone(), string.clone(), true);
                            property.serialized_name = discriminator.serialized_name.clone();
                            property.is_discriminator = true;
                            object.properties.insert(0, property);
                        }
                    }
                } else if plan.literals.contains_key(&schema.key) {
                    object.discriminator = None;
                }
                if let Some(literal) = plan.literals.get(&schema.key) {
                    object.discriminator_value = Some(literal.clone());
                }
            }
        }
        ctx.count("discriminated_hierarchies", plans.len());
        Ok(())
    }
}
