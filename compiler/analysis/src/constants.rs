//! Optional-Constant Promotion
//!
//! A non-required property or parameter typed as a constant can only ever
//! hold one value, yet must still be representable as absent. Its schema is
//! replaced by an enum: the constant's own value type when that is already an
//! enum, otherwise a synthesized closed enum with the literal as its single
//! member. One synthesized enum is shared per constant schema.

use std::collections::{BTreeMap, BTreeSet};

use ir::{
    CodeModel, EnumChoice, EnumOpenness, EnumSchema, PrimitiveKind, Schema, SchemaKind, SchemaRef,
};
use tracing::debug;
use types::naming::{identifier, NameKind};

use crate::{CompilerContext, CompilerPhase, PhaseResult};

/// Suffix of synthesized enum keys
pub const SYNTHESIZED_ENUM_SUFFIX: &str = ".enum";

/// Replaces optional constants with enums
pub struct ConstantPromotion;

impl Default for ConstantPromotion {
    fn default() -> Self { Self::new() }
}

impl ConstantPromotion {
    /// Create a new constant promotion pass
    pub fn new() -> Self { Self }

    /// Promote every optional constant in place; returns the number of rewritten references
    pub fn promote(&self, model: &mut CodeModel) -> usize {
        let replacements = self.plan(model);
        if replacements.is_empty() {
            return 0;
        }

        let mut added = Vec::new();
        for (constant_key, target) in &replacements {
            if let Target::Synthesize(schema) = target {
                if model.schema(&schema.key).is_none() && !added.iter().any(|s: &Schema| s.key == schema.key) {
                    debug!(constant = %constant_key, key = %schema.key, "synthesized single-member enum");
                    added.push(schema.clone());
                }
            }
        }
        model.schemas.extend(added);

        let lookup: BTreeMap<&str, SchemaRef> =
            replacements.iter().map(|(key, target)| (key.as_str(), target.reference())).collect();
        let flattened_optional = flattened_optional_targets(model);
        let mut rewritten = 0;

        for schema in &mut model.schemas {
            let in_optional_flatten = flattened_optional.contains(&schema.key);
            if let SchemaKind::Object(object) = &mut schema.kind {
                for property in &mut object.properties {
                    if property.required && !in_optional_flatten {
                        continue;
                    }
                    if let Some(target) = lookup.get(property.schema.key()) {
                        property.schema = target.clone();
                        rewritten += 1;
                    }
                }
            }
        }
        for client in &mut model.clients {
            let operations = client.operation_groups.iter_mut().flat_map(|g| g.operations.iter_mut());
            let parameters = operations.flat_map(|o| o.request.parameters.iter_mut());
            for parameter in client.parameters.iter_mut().chain(parameters) {
                if parameter.required {
                    continue;
                }
                if let Some(target) = lookup.get(parameter.schema.key()) {
                    parameter.schema = target.clone();
                    rewritten += 1;
                }
            }
        }
        rewritten
    }

    /// Decide the replacement for every constant referenced from an optional position
    fn plan(&self, model: &CodeModel) -> BTreeMap<String, Target> {
        let flattened_optional = flattened_optional_targets(model);
        let mut keys = BTreeSet::new();
        for schema in &model.schemas {
            let in_optional_flatten = flattened_optional.contains(&schema.key);
            if let Some(object) = schema.as_object() {
                keys.extend(
                    object
                        .properties
                        .iter()
                        .filter(|p| !p.required || in_optional_flatten)
                        .map(|p| p.schema.key().to_string()),
                );
            }
        }
        for client in &model.clients {
            keys.extend(client.parameters.iter().filter(|p| !p.required).map(|p| p.schema.key().to_string()));
        }
        for operation in model.operations() {
            keys.extend(
                operation.request.parameters.iter().filter(|p| !p.required).map(|p| p.schema.key().to_string()),
            );
        }

        let mut plan = BTreeMap::new();
        for key in keys {
            let Some(schema) = model.schema(&key) else { continue };
            let Some(constant) = schema.as_constant() else { continue };
            if schema.synthesized {
                continue;
            }
            let value_type = model.schema(constant.value_type.key());
            let target = match value_type.map(|s| &s.kind) {
                Some(SchemaKind::Enum(_)) => Target::Existing(constant.value_type.clone()),
                other => {
                    let kind = match other {
                        Some(SchemaKind::Primitive(p)) => p.kind,
                        _ => PrimitiveKind::String,
                    };
                    let literal = constant.literal();
                    let mut synthesized = Schema::new(
                        format!("{}{}", schema.key, SYNTHESIZED_ENUM_SUFFIX),
                        schema.name.clone(),
                        SchemaKind::Enum(EnumSchema {
                            value_type: kind,
                            openness: EnumOpenness::Fixed,
                            choices: vec![EnumChoice {
                                name: identifier(&literal, NameKind::EnumMember),
                                value: literal,
                                description: String::new(),
                            }],
                        }),
                    );
                    synthesized.description = schema.description.clone();
                    synthesized.synthesized = true;
                    Target::Synthesize(synthesized)
                }
            };
            plan.insert(key, target);
        }
        plan
    }
}

#[derive(Debug)]
enum Target {
    Existing(SchemaRef),
    Synthesize(Schema),
}

impl Target {
    fn reference(&self) -> SchemaRef {
        match self {
            Target::Existing(r) => r.clone(),
            Target::Synthesize(schema) => schema.reference(),
        }
    }
}

/// Objects reached only through optional flatten properties
fn flattened_optional_targets(model: &CodeModel) -> BTreeSet<String> {
    model
        .schemas
        .iter()
        .filter_map(|s| s.as_object())
        .flat_map(|o| o.properties.iter())
        .filter(|p| p.flatten && !p.required)
        .map(|p| p.schema.key().to_string())
        .collect()
}

impl CompilerPhase for ConstantPromotion {
    fn name(&self) -> &str { "ConstantPromotion" }

    fn description(&self) -> &str { "Promote optional constants to single-member enums" }

    fn run(&self, ctx: &mut CompilerContext) -> PhaseResult {
        if !ctx.settings.promote_optional_constants_to_enum {
            debug!("constant promotion disabled by settings");
            return Ok(());
        }
        let rewritten = self.promote(&mut ctx.model);
        ctx.count("promoted_constants", rewritten);
        Ok(())
    }
}
