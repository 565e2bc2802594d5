//! Name Normalization
//!
//! Normalizes the code model so every name is trimmed and already in the
//! form generated code uses (types PascalCase, members snake_case, reserved
//! words escaped), with wire names preserved alongside. Parameter lists are
//! deduplicated. Also computes a deterministic content hash of the
//! normalized model.

use std::collections::BTreeSet;

use ir::{
    Client, CodeModel, ModelError, Operation, OperationGroup, Parameter, ParameterLocation, SchemaKind,
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use types::naming::{identifier, to_snake_case, NameKind};

use crate::{operation_path, CompilerContext, CompilerPhase, PhaseResult};

/// OData query parameters whose wire names do not split into words
const ODATA_NAMES: &[(&str, &str)] = &[("maxpagesize", "max_page_size"), ("orderby", "order_by")];

/// NameNormalizer ensures code-model naming consistency.
///
/// Responsibilities:
/// - Trim names and descriptions; keep wire names next to client names
/// - Recase and escape type and member names
/// - Place top-level operation groups on a client
/// - Deduplicate request parameters
/// - Compute a SHA256 checksum of the entire normalized model
pub struct NameNormalizer;

impl Default for NameNormalizer {
    fn default() -> Self { Self::new() }
}

impl NameNormalizer {
    /// Create a new NameNormalizer instance
    pub fn new() -> Self { Self }

    /// Normalize and hash a code model in place
    pub fn normalize(&self, model: &mut CodeModel) -> Result<String, crate::PhaseError> {
        model.name = model.name.trim().to_string();
        model.namespace = model.namespace.trim().to_string();
        model.description = model.description.trim().to_string();
        if model.namespace.is_empty() {
            model.namespace = to_snake_case(&model.name);
        }

        for schema in &mut model.schemas {
            schema.key = schema.key.trim().to_string();
            schema.name = identifier(schema.name.trim(), NameKind::Model);
            schema.description = schema.description.trim().to_string();
            match &mut schema.kind {
                SchemaKind::Object(object) => {
                    for property in &mut object.properties {
                        let raw = property.name.trim().to_string();
                        if property.serialized_name.trim().is_empty() {
                            property.serialized_name = raw.clone();
                        }
                        property.name = identifier(&raw, NameKind::Property);
                        property.description = property.description.trim().to_string();
                    }
                    if let Some(discriminator) = &mut object.discriminator {
                        discriminator.property_name = identifier(discriminator.property_name.trim(), NameKind::Property);
                    }
                }
                SchemaKind::Enum(enumeration) => {
                    for choice in &mut enumeration.choices {
                        choice.name = identifier(choice.name.trim(), NameKind::EnumMember);
                        choice.description = choice.description.trim().to_string();
                    }
                }
                _ => {}
            }
        }

        self.place_operation_groups(model);

        for client in &mut model.clients {
            client.name = identifier(client.name.trim(), NameKind::Client);
            client.description = client.description.trim().to_string();
            let path = format!("clients/{}", client.name);
            normalize_parameters(&mut client.parameters, &path)?;
            for group in &mut client.operation_groups {
                group.name = group.name.trim().to_string();
                group.description = group.description.trim().to_string();
                for operation in &mut group.operations {
                    self.normalize_operation(&group.name, operation)?;
                }
            }
        }

        // === Compute deterministic model hash ===
        let json_repr = serde_json::to_string(model)?;
        let mut hasher = Sha256::new();
        hasher.update(json_repr.as_bytes());
        let checksum = format!("{:x}", hasher.finalize());

        Ok(checksum)
    }

    /// Operation groups declared outside any client go to the first client,
    /// or to an implicit client named after the model
    fn place_operation_groups(&self, model: &mut CodeModel) {
        if model.operation_groups.is_empty() {
            return;
        }
        let groups: Vec<OperationGroup> = std::mem::take(&mut model.operation_groups);
        if model.clients.is_empty() {
            debug!(client = %model.name, "creating implicit client");
            model.clients.push(Client {
                name: model.name.clone(),
                description: model.description.clone(),
                api_versions: Vec::new(),
                security: None,
                parameters: Vec::new(),
                operation_groups: Vec::new(),
            });
        }
        if let Some(client) = model.clients.first_mut() {
            client.operation_groups.extend(groups);
        }
    }

    fn normalize_operation(&self, group: &str, operation: &mut Operation) -> Result<(), ModelError> {
        operation.name = identifier(operation.name.trim(), NameKind::Operation);
        operation.description = operation.description.trim().to_string();
        operation.request.path = operation.request.path.trim().to_string();
        let path = operation_path(group, &operation.name);
        normalize_parameters(&mut operation.request.parameters, &path)
    }
}

/// Recase, relocate and deduplicate one parameter list
fn normalize_parameters(parameters: &mut Vec<Parameter>, path: &str) -> Result<(), ModelError> {
    for parameter in parameters.iter_mut() {
        let raw = parameter.name.trim().to_string();
        if parameter.serialized_name.trim().is_empty() {
            parameter.serialized_name = raw.clone();
        }
        parameter.serialized_name = parameter.serialized_name.trim().to_string();
        parameter.description = parameter.description.trim().to_string();

        if parameter.location.is_none() {
            if raw.eq_ignore_ascii_case("contentType") || raw.eq_ignore_ascii_case("content-type") {
                parameter.location = Some(ParameterLocation::Header);
                parameter.serialized_name = "Content-Type".to_string();
            } else {
                warn!(parameter = %raw, at = path, "parameter has no location; sending it in the query");
                parameter.location = Some(ParameterLocation::Query);
            }
        }

        let wire = parameter.serialized_name.trim_start_matches('$').to_ascii_lowercase();
        let odata = ODATA_NAMES.iter().find(|(w, _)| *w == wire).map(|(_, name)| name.to_string());
        parameter.name = match odata {
            Some(name) => name,
            None => identifier(&raw, NameKind::Parameter),
        };
    }

    let mut seen_wire = BTreeSet::new();
    let before = parameters.len();
    parameters.retain(|p| {
        let wire = match p.location {
            Some(ParameterLocation::Header) => p.serialized_name.to_ascii_lowercase(),
            _ => p.serialized_name.clone(),
        };
        seen_wire.insert((p.location, wire))
    });
    if parameters.len() != before {
        debug!(at = path, removed = before - parameters.len(), "removed duplicate parameters");
    }

    let mut seen_names = BTreeSet::new();
    for parameter in parameters.iter_mut() {
        if !seen_names.contains(&parameter.name) {
            seen_names.insert(parameter.name.clone());
            continue;
        }
        let renamed = format!("{}_param", parameter.name);
        if seen_names.contains(&renamed) {
            return Err(ModelError::NameCollision {
                name: parameter.name.clone(),
                path: format!("{}/parameters/{}", path, parameter.serialized_name),
            });
        }
        debug!(at = path, from = %parameter.name, to = %renamed, "renamed colliding parameter");
        parameter.name = renamed.clone();
        seen_names.insert(renamed);
    }
    Ok(())
}

impl CompilerPhase for NameNormalizer {
    fn name(&self) -> &str { "NameNormalizer" }

    fn description(&self) -> &str { "Normalize names, deduplicate parameters and hash the code model" }

    fn run(&self, ctx: &mut CompilerContext) -> PhaseResult {
        let checksum = self.normalize(&mut ctx.model)?;
        debug!(checksum = %checksum, "normalized code model");
        ctx.checksum = Some(checksum);
        Ok(())
    }
}
