//! Reference Validation
//!
//! Validates the code model for correctness and consistency before any
//! rewriting happens. Every schema, parameter and response reference must
//! resolve, schema keys must be unique, objects may have at most one parent,
//! and every path placeholder must bind a path parameter.

use std::collections::BTreeSet;

use ir::{CodeModel, ModelError, Operation, Parameter, ParameterLocation, SchemaGraph, SchemaKind, SchemaRef};
use tracing::debug;

use crate::{operation_path, CompilerContext, CompilerPhase, PhaseResult};

/// IR Validator
pub struct IrValidator;

impl Default for IrValidator {
    fn default() -> Self { Self::new() }
}

impl IrValidator {
    /// Create a new IR validator
    pub fn new() -> Self { Self }
}

impl IrValidator {
    /// Validate a code model and return every error found, in model order
    pub fn validate(&self, model: &CodeModel) -> Vec<ModelError> {
        let graph = match SchemaGraph::from_code_model(model) {
            Ok(graph) => graph,
            Err(e) => return vec![e],
        };
        let mut errors = Vec::new();

        for schema in &model.schemas {
            let path = schema.path();
            let mut references: Vec<(&SchemaRef, String)> = Vec::new();
            match &schema.kind {
                SchemaKind::Object(object) => {
                    for property in &object.properties {
                        references.push((&property.schema, format!("{}/properties/{}", path, property.name)));
                    }
                    for parent in &object.parents {
                        references.push((parent, format!("{}/parents", path)));
                    }
                    if object.parents.len() > 1 {
                        errors.push(ModelError::unsupported(
                            path.clone(),
                            format!(
                                "object declares {} parents; only single inheritance is supported",
                                object.parents.len()
                            ),
                        ));
                    }
                }
                SchemaKind::Constant(constant) => references.push((&constant.value_type, path.clone())),
                SchemaKind::Array(array) => references.push((&array.element, path.clone())),
                SchemaKind::Dictionary(dictionary) => references.push((&dictionary.value, path.clone())),
                SchemaKind::Primitive(_) | SchemaKind::Enum(_) | SchemaKind::Any => {}
            }
            for (reference, at) in references {
                if let Err(e) = graph.resolve(reference, &at) {
                    errors.push(e);
                }
            }
        }

        for id in graph.ids() {
            if let Err(e) = graph.ancestors(id) {
                if !errors.contains(&e) {
                    errors.push(e);
                }
            }
        }

        for client in &model.clients {
            let path = format!("clients/{}", client.name);
            for parameter in &client.parameters {
                if let Err(e) = graph.resolve(&parameter.schema, &format!("{}/parameters/{}", path, parameter.name)) {
                    errors.push(e);
                }
            }
        }

        for group in model.operation_groups() {
            for operation in &group.operations {
                let client_parameters = model
                    .clients
                    .iter()
                    .find(|c| c.operation_groups.iter().any(|g| std::ptr::eq(g, group)))
                    .map(|c| c.parameters.as_slice())
                    .unwrap_or_default();
                self.validate_operation(&graph, &group.name, operation, client_parameters, &mut errors);
            }
        }

        errors
    }

    fn validate_operation(
        &self,
        graph: &SchemaGraph,
        group: &str,
        operation: &Operation,
        client_parameters: &[Parameter],
        errors: &mut Vec<ModelError>,
    ) {
        let path = operation_path(group, &operation.name);
        let mut check = |reference: &SchemaRef, at: String| {
            if let Err(e) = graph.resolve(reference, &at) {
                errors.push(e);
            }
        };

        for parameter in &operation.request.parameters {
            check(&parameter.schema, format!("{}/parameters/{}", path, parameter.name));
        }
        for response in &operation.responses {
            let at = format!("{}/responses/{}", path, response.status);
            if let Some(schema) = &response.schema {
                check(schema, at.clone());
            }
            for header in &response.headers {
                check(&header.schema, format!("{}/headers/{}", at, header.name));
            }
        }
        if let Some(result) = operation.long_running.as_ref().and_then(|l| l.final_result.as_ref()) {
            check(result, format!("{}/longRunning", path));
        }

        let bound: BTreeSet<String> = operation
            .request
            .parameters
            .iter()
            .chain(client_parameters)
            .filter(|p| matches!(p.location, Some(ParameterLocation::Path) | Some(ParameterLocation::Uri)))
            .flat_map(|p| [p.name.trim().to_string(), wire_name(p).to_string()])
            .collect();
        for placeholder in placeholders(&operation.request.path) {
            if !bound.contains(&placeholder) {
                errors.push(ModelError::unresolved(format!("{}/path", path), format!("{{{}}}", placeholder)));
            }
        }
    }
}

/// Wire name of a parameter, falling back to its declared name
pub fn wire_name(parameter: &Parameter) -> &str {
    let serialized = parameter.serialized_name.trim();
    if serialized.is_empty() {
        parameter.name.trim()
    } else {
        serialized
    }
}

/// `{name}` placeholders of a path template, in order
pub fn placeholders(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                out.push(after[..end].trim().to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    out
}

impl CompilerPhase for IrValidator {
    fn name(&self) -> &str { "IrValidator" }

    fn description(&self) -> &str { "Validate code model references and schema shapes" }

    fn run(&self, ctx: &mut CompilerContext) -> PhaseResult {
        let errors = self.validate(&ctx.model);
        ctx.count("ir_validation_errors", errors.len());
        debug!(errors = errors.len(), "validated code model");

        for error in &errors {
            ctx.add_error(error.to_string());
        }
        match errors.into_iter().next() {
            Some(first) => Err(first.into()),
            None => Ok(()),
        }
    }
}
