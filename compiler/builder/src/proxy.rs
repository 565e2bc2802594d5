//! Wire-level bindings of operations

use ir::{Client, Operation, Parameter, ParameterLocation, SchemaGraph, StatusCode};
use mapper::MapperRegistry;
use regex::Regex;
use types::{ExceptionDefinition, ProxyMethod, ProxyParameter};

use crate::exceptions::exception_mappings;
use crate::{ClientModelBuilder, Result};

const PLACEHOLDER_PATTERN: &str = r"\{([^}]+)\}";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Placeholder names of a path template, in template order
pub(crate) fn placeholders(template: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(PLACEHOLDER_PATTERN)?;
    Ok(pattern.captures_iter(template).map(|c| c[1].to_string()).collect())
}

impl ClientModelBuilder<'_> {
    /// Bind an operation to its proxy.
    ///
    /// Client parameters the operation does not redeclare are bound too, so a
    /// proxy carries every value its request needs.
    pub(crate) fn build_proxy(
        &self,
        client: &Client,
        operation: &Operation,
        path: &str,
        graph: &SchemaGraph,
        registry: &mut MapperRegistry,
    ) -> Result<ProxyMethod> {
        let mut parameters = Vec::new();
        for parameter in &operation.request.parameters {
            let param_path = format!("{}/parameters/{}", path, parameter.name);
            parameters.push(proxy_parameter(parameter, &param_path, graph, registry)?);
        }
        for parameter in &client.parameters {
            let redeclared = operation
                .request
                .parameters
                .iter()
                .any(|p| p.serialized_name == parameter.serialized_name && p.location == parameter.location);
            if redeclared {
                continue;
            }
            let param_path = format!("clients/{}/parameters/{}", client.name, parameter.name);
            parameters.push(proxy_parameter(parameter, &param_path, graph, registry)?);
        }

        let body_type = match operation.body_parameter() {
            Some(body) => Some(registry.map_schema(graph, &body.schema, &format!("{}/parameters/{}", path, body.name))?),
            None => None,
        };
        let response_type = match operation.success_schema() {
            Some(schema) => Some(registry.map_schema(graph, schema, &format!("{}/responses", path))?),
            None => None,
        };
        let content_type = operation
            .request
            .content_type
            .clone()
            .or_else(|| body_type.as_ref().map(|_| JSON_CONTENT_TYPE.to_string()));

        let expected_status: Vec<StatusCode> = operation.success_responses().map(|r| r.status).collect();
        let mut typed_errors = Vec::new();
        let mut ranged_errors = Vec::new();
        let mut default_exception = ExceptionDefinition::default();
        for response in operation.error_responses() {
            let body = match &response.schema {
                Some(schema) => Some(registry.map_schema(graph, schema, &format!("{}/responses/{}", path, response.status))?),
                None => None,
            };
            match response.status {
                StatusCode::Code(code) => typed_errors.push((code, body)),
                StatusCode::Default => {
                    if body.is_some() {
                        default_exception.body_type = body;
                    }
                }
                StatusCode::Range(class) => ranged_errors.push((class, body)),
            }
        }
        let exceptions = exception_mappings(&expected_status, &self.exception_overrides, &typed_errors, &ranged_errors);

        Ok(ProxyMethod {
            name: operation.name.clone(),
            http_method: operation.request.method,
            url_template: operation.request.path.clone(),
            placeholders: placeholders(&operation.request.path)?,
            parameters,
            content_type,
            expected_status,
            exceptions,
            default_exception,
            response_type,
            body_type,
        })
    }
}

fn proxy_parameter(
    parameter: &Parameter,
    path: &str,
    graph: &SchemaGraph,
    registry: &mut MapperRegistry,
) -> Result<ProxyParameter> {
    let client_type = registry.map_schema(graph, &parameter.schema, path)?;
    let wire_type = client_type.wire_type();
    let constant_value =
        if parameter.required { MapperRegistry::constant_literal(graph, &parameter.schema) } else { None };
    Ok(ProxyParameter {
        name: parameter.name.clone(),
        serialized_name: parameter.serialized_name.clone(),
        location: parameter.location.unwrap_or(ParameterLocation::Query),
        origin: parameter.origin,
        client_type,
        wire_type,
        required: parameter.required,
        skip_url_encoding: parameter.skip_url_encoding,
        constant_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_in_template_order() {
        let names = placeholders("/stores/{storeId}/pets/{petId}").expect("pattern");
        assert_eq!(names, vec!["storeId".to_string(), "petId".to_string()]);
        assert!(placeholders("/pets").expect("pattern").is_empty());
        assert_eq!(placeholders("{nextLink}").expect("pattern"), vec!["nextLink".to_string()]);
    }
}
