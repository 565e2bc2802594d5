//! Service clients and their method groups

use std::collections::{BTreeSet, HashSet};

use ir::{Client, CodeModel, OperationGroup, ParameterLocation, ParameterOrigin, SchemaGraph, Security};
use mapper::MapperRegistry;
use types::naming::{to_pascal_case, to_snake_case};
use types::{
    ClientProperty, ClientPropertyKind, IType, MethodGroupClient, NameRegistry, NameStyle, PipelinePolicy,
    PrimitiveType, ServiceClient,
};

use crate::{operation_path, ClientModelBuilder, Result};

const ENDPOINT: &str = "endpoint";
const CREDENTIAL: &str = "credential";
const SERVICE_VERSION: &str = "service_version";
const API_VERSION_HEADER: &str = "api-version";

impl ClientModelBuilder<'_> {
    pub(crate) fn build_client(
        &self,
        model: &CodeModel,
        client: &Client,
        graph: &SchemaGraph,
        registry: &mut MapperRegistry,
    ) -> Result<ServiceClient> {
        let client_path = format!("clients/{}", client.name);
        let base = if client.name.ends_with("Client") { client.name.clone() } else { format!("{}Client", client.name) };
        let name = registry.claim_type_name(&base, &client_path)?;
        let builder_name = registry.claim_type_name(&format!("{}Builder", name), &client_path)?;

        let mut service_versions = client.api_versions.clone();
        service_versions.sort();
        service_versions.dedup();

        let properties = self.client_properties(client, &service_versions, graph, registry)?;

        let mut groups: Vec<&OperationGroup> = client.operation_groups.iter().collect();
        groups.sort_by_key(|g| !g.name.is_empty());
        let mut method_groups = Vec::with_capacity(groups.len());
        for group in groups {
            method_groups.push(self.build_group(client, group, &name, graph, registry)?);
        }

        let pipeline_policies = pipeline_policies(client, &method_groups);
        let description = if client.description.is_empty() { model.description.clone() } else { client.description.clone() };

        Ok(ServiceClient {
            name,
            builder_name,
            namespace: self.settings.namespace.clone().unwrap_or_else(|| model.namespace.clone()),
            description,
            properties,
            service_versions,
            method_groups,
            pipeline_policies,
        })
    }

    fn client_properties(
        &self,
        client: &Client,
        service_versions: &[String],
        graph: &SchemaGraph,
        registry: &mut MapperRegistry,
    ) -> Result<Vec<ClientProperty>> {
        let endpoint_param = client.parameters.iter().find(|p| p.location == Some(ParameterLocation::Uri));
        let mut properties = vec![ClientProperty {
            name: endpoint_param.map(|p| p.name.clone()).unwrap_or_else(|| ENDPOINT.to_string()),
            serialized_name: endpoint_param.map(|p| p.serialized_name.clone()).unwrap_or_else(|| ENDPOINT.to_string()),
            client_type: IType::string(),
            required: true,
            kind: ClientPropertyKind::Endpoint,
            default_value: None,
            description: endpoint_param
                .map(|p| p.description.clone())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "Service endpoint".to_string()),
        }];

        if let Some(security) = &client.security {
            let (serialized_name, description) = match security {
                Security::ApiKey { header } => (header.clone(), format!("Key sent in the `{}` header", header)),
                Security::OAuth2 { scopes } => {
                    ("authorization".to_string(), format!("Bearer token for scopes: {}", scopes.join(", ")))
                }
            };
            properties.push(ClientProperty {
                name: CREDENTIAL.to_string(),
                serialized_name,
                client_type: IType::string(),
                required: true,
                kind: ClientPropertyKind::Credential,
                default_value: None,
                description,
            });
        }

        if let Some(latest) = service_versions.last() {
            let serialized_name = client
                .parameters
                .iter()
                .find(|p| p.origin == ParameterOrigin::ApiVersion)
                .map(|p| p.serialized_name.clone())
                .unwrap_or_else(|| API_VERSION_HEADER.to_string());
            properties.push(ClientProperty {
                name: SERVICE_VERSION.to_string(),
                serialized_name,
                client_type: IType::Primitive(PrimitiveType::String),
                required: false,
                kind: ClientPropertyKind::ServiceVersion,
                default_value: Some(latest.clone()),
                description: "Service version; defaults to the latest".to_string(),
            });
        }

        for parameter in &client.parameters {
            if parameter.origin != ParameterOrigin::Client || parameter.location == Some(ParameterLocation::Uri) {
                continue;
            }
            let path = format!("clients/{}/parameters/{}", client.name, parameter.name);
            let client_type = registry.map_schema(graph, &parameter.schema, &path)?;
            let default_value = MapperRegistry::constant_literal(graph, &parameter.schema);
            properties.push(ClientProperty {
                name: parameter.name.clone(),
                serialized_name: parameter.serialized_name.clone(),
                client_type,
                required: parameter.required && default_value.is_none(),
                kind: ClientPropertyKind::Parameter,
                default_value,
                description: parameter.description.clone(),
            });
        }
        Ok(properties)
    }

    fn build_group(
        &self,
        client: &Client,
        group: &OperationGroup,
        client_type: &str,
        graph: &SchemaGraph,
        registry: &mut MapperRegistry,
    ) -> Result<MethodGroupClient> {
        let (type_name, property_name) = if group.name.is_empty() {
            (client_type.to_string(), String::new())
        } else {
            let path = format!("clients/{}/operationGroups/{}", client.name, group.name);
            let type_name = registry.claim_type_name(&format!("{}Client", to_pascal_case(&group.name)), &path)?;
            (type_name, to_snake_case(&group.name))
        };

        // Pages after the first are fetched through the paged method itself.
        let next_operations: HashSet<&str> = group
            .operations
            .iter()
            .filter_map(|op| {
                let next = op.paging.as_ref()?.next_operation.as_deref()?;
                (next != op.name).then_some(next)
            })
            .collect();

        let mut names = NameRegistry::new(NameStyle::Snake);
        let mut proxies = Vec::with_capacity(group.operations.len());
        let mut methods = Vec::new();
        for operation in &group.operations {
            let path = operation_path(&client.name, &group.name, &operation.name);
            let proxy = self.build_proxy(client, operation, &path, graph, registry)?;
            let index = proxies.len();
            if !next_operations.contains(operation.name.as_str()) {
                methods.extend(self.build_methods(operation, index, &proxy, &path, graph, registry, &mut names)?);
            }
            proxies.push(proxy);
        }

        Ok(MethodGroupClient {
            name: group.name.clone(),
            type_name,
            property_name,
            description: group.description.clone(),
            proxies,
            methods,
        })
    }
}

fn pipeline_policies(client: &Client, groups: &[MethodGroupClient]) -> BTreeSet<PipelinePolicy> {
    let mut policies = BTreeSet::new();
    match client.security {
        Some(Security::ApiKey { .. }) => {
            policies.insert(PipelinePolicy::KeyCredential);
        }
        Some(Security::OAuth2 { .. }) => {
            policies.insert(PipelinePolicy::BearerToken);
        }
        None => {}
    }
    let headers = groups
        .iter()
        .flat_map(|g| g.proxies.iter())
        .flat_map(|p| p.parameters_in(ParameterLocation::Header))
        .map(|p| p.serialized_name.as_str());
    for header in headers {
        if PipelinePolicy::RequestId.headers().iter().any(|h| h.eq_ignore_ascii_case(header)) {
            policies.insert(PipelinePolicy::RequestId);
        }
        if PipelinePolicy::Repeatability.headers()[0].eq_ignore_ascii_case(header) {
            policies.insert(PipelinePolicy::Repeatability);
        }
    }
    if groups.iter().flat_map(|g| g.methods.iter()).any(|m| m.polling.is_some()) {
        policies.insert(PipelinePolicy::Polling);
    }
    policies
}
