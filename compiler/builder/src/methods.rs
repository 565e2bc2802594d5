//! Method families of an operation

use ir::{Operation, ParameterLocation, ParameterOrigin, SchemaGraph};
use mapper::MapperRegistry;
use types::{
    ClientMethod, ClientModel, IType, Invocation, MethodParameter, MethodVariant, NameRegistry, PagingDetails,
    PipelinePolicy, PollingDetails, PollingStrategyKind, ProxyMethod, ResultKind, ReturnShape,
};

use crate::{ClientModelBuilder, Result};

/// Name of a method variant of `operation`.
///
/// `raw` marks the untyped twin of a convenience overload.
///
/// ```
/// use builder::method_name;
/// use types::{Invocation, MethodVariant, ResultKind, ReturnShape};
///
/// let lro = MethodVariant::new(ReturnShape::Simple, Invocation::Async, ResultKind::LongRunning);
/// assert_eq!(method_name("create_pet", lro, false), "begin_create_pet_async");
/// ```
pub fn method_name(operation: &str, variant: MethodVariant, raw: bool) -> String {
    let mut name = match (variant.shape, variant.result) {
        (ReturnShape::Simple, ResultKind::LongRunning) => format!("begin_{}", operation),
        (ReturnShape::Simple, _) => operation.to_string(),
        (ReturnShape::WithRawResponse, _) => format!("{}_with_response", operation),
    };
    if raw {
        name.push_str("_raw");
    }
    if variant.is_async() {
        name.push_str("_async");
    }
    name
}

pub(crate) fn is_policy_header(name: &str) -> bool { PipelinePolicy::stamps(name) }

fn is_typed(ty: &IType) -> bool { !ty.references().is_empty() }

fn untyped(ty: &IType) -> IType {
    if is_typed(ty) {
        IType::Any
    } else {
        ty.clone()
    }
}

/// Element type of the items property of a page model, searching its ancestors
fn page_item_type(page: Option<&IType>, item_name: &str, models: &[ClientModel]) -> IType {
    let mut current = page.and_then(IType::as_model).and_then(|r| models.get(r.index));
    while let Some(model) = current {
        if let Some(property) = model.properties.iter().find(|p| p.serialized_name == item_name) {
            return match &property.client_type {
                IType::List(element) => element.as_ref().clone(),
                other => other.clone(),
            };
        }
        current = model.parent.as_ref().and_then(|r| models.get(r.index));
    }
    IType::Any
}

/// Types shared by every method of one operation, fully typed
struct OperationShape {
    parameters: Vec<MethodParameter>,
    response: Option<IType>,
    item: Option<IType>,
    final_result: Option<IType>,
    paging: Option<PagingDetails>,
    strategy: PollingStrategyKind,
}

impl ClientModelBuilder<'_> {
    /// Expand one operation into its client methods, bound to `proxy_index`.
    ///
    /// Names are claimed in `names`, the registry of the method group.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build_methods(
        &self,
        operation: &Operation,
        proxy_index: usize,
        proxy: &ProxyMethod,
        path: &str,
        graph: &SchemaGraph,
        registry: &mut MapperRegistry,
        names: &mut NameRegistry,
    ) -> Result<Vec<ClientMethod>> {
        let shape = self.operation_shape(operation, proxy, path, graph, registry)?;
        let typed = shape.parameters.iter().any(|p| is_typed(&p.client_type))
            || [&shape.response, &shape.item, &shape.final_result].into_iter().flatten().any(is_typed);
        let convenience = self.settings.generate_convenience_api && operation.convenience_api && typed;

        let kinds = if operation.is_paged() {
            [(ReturnShape::Simple, ResultKind::Paged), (ReturnShape::WithRawResponse, ResultKind::Paged)]
        } else if operation.is_long_running() {
            [(ReturnShape::Simple, ResultKind::LongRunning), (ReturnShape::WithRawResponse, ResultKind::Plain)]
        } else {
            [(ReturnShape::WithRawResponse, ResultKind::Plain), (ReturnShape::Simple, ResultKind::Plain)]
        };
        let mut invocations = vec![Invocation::Sync];
        if self.settings.generate_async_api {
            invocations.push(Invocation::Async);
        }

        let mut methods = Vec::new();
        for invocation in invocations {
            for (return_shape, result) in kinds {
                let variant = MethodVariant::new(return_shape, invocation, result);
                let overloaded = convenience && return_shape == ReturnShape::Simple;
                if overloaded {
                    methods.push(method(operation, variant, proxy_index, &shape, true, false));
                }
                methods.push(method(operation, variant, proxy_index, &shape, false, overloaded));
            }
        }
        for m in &mut methods {
            m.name = names.claim(&m.name, path)?;
        }
        Ok(methods)
    }

    fn operation_shape(
        &self,
        operation: &Operation,
        proxy: &ProxyMethod,
        path: &str,
        graph: &SchemaGraph,
        registry: &mut MapperRegistry,
    ) -> Result<OperationShape> {
        let mut required = Vec::new();
        let mut optional = Vec::new();
        for parameter in &proxy.parameters {
            let fixed = parameter.required && parameter.constant_value.is_some();
            let policy = parameter.location == ParameterLocation::Header && is_policy_header(&parameter.serialized_name);
            if parameter.origin != ParameterOrigin::Method || fixed || policy {
                continue;
            }
            let description = operation
                .request
                .parameters
                .iter()
                .find(|p| p.name == parameter.name)
                .map(|p| p.description.clone())
                .unwrap_or_default();
            let signature = MethodParameter {
                name: parameter.name.clone(),
                client_type: parameter.client_type.clone(),
                required: parameter.required,
                description,
            };
            if parameter.required {
                required.push(signature);
            } else {
                optional.push(signature);
            }
        }
        required.extend(optional);

        let paging = operation.paging.as_ref().map(|p| PagingDetails {
            item_name: p.item_name.clone(),
            next_link_name: p.next_link_name.clone(),
            next_proxy: p.next_operation.clone(),
            continuation_parameter: p.continuation_token.as_ref().map(|t| t.parameter.clone()),
            continuation_header: p.continuation_token.as_ref().and_then(|t| t.response_header.clone()),
            continuation_property: p.continuation_token.as_ref().and_then(|t| t.response_property.clone()),
        });
        let item = paging
            .as_ref()
            .map(|p| page_item_type(proxy.response_type.as_ref(), &p.item_name, registry.models()));

        let (final_result, strategy) = match &operation.long_running {
            Some(lro) => {
                let final_result = match &lro.final_result {
                    Some(schema) => registry.map_schema(graph, schema, &format!("{}/longRunning", path))?,
                    None => proxy.response_type.clone().unwrap_or(IType::Any),
                };
                let strategy = match lro.poll_interval_seconds {
                    Some(seconds) => PollingStrategyKind::FixedInterval(seconds),
                    None => PollingStrategyKind::RetryAfter(self.settings.default_poll_interval_seconds),
                };
                (Some(final_result), strategy)
            }
            None => (None, PollingStrategyKind::RetryAfter(self.settings.default_poll_interval_seconds)),
        };

        Ok(OperationShape {
            parameters: required,
            response: proxy.response_type.clone(),
            item,
            final_result,
            paging,
            strategy,
        })
    }
}

fn method(
    operation: &Operation,
    variant: MethodVariant,
    proxy: usize,
    shape: &OperationShape,
    convenience: bool,
    raw: bool,
) -> ClientMethod {
    let expose = |ty: &IType| if convenience { ty.clone() } else { untyped(ty) };
    let parameters = shape
        .parameters
        .iter()
        .map(|p| MethodParameter { client_type: expose(&p.client_type), ..p.clone() })
        .collect();
    let return_type = match (variant.shape, variant.result) {
        (_, ResultKind::Paged) => shape.item.as_ref().map(expose),
        (ReturnShape::Simple, ResultKind::LongRunning) => shape.final_result.as_ref().map(expose),
        _ => shape.response.as_ref().map(expose),
    };
    let polling = match (variant.result, operation.long_running.as_ref()) {
        (ResultKind::LongRunning, Some(lro)) => Some(PollingDetails {
            strategy: shape.strategy,
            final_state_via: lro.final_state_via,
            poll_result: shape.response.as_ref().map(expose).unwrap_or(IType::Any),
            final_result: shape.final_result.as_ref().map(expose).unwrap_or(IType::Any),
        }),
        _ => None,
    };
    let paging = if variant.result == ResultKind::Paged { shape.paging.clone() } else { None };

    ClientMethod {
        name: method_name(&operation.name, variant, raw),
        description: operation.description.clone(),
        variant,
        convenience,
        proxy,
        parameters,
        return_type,
        paging,
        polling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(shape: ReturnShape, invocation: Invocation, result: ResultKind) -> MethodVariant {
        MethodVariant::new(shape, invocation, result)
    }

    #[test]
    fn test_method_names() {
        use Invocation::*;
        use ResultKind::*;
        use ReturnShape::*;

        assert_eq!(method_name("get_pet", variant(Simple, Sync, Plain), false), "get_pet");
        assert_eq!(method_name("get_pet", variant(WithRawResponse, Sync, Plain), false), "get_pet_with_response");
        assert_eq!(method_name("get_pet", variant(Simple, Async, Plain), true), "get_pet_raw_async");
        assert_eq!(method_name("list_pets", variant(Simple, Sync, Paged), false), "list_pets");
        assert_eq!(method_name("create", variant(Simple, Sync, LongRunning), false), "begin_create");
    }

    #[test]
    fn test_policy_headers_are_case_insensitive() {
        assert!(is_policy_header("X-MS-Client-Request-Id"));
        assert!(is_policy_header("repeatability-first-sent"));
        assert!(!is_policy_header("if-match"));
    }

    #[test]
    fn test_untyped_erases_references() {
        use types::TypeRef;
        let pets = IType::List(Box::new(IType::Model(TypeRef::new(0, "Pet"))));
        assert_eq!(untyped(&pets), IType::Any);
        assert_eq!(untyped(&IType::string()), IType::string());
        assert_eq!(untyped(&IType::Binary), IType::Binary);
    }
}
