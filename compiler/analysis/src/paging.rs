//! Paging Next-Operation Synthesis
//!
//! A paged operation whose pages carry a next link is followed by GET
//! requests to that link. This pass adds a `<name>_next` operation for each
//! such operation (unless the group already has one) and records it on the
//! paged operation.

use ir::{
    HttpMethod, Operation, Paging, Parameter, ParameterLocation, ParameterOrigin, Request,
};
use tracing::debug;

use crate::{ensure_string_schema, CompilerContext, CompilerPhase, PhaseResult};

/// Name of the next-link path parameter
pub const NEXT_LINK_PARAMETER: &str = "next_link";

/// Synthesizes next-page operations
pub struct PagingNextOperations;

impl Default for PagingNextOperations {
    fn default() -> Self { Self::new() }
}

impl PagingNextOperations {
    /// Create a new paging pass
    pub fn new() -> Self { Self }

    fn next_operation(&self, operation: &Operation, name: &str, next_link: Parameter) -> Operation {
        let mut parameters = vec![next_link];
        parameters.extend(
            operation
                .request
                .parameters
                .iter()
                .filter(|p| p.location == Some(ParameterLocation::Header))
                .cloned(),
        );
        Operation {
            name: name.to_string(),
            description: format!("Get the next page of `{}`", operation.name),
            request: Request {
                method: HttpMethod::Get,
                path: "{nextLink}".to_string(),
                content_type: None,
                parameters,
            },
            responses: operation.responses.clone(),
            paging: operation.paging.as_ref().map(|paging| Paging {
                item_name: paging.item_name.clone(),
                next_link_name: paging.next_link_name.clone(),
                continuation_token: None,
                next_operation: Some(name.to_string()),
            }),
            long_running: None,
            api_versions: operation.api_versions.clone(),
            convenience_api: false,
        }
    }
}

impl CompilerPhase for PagingNextOperations {
    fn name(&self) -> &str { "PagingNextOperations" }

    fn description(&self) -> &str { "Synthesize next-page operations for next-link paging" }

    fn run(&self, ctx: &mut CompilerContext) -> PhaseResult {
        let pending = ctx
            .model
            .operations()
            .any(|o| o.paging.as_ref().is_some_and(|p| p.next_link_name.is_some() && p.next_operation.is_none()));
        if !pending {
            return Ok(());
        }
        let string = ensure_string_schema(&mut ctx.model);
        let mut next_link = Parameter::new(NEXT_LINK_PARAMETER, string, ParameterLocation::Path, true);
        next_link.serialized_name = "nextLink".to_string();
        next_link.origin = ParameterOrigin::Method;
        next_link.skip_url_encoding = true;
        next_link.description = "The URL to get the next page of items.".to_string();

        let mut synthesized = 0;
        for group in ctx.model.operation_groups_mut() {
            let mut added = Vec::new();
            for index in 0..group.operations.len() {
                let operation = &group.operations[index];
                let Some(paging) = &operation.paging else { continue };
                if paging.next_link_name.is_none() || paging.next_operation.is_some() {
                    continue;
                }
                let name = format!("{}_next", operation.name);
                let exists = group.operations.iter().chain(added.iter()).any(|o: &Operation| o.name == name);
                if !exists {
                    debug!(operation = %operation.name, next = %name, "synthesized next-page operation");
                    added.push(self.next_operation(operation, &name, next_link.clone()));
                }
                if let Some(paging) = group.operations[index].paging.as_mut() {
                    paging.next_operation = Some(name);
                }
            }
            synthesized += added.len();
            group.operations.extend(added);
        }
        ctx.count("next_operations", synthesized);
        Ok(())
    }
}
