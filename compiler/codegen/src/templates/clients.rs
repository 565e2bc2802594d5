//! Service clients, their builders and method groups
//!
//! One file per client holds the builder, the client itself and one struct
//! per operation group. Every proxy method becomes a private
//! `<proxy>_request` function that assembles the `HttpRequest` from
//! string-encoded arguments; the public methods convert their typed
//! arguments, send the request through the client pipeline and shape the
//! result for their variant.

use ir::{ParameterLocation, ParameterOrigin, StatusCode};
use types::method::KNOWN_EXCEPTIONS;
use types::{
    ClientMethod, ClientModelGraph, ClientProperty, ClientPropertyKind, IType, MethodGroupClient, PagingDetails,
    PipelinePolicy, PollingStrategyKind, ProxyMethod, ProxyParameter, ResultKind, ReturnShape, ServiceClient,
    TypeAdapter,
};

use crate::doc_comment::{doc_lines, emit_docs};
use crate::events::{EventSink, RenderEvent};
use crate::templates::{emit_item, import_references, literal_expr};
use crate::utils::{screaming_case, string_literal};
use crate::{CodegenError, Result};

/// Everything a client file needs while rendering
struct Scope<'a> {
    graph: &'a ClientModelGraph,
    client: &'a ServiceClient,
    adapter: &'a dyn TypeAdapter,
}

impl Scope<'_> {
    fn property(&self, kind: ClientPropertyKind) -> Option<&ClientProperty> {
        self.client.properties.iter().find(|p| p.kind == kind)
    }

    fn endpoint_field(&self) -> String {
        self.property(ClientPropertyKind::Endpoint).map(|p| p.name.clone()).unwrap_or_else(|| "endpoint".to_string())
    }

    /// Stored type of a client property
    fn field_type(&self, property: &ClientProperty) -> String {
        let ty = self.adapter.client_type(&property.client_type);
        if stored_optional(property) {
            format!("Option<{}>", ty)
        } else {
            ty
        }
    }
}

fn stored_optional(property: &ClientProperty) -> bool { !property.required && property.default_value.is_none() }

/// Render one client file
pub(crate) fn render_client<S: EventSink>(
    sink: &mut S,
    graph: &ClientModelGraph,
    client: &ServiceClient,
    adapter: &dyn TypeAdapter,
) -> Result<()> {
    let scope = Scope { graph, client, adapter };
    sink.emit(RenderEvent::FileDoc(format!("`{}` and its builder", client.name)));
    for property in &client.properties {
        import_references(sink, graph, &property.client_type, None)?;
    }

    render_builder(sink, &scope)?;
    sink.blank();
    render_client_struct(sink, &scope)?;
    for group in client.method_groups.iter().filter(|g| !g.is_client_level()) {
        sink.blank();
        emit_docs(sink, &group.description, &format!("`{}` operations", group.name));
        sink.line("#[derive(Clone)]");
        sink.open(format!("pub struct {} {{", group.type_name));
        sink.line(format!("client: {},", client.name));
        sink.close("}");
        sink.blank();
        sink.open(format!("impl {} {{", group.type_name));
        render_group_items(sink, &scope, group, "&self.client")?;
        sink.close("}");
    }
    Ok(())
}

fn render_builder<S: EventSink>(sink: &mut S, scope: &Scope) -> Result<()> {
    let client = scope.client;
    sink.line(format!("/// Configures and creates a [`{}`]", client.name));
    sink.line("#[derive(Clone, Default)]");
    sink.open(format!("pub struct {} {{", client.builder_name));
    sink.line("transport: Option<runtime::DynTransport>,");
    for property in &client.properties {
        let ty = match property.kind {
            ClientPropertyKind::Parameter => scope.adapter.client_type(&property.client_type),
            _ => "String".to_string(),
        };
        sink.line(format!("{}: Option<{}>,", property.name, ty));
    }
    sink.close("}");
    sink.blank();

    sink.open(format!("impl {} {{", client.builder_name));
    if let Some(latest) = client.service_versions.last() {
        let versions: Vec<String> = client.service_versions.iter().map(|v| string_literal(v)).collect();
        emit_item(sink, vec![
            "/// Service versions this client knows, oldest first".to_string(),
            format!("pub const SERVICE_VERSIONS: &'static [&'static str] = &[{}];", versions.join(", ")),
            "/// Version used when none is selected".to_string(),
            format!("pub const LATEST_SERVICE_VERSION: &'static str = {};", string_literal(latest)),
        ]);
        sink.blank();
    }
    emit_item(sink, vec![
        "/// Create an empty builder".to_string(),
        "pub fn new() -> Self { Self::default() }".to_string(),
    ]);
    sink.blank();
    emit_item(sink, vec![
        "/// Transport performing the requests".to_string(),
        "pub fn transport(mut self, transport: runtime::DynTransport) -> Self {".to_string(),
        "self.transport = Some(transport);".to_string(),
        "self".to_string(),
        "}".to_string(),
    ]);
    for property in &client.properties {
        sink.blank();
        let mut item = doc_lines(&property.description);
        if item.is_empty() {
            item.push(format!("/// Set `{}`", property.name));
        }
        match property.kind {
            ClientPropertyKind::Parameter => {
                let ty = scope.adapter.client_type(&property.client_type);
                item.push(format!("pub fn {}(mut self, value: {}) -> Self {{", property.name, ty));
                item.push(format!("self.{} = Some(value);", property.name));
            }
            _ => {
                item.push(format!("pub fn {}(mut self, value: impl Into<String>) -> Self {{", property.name));
                item.push(format!("self.{} = Some(value.into());", property.name));
            }
        }
        item.push("self".to_string());
        item.push("}".to_string());
        emit_item(sink, item);
    }
    sink.blank();
    render_build(sink, scope)?;
    sink.close("}");
    Ok(())
}

fn render_build<S: EventSink>(sink: &mut S, scope: &Scope) -> Result<()> {
    let client = scope.client;
    let mut lines = vec![
        "/// Create the client; fails when a required setting is missing".to_string(),
        format!("pub fn build(self) -> runtime::Result<{}> {{", client.name),
        "let transport = self.transport.ok_or_else(|| runtime::HttpError::MissingSetting(\"transport\".to_string()))?;"
            .to_string(),
    ];
    let mut pipeline = vec!["let pipeline = runtime::HttpPipeline::new(transport)".to_string()];
    if client.requires(PipelinePolicy::RequestId) {
        let header = request_id_header(client);
        pipeline.push(format!(".with_request_id({})", string_literal(&header)));
    }
    if client.requires(PipelinePolicy::Repeatability) {
        pipeline.push(".with_repeatability()".to_string());
    }
    if let Some(last) = pipeline.last_mut() {
        last.push(';');
    }
    lines.push(pipeline.join(""));

    if let Some(credential) = scope.property(ClientPropertyKind::Credential) {
        let make = if client.requires(PipelinePolicy::BearerToken) {
            "runtime::Credential::Bearer { token }".to_string()
        } else {
            format!("runtime::Credential::Key {{ header: {}.to_string(), key: token }}", string_literal(&credential.serialized_name))
        };
        if credential.required {
            lines.push(format!("let token = {}?;", required_setting(&credential.name)));
            lines.push(format!("let pipeline = pipeline.with_credential({});", make));
        } else {
            lines.push(format!("let pipeline = match self.{} {{", credential.name));
            lines.push(format!("Some(token) => pipeline.with_credential({}),", make));
            lines.push("None => pipeline,".to_string());
            lines.push("};".to_string());
        }
    }

    lines.push(format!("Ok({} {{", client.name));
    lines.push("pipeline: pipeline.into_dyn(),".to_string());
    for property in &client.properties {
        let value = match (property.kind, &property.default_value) {
            (ClientPropertyKind::Credential, _) => continue,
            (ClientPropertyKind::Parameter, Some(default)) => {
                let (expr, open) = literal_expr(scope.graph, &property.client_type, default)?;
                if open {
                    sink.import("runtime::ExpandableEnum");
                }
                format!("self.{}.unwrap_or_else(|| {})", property.name, expr)
            }
            (_, Some(default)) => format!("self.{}.unwrap_or_else(|| {}.to_string())", property.name, string_literal(default)),
            (_, None) if property.required => format!("{}?", required_setting(&property.name)),
            (_, None) => format!("self.{}", property.name),
        };
        lines.push(format!("{}: {},", property.name, value));
    }
    lines.push("})".to_string());
    lines.push("}".to_string());
    emit_item(sink, lines);
    Ok(())
}

fn required_setting(name: &str) -> String {
    format!("self.{}.ok_or_else(|| runtime::HttpError::MissingSetting({}.to_string()))", name, string_literal(name))
}

/// Request id header the operations declare, or the first the policy knows
fn request_id_header(client: &ServiceClient) -> String {
    let known = PipelinePolicy::RequestId.headers();
    client
        .method_groups
        .iter()
        .flat_map(|g| g.proxies.iter())
        .flat_map(|p| p.parameters_in(ParameterLocation::Header))
        .find(|p| known.iter().any(|h| h.eq_ignore_ascii_case(&p.serialized_name)))
        .map(|p| p.serialized_name.clone())
        .unwrap_or_else(|| known[0].to_string())
}

fn render_client_struct<S: EventSink>(sink: &mut S, scope: &Scope) -> Result<()> {
    let client = scope.client;
    emit_docs(sink, &client.description, &format!("Client for the `{}` service", client.namespace));
    sink.line("#[derive(Clone)]");
    sink.open(format!("pub struct {} {{", client.name));
    sink.line("pipeline: runtime::DynTransport,");
    for property in client.properties.iter().filter(|p| p.kind != ClientPropertyKind::Credential) {
        sink.line(format!("{}: {},", property.name, scope.field_type(property)));
    }
    sink.close("}");
    sink.blank();

    sink.open(format!("impl {} {{", client.name));
    emit_item(sink, vec![
        "/// Start configuring a client".to_string(),
        format!("pub fn builder() -> {} {{ {}::new() }}", client.builder_name, client.builder_name),
    ]);
    let endpoint = scope.endpoint_field();
    sink.blank();
    emit_item(sink, vec![
        "/// Service endpoint".to_string(),
        format!("pub fn {}(&self) -> &str {{ &self.{} }}", endpoint, endpoint),
    ]);
    if let Some(version) = scope.property(ClientPropertyKind::ServiceVersion) {
        sink.blank();
        emit_item(sink, vec![
            "/// Selected service version".to_string(),
            format!("pub fn {}(&self) -> &str {{ &self.{} }}", version.name, version.name),
        ]);
    }
    for group in client.method_groups.iter().filter(|g| !g.is_client_level()) {
        sink.blank();
        let mut item = vec![format!("/// `{}` operations", group.name)];
        item.push(format!(
            "pub fn {}(&self) -> {} {{ {} {{ client: self.clone() }} }}",
            group.property_name, group.type_name, group.type_name
        ));
        emit_item(sink, item);
    }
    if let Some(own) = client.method_groups.iter().find(|g| g.is_client_level()) {
        render_group_items(sink, scope, own, "self")?;
    }
    sink.close("}");
    Ok(())
}

/// Error tables, request builders and methods of one group
fn render_group_items<S: EventSink>(sink: &mut S, scope: &Scope, group: &MethodGroupClient, ctx: &str) -> Result<()> {
    for (index, proxy) in group.proxies.iter().enumerate() {
        if !group.methods.iter().any(|m| m.proxy == index) {
            continue;
        }
        sink.blank();
        sink.line(errors_const(proxy)?);
        if let Some(ranges) = error_ranges_const(proxy)? {
            sink.line(ranges);
        }
        sink.blank();
        emit_item(sink, request_fn(scope, proxy, ctx)?);
    }
    for method in &group.methods {
        let proxy = group.proxy_of(method).ok_or_else(|| {
            CodegenError::Message(format!("method `{}` is bound to a missing proxy", method.name))
        })?;
        for parameter in &method.parameters {
            import_references(sink, scope.graph, &parameter.client_type, None)?;
        }
        if let Some(ty) = value_type(method) {
            import_references(sink, scope.graph, ty, None)?;
        }
        sink.blank();
        emit_item(sink, method_fn(scope, proxy, method, ctx)?);
    }
    Ok(())
}

fn errors_const_name(proxy: &ProxyMethod) -> String { format!("{}_ERRORS", screaming_case(&proxy.name)) }

fn exception_kind(name: &str) -> Result<String> {
    if KNOWN_EXCEPTIONS.contains(&name) {
        Ok(format!("runtime::HttpErrorKind::{}", name))
    } else {
        Err(CodegenError::Message(format!("unknown exception `{}`", name)))
    }
}

fn errors_const(proxy: &ProxyMethod) -> Result<String> {
    let mut entries = Vec::new();
    for mapping in &proxy.exceptions {
        let kind = exception_kind(&mapping.exception)?;
        for code in &mapping.status_codes {
            entries.push(format!("({}, {})", code, kind));
        }
    }
    Ok(format!(
        "const {}: &'static [(u16, runtime::HttpErrorKind)] = &[{}];",
        errors_const_name(proxy),
        entries.join(", ")
    ))
}

fn error_ranges_const_name(proxy: &ProxyMethod) -> String {
    format!("{}_ERROR_RANGES", screaming_case(&proxy.name))
}

fn error_ranges_const(proxy: &ProxyMethod) -> Result<Option<String>> {
    let mut entries = Vec::new();
    for mapping in &proxy.exceptions {
        let kind = exception_kind(&mapping.exception)?;
        for class in &mapping.status_ranges {
            entries.push(format!("({}, {})", class, kind));
        }
    }
    if entries.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!(
        "const {}: &'static [(u8, runtime::HttpErrorKind)] = &[{}];",
        error_ranges_const_name(proxy),
        entries.join(", ")
    )))
}

fn status_predicate(expected: &[StatusCode]) -> String {
    if expected.iter().any(|s| matches!(s, StatusCode::Default)) {
        return "|_| true".to_string();
    }
    if expected.is_empty() {
        return "|status| (200..300).contains(&status)".to_string();
    }
    let patterns: Vec<String> = expected
        .iter()
        .map(|s| match s {
            StatusCode::Code(code) => code.to_string(),
            StatusCode::Range(class) => format!("{}..={}", u16::from(*class) * 100, u16::from(*class) * 100 + 99),
            StatusCode::Default => "_".to_string(),
        })
        .collect();
    format!("|status| matches!(status, {})", patterns.join(" | "))
}

fn check_line(proxy: &ProxyMethod) -> Result<String> {
    let default = exception_kind(&proxy.default_exception.exception)?;
    if proxy.exceptions.iter().any(|m| !m.status_ranges.is_empty()) {
        return Ok(format!(
            "let response = runtime::check_status_ranged(response, {}, Self::{}, Self::{}, {})?;",
            status_predicate(&proxy.expected_status),
            errors_const_name(proxy),
            error_ranges_const_name(proxy),
            default
        ));
    }
    Ok(format!(
        "let response = runtime::check_status_by(response, {}, Self::{}, {})?;",
        status_predicate(&proxy.expected_status),
        errors_const_name(proxy),
        default
    ))
}

/// Argument of a request builder
struct RequestArg<'a> {
    parameter: &'a ProxyParameter,
    ty: &'static str,
    optional: bool,
}

fn is_policy(parameter: &ProxyParameter) -> bool {
    parameter.location == ParameterLocation::Header && PipelinePolicy::stamps(&parameter.serialized_name)
}

fn is_binary(parameter: &ProxyParameter) -> bool { parameter.client_type == IType::Binary }

fn request_args(proxy: &ProxyMethod) -> Vec<RequestArg<'_>> {
    proxy
        .parameters
        .iter()
        .filter(|p| p.origin == ParameterOrigin::Method && p.constant_value.is_none())
        .map(|parameter| RequestArg {
            parameter,
            ty: match parameter.location {
                ParameterLocation::Body if is_binary(parameter) => "Vec<u8>",
                ParameterLocation::Body => "serde_json::Value",
                _ => "String",
            },
            optional: !parameter.required || is_policy(parameter),
        })
        .collect()
}

/// Client-held value feeding a request parameter
enum ClientValue {
    /// `String` field, e.g. `ctx.endpoint`
    Text(String),
    /// Expression producing an owned `String`
    Encoded(String),
    /// `Option<T>` field
    Optional(String),
}

fn client_value(scope: &Scope, parameter: &ProxyParameter) -> Result<Option<ClientValue>> {
    if parameter.origin == ParameterOrigin::ApiVersion {
        return Ok(scope.property(ClientPropertyKind::ServiceVersion).map(|p| ClientValue::Text(format!("ctx.{}", p.name))));
    }
    let property = scope.client.property(&parameter.name).ok_or_else(|| {
        CodegenError::Message(format!("client `{}` has no property `{}`", scope.client.name, parameter.name))
    })?;
    Ok(Some(match property.kind {
        ClientPropertyKind::Parameter if stored_optional(property) => ClientValue::Optional(format!("ctx.{}", property.name)),
        ClientPropertyKind::Parameter => ClientValue::Encoded(format!("runtime::to_param(&ctx.{})?", property.name)),
        _ => ClientValue::Text(format!("ctx.{}", property.name)),
    }))
}

fn request_fn(scope: &Scope, proxy: &ProxyMethod, ctx: &str) -> Result<Vec<String>> {
    let args = request_args(proxy);
    let signature: Vec<String> = args
        .iter()
        .map(|a| {
            if a.optional {
                format!(", {}: Option<{}>", a.parameter.name, a.ty)
            } else {
                format!(", {}: {}", a.parameter.name, a.ty)
            }
        })
        .collect();
    let mut body = Vec::new();

    // Path
    let mut format_string = String::new();
    let mut format_args = Vec::new();
    let mut absolute = false;
    let mut rest = proxy.url_template.as_str();
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|c| open + c) else { break };
        format_string.push_str(&rest[..open]);
        format_string.push_str("{}");
        let name = &rest[open + 1..close];
        let parameter = proxy
            .parameters
            .iter()
            .find(|p| {
                p.serialized_name == name && matches!(p.location, ParameterLocation::Path | ParameterLocation::Uri)
            })
            .ok_or_else(|| CodegenError::Message(format!("`{}` has no parameter for `{{{}}}`", proxy.name, name)))?;
        absolute |= parameter.location == ParameterLocation::Uri;
        let raw = if let Some(constant) = &parameter.constant_value {
            string_literal(constant)
        } else if parameter.origin == ParameterOrigin::Method {
            if args.iter().any(|a| a.optional && a.parameter.name == parameter.name) {
                format!("{}.as_deref().unwrap_or_default()", parameter.name)
            } else {
                format!("&{}", parameter.name)
            }
        } else {
            match client_value(scope, parameter)? {
                Some(ClientValue::Optional(field)) => {
                    format!("&{}.as_ref().map(runtime::to_param).transpose()?.unwrap_or_default()", field)
                }
                Some(ClientValue::Text(expr) | ClientValue::Encoded(expr)) => format!("&{}", expr),
                None => "\"\"".to_string(),
            }
        };
        let verbatim = parameter.skip_url_encoding || parameter.location == ParameterLocation::Uri;
        format_args.push(if verbatim { raw } else { format!("runtime::encode_component({})", raw) });
        rest = &rest[close + 1..];
    }
    format_string.push_str(rest);
    let path = if format_args.is_empty() {
        string_literal(&format_string)
    } else {
        format!("&format!({}, {})", string_literal(&format_string), format_args.join(", "))
    };
    let url = if absolute {
        path.trim_start_matches('&').to_string()
    } else {
        format!("runtime::join_url(&ctx.{}, {})", scope.endpoint_field(), path)
    };

    // Query, headers and body
    let mut statements = Vec::new();
    for parameter in &proxy.parameters {
        let setter = match parameter.location {
            ParameterLocation::Query => Setter::Query,
            ParameterLocation::Header => Setter::Header,
            ParameterLocation::Body => {
                body_statements(&mut statements, parameter, proxy, &args);
                continue;
            }
            _ => continue,
        };
        let wire = string_literal(&parameter.serialized_name);
        if let Some(constant) = &parameter.constant_value {
            statements.push(setter.call(&wire, &string_literal(constant), true));
            continue;
        }
        match parameter.origin {
            ParameterOrigin::Method => {
                let optional = args.iter().any(|a| a.optional && a.parameter.name == parameter.name);
                if optional {
                    statements.push(format!("if let Some(value) = {} {{", parameter.name));
                    statements.push(setter.call(&wire, "value", false));
                    statements.push("}".to_string());
                } else {
                    statements.push(setter.call(&wire, &parameter.name, false));
                }
            }
            _ => match client_value(scope, parameter)? {
                Some(ClientValue::Optional(field)) => {
                    statements.push(format!("if let Some(value) = &{} {{", field));
                    statements.push(setter.call(&wire, "runtime::to_param(value)?", false));
                    statements.push("}".to_string());
                }
                Some(ClientValue::Text(field)) => {
                    let value = match setter {
                        Setter::Query => field,
                        Setter::Header => format!("{}.clone()", field),
                    };
                    statements.push(setter.call(&wire, &value, false));
                }
                Some(ClientValue::Encoded(expr)) => statements.push(setter.call(&wire, &expr, false)),
                None => {}
            },
        }
    }

    let mut lines = vec![format!(
        "fn {}_request(&self{}) -> runtime::Result<runtime::HttpRequest> {{",
        proxy.name,
        signature.join("")
    )];
    let method = string_literal(proxy.http_method.as_str());
    if statements.is_empty() {
        body.push(format!("Ok(runtime::HttpRequest::new({}, {}))", method, url));
    } else {
        body.push(format!("let mut http_request = runtime::HttpRequest::new({}, {});", method, url));
        body.extend(statements);
        body.push("Ok(http_request)".to_string());
    }
    if body.iter().any(|l| l.contains("ctx.")) {
        lines.push(format!("let ctx = {};", ctx));
    }
    lines.extend(body);
    lines.push("}".to_string());
    Ok(lines)
}

#[derive(Clone, Copy)]
enum Setter {
    Query,
    Header,
}

impl Setter {
    /// Statement applying `value`; `literal` marks a `&str` literal
    fn call(self, name: &str, value: &str, literal: bool) -> String {
        match self {
            Setter::Query if literal => format!("http_request.append_query({}, {});", name, value),
            Setter::Query => format!("http_request.append_query({}, &{});", name, value),
            Setter::Header => format!("http_request.set_header({}, {});", name, value),
        }
    }
}

fn body_statements(statements: &mut Vec<String>, parameter: &ProxyParameter, proxy: &ProxyMethod, args: &[RequestArg]) {
    let content_type = proxy.content_type.clone();
    if let Some(constant) = &parameter.constant_value {
        statements.push(format!("http_request = http_request.with_json({})?;", string_literal(constant)));
        return;
    }
    let optional = args.iter().any(|a| a.optional && a.parameter.name == parameter.name);
    let name = &parameter.name;
    let mut inner = Vec::new();
    if is_binary(parameter) {
        inner.push(format!("http_request.body = Some({});", if optional { "body" } else { name.as_str() }));
        let media = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
        inner.push(format!("http_request.set_header(\"content-type\", {});", string_literal(&media)));
    } else {
        inner.push(format!("http_request = http_request.with_json(&{})?;", if optional { "body" } else { name.as_str() }));
        if let Some(media) = content_type.filter(|m| m != "application/json") {
            inner.push(format!("http_request.set_header(\"content-type\", {});", string_literal(&media)));
        }
    }
    if optional {
        statements.push(format!("if let Some(body) = {} {{", name));
        statements.extend(inner);
        statements.push("}".to_string());
    } else {
        statements.extend(inner);
    }
}

/// Value type a method surfaces, before variant wrapping
fn value_type(method: &ClientMethod) -> Option<&IType> {
    match (method.variant.result, &method.polling) {
        (ResultKind::LongRunning, Some(polling)) => Some(&polling.final_result),
        _ => method.return_type.as_ref(),
    }
}

fn method_return(scope: &Scope, method: &ClientMethod) -> String {
    let value = value_type(method);
    let base = match value {
        Some(IType::Binary) => "Vec<u8>".to_string(),
        Some(ty) => scope.adapter.client_type(ty),
        None => "()".to_string(),
    };
    let paged_item = || value.map(|t| scope.adapter.client_type(t)).unwrap_or_else(|| "serde_json::Value".to_string());
    match (method.variant.result, method.variant.shape, method.variant.is_async()) {
        (ResultKind::Paged, ReturnShape::Simple, false) => format!("runtime::PagedIterable<{}>", paged_item()),
        (ResultKind::Paged, ReturnShape::Simple, true) => format!("runtime::PagedFlux<{}>", paged_item()),
        (ResultKind::Paged, ReturnShape::WithRawResponse, _) => {
            format!("runtime::Response<runtime::Page<{}>>", paged_item())
        }
        (ResultKind::LongRunning, _, false) => format!("runtime::SyncPoller<{}>", base),
        (ResultKind::LongRunning, _, true) => format!("runtime::Poller<{}>", base),
        (ResultKind::Plain, ReturnShape::WithRawResponse, _) => format!("runtime::Response<{}>", base),
        (ResultKind::Plain, ReturnShape::Simple, _) => base,
    }
}

/// Arguments passed from a method to its request builder
fn forward_args(proxy: &ProxyMethod, method: &ClientMethod) -> String {
    request_args(proxy)
        .iter()
        .map(|a| {
            let name = &a.parameter.name;
            let declared = method.parameters.iter().find(|p| &p.name == name);
            match (declared, a.parameter.location) {
                (None, _) => "None".to_string(),
                (Some(_), ParameterLocation::Body) if is_binary(a.parameter) => name.clone(),
                (Some(p), ParameterLocation::Body) if p.required => format!("serde_json::to_value(&{})?", name),
                (Some(_), ParameterLocation::Body) => format!("{}.as_ref().map(serde_json::to_value).transpose()?", name),
                (Some(p), _) if p.required && !a.optional => format!("runtime::to_param(&{})?", name),
                (Some(p), _) if p.required => format!("Some(runtime::to_param(&{})?)", name),
                (Some(_), _) => format!("{}.as_ref().map(runtime::to_param).transpose()?", name),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn method_docs(method: &ClientMethod, proxy: &ProxyMethod) -> Vec<String> {
    let mut lines = doc_lines(&method.description);
    if lines.is_empty() {
        lines.push(format!("/// `{} {}`", proxy.http_method.as_str(), proxy.url_template));
    }
    if method.convenience {
        lines.push("///".to_string());
        lines.push("/// Typed overload; a `_raw` twin takes and returns untyped JSON.".to_string());
    }
    lines.push("///".to_string());
    lines.push("/// # Errors".to_string());
    lines.push("///".to_string());
    for mapping in &proxy.exceptions {
        let codes: Vec<String> = mapping
            .status_codes
            .iter()
            .map(u16::to_string)
            .chain(mapping.status_ranges.iter().map(|class| format!("{}XX", class)))
            .collect();
        lines.push(format!("/// * `{}` for status {}", mapping.exception, codes.join(", ")));
    }
    lines.push(format!("/// * `{}` for any other unexpected status", proxy.default_exception.exception));
    lines
}

fn method_fn(scope: &Scope, proxy: &ProxyMethod, method: &ClientMethod, ctx: &str) -> Result<Vec<String>> {
    let mut params: Vec<String> = method
        .parameters
        .iter()
        .map(|p| {
            let ty = match p.client_type {
                IType::Binary => "Vec<u8>".to_string(),
                _ => scope.adapter.client_type(&p.client_type),
            };
            if p.required {
                format!("{}: {}", p.name, ty)
            } else {
                format!("{}: Option<{}>", p.name, ty)
            }
        })
        .collect();
    let raw_page = method.variant.result == ResultKind::Paged && method.variant.shape == ReturnShape::WithRawResponse;
    if raw_page {
        params.push("continuation_token: Option<String>".to_string());
    }

    let mut lines = method_docs(method, proxy);
    if params.len() > 6 {
        lines.push("#[allow(clippy::too_many_arguments)]".to_string());
    }
    let asyncness = match (method.variant.is_async(), method.variant.result, method.variant.shape) {
        (true, ResultKind::Paged, ReturnShape::Simple) => "",
        (true, _, _) => "async ",
        (false, _, _) => "",
    };
    let self_params = std::iter::once("&self".to_string()).chain(params).collect::<Vec<_>>().join(", ");
    lines.push(format!(
        "pub {}fn {}({}) -> runtime::Result<{}> {{",
        asyncness,
        method.name,
        self_params,
        method_return(scope, method)
    ));
    lines.push(format!("let ctx = {};", ctx));
    let build = format!("self.{}_request({})", proxy.name, forward_args(proxy, method));

    match method.variant.result {
        ResultKind::Paged => {
            let paging = method
                .paging
                .as_ref()
                .ok_or_else(|| CodegenError::Message(format!("paged method `{}` has no paging details", method.name)))?;
            let item = value_type(method).map(|t| scope.adapter.client_type(t)).unwrap_or_else(|| "serde_json::Value".to_string());
            lines.push(format!("let first = {}?;", build));
            if raw_page {
                lines.push("let token = continuation_token;".to_string());
                if paging.next_link_name.is_some() {
                    lines.push(format!("let endpoint = ctx.{}.clone();", scope.endpoint_field()));
                }
                lines.extend(next_request(proxy, paging));
                let mut core = vec!["let response = ctx.pipeline.send(http_request).await?;".to_string(), check_line(proxy)?];
                core.push(format!("let page: runtime::Page<{}> = {}?;", item, page_expr(paging)));
                core.push("Ok(runtime::Response::new(response.status, response.headers.clone(), page))".to_string());
                push_core(&mut lines, core, method.variant.is_async());
            } else {
                lines.push("let pipeline = ctx.pipeline.clone();".to_string());
                if paging.next_link_name.is_some() {
                    lines.push(format!("let endpoint = ctx.{}.clone();", scope.endpoint_field()));
                }
                let (kind, wrap) = if method.variant.is_async() {
                    ("PagedFlux", "Box::pin(async move {")
                } else {
                    ("PagedIterable", "runtime::block_on(async move {")
                };
                lines.push(format!("Ok(runtime::{}::new(move |token: Option<String>| {{", kind));
                lines.extend(next_request(proxy, paging));
                lines.push("let pipeline = pipeline.clone();".to_string());
                lines.push(wrap.to_string());
                lines.push("let response = pipeline.send(http_request).await?;".to_string());
                lines.push(check_line(proxy)?);
                lines.push(page_expr(paging));
                lines.push(if method.variant.is_async() { "})" } else { "})?" }.to_string());
                lines.push("}))".to_string());
            }
        }
        ResultKind::LongRunning => {
            let polling = method.polling.as_ref().ok_or_else(|| {
                CodegenError::Message(format!("long-running method `{}` has no polling details", method.name))
            })?;
            let strategy = match polling.strategy {
                PollingStrategyKind::FixedInterval(seconds) => {
                    format!("runtime::PollingStrategy::FixedInterval(std::time::Duration::from_secs({}))", seconds)
                }
                PollingStrategyKind::RetryAfter(seconds) => format!(
                    "runtime::PollingStrategy::RetryAfter {{ fallback: std::time::Duration::from_secs({}) }}",
                    seconds
                ),
            };
            let core = vec![
                format!("let http_request = {}?;", build),
                "let response = ctx.pipeline.send(http_request.clone()).await?;".to_string(),
                check_line(proxy)?,
                format!(
                    "runtime::Poller::new(ctx.pipeline.clone(), &http_request, response, {}, runtime::FinalStateVia::{:?})",
                    strategy, polling.final_state_via
                ),
            ];
            if method.variant.is_async() {
                lines.extend(core);
            } else {
                let ty = value_type(method).map(|t| scope.adapter.client_type(t)).unwrap_or_else(|| "()".to_string());
                lines.push(format!("let poller: runtime::Poller<{}> = runtime::block_on(async {{", ty));
                lines.extend(core);
                lines.push("})??;".to_string());
                lines.push("runtime::SyncPoller::new(poller)".to_string());
            }
        }
        ResultKind::Plain => {
            let mut core = vec![
                format!("let http_request = {}?;", build),
                "let response = ctx.pipeline.send(http_request).await?;".to_string(),
                check_line(proxy)?,
            ];
            let value = value_type(method);
            match (method.variant.shape, value) {
                (ReturnShape::Simple, None) => core.push("Ok(())".to_string()),
                (ReturnShape::Simple, Some(IType::Binary)) => core.push("Ok(response.body)".to_string()),
                (ReturnShape::Simple, Some(ty)) => {
                    core.push(format!("let value: {} = response.json()?;", scope.adapter.client_type(ty)));
                    core.push("Ok(value)".to_string());
                }
                (ReturnShape::WithRawResponse, None) => core.push("Ok(runtime::Response::empty(response))".to_string()),
                (ReturnShape::WithRawResponse, Some(IType::Binary)) => {
                    core.push("Ok(runtime::Response::raw(response).map(|r| r.body))".to_string())
                }
                (ReturnShape::WithRawResponse, Some(ty)) => {
                    core.push(format!(
                        "let value: runtime::Response<{}> = runtime::Response::from_json(response)?;",
                        scope.adapter.client_type(ty)
                    ));
                    core.push("Ok(value)".to_string());
                }
            }
            push_core(&mut lines, core, method.variant.is_async());
        }
    }
    lines.push("}".to_string());
    Ok(lines)
}

/// Append an awaiting body, wrapped in `block_on` for blocking methods
fn push_core(lines: &mut Vec<String>, mut core: Vec<String>, is_async: bool) {
    if is_async {
        lines.extend(core);
        return;
    }
    if let Some(last) = core.last_mut() {
        if let Some(rest) = last.strip_prefix("Ok(") {
            *last = format!("Ok::<_, runtime::HttpError>({}", rest);
        }
    }
    lines.push("runtime::block_on(async {".to_string());
    lines.extend(core);
    lines.push("})?".to_string());
}

/// Statements binding `http_request` for the page `token` points at
fn next_request(proxy: &ProxyMethod, paging: &PagingDetails) -> Vec<String> {
    if paging.next_link_name.is_some() {
        return vec![
            "let http_request = match token {".to_string(),
            "Some(link) => {".to_string(),
            "let mut next = runtime::HttpRequest::new(\"GET\", runtime::join_url(&endpoint, &link));".to_string(),
            "next.headers = first.headers.clone();".to_string(),
            "next".to_string(),
            "}".to_string(),
            "None => first.clone(),".to_string(),
            "};".to_string(),
        ];
    }
    let Some(name) = &paging.continuation_parameter else {
        return vec!["let _ = token;".to_string(), "let http_request = first.clone();".to_string()];
    };
    let target = proxy.parameters.iter().find(|p| &p.name == name || &p.serialized_name == name);
    let wire = target.map(|p| p.serialized_name.clone()).unwrap_or_else(|| name.clone());
    let set = match target.map(|p| p.location) {
        Some(ParameterLocation::Header) => format!("http_request.set_header({}, token);", string_literal(&wire)),
        _ => format!("http_request.append_query({}, &token);", string_literal(&wire)),
    };
    vec![
        "let mut http_request = first.clone();".to_string(),
        "if let Some(token) = token {".to_string(),
        set,
        "}".to_string(),
    ]
}

fn page_expr(paging: &PagingDetails) -> String {
    let item = string_literal(&paging.item_name);
    if paging.next_link_name.is_none() {
        if let Some(header) = &paging.continuation_header {
            return format!("runtime::Page::from_response_header(&response, {}, {})", item, string_literal(header));
        }
    }
    let token = paging.next_link_name.as_ref().or(paging.continuation_property.as_ref());
    match token {
        Some(name) => format!("runtime::Page::from_response(&response, {}, Some({}))", item, string_literal(name)),
        None => format!("runtime::Page::from_response(&response, {}, None)", item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        assert_eq!(status_predicate(&[StatusCode::Code(200), StatusCode::Range(3)]), "|status| matches!(status, 200 | 300..=399)");
        assert_eq!(status_predicate(&[StatusCode::Default]), "|_| true");
        assert_eq!(status_predicate(&[]), "|status| (200..300).contains(&status)");
    }

    #[test]
    fn test_query_setter_borrows_values() {
        assert_eq!(Setter::Query.call("\"top\"", "top", false), "http_request.append_query(\"top\", &top);");
        assert_eq!(Setter::Query.call("\"v\"", "\"1\"", true), "http_request.append_query(\"v\", \"1\");");
        assert_eq!(Setter::Header.call("\"x\"", "x", false), "http_request.set_header(\"x\", x);");
    }
}
