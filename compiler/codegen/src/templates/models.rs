//! Model structs

use std::collections::BTreeSet;

use types::{ClientModel, ClientModelGraph, ClientModelProperty, TypeAdapter};

use crate::doc_comment::{doc_lines, emit_docs};
use crate::events::{EventSink, RenderEvent};
use crate::templates::{emit_item, import_references, literal_expr};
use crate::utils::string_literal;
use crate::{CodegenError, RenderOptions, Result};

/// Whether a field of `owner` typed as the model `target` must be boxed.
///
/// True when `target` reaches `owner` through direct (non-collection) model
/// fields, which would otherwise give the struct infinite size.
pub(crate) fn needs_box(graph: &ClientModelGraph, owner: usize, target: usize) -> bool {
    let mut seen = BTreeSet::new();
    let mut stack = vec![target];
    while let Some(next) = stack.pop() {
        if next == owner {
            return true;
        }
        if !seen.insert(next) {
            continue;
        }
        stack.extend(graph.all_properties(next).into_iter().filter_map(|p| p.client_type.as_model()).map(|r| r.index));
    }
    false
}

struct Field<'a> {
    property: &'a ClientModelProperty,
    ty: String,
    helper: Option<&'static str>,
    boxed: bool,
}

fn field<'a>(
    graph: &ClientModelGraph,
    owner: usize,
    property: &'a ClientModelProperty,
    adapter: &dyn TypeAdapter,
) -> Field<'a> {
    let boxed = property.client_type.as_model().is_some_and(|r| needs_box(graph, owner, r.index));
    let (base, helper) = adapter.field_type(&property.client_type);
    let base = if boxed { format!("Box<{}>", base) } else { base };
    match (property.required, helper) {
        (true, _) => Field { property, ty: base, helper, boxed },
        // Helpers only apply to the whole field, so optional ones keep their wire form.
        (false, Some(_)) => {
            Field { property, ty: adapter.optional(&property.client_type.wire_type()), helper: None, boxed }
        }
        (false, None) => Field { property, ty: format!("Option<{}>", base), helper: None, boxed },
    }
}

/// Render one model file
pub(crate) fn render_model<S: EventSink>(
    sink: &mut S,
    graph: &ClientModelGraph,
    index: usize,
    adapter: &dyn TypeAdapter,
    options: RenderOptions,
) -> Result<()> {
    let model = graph.models.get(index).ok_or_else(|| CodegenError::DanglingReference(format!("model #{}", index)))?;
    let fields: Vec<Field> = graph.all_properties(index).into_iter().map(|p| field(graph, index, p, adapter)).collect();

    sink.emit(RenderEvent::FileDoc(format!("`{}` model", model.name)));
    sink.import("serde::Deserialize");
    sink.import("serde::Serialize");
    for f in &fields {
        import_references(sink, graph, &f.property.client_type, Some(&model.name))?;
    }

    emit_docs(sink, &model.description, &format!("`{}` model", model.name));
    if !model.derived.is_empty() {
        let names: Vec<String> = model.derived.iter().map(|d| format!("[`{}`]", d.name)).collect();
        sink.line("///");
        sink.line(format!("/// Known subtypes: {}.", names.join(", ")));
    }
    sink.line("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]");
    sink.open(format!("pub struct {} {{", model.name));
    let visibility = if model.immutable { "pub(crate)" } else { "pub" };
    for f in &fields {
        emit_docs(sink, &f.property.description, "");
        let mut attrs = vec![format!("rename = {}", string_literal(&f.property.serialized_name))];
        if !f.property.required {
            attrs.push("default, skip_serializing_if = \"Option::is_none\"".to_string());
        }
        if let Some(helper) = f.helper {
            attrs.push(format!("with = {}", string_literal(helper)));
        }
        sink.line(format!("#[serde({})]", attrs.join(", ")));
        sink.line(format!("{} {}: {},", visibility, f.property.name, f.ty));
    }
    sink.close("}");

    let mut body = ImplBody::default();
    if let Some(value) = &model.discriminator_value {
        body.items.push(vec![
            "/// Discriminator value identifying this type on the wire".to_string(),
            format!("pub const DISCRIMINATOR_VALUE: &'static str = {};", string_literal(value)),
        ]);
    }
    if model.immutable {
        for f in &fields {
            body.items.push(getter(f));
        }
    } else if options.constructor_args {
        body.items.push(constructor(graph, model, &fields, &mut body.expandable)?);
    }
    for flat in &model.flattened {
        body.items.push(flattened_getter(graph, index, flat.via.as_str(), &flat.property, adapter)?);
    }
    if body.expandable {
        sink.import("runtime::ExpandableEnum");
    }
    if !body.items.is_empty() {
        sink.blank();
        sink.open(format!("impl {} {{", model.name));
        for (i, item) in body.items.into_iter().enumerate() {
            if i > 0 {
                sink.blank();
            }
            emit_item(sink, item);
        }
        sink.close("}");
    }
    if !model.derived.is_empty() {
        render_dispatch(sink, graph, index, model)?;
    }
    Ok(())
}

/// Name of the enum that picks the concrete type of a hierarchy rooted at `model`
pub(crate) fn dispatch_name(model: &ClientModel) -> String { format!("Any{}", model.name) }

fn render_dispatch<S: EventSink>(sink: &mut S, graph: &ClientModelGraph, index: usize, model: &ClientModel) -> Result<()> {
    let name = dispatch_name(model);
    if graph.model_by_name(&name).is_some() || graph.enum_by_name(&name).is_some() {
        return Err(CodegenError::Message(format!("`{}` clashes with the subtype enum of `{}`", name, model.name)));
    }
    let discriminator = model
        .discriminator
        .as_deref()
        .ok_or_else(|| CodegenError::Message(format!("`{}` has subtypes but no discriminator", model.name)))?;
    let mut subtypes = Vec::new();
    for i in graph.descendants(index) {
        let sub = graph.models.get(i).ok_or_else(|| CodegenError::DanglingReference(format!("model #{}", i)))?;
        sink.import(format!("crate::models::{}", sub.name));
        subtypes.push(sub);
    }

    sink.blank();
    sink.line(format!("/// [`{}`] or one of its subtypes, chosen by the `{}` value on the wire", model.name, discriminator));
    sink.line("#[derive(Debug, Clone, PartialEq, Serialize)]");
    sink.line("#[serde(untagged)]");
    sink.open(format!("pub enum {} {{", name));
    for sub in &subtypes {
        sink.line(format!("{}({}),", sub.name, sub.name));
    }
    sink.line(format!("{}({}),", model.name, model.name));
    sink.close("}");

    // Unknown or missing discriminator values fall back to the base type.
    sink.blank();
    sink.open(format!("impl<'de> Deserialize<'de> for {} {{", name));
    sink.open("fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {");
    sink.line("let value = serde_json::Value::deserialize(deserializer)?;");
    sink.line(format!(
        "let tag = value.get({}).and_then(serde_json::Value::as_str).map(str::to_owned);",
        string_literal(discriminator)
    ));
    sink.open("let parsed = match tag.as_deref() {");
    for sub in &subtypes {
        if let Some(value) = &sub.discriminator_value {
            sink.line(format!("Some({}) => serde_json::from_value(value).map(Self::{}),", string_literal(value), sub.name));
        }
    }
    sink.line(format!("_ => serde_json::from_value(value).map(Self::{}),", model.name));
    sink.close("};");
    sink.line("parsed.map_err(serde::de::Error::custom)");
    sink.close("}");
    sink.close("}");

    for sub in subtypes.iter().copied().chain(std::iter::once(model)) {
        sink.blank();
        sink.open(format!("impl From<{}> for {} {{", sub.name, name));
        sink.line(format!("fn from(value: {}) -> Self {{ Self::{}(value) }}", sub.name, sub.name));
        sink.close("}");
    }
    Ok(())
}

#[derive(Default)]
struct ImplBody {
    items: Vec<Vec<String>>,
    expandable: bool,
}

fn getter(f: &Field) -> Vec<String> {
    let p = f.property;
    let mut lines = doc_lines(&p.description);
    if lines.is_empty() {
        lines.push(format!("/// `{}` value", p.serialized_name));
    }
    if p.required {
        let inner = f.ty.strip_prefix("Box<").and_then(|t| t.strip_suffix('>')).unwrap_or(&f.ty);
        lines.push(format!("pub fn {}(&self) -> &{} {{", p.name, inner));
        lines.push(format!("&self.{}", p.name));
    } else {
        let inner = f.ty.strip_prefix("Option<").and_then(|t| t.strip_suffix('>')).unwrap_or(&f.ty);
        let inner = inner.strip_prefix("Box<").and_then(|t| t.strip_suffix('>')).unwrap_or(inner);
        lines.push(format!("pub fn {}(&self) -> Option<&{}> {{", p.name, inner));
        lines.push(format!("self.{}.{}", p.name, if f.boxed { "as_deref()" } else { "as_ref()" }));
    }
    lines.push("}".to_string());
    lines
}

fn constructor(graph: &ClientModelGraph, model: &ClientModel, fields: &[Field], expandable: &mut bool) -> Result<Vec<String>> {
    let args: Vec<&Field> = fields
        .iter()
        .filter(|f| f.property.required && f.property.constant_value.is_none())
        .filter(|f| !f.property.is_discriminator || model.discriminator_value.is_none())
        .collect();
    let mut lines = vec![format!("/// Create a `{}` from its required values", model.name)];
    if args.len() > 7 {
        lines.push("#[allow(clippy::too_many_arguments)]".to_string());
    }
    let params: Vec<String> = args.iter().map(|f| format!("{}: {}", f.property.name, arg_type(f))).collect();
    lines.push(format!("pub fn new({}) -> Self {{", params.join(", ")));
    lines.push("Self {".to_string());
    for f in fields {
        let p = f.property;
        let value = if let Some(literal) = model.discriminator_value.as_deref().filter(|_| p.is_discriminator) {
            let (expr, open) = literal_expr(graph, &p.client_type, literal)?;
            *expandable |= open;
            wrap(expr, f)
        } else if let Some(constant) = p.constant_value.as_deref().filter(|_| p.required) {
            let (expr, open) = literal_expr(graph, &p.client_type, constant)?;
            *expandable |= open;
            wrap(expr, f)
        } else if p.required {
            if f.boxed {
                format!("Box::new({})", p.name)
            } else {
                p.name.clone()
            }
        } else {
            "None".to_string()
        };
        if value == p.name {
            lines.push(format!("{},", p.name));
        } else {
            lines.push(format!("{}: {},", p.name, value));
        }
    }
    lines.push("}".to_string());
    lines.push("}".to_string());
    Ok(lines)
}

fn arg_type(f: &Field) -> String {
    f.ty.strip_prefix("Box<").and_then(|t| t.strip_suffix('>')).map(str::to_string).unwrap_or_else(|| f.ty.clone())
}

fn wrap(expr: String, f: &Field) -> String {
    if f.property.required {
        expr
    } else {
        format!("Some({})", expr)
    }
}

/// Access path built while walking a flattened carrier chain
enum Access {
    /// A place expression that is always present
    Place(String),
    /// An expression of type `Option<&T>`
    Maybe(String),
}

impl Access {
    fn step(self, name: &str, required: bool, boxed: bool) -> Self {
        let take = if boxed { "as_deref()" } else { "as_ref()" };
        match (self, required) {
            (Access::Place(p), true) => Access::Place(format!("{}.{}", p, name)),
            (Access::Place(p), false) => Access::Maybe(format!("{}.{}.{}", p, name, take)),
            (Access::Maybe(e), true) => {
                let deref = if boxed { "&*" } else { "&" };
                Access::Maybe(format!("{}.map(|v| {}v.{})", e, deref, name))
            }
            (Access::Maybe(e), false) => Access::Maybe(format!("{}.and_then(|v| v.{}.{})", e, name, take)),
        }
    }
}

fn flattened_getter(
    graph: &ClientModelGraph,
    owner: usize,
    via: &str,
    lifted: &ClientModelProperty,
    adapter: &dyn TypeAdapter,
) -> Result<Vec<String>> {
    let missing = || CodegenError::Message(format!("flattened property `{}` has no carrier `{}`", lifted.name, via));
    let mut current = owner;
    let mut access = Access::Place("self".to_string());
    let mut carrier_name = via;
    for step in via.split('.') {
        let carrier = graph.all_properties(current).into_iter().find(|p| p.name == step).ok_or_else(missing)?;
        let nested = carrier.client_type.as_model().ok_or_else(missing)?.index;
        access = access.step(step, carrier.required, needs_box(graph, current, nested));
        carrier_name = carrier.serialized_name.as_str();
        current = nested;
    }
    let original = graph
        .all_properties(current)
        .into_iter()
        .find(|p| p.serialized_name == lifted.serialized_name)
        .ok_or_else(missing)?;

    let f = field(graph, current, original, adapter);
    let inner = arg_type(&f);
    let inner = match inner.strip_prefix("Option<").and_then(|t| t.strip_suffix('>')) {
        Some(t) => t.strip_prefix("Box<").and_then(|t| t.strip_suffix('>')).unwrap_or(t).to_string(),
        None => inner,
    };
    let (ret, body) = match access.step(&original.name, original.required, f.boxed) {
        Access::Place(p) => (format!("&{}", inner), format!("&{}", p)),
        Access::Maybe(e) => (format!("Option<&{}>", inner), e),
    };
    let mut lines = doc_lines(&lifted.description);
    if lines.is_empty() {
        lines.push(format!("/// `{}` of the nested `{}` value", lifted.serialized_name, carrier_name));
    }
    lines.push(format!("pub fn {}(&self) -> {} {{", lifted.name, ret));
    lines.push(body);
    lines.push("}".to_string());
    Ok(lines)
}
