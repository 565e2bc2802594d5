//! Enum types
//!
//! Three shapes are rendered:
//!
//! * closed string enums become a plain Rust `enum` with serde renames
//! * open string enums add an `UnknownValue(String)` member and implement
//!   `runtime::ExpandableEnum`
//! * enums over a number or boolean become a transparent newtype with one
//!   associated constant per member

use types::model::UNKNOWN_MEMBER;
use types::{EnumType, PrimitiveType, TypeAdapter};

use crate::doc_comment::{doc_lines, emit_docs};
use crate::events::{EventSink, RenderEvent};
use crate::templates::{emit_item, float_literal};
use crate::utils::{screaming_case, string_literal};
use crate::Result;

/// Render one enum file
pub(crate) fn render_enum<S: EventSink>(sink: &mut S, e: &EnumType, adapter: &dyn TypeAdapter) -> Result<()> {
    sink.emit(RenderEvent::FileDoc(format!("`{}` enum", e.name)));
    emit_docs(sink, &e.description, &format!("`{}` values", e.name));
    if !e.value_type.is_string_on_wire() {
        render_newtype(sink, e, adapter);
    } else if e.expandable {
        render_open(sink, e);
    } else {
        render_closed(sink, e);
    }
    sink.blank();
    sink.open(format!("impl std::fmt::Display for {} {{", e.name));
    sink.open("fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {");
    if e.value_type.is_string_on_wire() {
        sink.line("f.write_str(self.value())");
    } else {
        sink.line("write!(f, \"{}\", self.0)");
    }
    sink.close("}");
    sink.close("}");
    Ok(())
}

fn member_docs<S: EventSink>(sink: &mut S, description: &str, value: &str) {
    emit_docs(sink, description, &format!("`{}`", value));
}

fn render_closed<S: EventSink>(sink: &mut S, e: &EnumType) {
    sink.import("serde::Deserialize");
    sink.import("serde::Serialize");
    sink.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]");
    sink.open(format!("pub enum {} {{", e.name));
    for m in &e.members {
        member_docs(sink, &m.description, &m.value);
        sink.line(format!("#[serde(rename = {})]", string_literal(&m.value)));
        sink.line(format!("{},", m.name));
    }
    sink.close("}");

    sink.blank();
    sink.open(format!("impl {} {{", e.name));
    sink.line("/// Wire value");
    sink.open("pub fn value(&self) -> &'static str {");
    sink.open("match *self {");
    for m in &e.members {
        sink.line(format!("{}::{} => {},", e.name, m.name, string_literal(&m.value)));
    }
    sink.close("}");
    sink.close("}");
    sink.blank();
    sink.line("/// Member carrying a wire value");
    sink.open("pub fn from_value(value: &str) -> Option<Self> {");
    sink.open("match value {");
    for m in &e.members {
        sink.line(format!("{} => Some({}::{}),", string_literal(&m.value), e.name, m.name));
    }
    sink.line("_ => None,");
    sink.close("}");
    sink.close("}");
    sink.close("}");
}

fn render_open<S: EventSink>(sink: &mut S, e: &EnumType) {
    sink.import("runtime::ExpandableEnum");
    sink.import("serde::Deserialize");
    sink.import("serde::Serialize");
    sink.line("#[derive(Debug, Clone, PartialEq, Eq, Hash)]");
    sink.open(format!("pub enum {} {{", e.name));
    for m in &e.members {
        member_docs(sink, &m.description, &m.value);
        sink.line(format!("{},", m.name));
    }
    sink.line("/// Value not known when this library was generated");
    sink.line(format!("{}(String),", UNKNOWN_MEMBER));
    sink.close("}");

    sink.blank();
    sink.open(format!("impl ExpandableEnum for {} {{", e.name));
    sink.open("fn from_value(value: &str) -> Self {");
    sink.open("match value {");
    for m in &e.members {
        sink.line(format!("{} => {}::{},", string_literal(&m.value), e.name, m.name));
    }
    sink.line(format!("other => {}::{}(other.to_string()),", e.name, UNKNOWN_MEMBER));
    sink.close("}");
    sink.close("}");
    sink.blank();
    sink.open("fn value(&self) -> &str {");
    sink.open("match self {");
    for m in &e.members {
        sink.line(format!("{}::{} => {},", e.name, m.name, string_literal(&m.value)));
    }
    sink.line(format!("{}::{}(value) => value.as_str(),", e.name, UNKNOWN_MEMBER));
    sink.close("}");
    sink.close("}");
    sink.blank();
    let known: Vec<String> = e.members.iter().map(|m| format!("{}::{}", e.name, m.name)).collect();
    sink.line(format!("fn known_values() -> Vec<Self> {{ vec![{}] }}", known.join(", ")));
    sink.close("}");

    sink.blank();
    sink.open(format!("impl Serialize for {} {{", e.name));
    sink.open("fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {");
    sink.line("runtime::expandable::serialize(self, serializer)");
    sink.close("}");
    sink.close("}");
    sink.blank();
    sink.open(format!("impl<'de> Deserialize<'de> for {} {{", e.name));
    sink.open("fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {");
    sink.line("runtime::expandable::deserialize(deserializer)");
    sink.close("}");
    sink.close("}");
}

fn render_newtype<S: EventSink>(sink: &mut S, e: &EnumType, adapter: &dyn TypeAdapter) {
    let scalar = adapter.client_type(&types::IType::Primitive(e.value_type));
    let float = matches!(e.value_type, PrimitiveType::Float32 | PrimitiveType::Float64);
    sink.import("serde::Deserialize");
    sink.import("serde::Serialize");
    let derives = if float { "Debug, Clone, Copy, PartialEq" } else { "Debug, Clone, Copy, PartialEq, Eq, Hash" };
    if e.expandable {
        sink.line(format!("#[derive({}, Serialize, Deserialize)]", derives));
        sink.line("#[serde(transparent)]");
        sink.line(format!("pub struct {}(pub {});", e.name, scalar));
    } else {
        // Private field: only members can be constructed.
        sink.line(format!("#[derive({}, Serialize)]", derives));
        sink.line("#[serde(transparent)]");
        sink.line(format!("pub struct {}({});", e.name, scalar));
    }

    sink.blank();
    sink.open(format!("impl {} {{", e.name));
    for m in &e.members {
        let mut item = doc_lines(&m.description);
        if item.is_empty() {
            item.push(format!("/// `{}`", m.value));
        }
        let value = if float { float_literal(&m.value) } else { m.value.clone() };
        item.push(format!("pub const {}: {} = {}({});", screaming_case(&m.name), e.name, e.name, value));
        emit_item(sink, item);
    }
    if !e.members.is_empty() {
        sink.blank();
    }
    sink.line("/// Wire value");
    sink.line(format!("pub fn value(&self) -> {} {{ self.0 }}", scalar));
    sink.blank();
    if e.expandable {
        sink.line("/// Wrap any wire value");
        sink.line(format!("pub fn from_value(value: {}) -> Self {{ Self(value) }}", scalar));
    } else {
        sink.line("/// Known member carrying a wire value");
        sink.line(format!(
            "pub fn from_value(value: {}) -> Option<Self> {{ Self::known_values().into_iter().find(|m| m.0 == value) }}",
            scalar
        ));
    }
    sink.blank();
    let known: Vec<String> = e.members.iter().map(|m| format!("Self::{}", screaming_case(&m.name))).collect();
    sink.line("/// Known members");
    sink.line(format!("pub fn known_values() -> Vec<Self> {{ vec![{}] }}", known.join(", ")));
    sink.close("}");

    if !e.expandable {
        sink.blank();
        sink.open(format!("impl<'de> Deserialize<'de> for {} {{", e.name));
        sink.open("fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {");
        sink.line(format!(
            "runtime::expandable::deserialize_closed(deserializer, {}, Self::from_value)",
            string_literal(&e.name)
        ));
        sink.close("}");
        sink.close("}");
    }
}
