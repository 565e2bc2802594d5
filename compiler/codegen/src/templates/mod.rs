//! Templates turning graph nodes into render events

pub(crate) mod clients;
pub(crate) mod crate_root;
pub(crate) mod enums;
pub(crate) mod models;

use std::collections::BTreeSet;

use types::naming::{identifier, to_snake_case};
use types::{ClientModelGraph, IType, NameKind, PrimitiveType};

use crate::events::EventSink;
use crate::utils::{screaming_case, string_literal};
use crate::{CodegenError, Result};

/// Module file stem for a generated type
pub(crate) fn module_name(type_name: &str) -> String { identifier(&to_snake_case(type_name), NameKind::Property) }

/// Import every generated type `ty` references, except `skip`
pub(crate) fn import_references<S: EventSink>(sink: &mut S, graph: &ClientModelGraph, ty: &IType, skip: Option<&str>) -> Result<()> {
    for name in reference_names(graph, ty)? {
        if Some(name.as_str()) != skip {
            sink.import(format!("crate::models::{}", name));
        }
    }
    Ok(())
}

fn reference_names(graph: &ClientModelGraph, ty: &IType) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for r in ty.references() {
        let known = match ty_kind(ty, r) {
            Some(true) => graph.model(r).map(|m| m.name.clone()),
            Some(false) => graph.enum_type(r).map(|e| e.name.clone()),
            None => None,
        };
        names.insert(known.ok_or_else(|| CodegenError::DanglingReference(r.name.clone()))?);
    }
    Ok(names)
}

// Some(true) for a model reference, Some(false) for an enum reference.
fn ty_kind(ty: &IType, target: &types::TypeRef) -> Option<bool> {
    match ty {
        IType::Model(r) if r == target => Some(true),
        IType::Enum(r) if r == target => Some(false),
        IType::List(inner) | IType::Map(inner) => ty_kind(inner, target),
        _ => None,
    }
}

/// Rust expression producing the constant `literal` of type `ty`.
///
/// The flag reports whether the expression needs `ExpandableEnum` in scope.
pub(crate) fn literal_expr(graph: &ClientModelGraph, ty: &IType, literal: &str) -> Result<(String, bool)> {
    match ty {
        IType::Primitive(PrimitiveType::String) => Ok((format!("{}.to_string()", string_literal(literal)), false)),
        IType::Primitive(PrimitiveType::Boolean | PrimitiveType::Int32 | PrimitiveType::Int64) => {
            Ok((literal.to_string(), false))
        }
        IType::Primitive(PrimitiveType::Float32 | PrimitiveType::Float64) => Ok((float_literal(literal), false)),
        IType::Enum(r) => {
            let e = graph.enum_type(r).ok_or_else(|| CodegenError::DanglingReference(r.name.clone()))?;
            let numeric = !e.value_type.is_string_on_wire();
            if e.expandable {
                if numeric {
                    let value = match e.value_type {
                        PrimitiveType::Float32 | PrimitiveType::Float64 => float_literal(literal),
                        _ => literal.to_string(),
                    };
                    return Ok((format!("{}::from_value({})", e.name, value), false));
                }
                return Ok((format!("{}::from_value({})", e.name, string_literal(literal)), true));
            }
            let member = e.member_for(literal).ok_or_else(|| {
                CodegenError::Message(format!("`{}` is not a member of enum `{}`", literal, e.name))
            })?;
            if numeric {
                return Ok((format!("{}::{}", e.name, screaming_case(&member.name)), false));
            }
            Ok((format!("{}::{}", e.name, member.name), false))
        }
        other => Err(CodegenError::Message(format!("constant `{}` of type {:?} has no literal form", literal, other))),
    }
}

// Items are flat lines; `{` / `}` endings drive nesting.
pub(crate) fn emit_item<S: EventSink>(sink: &mut S, lines: Vec<String>) {
    for line in lines {
        if line.starts_with("//") {
            sink.line(line);
        } else if line.ends_with('{') {
            sink.open(line);
        } else if line.starts_with('}') {
            sink.close(line);
        } else {
            sink.line(line);
        }
    }
}

/// Float literal that always carries a decimal point
pub(crate) fn float_literal(literal: &str) -> String {
    if literal.contains(['.', 'e', 'E']) {
        literal.to_string()
    } else {
        format!("{}.0", literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{EnumMember, EnumType, TypeRef};

    fn graph() -> ClientModelGraph {
        let mut graph = ClientModelGraph::new("petstore");
        let mut color = EnumType::placeholder("Color", "petstore", "Color");
        color.value_type = PrimitiveType::String;
        color.members = vec![EnumMember { name: "Red".to_string(), value: "red".to_string(), description: String::new() }];
        graph.enums.push(color);
        let mut level = EnumType::placeholder("Level", "petstore", "Level");
        level.value_type = PrimitiveType::Int32;
        level.members = vec![EnumMember { name: "Low".to_string(), value: "1".to_string(), description: String::new() }];
        graph.enums.push(level);
        graph
    }

    #[test]
    fn test_literal_expressions() {
        let graph = graph();
        let color = IType::Enum(TypeRef::new(0, "Color"));
        assert_eq!(literal_expr(&graph, &color, "red").expect("member").0, "Color::Red");
        assert!(literal_expr(&graph, &color, "blue").is_err());
        assert_eq!(
            literal_expr(&graph, &IType::Primitive(PrimitiveType::Float64), "2").expect("float").0,
            "2.0"
        );
        assert_eq!(literal_expr(&graph, &IType::string(), "cat").expect("string").0, "\"cat\".to_string()");
    }

    #[test]
    fn test_closed_numeric_literal_uses_member_constant() {
        let mut graph = graph();
        let level = IType::Enum(TypeRef::new(1, "Level"));
        assert_eq!(literal_expr(&graph, &level, "1").expect("member").0, "Level::LOW");
        assert!(literal_expr(&graph, &level, "99").is_err());

        graph.enums[1].expandable = true;
        assert_eq!(literal_expr(&graph, &level, "99").expect("open").0, "Level::from_value(99)");
    }

    #[test]
    fn test_module_names_avoid_keywords() {
        assert_eq!(module_name("PetStore"), "pet_store");
        assert_ne!(module_name("Type"), "type");
    }
}
