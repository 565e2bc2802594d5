//! Type Adapter Trait for Target-Language Type Rendering
//!
//! This module defines the `TypeAdapter` trait that turns mapped [`IType`]s
//! into type expressions of the generated library. Templates only ever go
//! through an adapter, so the rendered surface stays independent of the
//! mapping logic.

use crate::itype::{IType, PrimitiveType};

/// Trait for target-specific type rendering.
///
/// ## Usage
///
/// ```rust
/// use types::type_adapter::{RustTypeAdapter, TypeAdapter};
/// use types::{IType, PrimitiveType};
///
/// let adapter = RustTypeAdapter;
/// assert_eq!(adapter.client_type(&IType::Primitive(PrimitiveType::Int64)), "i64");
/// assert_eq!(adapter.optional(&IType::string()), "Option<String>");
/// ```
pub trait TypeAdapter: Send + Sync {
    /// Target name for logging and debugging purposes.
    fn language(&self) -> &str;

    /// Type expression for a client-facing type
    fn client_type(&self, ty: &IType) -> String;

    /// Serde helper module converting between client and wire form, if one is needed.
    ///
    /// Returns `None` when the client type already serializes to its wire form.
    fn wire_format(&self, ty: &IType) -> Option<&'static str>;

    /// Field type and optional serde helper for a model field.
    ///
    /// Collections of types that need a helper fall back to their wire type,
    /// since helpers only apply to the whole field.
    fn field_type(&self, ty: &IType) -> (String, Option<&'static str>) {
        match ty {
            IType::List(_) | IType::Map(_) if *ty != ty.wire_type() && self.needs_helper(ty) =>
                (self.client_type(&ty.wire_type()), None),
            _ => (self.client_type(ty), self.wire_format(ty)),
        }
    }

    /// Whether a helper is required anywhere inside `ty`
    fn needs_helper(&self, ty: &IType) -> bool {
        match ty {
            IType::List(inner) | IType::Map(inner) => self.needs_helper(inner),
            other => self.wire_format(other).is_some(),
        }
    }

    /// Type expression admitting an absent value
    fn optional(&self, ty: &IType) -> String;
}

/// Renders Rust type expressions for the generated library
#[derive(Debug, Clone, Copy, Default)]
pub struct RustTypeAdapter;

impl TypeAdapter for RustTypeAdapter {
    fn language(&self) -> &str { "rust" }

    fn client_type(&self, ty: &IType) -> String {
        match ty {
            IType::Primitive(p) => match p {
                PrimitiveType::Boolean => "bool".to_string(),
                PrimitiveType::Int32 => "i32".to_string(),
                PrimitiveType::Int64 => "i64".to_string(),
                PrimitiveType::Float32 => "f32".to_string(),
                PrimitiveType::Float64 => "f64".to_string(),
                PrimitiveType::String => "String".to_string(),
                PrimitiveType::Date => "chrono::NaiveDate".to_string(),
                PrimitiveType::DateTime => "chrono::DateTime<chrono::Utc>".to_string(),
                PrimitiveType::Time => "chrono::NaiveTime".to_string(),
                PrimitiveType::Duration => "std::time::Duration".to_string(),
                PrimitiveType::Uuid => "uuid::Uuid".to_string(),
                PrimitiveType::Url => "url::Url".to_string(),
                PrimitiveType::Bytes => "Vec<u8>".to_string(),
            },
            IType::Model(r) | IType::Enum(r) => r.name.clone(),
            IType::List(inner) => format!("Vec<{}>", self.client_type(inner)),
            IType::Map(inner) => format!("std::collections::BTreeMap<String, {}>", self.client_type(inner)),
            IType::Binary => "Vec<u8>".to_string(),
            IType::Any => "serde_json::Value".to_string(),
        }
    }

    fn wire_format(&self, ty: &IType) -> Option<&'static str> {
        match ty {
            IType::Primitive(PrimitiveType::Bytes) => Some("runtime::wire::base64"),
            IType::Primitive(PrimitiveType::Duration) => Some("runtime::wire::duration"),
            _ => None,
        }
    }

    fn optional(&self, ty: &IType) -> String { format!("Option<{}>", self.client_type(ty)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itype::TypeRef;

    #[test]
    fn test_rust_types() {
        let adapter = RustTypeAdapter;
        let pets = IType::List(Box::new(IType::Model(TypeRef::new(0, "Pet"))));
        assert_eq!(adapter.client_type(&pets), "Vec<Pet>");
        assert_eq!(
            adapter.client_type(&IType::Map(Box::new(IType::Any))),
            "std::collections::BTreeMap<String, serde_json::Value>"
        );
    }

    #[test]
    fn test_field_type_helpers() {
        let adapter = RustTypeAdapter;
        let bytes = IType::Primitive(PrimitiveType::Bytes);
        assert_eq!(adapter.field_type(&bytes), ("Vec<u8>".to_string(), Some("runtime::wire::base64")));

        let list = IType::List(Box::new(bytes));
        assert_eq!(adapter.field_type(&list), ("Vec<String>".to_string(), None));

        let dates = IType::List(Box::new(IType::Primitive(PrimitiveType::DateTime)));
        assert_eq!(adapter.field_type(&dates), ("Vec<chrono::DateTime<chrono::Utc>>".to_string(), None));
    }
}
