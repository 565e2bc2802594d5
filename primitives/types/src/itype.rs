//! Client-facing type expressions

use serde::{Deserialize, Serialize};

/// Reference to a mapped model or enum by arena index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Index into the owning graph's model or enum list
    pub index: usize,
    /// Final type name
    pub name: String,
}

impl TypeRef {
    /// Create a type reference
    pub fn new(index: usize, name: impl Into<String>) -> Self { Self { index, name: name.into() } }
}

/// Builtin scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// `bool`
    Boolean,
    /// `i32`
    Int32,
    /// `i64`
    Int64,
    /// `f32`
    Float32,
    /// `f64`
    Float64,
    /// Text
    String,
    /// Calendar date
    Date,
    /// Date and time
    DateTime,
    /// Time of day
    Time,
    /// ISO 8601 duration
    Duration,
    /// UUID
    Uuid,
    /// URL
    Url,
    /// Bytes carried as base64 text
    Bytes,
}

impl PrimitiveType {
    /// Whether the value travels on the wire as a JSON string
    pub fn is_string_on_wire(&self) -> bool {
        !matches!(
            self,
            PrimitiveType::Boolean
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::Float32
                | PrimitiveType::Float64
        )
    }

    /// The primitive used on the wire
    pub fn wire(&self) -> PrimitiveType {
        match self {
            PrimitiveType::Date
            | PrimitiveType::DateTime
            | PrimitiveType::Time
            | PrimitiveType::Duration
            | PrimitiveType::Uuid
            | PrimitiveType::Url
            | PrimitiveType::Bytes => PrimitiveType::String,
            other => *other,
        }
    }
}

/// A mapped type
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IType {
    /// Builtin scalar
    Primitive(PrimitiveType),
    /// Generated model
    Model(TypeRef),
    /// Generated enum
    Enum(TypeRef),
    /// Homogeneous list
    List(Box<IType>),
    /// String keyed map
    Map(Box<IType>),
    /// Raw binary payload
    Binary,
    /// Untyped JSON payload
    Any,
}

impl IType {
    /// Shorthand for a string
    pub fn string() -> Self { IType::Primitive(PrimitiveType::String) }

    /// The type as transmitted
    pub fn wire_type(&self) -> IType {
        match self {
            IType::Primitive(p) => IType::Primitive(p.wire()),
            IType::List(inner) => IType::List(Box::new(inner.wire_type())),
            IType::Map(inner) => IType::Map(Box::new(inner.wire_type())),
            other => other.clone(),
        }
    }

    /// Whether the type names a generated model or enum
    pub fn is_reference(&self) -> bool { matches!(self, IType::Model(_) | IType::Enum(_)) }

    /// Whether the type is an untyped or raw payload
    pub fn is_untyped(&self) -> bool { matches!(self, IType::Any | IType::Binary) }

    /// Referenced generated model, if any
    pub fn as_model(&self) -> Option<&TypeRef> {
        match self {
            IType::Model(r) => Some(r),
            _ => None,
        }
    }

    /// Every model or enum reference inside the type
    pub fn references(&self) -> Vec<&TypeRef> {
        match self {
            IType::Model(r) | IType::Enum(r) => vec![r],
            IType::List(inner) | IType::Map(inner) => inner.references(),
            IType::Primitive(_) | IType::Binary | IType::Any => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_of_nested_bytes() {
        let t = IType::List(Box::new(IType::Primitive(PrimitiveType::Bytes)));
        assert_eq!(t.wire_type(), IType::List(Box::new(IType::string())));
        assert_eq!(IType::Primitive(PrimitiveType::Int64).wire_type(), IType::Primitive(PrimitiveType::Int64));
    }

    #[test]
    fn test_references() {
        let t = IType::Map(Box::new(IType::List(Box::new(IType::Model(TypeRef::new(3, "Pet"))))));
        assert_eq!(t.references(), vec![&TypeRef::new(3, "Pet")]);
        assert!(IType::Any.references().is_empty());
    }
}
