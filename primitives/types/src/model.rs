//! Mapped models and enums

use serde::{Deserialize, Serialize};

use crate::itype::{IType, PrimitiveType, TypeRef};

/// A mapped object schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientModel {
    /// Type name
    pub name: String,
    /// Owning namespace
    pub namespace: String,
    /// Model documentation
    pub description: String,
    /// Identity key of the source schema
    pub schema_key: String,
    /// Whether instances are only ever built by the deserializer
    pub immutable: bool,
    /// Own properties in declaration order (inherited ones live on the parent)
    pub properties: Vec<ClientModelProperty>,
    /// Parent model
    pub parent: Option<TypeRef>,
    /// Wire name of the hierarchy's discriminator property
    pub discriminator: Option<String>,
    /// Literal selecting this model
    pub discriminator_value: Option<String>,
    /// Direct subtypes, sorted by name
    pub derived: Vec<TypeRef>,
    /// Accessors lifted from flattened nested models
    pub flattened: Vec<FlattenedProperty>,
}

impl ClientModel {
    /// Create an empty placeholder; the mapper fills it once the schema resolves
    pub fn placeholder(name: impl Into<String>, namespace: impl Into<String>, schema_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            description: String::new(),
            schema_key: schema_key.into(),
            immutable: false,
            properties: Vec::new(),
            parent: None,
            discriminator: None,
            discriminator_value: None,
            derived: Vec::new(),
            flattened: Vec::new(),
        }
    }

    /// Whether the model takes part in a discriminated hierarchy
    pub fn is_polymorphic(&self) -> bool { self.discriminator.is_some() }

    /// Own property by client name
    pub fn property(&self, name: &str) -> Option<&ClientModelProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Property of a mapped model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientModelProperty {
    /// Client (snake case) name
    pub name: String,
    /// Wire name
    pub serialized_name: String,
    /// Property documentation
    pub description: String,
    /// Type as transmitted
    pub wire_type: IType,
    /// Type as exposed
    pub client_type: IType,
    /// Whether the property is always present
    pub required: bool,
    /// Whether only the service sets the property
    pub read_only: bool,
    /// Whether this is the hierarchy's discriminator
    pub is_discriminator: bool,
    /// Fixed literal for required constant properties
    pub constant_value: Option<String>,
}

impl ClientModelProperty {
    /// Whether the generated field admits an absent value
    pub fn is_optional(&self) -> bool { !self.required }
}

/// Accessor lifted onto an owner from a flattened nested model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedProperty {
    /// Carrier properties from the owner down to the nested model, dot separated
    pub via: String,
    /// Nested property exposed on the owner
    pub property: ClientModelProperty,
}

/// Member name reserved in open enums for values outside the known set
pub const UNKNOWN_MEMBER: &str = "UnknownValue";

/// How generated code reads an enum's wire value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumAccessor {
    /// Closed string enum: members are looked up by their literal
    StringLookup,
    /// Open or non-string enum: explicit value accessor and a factory for unknown values
    ValueAccessor,
}

/// A mapped enum or promoted constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    /// Type name
    pub name: String,
    /// Owning namespace
    pub namespace: String,
    /// Enum documentation
    pub description: String,
    /// Identity key of the source schema
    pub schema_key: String,
    /// Backing scalar
    pub value_type: PrimitiveType,
    /// Whether unknown wire values are tolerated
    pub expandable: bool,
    /// Members in declaration order
    pub members: Vec<EnumMember>,
    /// Read strategy
    pub accessor: EnumAccessor,
    /// Whether the enum was synthesised from a constant
    pub synthesized: bool,
}

impl EnumType {
    /// Create an empty placeholder; the mapper fills it once the schema resolves
    pub fn placeholder(name: impl Into<String>, namespace: impl Into<String>, schema_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            description: String::new(),
            schema_key: schema_key.into(),
            value_type: PrimitiveType::String,
            expandable: false,
            members: Vec::new(),
            accessor: EnumAccessor::StringLookup,
            synthesized: false,
        }
    }

    /// Accessor policy for a backing type and openness
    pub fn accessor_for(value_type: PrimitiveType, expandable: bool) -> EnumAccessor {
        if value_type == PrimitiveType::String && !expandable {
            EnumAccessor::StringLookup
        } else {
            EnumAccessor::ValueAccessor
        }
    }

    /// Member carrying a wire literal
    pub fn member_for(&self, value: &str) -> Option<&EnumMember> { self.members.iter().find(|m| m.value == value) }

    /// Whether a wire literal is acceptable
    pub fn accepts(&self, value: &str) -> bool { self.expandable || self.member_for(value).is_some() }
}

/// Enum member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    /// Member (Pascal case) name
    pub name: String,
    /// Wire literal
    pub value: String,
    /// Member documentation
    pub description: String,
}
