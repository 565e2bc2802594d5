//! Code model document
//!
//! This module defines the language-agnostic API description produced by an
//! external spec compiler: schemas addressed by a stable key, operations with
//! their requests and responses, operation groups and clients.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Reference to a schema by its stable identity key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRef(pub String);

impl SchemaRef {
    /// Create a reference to the schema with the given key
    pub fn new(key: impl Into<String>) -> Self { Self(key.into()) }

    /// The referenced schema key
    pub fn key(&self) -> &str { &self.0 }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// The code model document handed to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeModel {
    /// Service title, used to name the implicit client
    pub name: String,
    /// Namespace (crate module path) generated types are placed in
    #[serde(default)]
    pub namespace: String,
    /// Service description
    #[serde(default)]
    pub description: String,
    /// Every schema of the service, each with a unique key
    #[serde(default)]
    pub schemas: Vec<Schema>,
    /// Operation groups that belong to the implicit client
    #[serde(default)]
    pub operation_groups: Vec<OperationGroup>,
    /// Explicit clients
    #[serde(default)]
    pub clients: Vec<Client>,
}

/// A schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Stable identity of the schema
    pub key: String,
    /// Declared name
    pub name: String,
    /// Schema description
    #[serde(default)]
    pub description: String,
    /// Whether the generator created this schema (e.g. a promoted constant)
    #[serde(default)]
    pub synthesized: bool,
    /// Kind specific payload
    #[serde(flatten)]
    pub kind: SchemaKind,
}

/// Schema kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SchemaKind {
    /// Builtin scalar
    Primitive(PrimitiveSchema),
    /// Named object with properties
    Object(ObjectSchema),
    /// Closed or open set of literal values
    Enum(EnumSchema),
    /// A single literal value of a value schema
    Constant(ConstantSchema),
    /// Homogeneous list
    Array(ArraySchema),
    /// String keyed map
    Dictionary(DictionarySchema),
    /// Untyped passthrough
    Any,
}

impl SchemaKind {
    /// Short kind label used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            SchemaKind::Primitive(_) => "primitive",
            SchemaKind::Object(_) => "object",
            SchemaKind::Enum(_) => "enum",
            SchemaKind::Constant(_) => "constant",
            SchemaKind::Array(_) => "array",
            SchemaKind::Dictionary(_) => "dictionary",
            SchemaKind::Any => "any",
        }
    }

    /// Whether values of this kind map to a named reference type (model or enum)
    pub fn is_reference_kind(&self) -> bool {
        matches!(self, SchemaKind::Object(_) | SchemaKind::Enum(_))
    }
}

/// Primitive schema payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveSchema {
    /// Which scalar
    pub kind: PrimitiveKind,
}

/// Builtin scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    /// true/false
    Boolean,
    /// 32-bit integer
    Int32,
    /// 64-bit integer
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// UTF-8 text
    String,
    /// Calendar date (RFC 3339 full-date)
    Date,
    /// Date and time (RFC 3339)
    DateTime,
    /// Time of day
    Time,
    /// ISO 8601 duration
    Duration,
    /// UUID
    Uuid,
    /// URL
    Url,
    /// Base64 encoded bytes
    Bytes,
    /// Raw binary stream
    Binary,
}

/// Object schema payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    /// Properties in declaration order
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Parent schemas; more than one is rejected as multiple inheritance
    #[serde(default)]
    pub parents: Vec<SchemaRef>,
    /// Discriminator declared by a hierarchy root
    #[serde(default)]
    pub discriminator: Option<Discriminator>,
    /// Literal selecting this subtype
    #[serde(default)]
    pub discriminator_value: Option<String>,
    /// Where the schema is used; empty means input and output
    #[serde(default)]
    pub usage: BTreeSet<SchemaUsage>,
    /// Set by the flatten pass on schemas lifted into an owner
    #[serde(default)]
    pub flattened: bool,
}

impl ObjectSchema {
    /// The single parent, if any
    pub fn parent(&self) -> Option<&SchemaRef> { self.parents.first() }

    /// Whether this schema takes part in a discriminated hierarchy
    pub fn is_polymorphic(&self) -> bool {
        self.discriminator.is_some() || self.discriminator_value.is_some()
    }

    /// Whether the schema only ever appears in responses
    pub fn is_output_only(&self) -> bool {
        (self.usage.contains(&SchemaUsage::Output) || self.usage.contains(&SchemaUsage::Exception))
            && !self.usage.contains(&SchemaUsage::Input)
    }
}

/// Discriminator declared on a polymorphic root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    /// Property name
    pub property_name: String,
    /// Wire name of the property
    #[serde(default)]
    pub serialized_name: String,
}

/// Schema usage context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaUsage {
    /// Sent in requests
    Input,
    /// Received in responses
    Output,
    /// Received in error responses
    Exception,
}

/// Object property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Property name
    pub name: String,
    /// Wire name; filled from `name` when empty
    #[serde(default)]
    pub serialized_name: String,
    /// Property schema
    pub schema: SchemaRef,
    /// Whether the property must be present
    #[serde(default)]
    pub required: bool,
    /// Whether only the service sets the property
    #[serde(default)]
    pub read_only: bool,
    /// Whether the nested object's properties are lifted onto the owner
    #[serde(default)]
    pub flatten: bool,
    /// Whether this is the hierarchy's discriminator property
    #[serde(default)]
    pub is_discriminator: bool,
    /// Property description
    #[serde(default)]
    pub description: String,
}

/// Enum schema payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumSchema {
    /// Backing scalar
    pub value_type: PrimitiveKind,
    /// Closed or open
    #[serde(default)]
    pub openness: EnumOpenness,
    /// Members in declaration order
    pub choices: Vec<EnumChoice>,
}

/// Whether an enum's member set is exhaustive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumOpenness {
    /// Closed: unknown wire values are rejected
    #[default]
    Fixed,
    /// Open: unknown wire values are preserved
    Extensible,
}

/// Enum member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumChoice {
    /// Member name
    pub name: String,
    /// Wire literal
    pub value: String,
    /// Member description
    #[serde(default)]
    pub description: String,
}

/// Constant schema payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantSchema {
    /// Schema of the literal (a primitive or an enum)
    pub value_type: SchemaRef,
    /// The literal
    pub value: serde_json::Value,
}

impl ConstantSchema {
    /// Literal rendered as wire text
    pub fn literal(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Array schema payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySchema {
    /// Element schema
    pub element: SchemaRef,
}

/// Dictionary schema payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionarySchema {
    /// Value schema; keys are strings
    pub value: SchemaRef,
}

/// Client declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Client name
    pub name: String,
    /// Client description
    #[serde(default)]
    pub description: String,
    /// Supported service versions, oldest first
    #[serde(default)]
    pub api_versions: Vec<String>,
    /// Authentication scheme
    #[serde(default)]
    pub security: Option<Security>,
    /// Client-level parameters (endpoint and friends)
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Operation groups
    #[serde(default)]
    pub operation_groups: Vec<OperationGroup>,
}

/// Authentication scheme declared by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Security {
    /// Key sent in a header
    ApiKey {
        /// Header carrying the key
        header: String,
    },
    /// OAuth2 bearer token
    OAuth2 {
        /// Requested scopes
        scopes: Vec<String>,
    },
}

/// Group of operations; an empty name places methods on the client itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationGroup {
    /// Group name
    #[serde(default)]
    pub name: String,
    /// Group description
    #[serde(default)]
    pub description: String,
    /// Operations in declaration order
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation name
    pub name: String,
    /// Operation description
    #[serde(default)]
    pub description: String,
    /// HTTP request
    pub request: Request,
    /// Possible responses
    pub responses: Vec<OperationResponse>,
    /// Paging contract
    #[serde(default)]
    pub paging: Option<Paging>,
    /// Polling contract
    #[serde(default)]
    pub long_running: Option<LongRunning>,
    /// Service versions the operation exists in
    #[serde(default)]
    pub api_versions: Vec<String>,
    /// Whether typed convenience overloads may be produced
    #[serde(default = "default_true")]
    pub convenience_api: bool,
}

fn default_true() -> bool { true }

impl Operation {
    /// Success responses in declaration order
    pub fn success_responses(&self) -> impl Iterator<Item = &OperationResponse> {
        self.responses.iter().filter(|r| r.success)
    }

    /// Error responses in declaration order
    pub fn error_responses(&self) -> impl Iterator<Item = &OperationResponse> {
        self.responses.iter().filter(|r| !r.success)
    }

    /// Schema of the first success response carrying a body
    pub fn success_schema(&self) -> Option<&SchemaRef> {
        self.success_responses().find_map(|r| r.schema.as_ref())
    }

    /// The body parameter, if any
    pub fn body_parameter(&self) -> Option<&Parameter> {
        self.request.parameters.iter().find(|p| p.location == Some(ParameterLocation::Body))
    }

    /// Whether the operation is paged
    pub fn is_paged(&self) -> bool { self.paging.is_some() }

    /// Whether the operation is long-running
    pub fn is_long_running(&self) -> bool { self.long_running.is_some() }
}

/// HTTP request of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Verb
    pub method: HttpMethod,
    /// Path template with `{name}` placeholders
    pub path: String,
    /// Body media type
    #[serde(default)]
    pub content_type: Option<String>,
    /// Parameters in declaration order
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// HTTP verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Upper-case verb
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

/// Operation or client parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Wire name; filled from `name` when empty
    #[serde(default)]
    pub serialized_name: String,
    /// Parameter schema
    pub schema: SchemaRef,
    /// Where the value travels; `None` until the transformer assigns one
    #[serde(default)]
    pub location: Option<ParameterLocation>,
    /// Who supplies the value
    #[serde(default)]
    pub origin: ParameterOrigin,
    /// Whether the value must be supplied
    #[serde(default)]
    pub required: bool,
    /// Whether path values are inserted verbatim
    #[serde(default)]
    pub skip_url_encoding: bool,
    /// Parameter description
    #[serde(default)]
    pub description: String,
}

/// Parameter locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    /// Path segment
    Path,
    /// Query string
    Query,
    /// Header
    Header,
    /// Request body
    Body,
    /// Host/base URL segment
    Uri,
}

/// Who supplies a parameter value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterOrigin {
    /// The caller, through the method signature
    #[default]
    Method,
    /// A client-level property
    Client,
    /// Synthesised from the client's service version
    ApiVersion,
}

/// Response of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    /// Status code key
    pub status: StatusCode,
    /// Body schema
    #[serde(default)]
    pub schema: Option<SchemaRef>,
    /// Response headers
    #[serde(default)]
    pub headers: Vec<ResponseHeader>,
    /// Whether this is a success case
    pub success: bool,
}

/// Declared response header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseHeader {
    /// Header name
    pub name: String,
    /// Header schema
    pub schema: SchemaRef,
}

/// Status code key of a response: an exact code, a class range such as `4XX`, or `default`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusCode {
    /// Exact code
    Code(u16),
    /// Class range, holding the leading digit
    Range(u8),
    /// Any code not otherwise listed
    Default,
}

impl StatusCode {
    /// Whether `code` falls under this key
    pub fn matches(&self, code: u16) -> bool {
        match self {
            StatusCode::Code(c) => *c == code,
            StatusCode::Range(class) => code / 100 == u16::from(*class),
            StatusCode::Default => true,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Code(c) => write!(f, "{}", c),
            StatusCode::Range(class) => write!(f, "{}XX", class),
            StatusCode::Default => f.write_str("default"),
        }
    }
}

impl From<StatusCode> for String {
    fn from(code: StatusCode) -> Self { code.to_string() }
}

impl TryFrom<String> for StatusCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("default") {
            return Ok(StatusCode::Default);
        }
        let upper = trimmed.to_ascii_uppercase();
        if let Some(class) = upper.strip_suffix("XX") {
            return match class.parse::<u8>() {
                Ok(c) if (1..=5).contains(&c) => Ok(StatusCode::Range(c)),
                _ => Err(format!("invalid status range `{}`", value)),
            };
        }
        trimmed
            .parse::<u16>()
            .map(StatusCode::Code)
            .map_err(|_| format!("invalid status code `{}`", value))
    }
}

/// Paging contract of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Name of the items property of a page
    #[serde(default = "default_item_name")]
    pub item_name: String,
    /// Name of the next-link property of a page
    #[serde(default)]
    pub next_link_name: Option<String>,
    /// Token-based continuation, as an alternative to a next link
    #[serde(default)]
    pub continuation_token: Option<ContinuationToken>,
    /// Operation fetching subsequent pages, filled by the transformer
    #[serde(default)]
    pub next_operation: Option<String>,
}

fn default_item_name() -> String { "value".to_string() }

/// Continuation token contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationToken {
    /// Request parameter receiving the token
    pub parameter: String,
    /// Response header carrying the next token
    #[serde(default)]
    pub response_header: Option<String>,
    /// Response property carrying the next token
    #[serde(default)]
    pub response_property: Option<String>,
}

/// Polling contract of a long-running operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunning {
    /// Where the final result is fetched from
    #[serde(default)]
    pub final_state_via: FinalStateVia,
    /// Fixed polling interval; absent means honour `Retry-After`
    #[serde(default)]
    pub poll_interval_seconds: Option<u64>,
    /// Schema of the final result when it differs from the initial response
    #[serde(default)]
    pub final_result: Option<SchemaRef>,
}

/// Final state source of a long-running operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinalStateVia {
    /// `Azure-AsyncOperation` header
    AzureAsyncOperation,
    /// `Location` header
    #[default]
    Location,
    /// The original request URI
    OriginalUri,
    /// `Operation-Location` header
    OperationLocation,
}

impl CodeModel {
    /// Create an empty code model
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            description: String::new(),
            schemas: Vec::new(),
            operation_groups: Vec::new(),
            clients: Vec::new(),
        }
    }

    /// Parse a code model from JSON text
    pub fn from_json(json: &str) -> Result<Self, LoadError> { Ok(serde_json::from_str(json)?) }

    /// Load a code model from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save the code model to a JSON file with pretty formatting
    pub fn to_file(&self, path: &std::path::Path) -> Result<(), LoadError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        // Ensure file ends with a newline (POSIX standard)
        use std::io::Write;
        writeln!(file)?;
        Ok(())
    }

    /// Find a schema by key
    pub fn schema(&self, key: &str) -> Option<&Schema> { self.schemas.iter().find(|s| s.key == key) }

    /// Every operation group: the implicit client's first, then each explicit client's
    pub fn operation_groups(&self) -> impl Iterator<Item = &OperationGroup> {
        self.operation_groups
            .iter()
            .chain(self.clients.iter().flat_map(|c| c.operation_groups.iter()))
    }

    /// Mutable access to every operation group
    pub fn operation_groups_mut(&mut self) -> impl Iterator<Item = &mut OperationGroup> {
        self.operation_groups
            .iter_mut()
            .chain(self.clients.iter_mut().flat_map(|c| c.operation_groups.iter_mut()))
    }

    /// Every operation across all groups
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operation_groups().flat_map(|g| g.operations.iter())
    }

    /// Get the total number of operations
    pub fn operation_count(&self) -> usize { self.operations().count() }
}

impl Schema {
    /// Create a schema
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: SchemaKind) -> Self {
        Self { key: key.into(), name: name.into(), description: String::new(), synthesized: false, kind }
    }

    /// Reference to this schema
    pub fn reference(&self) -> SchemaRef { SchemaRef(self.key.clone()) }

    /// Object payload, if this is an object
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Constant payload, if this is a constant
    pub fn as_constant(&self) -> Option<&ConstantSchema> {
        match &self.kind {
            SchemaKind::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// Identity path used in diagnostics
    pub fn path(&self) -> String { format!("schemas/{}", self.key) }
}

impl Property {
    /// Create a property whose wire name equals its name
    pub fn new(name: impl Into<String>, schema: SchemaRef, required: bool) -> Self {
        let name = name.into();
        Self {
            serialized_name: name.clone(),
            name,
            schema,
            required,
            read_only: false,
            flatten: false,
            is_discriminator: false,
            description: String::new(),
        }
    }
}

impl Parameter {
    /// Create a caller-supplied parameter
    pub fn new(
        name: impl Into<String>,
        schema: SchemaRef,
        location: ParameterLocation,
        required: bool,
    ) -> Self {
        let name = name.into();
        Self {
            serialized_name: name.clone(),
            name,
            schema,
            location: Some(location),
            origin: ParameterOrigin::Method,
            required,
            skip_url_encoding: false,
            description: String::new(),
        }
    }
}
