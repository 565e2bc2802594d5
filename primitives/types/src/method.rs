//! Client methods and their wire bindings

use ir::{FinalStateVia, HttpMethod, ParameterLocation, ParameterOrigin, StatusCode};
use serde::{Deserialize, Serialize};

use crate::itype::IType;

/// Exception raised for authentication failures
pub const CLIENT_AUTHENTICATION: &str = "ClientAuthentication";
/// Exception raised when the resource does not exist
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFound";
/// Exception raised on conflicting or stale modifications
pub const RESOURCE_MODIFIED: &str = "ResourceModified";
/// Exception raised for every other unexpected status
pub const HTTP_RESPONSE: &str = "HttpResponse";

/// Every exception name the runtime understands
pub const KNOWN_EXCEPTIONS: &[&str] =
    &[CLIENT_AUTHENTICATION, RESOURCE_NOT_FOUND, RESOURCE_MODIFIED, HTTP_RESPONSE];

/// Wire-level binding of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyMethod {
    /// Proxy name (the normalised operation name)
    pub name: String,
    /// HTTP verb
    pub http_method: HttpMethod,
    /// Path template with `{name}` placeholders
    pub url_template: String,
    /// Placeholder names in template order
    pub placeholders: Vec<String>,
    /// Request parameters in declaration order
    pub parameters: Vec<ProxyParameter>,
    /// Body media type
    pub content_type: Option<String>,
    /// Success status codes
    pub expected_status: Vec<StatusCode>,
    /// Status code to exception groups, ordered by lowest code
    pub exceptions: Vec<ExceptionMapping>,
    /// Exception raised for any other unexpected status
    pub default_exception: ExceptionDefinition,
    /// Success body type
    pub response_type: Option<IType>,
    /// Request body type
    pub body_type: Option<IType>,
}

impl ProxyMethod {
    /// Parameters bound to a location
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &ProxyParameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    /// Whether a status code is expected
    pub fn expects(&self, code: u16) -> bool { self.expected_status.iter().any(|s| s.matches(code)) }

    /// Exception name for an unexpected status code
    pub fn exception_for(&self, code: u16) -> &str {
        self.exception_mapping_for(code).map(|e| e.exception.as_str()).unwrap_or(self.default_exception.exception.as_str())
    }

    /// Mapping that handles an unexpected status code, exact codes before classes
    pub fn exception_mapping_for(&self, code: u16) -> Option<&ExceptionMapping> {
        self.exceptions.iter().find(|e| e.status_codes.contains(&code)).or_else(|| {
            self.exceptions.iter().find(|e| e.status_ranges.iter().any(|class| code / 100 == u16::from(*class)))
        })
    }
}

/// Parameter as bound on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyParameter {
    /// Client name
    pub name: String,
    /// Wire name
    pub serialized_name: String,
    /// Location
    pub location: ParameterLocation,
    /// Who supplies the value
    pub origin: ParameterOrigin,
    /// Type as exposed
    pub client_type: IType,
    /// Type as transmitted
    pub wire_type: IType,
    /// Whether the value must be supplied
    pub required: bool,
    /// Whether path values are inserted verbatim
    pub skip_url_encoding: bool,
    /// Fixed literal for required constants
    pub constant_value: Option<String>,
}

/// Group of status codes raising the same exception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionMapping {
    /// Exception name
    pub exception: String,
    /// Codes in ascending order
    pub status_codes: Vec<u16>,
    /// Status classes (`4` for `4XX`) in ascending order; exact codes win over these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_ranges: Vec<u8>,
    /// Typed error body
    pub body_type: Option<IType>,
}

/// Exception raised when no mapping applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionDefinition {
    /// Exception name
    pub exception: String,
    /// Typed error body
    pub body_type: Option<IType>,
}

impl Default for ExceptionDefinition {
    fn default() -> Self { Self { exception: HTTP_RESPONSE.to_string(), body_type: None } }
}

/// Whether a method returns the value alone or the full response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReturnShape {
    /// Value only
    Simple,
    /// Status, headers and value
    WithRawResponse,
}

/// Calling convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Invocation {
    /// Blocking
    Sync,
    /// `async fn`
    Async,
}

/// Result flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResultKind {
    /// Single response
    Plain,
    /// Lazy sequence of page items
    Paged,
    /// Poller over a long-running operation
    LongRunning,
}

/// Variant tag of a client method
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodVariant {
    /// Return shape
    pub shape: ReturnShape,
    /// Calling convention
    pub invocation: Invocation,
    /// Result flavour
    pub result: ResultKind,
}

impl MethodVariant {
    /// Create a variant tag
    pub fn new(shape: ReturnShape, invocation: Invocation, result: ResultKind) -> Self {
        Self { shape, invocation, result }
    }

    /// Whether the method is `async`
    pub fn is_async(&self) -> bool { self.invocation == Invocation::Async }
}

/// Parameter of a client method signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodParameter {
    /// Client name
    pub name: String,
    /// Type as exposed
    pub client_type: IType,
    /// Whether the caller must supply it
    pub required: bool,
    /// Parameter documentation
    pub description: String,
}

/// Paging details of a paged method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingDetails {
    /// Wire name of the items property
    pub item_name: String,
    /// Wire name of the next-link property
    pub next_link_name: Option<String>,
    /// Proxy fetching subsequent pages
    pub next_proxy: Option<String>,
    /// Request parameter receiving a continuation token
    pub continuation_parameter: Option<String>,
    /// Response header carrying the next continuation token
    pub continuation_header: Option<String>,
    /// Response body property carrying the next continuation token
    pub continuation_property: Option<String>,
}

/// Polling interval selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollingStrategyKind {
    /// Fixed interval in seconds
    FixedInterval(u64),
    /// Honour `Retry-After`, falling back to the given seconds
    RetryAfter(u64),
}

/// Polling details of a long-running method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingDetails {
    /// Interval strategy
    pub strategy: PollingStrategyKind,
    /// Where the final result is read from
    pub final_state_via: FinalStateVia,
    /// Type of intermediate poll responses
    pub poll_result: IType,
    /// Type of the final result
    pub final_result: IType,
}

/// A generated client method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMethod {
    /// Method name
    pub name: String,
    /// Method documentation
    pub description: String,
    /// Variant tag
    pub variant: MethodVariant,
    /// Whether this is a typed convenience overload
    pub convenience: bool,
    /// Index of the bound proxy within the method group
    pub proxy: usize,
    /// Signature parameters in order
    pub parameters: Vec<MethodParameter>,
    /// Value type (page item type for paged methods)
    pub return_type: Option<IType>,
    /// Paging details
    pub paging: Option<PagingDetails>,
    /// Polling details
    pub polling: Option<PollingDetails>,
}

impl ClientMethod {
    /// Number of signature parameters
    pub fn arity(&self) -> usize { self.parameters.len() }

    /// Whether any parameter or the return type is untyped
    pub fn has_untyped_payload(&self) -> bool {
        self.parameters.iter().any(|p| p.client_type.is_untyped())
            || self.return_type.as_ref().map(IType::is_untyped).unwrap_or(false)
    }
}
