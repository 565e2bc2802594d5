//! Service clients and method groups

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::itype::IType;
use crate::method::{ClientMethod, ProxyMethod};

/// Cross-cutting request pipeline behaviour a client needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PipelinePolicy {
    /// Stamp a client request id header
    RequestId,
    /// Stamp repeatability headers
    Repeatability,
    /// Sign requests with a key header
    KeyCredential,
    /// Sign requests with an OAuth2 bearer token
    BearerToken,
    /// Drive long-running operation polling
    Polling,
}

impl PipelinePolicy {
    /// Headers this policy stamps, which callers never pass themselves
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            PipelinePolicy::RequestId => &["x-ms-client-request-id", "client-request-id"],
            PipelinePolicy::Repeatability => &["repeatability-request-id", "repeatability-first-sent"],
            _ => &[],
        }
    }

    /// Whether `name` is stamped by some policy
    pub fn stamps(name: &str) -> bool {
        [PipelinePolicy::RequestId, PipelinePolicy::Repeatability]
            .iter()
            .any(|p| p.headers().iter().any(|h| h.eq_ignore_ascii_case(name)))
    }
}

/// What a client property holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientPropertyKind {
    /// Service endpoint
    Endpoint,
    /// Credential
    Credential,
    /// Selected service version
    ServiceVersion,
    /// Client-level operation parameter
    Parameter,
}

/// Property held by a service client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProperty {
    /// Client name
    pub name: String,
    /// Wire name for parameter properties
    pub serialized_name: String,
    /// Exposed type
    pub client_type: IType,
    /// Whether the builder requires it
    pub required: bool,
    /// Kind
    pub kind: ClientPropertyKind,
    /// Default literal
    pub default_value: Option<String>,
    /// Property documentation
    pub description: String,
}

/// Methods of one operation group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodGroupClient {
    /// Group name as declared; empty for the client's own methods
    pub name: String,
    /// Generated type name
    pub type_name: String,
    /// Accessor name on the service client
    pub property_name: String,
    /// Group documentation
    pub description: String,
    /// Wire bindings
    pub proxies: Vec<ProxyMethod>,
    /// Client methods
    pub methods: Vec<ClientMethod>,
}

impl MethodGroupClient {
    /// Proxy bound by a method
    pub fn proxy_of(&self, method: &ClientMethod) -> Option<&ProxyMethod> { self.proxies.get(method.proxy) }

    /// Method by name
    pub fn method(&self, name: &str) -> Option<&ClientMethod> { self.methods.iter().find(|m| m.name == name) }

    /// Whether the group holds the client's own methods
    pub fn is_client_level(&self) -> bool { self.name.is_empty() }
}

/// A generated service client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceClient {
    /// Type name
    pub name: String,
    /// Builder type name
    pub builder_name: String,
    /// Owning namespace
    pub namespace: String,
    /// Client documentation
    pub description: String,
    /// Properties in declaration order
    pub properties: Vec<ClientProperty>,
    /// Service versions, oldest first
    pub service_versions: Vec<String>,
    /// Method groups; the client-level group first when present
    pub method_groups: Vec<MethodGroupClient>,
    /// Pipeline behaviours the operations need
    pub pipeline_policies: BTreeSet<PipelinePolicy>,
}

impl ServiceClient {
    /// Property by name
    pub fn property(&self, name: &str) -> Option<&ClientProperty> { self.properties.iter().find(|p| p.name == name) }

    /// Method group by declared name
    pub fn method_group(&self, name: &str) -> Option<&MethodGroupClient> {
        self.method_groups.iter().find(|g| g.name == name)
    }

    /// Every method across groups
    pub fn methods(&self) -> impl Iterator<Item = &ClientMethod> { self.method_groups.iter().flat_map(|g| g.methods.iter()) }

    /// Whether a pipeline behaviour is required
    pub fn requires(&self, policy: PipelinePolicy) -> bool { self.pipeline_policies.contains(&policy) }
}
