#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Clientgen Client Model Builder
//!
//! Expands every operation of the normalized code model into its family of
//! client methods and binds each method to a [`ProxyMethod`]. Operations are
//! grouped per client into method groups; each client records its properties
//! and the pipeline behaviours its operations need.
//!
//! Types are resolved through the run's [`MapperRegistry`], so parameters the
//! post-pass introduced are mapped on demand.
//!
//! [`ProxyMethod`]: types::ProxyMethod

use config::{ConfigError, GenerationSettings};
use ir::{CodeModel, ModelError, SchemaGraph};
use mapper::MapperRegistry;
use thiserror::Error;
use tracing::debug;
use types::ServiceClient;

mod clients;
mod exceptions;
mod methods;
mod proxy;

pub use exceptions::{default_exception_table, exception_mappings};
pub use methods::method_name;

/// Errors raised while building the client model
#[derive(Debug, Error)]
pub enum BuildError {
    /// The code model is invalid or unsupported
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Settings could not be applied
    #[error(transparent)]
    Settings(#[from] ConfigError),
    /// Internal pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result alias for building.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Builds service clients from the normalized operation graph
pub struct ClientModelBuilder<'a> {
    settings: &'a GenerationSettings,
    exception_overrides: Vec<(u16, String)>,
}

impl<'a> ClientModelBuilder<'a> {
    /// Create a builder; fails when the settings' exception mapping is invalid
    pub fn new(settings: &'a GenerationSettings) -> Result<Self> {
        let exception_overrides = settings.exception_overrides()?;
        Ok(Self { settings, exception_overrides })
    }

    /// Settings the builder was created with
    pub fn settings(&self) -> &GenerationSettings { self.settings }

    /// Build every client of the model, in declaration order
    pub fn build(
        &self,
        model: &CodeModel,
        graph: &SchemaGraph,
        registry: &mut MapperRegistry,
    ) -> Result<Vec<ServiceClient>> {
        let mut clients = Vec::with_capacity(model.clients.len());
        for client in &model.clients {
            let built = self.build_client(model, client, graph, registry)?;
            debug!(
                client = %built.name,
                groups = built.method_groups.len(),
                methods = built.methods().count(),
                "built service client"
            );
            clients.push(built);
        }
        Ok(clients)
    }
}

/// Identity path of an operation inside a client
pub(crate) fn operation_path(client: &str, group: &str, operation: &str) -> String {
    if group.is_empty() {
        format!("clients/{}/operations/{}", client, operation)
    } else {
        format!("clients/{}/operationGroups/{}/operations/{}", client, group, operation)
    }
}
