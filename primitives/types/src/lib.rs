#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Client Object Model
//!
//! This crate defines the client-facing model that the mapper and builder
//! produce from a code model: mapped models and enums, the type expressions
//! that reference them, client methods bound to wire-level proxy methods,
//! and the service clients that aggregate them. It also carries the naming
//! rules shared by every stage and a JSON codec for model instances.

/// JSON codec for dynamic model instances.
pub mod codec;
/// Service clients, method groups and pipeline needs.
pub mod client;
/// The finished client model graph.
pub mod graph;
/// Client-facing type expressions.
pub mod itype;
/// Client methods, variants and proxy methods.
pub mod method;
/// Mapped models and enums.
pub mod model;
/// Identifier recasing, reserved-word escaping and collision handling.
pub mod naming;
/// Type adapter trait for target-language type rendering.
///
/// This module defines the `TypeAdapter` trait that turns mapped types into
/// type expressions, keeping templates independent of the mapping logic.
pub mod type_adapter;

pub use client::{ClientProperty, ClientPropertyKind, MethodGroupClient, PipelinePolicy, ServiceClient};
pub use codec::{CodecError, ModelInstance};
pub use graph::ClientModelGraph;
pub use itype::{IType, PrimitiveType, TypeRef};
pub use method::{
    ClientMethod, ExceptionDefinition, ExceptionMapping, Invocation, MethodParameter, MethodVariant,
    PagingDetails, PollingDetails, PollingStrategyKind, ProxyMethod, ProxyParameter, ResultKind,
    ReturnShape,
};
pub use model::{ClientModel, ClientModelProperty, EnumAccessor, EnumMember, EnumType, FlattenedProperty};
pub use naming::{NameKind, NameRegistry, NameStyle};
pub use type_adapter::{RustTypeAdapter, TypeAdapter};
