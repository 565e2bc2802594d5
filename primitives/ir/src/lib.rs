#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Clientgen Intermediate Representation (IR)
//!
//! This crate defines the code model consumed by the generator (schemas,
//! operations, operation groups and clients), the arena-backed Schema Graph
//! used to resolve schema references by identity, and the fatal error kinds
//! shared by every later stage.

pub mod code_model;
pub mod error;
pub mod graph;

// Re-export the main code model types for convenience
pub use code_model::*;
pub use error::{LoadError, ModelError};
pub use graph::{SchemaGraph, SchemaId};
