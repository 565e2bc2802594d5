//! Error kinds raised while reading or transforming a code model

use thiserror::Error;

/// Fatal model errors. Every variant carries the identity path of the offending node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A hierarchy lacks a usable discriminator, or a value schema sits on a cycle
    #[error("schema validation failed at {path}: {message}")]
    SchemaValidation {
        /// Identity path, e.g. `schemas/Cat/properties/owner`
        path: String,
        /// What is wrong
        message: String,
    },

    /// A reference names an identity absent from the schema graph
    #[error("unresolved reference `{reference}` at {path}")]
    UnresolvedReference {
        /// Identity path of the referring node
        path: String,
        /// The reference that failed to resolve
        reference: String,
    },

    /// Deterministic disambiguation still collided after suffixing
    #[error("name `{name}` collides after disambiguation at {path}")]
    NameCollision {
        /// Colliding name
        name: String,
        /// Identity path of the later declaration
        path: String,
    },

    /// A schema combination no mapping strategy handles
    #[error("unsupported schema shape at {path}: {message}")]
    UnsupportedSchemaShape {
        /// Identity path
        path: String,
        /// What is unsupported
        message: String,
    },
}

impl ModelError {
    /// Identity path the error refers to
    pub fn path(&self) -> &str {
        match self {
            ModelError::SchemaValidation { path, .. }
            | ModelError::UnresolvedReference { path, .. }
            | ModelError::NameCollision { path, .. }
            | ModelError::UnsupportedSchemaShape { path, .. } => path,
        }
    }

    /// Shorthand for [`ModelError::SchemaValidation`]
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::SchemaValidation { path: path.into(), message: message.into() }
    }

    /// Shorthand for [`ModelError::UnresolvedReference`]
    pub fn unresolved(path: impl Into<String>, reference: impl Into<String>) -> Self {
        ModelError::UnresolvedReference { path: path.into(), reference: reference.into() }
    }

    /// Shorthand for [`ModelError::UnsupportedSchemaShape`]
    pub fn unsupported(path: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::UnsupportedSchemaShape { path: path.into(), message: message.into() }
    }
}

/// Errors reading or writing a code model document
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
