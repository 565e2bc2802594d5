#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! High-level pipeline turning a code model into client library sources.
//!
//! One call to [`transform`] runs the four stages in order, each exactly once:
//!
//! - the transformer pre-pass over schemas (`analysis`)
//! - the Mapper Registry over the resulting Schema Graph (`mapper`)
//! - the transformer post-pass over operations, then the Client Model
//!   Builder (`builder`)
//! - the Template Renderer (`codegen`)
//!
//! Every run owns its registry and graphs. Either the whole output is produced
//! or an error is returned; nothing here touches the filesystem.

use thiserror::Error;

pub mod orchestration;

pub use orchestration::{transform, transform_json, GenerationOutput, Stage};

/// Convenient result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running the generation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The settings cannot be applied.
    #[error(transparent)]
    Settings(#[from] config::ConfigError),
    /// The code model is invalid or unsupported.
    #[error(transparent)]
    Model(#[from] ir::ModelError),
    /// The code model document could not be read.
    #[error(transparent)]
    Load(#[from] ir::LoadError),
    /// Error from a transformer phase.
    #[error(transparent)]
    Phase(#[from] analysis::PhaseError),
    /// Error from the client model builder.
    #[error(transparent)]
    Build(#[from] builder::BuildError),
    /// Error propagated from the codegen crate.
    #[error(transparent)]
    Codegen(#[from] codegen::CodegenError),
    /// The client model graph could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Generic message-based error.
    #[error("{0}")]
    Message(String),
}

impl PipelineError {
    /// Identity path of the offending schema or operation, when known
    pub fn path(&self) -> Option<&str> {
        match self {
            PipelineError::Model(e)
            | PipelineError::Phase(analysis::PhaseError::Model(e))
            | PipelineError::Build(builder::BuildError::Model(e)) => Some(e.path()),
            _ => None,
        }
    }
}
