#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Clientgen Analysis and Transformation
//!
//! This crate provides the Transformer: validation and normalization passes
//! that rewrite the code model so later stages never special-case wire-level
//! quirks. Passes are grouped into a pre-pass (before mapping) and a
//! post-pass (after mapping, before the client model is built).

use std::collections::BTreeMap;

use config::GenerationSettings;
use ir::{CodeModel, ModelError, PrimitiveKind, PrimitiveSchema, Schema, SchemaKind, SchemaRef};
use thiserror::Error;
use tracing::debug;

pub mod constants;
pub mod discriminator;
pub mod flatten;
pub mod normalizer;
pub mod paging;
pub mod validator;

pub use constants::ConstantPromotion;
pub use discriminator::DiscriminatorNormalizer;
pub use flatten::FlattenMarker;
pub use normalizer::NameNormalizer;
pub use paging::PagingNextOperations;
pub use validator::IrValidator;

/// Compiler context containing unified state for all transformation phases
#[derive(Debug)]
pub struct CompilerContext {
    /// Code model - single source of truth
    pub model: CodeModel,
    /// Generation settings of the run
    pub settings: GenerationSettings,
    /// Compiler diagnostics
    pub diagnostics: CompilerDiagnostics,
    /// SHA-256 of the normalized code model
    pub checksum: Option<String>,
}

impl CompilerContext {
    /// Create a new compiler context
    pub fn new(model: CodeModel, settings: GenerationSettings) -> Self {
        Self { model, settings, diagnostics: CompilerDiagnostics::default(), checksum: None }
    }

    /// Add diagnostic warning
    pub fn add_warning(&mut self, warning: String) { self.diagnostics.warnings.push(warning); }

    /// Add diagnostic error
    pub fn add_error(&mut self, error: String) { self.diagnostics.errors.push(error); }

    /// Bump a named counter
    pub fn count(&mut self, stat: &str, by: usize) {
        *self.diagnostics.stats.entry(stat.to_string()).or_insert(0) += by;
    }
}

/// Compiler diagnostics
#[derive(Debug, Default, Clone)]
pub struct CompilerDiagnostics {
    /// Warnings generated
    pub warnings: Vec<String>,
    /// Errors generated
    pub errors: Vec<String>,
    /// Statistics
    pub stats: BTreeMap<String, usize>,
}

impl CompilerDiagnostics {
    /// Merge another diagnostics report
    pub fn merge(&mut self, other: &CompilerDiagnostics) {
        self.warnings.extend(other.warnings.clone());
        self.errors.extend(other.errors.clone());
        for (k, v) in &other.stats {
            *self.stats.entry(k.clone()).or_insert(0) += v;
        }
    }
}

#[derive(Debug, Error)]
/// Errors produced by individual compiler phases or during orchestration.
pub enum PhaseError {
    /// The code model is invalid or unsupported.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// JSON serialization error while hashing the model.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// Any other phase-specific error surfaced as a message.
    #[error("phase error: {0}")]
    Other(String),
}

/// Result alias for phase execution.
pub type Result<T> = std::result::Result<T, PhaseError>;

/// Result of a compiler phase
/// Empty Ok indicates success; errors carry context.
pub type PhaseResult = Result<()>;

/// Trait for compiler phases (analysis, validation, transformation)
///
/// Every transforming phase is idempotent: running it on its own output is a
/// no-op and never fails.
pub trait CompilerPhase {
    /// Name of the phase
    fn name(&self) -> &str;

    /// Description of what this phase does
    fn description(&self) -> &str;

    /// Execute this phase on the compiler context
    fn run(&self, ctx: &mut CompilerContext) -> PhaseResult;
}

/// Ordered phase lists for the two transformer passes
pub struct Transformer {
    pre: Vec<Box<dyn CompilerPhase>>,
    post: Vec<Box<dyn CompilerPhase>>,
}

impl Default for Transformer {
    fn default() -> Self { Self::new() }
}

impl Transformer {
    /// Create the standard transformer
    pub fn new() -> Self {
        Self {
            pre: vec![
                Box::new(IrValidator::new()),
                Box::new(DiscriminatorNormalizer::new()),
                Box::new(NameNormalizer::new()),
                Box::new(ConstantPromotion::new()),
                Box::new(FlattenMarker::new()),
            ],
            post: vec![
                Box::new(PagingNextOperations::new()),
                Box::new(NameNormalizer::new()),
                Box::new(ConstantPromotion::new()),
                Box::new(FlattenMarker::new()),
                Box::new(IrValidator::new()),
            ],
        }
    }

    /// Phase names of the pre-pass, in order
    pub fn pre_pass_names(&self) -> Vec<&str> { self.pre.iter().map(|p| p.name()).collect() }

    /// Phase names of the post-pass, in order
    pub fn post_pass_names(&self) -> Vec<&str> { self.post.iter().map(|p| p.name()).collect() }

    /// Run the schema-level pass before mapping
    pub fn run_pre_pass(&self, ctx: &mut CompilerContext) -> PhaseResult { run_phases(&self.pre, ctx) }

    /// Run the operation-level pass after mapping
    pub fn run_post_pass(&self, ctx: &mut CompilerContext) -> PhaseResult { run_phases(&self.post, ctx) }
}

fn run_phases(phases: &[Box<dyn CompilerPhase>], ctx: &mut CompilerContext) -> PhaseResult {
    for phase in phases {
        debug!(phase = phase.name(), "{}", phase.description());
        phase.run(ctx)?;
    }
    Ok(())
}

/// Key of the string schema added when the model declares none
pub const SYNTHESIZED_STRING_KEY: &str = "string";

/// Reference to a plain string schema, adding one if the model has none
pub(crate) fn ensure_string_schema(model: &mut CodeModel) -> SchemaRef {
    let existing = model.schemas.iter().find(|s| {
        matches!(&s.kind, SchemaKind::Primitive(PrimitiveSchema { kind: PrimitiveKind::String }))
    });
    if let Some(schema) = existing {
        return schema.reference();
    }
    let mut key = SYNTHESIZED_STRING_KEY.to_string();
    while model.schema(&key).is_some() {
        key.push('_');
    }
    let mut schema =
        Schema::new(key, "string", SchemaKind::Primitive(PrimitiveSchema { kind: PrimitiveKind::String }));
    schema.synthesized = true;
    let reference = schema.reference();
    model.schemas.push(schema);
    reference
}

/// Identity path of an operation
pub fn operation_path(group: &str, operation: &str) -> String {
    if group.is_empty() {
        format!("operations/{}", operation)
    } else {
        format!("operationGroups/{}/operations/{}", group, operation)
    }
}
