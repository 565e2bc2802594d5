//! Pipeline orchestration for the `transform` entry point.
//!
//! This module sequences the stages of one generation run and shapes their
//! results into a [`GenerationOutput`].

use std::collections::BTreeMap;
use std::time::Instant;

use analysis::{CompilerContext, CompilerDiagnostics, Transformer};
use builder::ClientModelBuilder;
use codegen::{CodeGenerator, RenderOptions, TemplateRenderer};
use config::GenerationSettings;
use ir::{CodeModel, SchemaGraph};
use mapper::MapperRegistry;
use tracing::info;
use types::ClientModelGraph;

use crate::{PipelineError, Result};

/// Stages of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Schema-level transformer pass
    PrePass,
    /// Schema to client type mapping
    Mapping,
    /// Operation-level transformer pass
    PostPass,
    /// Client and method assembly
    Building,
    /// Source rendering
    Rendering,
}

impl Stage {
    /// Stage name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PrePass => "pre-pass",
            Stage::Mapping => "mapping",
            Stage::PostPass => "post-pass",
            Stage::Building => "building",
            Stage::Rendering => "rendering",
        }
    }
}

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Rendered sources keyed by relative path
    pub files: BTreeMap<String, String>,
    /// The finished client model
    pub graph: ClientModelGraph,
    /// Warnings and counters gathered by the transformer
    pub diagnostics: CompilerDiagnostics,
    /// SHA-256 of the normalized code model
    pub checksum: Option<String>,
}

impl GenerationOutput {
    /// The client model graph as pretty JSON
    pub fn graph_json(&self) -> Result<String> { Ok(serde_json::to_string_pretty(&self.graph)?) }
}

/// Run the whole pipeline over `model`.
///
/// # Errors
///
/// Returns the first fatal error of any stage; no partial output is kept.
pub fn transform(model: CodeModel, settings: &GenerationSettings) -> Result<GenerationOutput> {
    settings.validate()?;
    let started = Instant::now();
    let transformer = Transformer::new();
    let mut ctx = CompilerContext::new(model, settings.clone());

    let stage = Instant::now();
    transformer.run_pre_pass(&mut ctx)?;
    fail_on_errors(&ctx.diagnostics)?;
    let schema_graph = SchemaGraph::from_code_model(&ctx.model)?;
    log_stage(Stage::PrePass, stage, schema_graph.len());

    let namespace = settings.namespace.clone().unwrap_or_else(|| ctx.model.namespace.clone());
    let stage = Instant::now();
    let mut registry = MapperRegistry::new(namespace.clone(), settings);
    registry.map_all(&schema_graph)?;
    log_stage(Stage::Mapping, stage, registry.models().len() + registry.enums().len());

    // The post-pass adds operations and schemas, so the graph is rebuilt.
    let stage = Instant::now();
    transformer.run_post_pass(&mut ctx)?;
    fail_on_errors(&ctx.diagnostics)?;
    let schema_graph = SchemaGraph::from_code_model(&ctx.model)?;
    log_stage(Stage::PostPass, stage, schema_graph.len());

    let stage = Instant::now();
    let clients = ClientModelBuilder::new(settings)?.build(&ctx.model, &schema_graph, &mut registry)?;
    let mapped = registry.finish();
    let graph = ClientModelGraph { namespace, models: mapped.models, enums: mapped.enums, clients };
    log_stage(Stage::Building, stage, graph.clients.len());

    let stage = Instant::now();
    let renderer =
        TemplateRenderer::new(RenderOptions { constructor_args: settings.required_properties_as_constructor_args });
    renderer.validate(&graph)?;
    let files = renderer.render(&graph)?;
    log_stage(Stage::Rendering, stage, files.len());

    info!(
        namespace = %graph.namespace,
        files = files.len(),
        warnings = ctx.diagnostics.warnings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "generation complete"
    );
    Ok(GenerationOutput { files, graph, diagnostics: ctx.diagnostics, checksum: ctx.checksum })
}

/// Parse a code model document and run [`transform`] over it
pub fn transform_json(json: &str, settings: &GenerationSettings) -> Result<GenerationOutput> {
    transform(CodeModel::from_json(json)?, settings)
}

fn fail_on_errors(diagnostics: &CompilerDiagnostics) -> Result<()> {
    if diagnostics.errors.is_empty() {
        return Ok(());
    }
    Err(PipelineError::Message(diagnostics.errors.join("; ")))
}

fn log_stage(stage: Stage, started: Instant, items: usize) {
    info!(stage = stage.as_str(), items, elapsed_ms = started.elapsed().as_millis() as u64, "stage complete");
}
