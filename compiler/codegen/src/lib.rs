#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Source generation for client libraries.
//!
//! This crate turns a finished [`ClientModelGraph`] into the files of a Rust
//! client library: one module per model and enum, one module per service
//! client, and the index files tying them together.
//!
//! Templates do not write text. They emit structural [`RenderEvent`]s into an
//! [`EventSink`]; [`CodeWriter`] turns those into source while [`EventLog`]
//! records them, so rendering can be checked without comparing text. Type
//! expressions always go through a [`TypeAdapter`].
//!
//! Writing files to disk, optionally through rustfmt, is left to
//! [`write_generated`].
//!
//! [`RenderEvent`]: events::RenderEvent
//! [`EventSink`]: events::EventSink
//! [`CodeWriter`]: writer::CodeWriter
//! [`EventLog`]: events::EventLog

pub mod doc_comment;
pub mod events;
mod templates;
pub mod utils;
pub mod writer;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info};
use types::{ClientModelGraph, RustTypeAdapter, TypeAdapter};

pub use crate::events::{EventLog, EventSink, RenderEvent};
pub use crate::utils::{format_with_rustfmt, write_generated};
pub use crate::writer::CodeWriter;

/// Error type for code generation operations in this crate.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Underlying I/O error while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A type reference points outside the graph.
    #[error("dangling type reference `{0}`")]
    DanglingReference(String),
    /// Generic message-based error.
    #[error("{0}")]
    Message(String),
}

impl From<String> for CodegenError {
    fn from(msg: String) -> Self { CodegenError::Message(msg) }
}

/// Convenient result type for codegen functions in this crate.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Trait for anything that turns a client model graph into source files.
pub trait CodeGenerator {
    /// Generate `(relative path, contents)` pairs.
    fn generate(&self, graph: &ClientModelGraph) -> Result<Vec<(String, String)>>;

    /// Optional validation step before generation (default is no-op).
    fn validate(&self, _graph: &ClientModelGraph) -> Result<()> { Ok(()) }
}

/// Knobs affecting the rendered surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Give mutable models a `new` taking their required properties
    pub constructor_args: bool,
}

impl Default for RenderOptions {
    fn default() -> Self { Self { constructor_args: true } }
}

/// Which file of the generated library to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `src/lib.rs`
    CrateRoot,
    /// `src/models/mod.rs`
    ModelsIndex,
    /// `src/clients/mod.rs`
    ClientsIndex,
    /// One model by index
    Model(usize),
    /// One enum by index
    Enum(usize),
    /// One service client by index
    Client(usize),
}

/// Renders a client model graph through templates.
///
/// Rendering is a pure function of the graph and options: the same graph
/// always produces the same events, and therefore the same files.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer<A: TypeAdapter = RustTypeAdapter> {
    adapter: A,
    options: RenderOptions,
}

impl TemplateRenderer<RustTypeAdapter> {
    /// Renderer emitting Rust types
    pub fn new(options: RenderOptions) -> Self { Self { adapter: RustTypeAdapter, options } }
}

impl<A: TypeAdapter> TemplateRenderer<A> {
    /// Renderer with a custom type adapter
    pub fn with_adapter(adapter: A, options: RenderOptions) -> Self { Self { adapter, options } }

    /// Every file target of `graph`, in output order
    pub fn targets(graph: &ClientModelGraph) -> Vec<Target> {
        let mut targets = vec![Target::CrateRoot, Target::ModelsIndex, Target::ClientsIndex];
        targets.extend((0..graph.models.len()).map(Target::Model));
        targets.extend((0..graph.enums.len()).map(Target::Enum));
        targets.extend((0..graph.clients.len()).map(Target::Client));
        targets
    }

    /// Relative path of a target's file
    pub fn path(graph: &ClientModelGraph, target: Target) -> Result<String> {
        let missing = |what: &str, i: usize| CodegenError::DanglingReference(format!("{} #{}", what, i));
        Ok(match target {
            Target::CrateRoot => "src/lib.rs".to_string(),
            Target::ModelsIndex => "src/models/mod.rs".to_string(),
            Target::ClientsIndex => "src/clients/mod.rs".to_string(),
            Target::Model(i) => {
                let m = graph.models.get(i).ok_or_else(|| missing("model", i))?;
                format!("src/models/{}.rs", templates::module_name(&m.name))
            }
            Target::Enum(i) => {
                let e = graph.enums.get(i).ok_or_else(|| missing("enum", i))?;
                format!("src/models/{}.rs", templates::module_name(&e.name))
            }
            Target::Client(i) => {
                let c = graph.clients.get(i).ok_or_else(|| missing("client", i))?;
                format!("src/clients/{}.rs", templates::module_name(&c.name))
            }
        })
    }

    /// Emit the events of one target into `sink`
    pub fn emit<S: EventSink>(&self, graph: &ClientModelGraph, target: Target, sink: &mut S) -> Result<()> {
        match target {
            Target::CrateRoot => templates::crate_root::render_lib(sink, graph),
            Target::ModelsIndex => templates::crate_root::render_models_index(sink, graph),
            Target::ClientsIndex => templates::crate_root::render_clients_index(sink, graph),
            Target::Model(i) => templates::models::render_model(sink, graph, i, &self.adapter, self.options)?,
            Target::Enum(i) => {
                let e = graph.enums.get(i).ok_or_else(|| CodegenError::DanglingReference(format!("enum #{}", i)))?;
                templates::enums::render_enum(sink, e, &self.adapter)?
            }
            Target::Client(i) => {
                let c =
                    graph.clients.get(i).ok_or_else(|| CodegenError::DanglingReference(format!("client #{}", i)))?;
                templates::clients::render_client(sink, graph, c, &self.adapter)?
            }
        }
        Ok(())
    }

    /// Record the events of one target
    pub fn events(&self, graph: &ClientModelGraph, target: Target) -> Result<EventLog> {
        let mut log = EventLog::new();
        self.emit(graph, target, &mut log)?;
        Ok(log)
    }

    /// Render every file, keyed by relative path
    pub fn render(&self, graph: &ClientModelGraph) -> Result<BTreeMap<String, String>> {
        let mut files = BTreeMap::new();
        for target in Self::targets(graph) {
            let path = Self::path(graph, target)?;
            let mut writer = CodeWriter::new();
            self.emit(graph, target, &mut writer)?;
            debug!(%path, "rendered file");
            if files.insert(path.clone(), writer.finish()).is_some() {
                return Err(CodegenError::Message(format!("two types render to `{}`", path)));
            }
        }
        info!(language = self.adapter.language(), files = files.len(), "rendered client library");
        Ok(files)
    }
}

impl<A: TypeAdapter> CodeGenerator for TemplateRenderer<A> {
    fn generate(&self, graph: &ClientModelGraph) -> Result<Vec<(String, String)>> {
        Ok(self.render(graph)?.into_iter().collect())
    }

    fn validate(&self, graph: &ClientModelGraph) -> Result<()> {
        let mut seen = BTreeMap::new();
        for target in Self::targets(graph) {
            let path = Self::path(graph, target)?;
            if let Some(previous) = seen.insert(path.clone(), target) {
                return Err(CodegenError::Message(format!("{:?} and {:?} both render to `{}`", previous, target, path)));
            }
        }
        Ok(())
    }
}
