#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Clientgen Mapper Registry
//!
//! Converts schema nodes into client-model types. Each schema identity maps
//! to exactly one [`IType`]; models and enums live in arenas addressed by
//! index, so self-referential schemas resolve to a forward-declared
//! placeholder instead of recursing.
//!
//! A registry is constructed per generation run and discarded afterwards.

use std::collections::{BTreeMap, VecDeque};

use config::GenerationSettings;
use ir::{ModelError, PrimitiveKind, SchemaGraph, SchemaKind, SchemaRef};
use tracing::debug;
use types::naming::{identifier, NameKind, NameRegistry, NameStyle};
use types::{ClientModel, EnumType, IType, PrimitiveType, TypeRef};

mod enums;
mod flatten;
mod models;

/// Result alias for mapping.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Mapping progress of one schema identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    /// Not reached yet
    Unvisited,
    /// Placeholder allocated, or value schema being composed
    InProgress,
    /// Fully mapped
    Resolved,
}

/// Arena slot of a reference type awaiting its fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Model(usize),
    Enum(usize),
}

/// A flatten request recorded while filling a model, applied by [`MapperRegistry::finish`]
#[derive(Debug, Clone)]
struct PendingFlatten {
    owner: usize,
    via: String,
    target: IType,
}

/// Everything the registry produced
#[derive(Debug, Clone)]
pub struct MapperOutput {
    /// Models, addressed by [`TypeRef::index`]
    pub models: Vec<ClientModel>,
    /// Enums, addressed by [`TypeRef::index`]
    pub enums: Vec<EnumType>,
    /// Type names claimed in the namespace, for clients to claim theirs
    pub type_names: NameRegistry,
}

/// Memoizing schema-to-type converter for one generation run
#[derive(Debug)]
pub struct MapperRegistry {
    namespace: String,
    flatten: bool,
    states: BTreeMap<String, VisitState>,
    resolved: BTreeMap<String, IType>,
    models: Vec<ClientModel>,
    enums: Vec<EnumType>,
    type_names: NameRegistry,
    claimed: BTreeMap<String, String>,
    worklist: VecDeque<(String, Slot)>,
    pending_flatten: Vec<PendingFlatten>,
}

impl MapperRegistry {
    /// Create an empty registry for one run
    pub fn new(namespace: impl Into<String>, settings: &GenerationSettings) -> Self {
        Self {
            namespace: namespace.into(),
            flatten: settings.flatten_client_flattened_properties,
            states: BTreeMap::new(),
            resolved: BTreeMap::new(),
            models: Vec::new(),
            enums: Vec::new(),
            type_names: NameRegistry::new(NameStyle::Pascal),
            claimed: BTreeMap::new(),
            worklist: VecDeque::new(),
            pending_flatten: Vec::new(),
        }
    }

    /// Mapping state of a schema key
    pub fn state(&self, key: &str) -> VisitState {
        self.states.get(key).copied().unwrap_or(VisitState::Unvisited)
    }

    /// Models mapped so far
    pub fn models(&self) -> &[ClientModel] { &self.models }

    /// Enums mapped so far
    pub fn enums(&self) -> &[EnumType] { &self.enums }

    /// Claim a type name for a non-schema declaration such as a client
    pub fn claim_type_name(&mut self, base: &str, origin_path: &str) -> Result<String> {
        self.type_names.claim(base, origin_path)
    }

    /// Map every schema of the graph, in key order
    pub fn map_all(&mut self, graph: &SchemaGraph) -> Result<()> {
        self.claim_names(graph)?;
        for schema in graph.schemas() {
            self.map_schema(graph, &schema.reference(), &schema.path())?;
        }
        debug!(models = self.models.len(), enums = self.enums.len(), "mapped schema graph");
        Ok(())
    }

    /// Map one schema reference, completing every model or enum it reaches
    pub fn map_schema(&mut self, graph: &SchemaGraph, reference: &SchemaRef, path: &str) -> Result<IType> {
        self.claim_names(graph)?;
        let ty = self.map(graph, reference, path)?;
        self.drain(graph)?;
        Ok(ty)
    }

    /// Fixed literal of a constant schema
    pub fn constant_literal(graph: &SchemaGraph, reference: &SchemaRef) -> Option<String> {
        graph.lookup(reference.key()).and_then(|id| graph.get(id).as_constant()).map(|c| c.literal())
    }

    /// Claim type names for reference schemas not seen before, in key order
    fn claim_names(&mut self, graph: &SchemaGraph) -> Result<()> {
        for schema in graph.schemas() {
            if !schema.kind.is_reference_kind() || self.claimed.contains_key(&schema.key) {
                continue;
            }
            let base = identifier(&schema.name, NameKind::Model);
            let name = self.type_names.claim(&base, &schema.path())?;
            if name != base {
                debug!(schema = %schema.key, from = %base, to = %name, "renamed colliding type");
            }
            self.claimed.insert(schema.key.clone(), name);
        }
        Ok(())
    }

    /// Dispatch on schema kind; reference kinds get a placeholder and are queued
    fn map(&mut self, graph: &SchemaGraph, reference: &SchemaRef, path: &str) -> Result<IType> {
        let id = graph.resolve(reference, path)?;
        let schema = graph.get(id);
        if let Some(ty) = self.resolved.get(&schema.key) {
            return Ok(ty.clone());
        }
        let key = schema.key.clone();

        let ty = match &schema.kind {
            SchemaKind::Primitive(p) => primitive(p.kind),
            SchemaKind::Any => IType::Any,
            SchemaKind::Object(_) | SchemaKind::Enum(_) => {
                let name = self
                    .claimed
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| identifier(&schema.name, NameKind::Model));
                let (slot, ty) = if matches!(schema.kind, SchemaKind::Object(_)) {
                    let index = self.models.len();
                    self.models.push(ClientModel::placeholder(name.clone(), self.namespace.clone(), key.clone()));
                    (Slot::Model(index), IType::Model(TypeRef::new(index, name)))
                } else {
                    let index = self.enums.len();
                    self.enums.push(EnumType::placeholder(name.clone(), self.namespace.clone(), key.clone()));
                    (Slot::Enum(index), IType::Enum(TypeRef::new(index, name)))
                };
                self.states.insert(key.clone(), VisitState::InProgress);
                self.resolved.insert(key.clone(), ty.clone());
                self.worklist.push_back((key, slot));
                return Ok(ty);
            }
            SchemaKind::Array(_) | SchemaKind::Dictionary(_) | SchemaKind::Constant(_) => {
                if self.state(&key) == VisitState::InProgress {
                    return Err(ModelError::validation(
                        schema.path(),
                        format!("{} schema takes part in a cycle and cannot be forward-declared", schema.kind.label()),
                    ));
                }
                self.states.insert(key.clone(), VisitState::InProgress);
                let at = schema.path();
                match &schema.kind {
                    SchemaKind::Array(a) => IType::List(Box::new(self.map(graph, &a.element, &at)?)),
                    SchemaKind::Dictionary(d) => IType::Map(Box::new(self.map(graph, &d.value, &at)?)),
                    SchemaKind::Constant(c) => self.map(graph, &c.value_type, &at)?,
                    _ => IType::Any,
                }
            }
        };
        self.states.insert(key.clone(), VisitState::Resolved);
        self.resolved.insert(key, ty.clone());
        Ok(ty)
    }

    /// Fill queued placeholders until none remain
    fn drain(&mut self, graph: &SchemaGraph) -> Result<()> {
        while let Some((key, slot)) = self.worklist.pop_front() {
            let reference = SchemaRef::new(key.clone());
            let id = graph.resolve(&reference, &format!("schemas/{}", key))?;
            match slot {
                Slot::Model(index) => self.fill_model(graph, id, index)?,
                Slot::Enum(index) => self.fill_enum(graph, id, index)?,
            }
            self.states.insert(key, VisitState::Resolved);
        }
        Ok(())
    }

    /// Link subtypes, lift flattened properties and hand out the arenas
    pub fn finish(mut self) -> MapperOutput {
        let mut derived: Vec<Vec<TypeRef>> = vec![Vec::new(); self.models.len()];
        for (index, model) in self.models.iter().enumerate() {
            if let Some(parent) = &model.parent {
                if let Some(list) = derived.get_mut(parent.index) {
                    list.push(TypeRef::new(index, model.name.clone()));
                }
            }
        }
        for (model, mut list) in self.models.iter_mut().zip(derived) {
            list.sort_by(|a, b| a.name.cmp(&b.name));
            model.derived = list;
        }

        if self.flatten {
            let pending = std::mem::take(&mut self.pending_flatten);
            flatten::lift(&mut self.models, &pending);
        }

        MapperOutput { models: self.models, enums: self.enums, type_names: self.type_names }
    }
}

/// Builtin type of a primitive schema
pub fn primitive(kind: PrimitiveKind) -> IType {
    let p = match kind {
        PrimitiveKind::Boolean => PrimitiveType::Boolean,
        PrimitiveKind::Int32 => PrimitiveType::Int32,
        PrimitiveKind::Int64 => PrimitiveType::Int64,
        PrimitiveKind::Float32 => PrimitiveType::Float32,
        PrimitiveKind::Float64 => PrimitiveType::Float64,
        PrimitiveKind::String => PrimitiveType::String,
        PrimitiveKind::Date => PrimitiveType::Date,
        PrimitiveKind::DateTime => PrimitiveType::DateTime,
        PrimitiveKind::Time => PrimitiveType::Time,
        PrimitiveKind::Duration => PrimitiveType::Duration,
        PrimitiveKind::Uuid => PrimitiveType::Uuid,
        PrimitiveKind::Url => PrimitiveType::Url,
        PrimitiveKind::Bytes => PrimitiveType::Bytes,
        PrimitiveKind::Binary => return IType::Binary,
    };
    IType::Primitive(p)
}
