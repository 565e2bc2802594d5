//! Schema graph arena
//!
//! Schemas live in a vector and are addressed by [`SchemaId`]; a key index
//! gives lookup by identity. Cycles in the input are ordinary edges here, so
//! traversals that follow references must keep their own visited sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::code_model::{CodeModel, Schema, SchemaKind, SchemaRef};
use crate::error::ModelError;

/// Index of a schema inside a [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaId(pub usize);

/// Arena of schemas indexed by identity key
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: Vec<Schema>,
    index: BTreeMap<String, SchemaId>,
}

impl SchemaGraph {
    /// Build a graph from a list of schemas, rejecting duplicate keys
    pub fn build(schemas: &[Schema]) -> Result<Self, ModelError> {
        let mut graph = SchemaGraph::default();
        for schema in schemas {
            if graph.index.contains_key(&schema.key) {
                return Err(ModelError::validation(
                    schema.path(),
                    format!("duplicate schema key `{}`", schema.key),
                ));
            }
            graph.index.insert(schema.key.clone(), SchemaId(graph.nodes.len()));
            graph.nodes.push(schema.clone());
        }
        Ok(graph)
    }

    /// Build a graph from the schemas of a code model
    pub fn from_code_model(model: &CodeModel) -> Result<Self, ModelError> {
        Self::build(&model.schemas)
    }

    /// Number of schemas
    pub fn len(&self) -> usize { self.nodes.len() }

    /// Whether the graph has no schemas
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Schema at an index
    pub fn get(&self, id: SchemaId) -> &Schema { &self.nodes[id.0] }

    /// Index of the schema with the given key
    pub fn lookup(&self, key: &str) -> Option<SchemaId> { self.index.get(key).copied() }

    /// Resolve a reference, reporting `path` as the referring node on failure
    pub fn resolve(&self, reference: &SchemaRef, path: &str) -> Result<SchemaId, ModelError> {
        self.lookup(reference.key()).ok_or_else(|| ModelError::unresolved(path, reference.key()))
    }

    /// Resolve a reference and return the schema
    pub fn schema(&self, reference: &SchemaRef, path: &str) -> Result<&Schema, ModelError> {
        self.resolve(reference, path).map(|id| self.get(id))
    }

    /// Every schema index, in key order
    pub fn ids(&self) -> impl Iterator<Item = SchemaId> + '_ { self.index.values().copied() }

    /// Every schema, in key order
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> + '_ { self.ids().map(|id| self.get(id)) }

    /// Ancestors of an object schema, nearest first. Stops on an inheritance cycle.
    pub fn ancestors(&self, id: SchemaId) -> Result<Vec<SchemaId>, ModelError> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::from([id]);
        let mut current = id;
        loop {
            let schema = self.get(current);
            let Some(parent) = schema.as_object().and_then(|o| o.parent()) else { break };
            let parent_id = self.resolve(parent, &format!("{}/parents", schema.path()))?;
            if !seen.insert(parent_id) {
                return Err(ModelError::validation(
                    self.get(id).path(),
                    "inheritance chain forms a cycle",
                ));
            }
            chain.push(parent_id);
            current = parent_id;
        }
        Ok(chain)
    }

    /// Root of the hierarchy containing an object schema (itself when it has no parent)
    pub fn root(&self, id: SchemaId) -> Result<SchemaId, ModelError> {
        Ok(self.ancestors(id)?.last().copied().unwrap_or(id))
    }

    /// Direct children of an object schema, in key order
    pub fn children(&self, id: SchemaId) -> Vec<SchemaId> {
        let key = &self.get(id).key;
        self.ids()
            .filter(|&child| {
                self.get(child)
                    .as_object()
                    .and_then(|o| o.parent())
                    .map(|p| p.key() == key)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// All transitive descendants of an object schema, in key order
    pub fn descendants(&self, id: SchemaId) -> Vec<SchemaId> {
        let mut found = BTreeSet::new();
        let mut stack = self.children(id);
        while let Some(next) = stack.pop() {
            if next != id && found.insert(next) {
                stack.extend(self.children(next));
            }
        }
        let mut out: Vec<SchemaId> = found.into_iter().collect();
        out.sort_by(|a, b| self.get(*a).key.cmp(&self.get(*b).key));
        out
    }

    /// References a schema holds directly
    pub fn edges(&self, id: SchemaId) -> Vec<&SchemaRef> {
        match &self.get(id).kind {
            SchemaKind::Object(o) =>
                o.parents.iter().chain(o.properties.iter().map(|p| &p.schema)).collect(),
            SchemaKind::Constant(c) => vec![&c.value_type],
            SchemaKind::Array(a) => vec![&a.element],
            SchemaKind::Dictionary(d) => vec![&d.value],
            SchemaKind::Primitive(_) | SchemaKind::Enum(_) | SchemaKind::Any => Vec::new(),
        }
    }
}
