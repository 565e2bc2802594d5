//! The finished client model graph

use serde::{Deserialize, Serialize};

use crate::client::ServiceClient;
use crate::itype::TypeRef;
use crate::model::{ClientModel, ClientModelProperty, EnumType};

/// Every model, enum and client produced by one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientModelGraph {
    /// Namespace of the generated library
    pub namespace: String,
    /// Models, addressed by [`TypeRef::index`]
    pub models: Vec<ClientModel>,
    /// Enums, addressed by [`TypeRef::index`]
    pub enums: Vec<EnumType>,
    /// Service clients
    pub clients: Vec<ServiceClient>,
}

impl ClientModelGraph {
    /// Create an empty graph
    pub fn new(namespace: impl Into<String>) -> Self { Self { namespace: namespace.into(), ..Default::default() } }

    /// Model addressed by a reference
    pub fn model(&self, r: &TypeRef) -> Option<&ClientModel> { self.models.get(r.index) }

    /// Enum addressed by a reference
    pub fn enum_type(&self, r: &TypeRef) -> Option<&EnumType> { self.enums.get(r.index) }

    /// Model by type name
    pub fn model_by_name(&self, name: &str) -> Option<(usize, &ClientModel)> {
        self.models.iter().enumerate().find(|(_, m)| m.name == name)
    }

    /// Enum by type name
    pub fn enum_by_name(&self, name: &str) -> Option<(usize, &EnumType)> {
        self.enums.iter().enumerate().find(|(_, e)| e.name == name)
    }

    /// Model lineage from the hierarchy root down to `index`
    pub fn lineage(&self, index: usize) -> Vec<usize> {
        let mut chain = vec![index];
        let mut current = index;
        while let Some(parent) = self.models.get(current).and_then(|m| m.parent.as_ref()) {
            if chain.contains(&parent.index) || chain.len() > self.models.len() {
                break;
            }
            chain.push(parent.index);
            current = parent.index;
        }
        chain.reverse();
        chain
    }

    /// Own and inherited properties, base to derived
    pub fn all_properties(&self, index: usize) -> Vec<&ClientModelProperty> {
        self.lineage(index)
            .into_iter()
            .filter_map(|i| self.models.get(i))
            .flat_map(|m| m.properties.iter())
            .collect()
    }

    /// Transitive subtypes of a model, depth first in name order
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self
            .models
            .get(index)
            .map(|m| m.derived.iter().rev().map(|d| d.index).collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if next == index || out.contains(&next) {
                continue;
            }
            out.push(next);
            if let Some(m) = self.models.get(next) {
                stack.extend(m.derived.iter().rev().map(|d| d.index));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itype::IType;

    fn prop(name: &str) -> ClientModelProperty {
        ClientModelProperty {
            name: name.to_string(),
            serialized_name: name.to_string(),
            description: String::new(),
            wire_type: IType::string(),
            client_type: IType::string(),
            required: true,
            read_only: false,
            is_discriminator: false,
            constant_value: None,
        }
    }

    #[test]
    fn test_all_properties_base_to_derived() {
        let mut graph = ClientModelGraph::new("pets");
        let mut pet = ClientModel::placeholder("Pet", "pets", "Pet");
        pet.properties.push(prop("name"));
        pet.derived.push(TypeRef::new(1, "Cat"));
        let mut cat = ClientModel::placeholder("Cat", "pets", "Cat");
        cat.parent = Some(TypeRef::new(0, "Pet"));
        cat.properties.push(prop("age"));
        graph.models = vec![pet, cat];

        let names: Vec<&str> = graph.all_properties(1).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age"]);
        assert_eq!(graph.descendants(0), vec![1]);
        assert_eq!(graph.lineage(1), vec![0, 1]);
    }
}
