//! Object schemas to client models

use ir::{ModelError, SchemaGraph, SchemaId, SchemaKind};
use tracing::trace;
use types::{ClientModelProperty, IType};

use crate::{MapperRegistry, PendingFlatten, Result};

impl MapperRegistry {
    pub(crate) fn fill_model(&mut self, graph: &SchemaGraph, id: SchemaId, index: usize) -> Result<()> {
        let schema = graph.get(id);
        let path = schema.path();
        let SchemaKind::Object(object) = &schema.kind else {
            return Err(ModelError::unsupported(path, "expected an object schema"));
        };
        if object.parents.len() > 1 {
            return Err(ModelError::unsupported(path, "multiple inheritance is not supported"));
        }

        let parent = match object.parent() {
            Some(parent) => match self.map(graph, parent, &format!("{}/parents", path))? {
                IType::Model(r) => Some(r),
                other => {
                    return Err(ModelError::unsupported(
                        path,
                        format!("parent must be an object, found {:?}", other),
                    ))
                }
            },
            None => None,
        };

        let root = graph.get(graph.root(id)?);
        let discriminator = root
            .as_object()
            .and_then(|o| o.discriminator.as_ref())
            .map(|d| if d.serialized_name.is_empty() { d.property_name.clone() } else { d.serialized_name.clone() });
        if object.is_polymorphic() && discriminator.is_none() {
            return Err(ModelError::validation(path, "discriminated hierarchy is missing a discriminator property"));
        }

        let mut properties = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            let at = format!("{}/properties/{}", path, property.name);
            let client_type = self.map(graph, &property.schema, &at)?;
            let constant_value =
                if property.required { Self::constant_literal(graph, &property.schema) } else { None };
            if property.flatten && self.flatten {
                self.pending_flatten.push(PendingFlatten {
                    owner: index,
                    via: property.name.clone(),
                    target: client_type.clone(),
                });
            }
            let serialized_name =
                if property.serialized_name.is_empty() { property.name.clone() } else { property.serialized_name.clone() };
            properties.push(ClientModelProperty {
                name: property.name.clone(),
                is_discriminator: property.is_discriminator
                    || discriminator.as_deref() == Some(serialized_name.as_str()),
                serialized_name,
                description: property.description.clone(),
                wire_type: client_type.wire_type(),
                client_type,
                required: property.required,
                read_only: property.read_only,
                constant_value,
            });
        }

        let immutable =
            object.is_output_only() || (!properties.is_empty() && properties.iter().all(|p| p.read_only));

        let Some(model) = self.models.get_mut(index) else {
            return Err(ModelError::validation(path, "model placeholder was never allocated"));
        };
        model.description = schema.description.clone();
        model.parent = parent;
        model.discriminator = if object.is_polymorphic() { discriminator } else { None };
        model.discriminator_value = object.discriminator_value.clone();
        model.immutable = immutable;
        model.properties = properties;
        trace!(model = %model.name, properties = model.properties.len(), "filled model");
        Ok(())
    }
}
