//! JSON codec for model instances
//!
//! Instances are dynamic (model name plus a value map keyed by client property
//! name), which lets tooling and tests exercise the wire contract of a mapped
//! graph without compiling the generated library.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::graph::ClientModelGraph;
use crate::itype::{IType, PrimitiveType};

/// Codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// No model with that name exists in the graph
    #[error("unknown model `{0}`")]
    UnknownModel(String),

    /// A model payload was not a JSON object
    #[error("expected a JSON object for model `{0}`")]
    NotAnObject(String),

    /// A required property was absent
    #[error("model `{model}` is missing required property `{property}`")]
    MissingProperty {
        /// Model name
        model: String,
        /// Client property name
        property: String,
    },

    /// A closed enum received a literal outside its member set
    #[error("`{value}` is not a member of enum `{enum_name}`")]
    UnknownEnumValue {
        /// Enum name
        enum_name: String,
        /// Offending literal
        value: String,
    },

    /// A value did not match its declared type
    #[error("invalid value at `{path}`: expected {expected}")]
    InvalidValue {
        /// Dotted property path
        path: String,
        /// Expected shape
        expected: String,
    },
}

/// A dynamic instance of a mapped model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelInstance {
    /// Model name
    pub model: String,
    /// Property values keyed by client property name
    pub values: BTreeMap<String, Value>,
}

impl ModelInstance {
    /// Create an instance with no values
    pub fn new(model: impl Into<String>) -> Self { Self { model: model.into(), values: BTreeMap::new() } }

    /// Set a property value
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(property.into(), value.into());
        self
    }
}

impl ClientModelGraph {
    /// Serialize an instance to its wire JSON, base properties first
    pub fn serialize_instance(&self, instance: &ModelInstance) -> Result<Value, CodecError> {
        let (index, model) = self
            .model_by_name(&instance.model)
            .ok_or_else(|| CodecError::UnknownModel(instance.model.clone()))?;

        let mut out = Map::new();
        for prop in self.all_properties(index) {
            let path = format!("{}.{}", model.name, prop.name);
            let value = if prop.is_discriminator {
                model
                    .discriminator_value
                    .clone()
                    .map(Value::String)
                    .or_else(|| instance.values.get(&prop.name).cloned())
            } else {
                instance.values.get(&prop.name).filter(|v| !v.is_null()).cloned()
            };
            match value {
                Some(v) => {
                    self.check_value(&prop.client_type, &v, &path)?;
                    out.insert(prop.serialized_name.clone(), v);
                }
                None if prop.required => {
                    return Err(CodecError::MissingProperty {
                        model: model.name.clone(),
                        property: prop.name.clone(),
                    })
                }
                None => {}
            }
        }
        Ok(Value::Object(out))
    }

    /// Deserialize wire JSON as `model_name`, selecting the most derived subtype
    /// named by the discriminator. Unknown literals fall back to `model_name`.
    pub fn deserialize_instance(&self, model_name: &str, json: &Value) -> Result<ModelInstance, CodecError> {
        let (index, _) = self
            .model_by_name(model_name)
            .ok_or_else(|| CodecError::UnknownModel(model_name.to_string()))?;
        let object = json.as_object().ok_or_else(|| CodecError::NotAnObject(model_name.to_string()))?;

        let selected = self.select_subtype(index, object);
        let model = &self.models[selected];
        let mut instance = ModelInstance::new(model.name.clone());
        for prop in self.all_properties(selected) {
            if prop.is_discriminator {
                continue;
            }
            let path = format!("{}.{}", model.name, prop.name);
            match object.get(&prop.serialized_name).filter(|v| !v.is_null()) {
                Some(v) => {
                    self.check_value(&prop.client_type, v, &path)?;
                    instance.values.insert(prop.name.clone(), v.clone());
                }
                None if prop.required => {
                    return Err(CodecError::MissingProperty {
                        model: model.name.clone(),
                        property: prop.name.clone(),
                    })
                }
                None => {}
            }
        }
        Ok(instance)
    }

    fn select_subtype(&self, index: usize, object: &Map<String, Value>) -> usize {
        let Some(discriminator) = self.models[index].discriminator.as_deref() else { return index };
        let Some(literal) = object.get(discriminator).and_then(Value::as_str) else { return index };
        std::iter::once(index)
            .chain(self.descendants(index))
            .find(|&i| self.models[i].discriminator_value.as_deref() == Some(literal))
            .unwrap_or(index)
    }

    fn check_value(&self, ty: &IType, value: &Value, path: &str) -> Result<(), CodecError> {
        let invalid = |expected: &str| CodecError::InvalidValue { path: path.to_string(), expected: expected.to_string() };
        match ty {
            IType::Primitive(p) => {
                let ok = match p {
                    PrimitiveType::Boolean => value.is_boolean(),
                    PrimitiveType::Int32 | PrimitiveType::Int64 => value.is_i64() || value.is_u64(),
                    PrimitiveType::Float32 | PrimitiveType::Float64 => value.is_number(),
                    _ => value.is_string(),
                };
                if ok {
                    Ok(())
                } else {
                    Err(invalid(&format!("{:?}", p)))
                }
            }
            IType::Enum(r) => {
                let Some(enum_type) = self.enum_type(r) else { return Err(invalid(&r.name)) };
                let literal = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return Err(invalid(&enum_type.name)),
                };
                if enum_type.accepts(&literal) {
                    Ok(())
                } else {
                    Err(CodecError::UnknownEnumValue { enum_name: enum_type.name.clone(), value: literal })
                }
            }
            IType::Model(r) => {
                self.deserialize_instance(&r.name, value)?;
                Ok(())
            }
            IType::List(inner) => {
                let items = value.as_array().ok_or_else(|| invalid("array"))?;
                for (i, item) in items.iter().enumerate() {
                    self.check_value(inner, item, &format!("{}[{}]", path, i))?;
                }
                Ok(())
            }
            IType::Map(inner) => {
                let entries = value.as_object().ok_or_else(|| invalid("object"))?;
                for (key, item) in entries {
                    self.check_value(inner, item, &format!("{}.{}", path, key))?;
                }
                Ok(())
            }
            IType::Binary | IType::Any => Ok(()),
        }
    }
}
