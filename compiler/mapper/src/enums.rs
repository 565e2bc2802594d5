//! Enum schemas to enum types

use ir::{EnumOpenness, ModelError, SchemaGraph, SchemaId, SchemaKind};
use tracing::trace;
use types::naming::{identifier, NameKind, NameRegistry, NameStyle};
use types::model::UNKNOWN_MEMBER;
use types::{EnumMember, EnumType, IType};

use crate::{primitive, MapperRegistry, Result};

impl MapperRegistry {
    pub(crate) fn fill_enum(&mut self, graph: &SchemaGraph, id: SchemaId, index: usize) -> Result<()> {
        let schema = graph.get(id);
        let path = schema.path();
        let SchemaKind::Enum(enumeration) = &schema.kind else {
            return Err(ModelError::unsupported(path, "expected an enum schema"));
        };
        let value_type = match primitive(enumeration.value_type) {
            IType::Primitive(p) => p,
            _ => return Err(ModelError::unsupported(path, "binary enums are not supported")),
        };
        let expandable = enumeration.openness == EnumOpenness::Extensible;

        let mut names = NameRegistry::new(NameStyle::Pascal);
        if expandable {
            names.reserve(UNKNOWN_MEMBER);
        }
        let mut members: Vec<EnumMember> = Vec::with_capacity(enumeration.choices.len());
        for choice in &enumeration.choices {
            if members.iter().any(|m| m.value == choice.value) {
                continue;
            }
            let base = identifier(&choice.name, NameKind::EnumMember);
            let name = names.claim(&base, &format!("{}/choices/{}", path, choice.value))?;
            members.push(EnumMember { name, value: choice.value.clone(), description: choice.description.clone() });
        }

        let Some(target) = self.enums.get_mut(index) else {
            return Err(ModelError::validation(path, "enum placeholder was never allocated"));
        };
        target.description = schema.description.clone();
        target.value_type = value_type;
        target.expandable = expandable;
        target.members = members;
        target.accessor = EnumType::accessor_for(value_type, expandable);
        target.synthesized = schema.synthesized;
        trace!(enum_name = %target.name, members = target.members.len(), "filled enum");
        Ok(())
    }
}
