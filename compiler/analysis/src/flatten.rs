//! Flatten Marking
//!
//! Validates properties marked for flattening and marks their target objects.
//! Flattening a polymorphic object would lose the discriminator, so it is
//! disabled with a warning; so is flattening anything that is not an object.

use std::collections::BTreeSet;

use ir::SchemaKind;
use tracing::{debug, warn};

use crate::{CompilerContext, CompilerPhase, PhaseResult};

/// Marks flatten targets and drops impossible flatten requests
pub struct FlattenMarker;

impl Default for FlattenMarker {
    fn default() -> Self { Self::new() }
}

impl FlattenMarker {
    /// Create a new flatten marker
    pub fn new() -> Self { Self }
}

impl CompilerPhase for FlattenMarker {
    fn name(&self) -> &str { "FlattenMarker" }

    fn description(&self) -> &str { "Mark flattened objects and disable unsupported flattening" }

    fn run(&self, ctx: &mut CompilerContext) -> PhaseResult {
        if !ctx.settings.flatten_client_flattened_properties {
            debug!("flattening disabled by settings");
            return Ok(());
        }

        let mut disabled = Vec::new();
        let mut targets = BTreeSet::new();
        for schema in &ctx.model.schemas {
            let Some(object) = schema.as_object() else { continue };
            for (index, property) in object.properties.iter().enumerate() {
                if !property.flatten {
                    continue;
                }
                let path = format!("{}/properties/{}", schema.path(), property.name);
                match ctx.model.schema(property.schema.key()).map(|s| &s.kind) {
                    Some(SchemaKind::Object(target)) if target.is_polymorphic() => {
                        disabled.push((schema.key.clone(), index, format!("{}: cannot flatten a polymorphic object", path)));
                    }
                    Some(SchemaKind::Object(_)) => {
                        targets.insert(property.schema.key().to_string());
                    }
                    _ => {
                        disabled.push((schema.key.clone(), index, format!("{}: only objects can be flattened", path)));
                    }
                }
            }
        }

        for (key, index, message) in disabled {
            warn!("{}; flatten disabled", message);
            ctx.add_warning(message);
            let owner = ctx.model.schemas.iter_mut().find(|s| s.key == key);
            if let Some(SchemaKind::Object(object)) = owner.map(|s| &mut s.kind) {
                if let Some(property) = object.properties.get_mut(index) {
                    property.flatten = false;
                }
            }
        }

        let mut marked = 0;
        for schema in &mut ctx.model.schemas {
            if let SchemaKind::Object(object) = &mut schema.kind {
                if targets.contains(&schema.key) && !object.flattened {
                    object.flattened = true;
                    marked += 1;
                }
            }
        }
        debug!(marked, "marked flattened objects");
        ctx.count("flattened_objects", marked);
        Ok(())
    }
}
