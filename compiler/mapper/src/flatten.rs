//! Lifting flattened properties onto their owners

use tracing::debug;
use types::{ClientModel, ClientModelGraph, ClientModelProperty, FlattenedProperty};

use crate::PendingFlatten;

/// Expose the properties of each flattened nested model on its owner.
///
/// Flattened carriers inside the nested model are followed as well, so an
/// owner sees every level at once; `via` then holds the dot-separated chain of
/// carriers. A lifted name that clashes with an owner property or an earlier
/// lifted one is prefixed with that chain.
pub(crate) fn lift(models: &mut [ClientModel], pending: &[PendingFlatten]) {
    let snapshot = ClientModelGraph { models: models.to_vec(), ..Default::default() };

    for request in pending {
        let mut reached = Vec::new();
        reach(&snapshot, pending, request, request.via.clone(), &mut vec![request.owner], &mut reached);
        if reached.is_empty() {
            continue;
        }
        let owner_names: Vec<String> =
            snapshot.all_properties(request.owner).iter().map(|p| p.name.clone()).collect();

        let Some(owner) = models.get_mut(request.owner) else { continue };
        for (via, property) in reached {
            let mut lifted = property.clone();
            let taken = owner_names.contains(&lifted.name) || owner.flattened.iter().any(|f| f.property.name == lifted.name);
            if taken {
                lifted.name = format!("{}_{}", via.replace('.', "_"), lifted.name);
            }
            owner.flattened.push(FlattenedProperty { via, property: lifted });
        }
        debug!(owner = %owner.name, via = %request.via, lifted = owner.flattened.len(), "lifted flattened properties");
    }
}

/// Collect the properties visible through `request`, descending into nested
/// carriers until none are left. `visited` holds the models on the current
/// chain and stops flatten cycles.
fn reach<'a>(
    snapshot: &'a ClientModelGraph,
    pending: &[PendingFlatten],
    request: &PendingFlatten,
    via: String,
    visited: &mut Vec<usize>,
    out: &mut Vec<(String, &'a ClientModelProperty)>,
) {
    let Some(target) = request.target.as_model() else { return };
    let Some(nested) = snapshot.models.get(target.index) else { return };
    if nested.is_polymorphic() || visited.contains(&target.index) {
        return;
    }
    out.extend(snapshot.all_properties(target.index).into_iter().map(|p| (via.clone(), p)));

    visited.push(target.index);
    let lineage = snapshot.lineage(target.index);
    for inner in pending.iter().filter(|p| lineage.contains(&p.owner)) {
        reach(snapshot, pending, inner, format!("{}.{}", via, inner.via), visited, out);
    }
    visited.pop();
}
