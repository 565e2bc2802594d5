//! Crate root and module index files

use types::ClientModelGraph;

use crate::events::{EventSink, RenderEvent};
use crate::templates::models::dispatch_name;
use crate::templates::module_name;

/// `src/lib.rs` of the generated library
pub(crate) fn render_lib<S: EventSink>(sink: &mut S, graph: &ClientModelGraph) {
    sink.emit(RenderEvent::FileDoc(format!("Client library for `{}`", graph.namespace)));
    sink.emit(RenderEvent::FileDoc(String::new()));
    sink.emit(RenderEvent::FileDoc("Generated code; edits are overwritten on the next run.".to_string()));
    sink.line("#![allow(clippy::all)]");
    sink.blank();
    sink.line("pub mod clients;");
    sink.line("pub mod models;");
    let mut exported: Vec<&str> = graph.clients.iter().flat_map(|c| [c.name.as_str(), c.builder_name.as_str()]).collect();
    exported.sort_unstable();
    if !exported.is_empty() {
        sink.blank();
        sink.line(format!("pub use clients::{{{}}};", exported.join(", ")));
    }
}

/// `src/models/mod.rs`: one private module per model and enum, re-exported
pub(crate) fn render_models_index<S: EventSink>(sink: &mut S, graph: &ClientModelGraph) {
    sink.emit(RenderEvent::FileDoc("Models and enums".to_string()));
    let models = graph.models.iter().map(|m| {
        let mut exported = vec![m.name.clone()];
        if !m.derived.is_empty() {
            exported.push(dispatch_name(m));
            exported.sort();
        }
        (module_name(&m.name), exported)
    });
    let enums = graph.enums.iter().map(|e| (module_name(&e.name), vec![e.name.clone()]));
    render_index(sink, models.chain(enums).collect());
}

/// `src/clients/mod.rs`
pub(crate) fn render_clients_index<S: EventSink>(sink: &mut S, graph: &ClientModelGraph) {
    sink.emit(RenderEvent::FileDoc("Service clients".to_string()));
    let entries = graph
        .clients
        .iter()
        .map(|c| {
            let mut exported = vec![c.name.clone(), c.builder_name.clone()];
            exported.extend(c.method_groups.iter().filter(|g| !g.is_client_level()).map(|g| g.type_name.clone()));
            exported.sort();
            (module_name(&c.name), exported)
        })
        .collect();
    render_index(sink, entries);
}

fn render_index<S: EventSink>(sink: &mut S, mut entries: Vec<(String, Vec<String>)>) {
    entries.sort();
    for (module, _) in &entries {
        sink.line(format!("mod {};", module));
    }
    if !entries.is_empty() {
        sink.blank();
    }
    for (module, exported) in &entries {
        match exported.as_slice() {
            [one] => sink.line(format!("pub use {}::{};", module, one)),
            many => sink.line(format!("pub use {}::{{{}}};", module, many.join(", "))),
        }
    }
}
