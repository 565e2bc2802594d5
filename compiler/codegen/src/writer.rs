//! Text emission for render events

use std::collections::BTreeSet;

use crate::events::{EventSink, RenderEvent};
use crate::utils::clean_generated_source;

const INDENT: &str = "    ";

/// Sink that renders events as Rust source.
///
/// Imports are collected across the whole file and emitted once, sorted,
/// after the file docs.
#[derive(Debug, Default)]
pub struct CodeWriter {
    docs: Vec<String>,
    imports: BTreeSet<String>,
    body: Vec<String>,
    depth: usize,
}

impl CodeWriter {
    /// Create an empty writer
    pub fn new() -> Self { Self::default() }

    /// Current nesting depth
    pub fn depth(&self) -> usize { self.depth }

    fn push(&mut self, text: &str) {
        let indent = INDENT.repeat(self.depth);
        self.body.push(format!("{}{}", indent, text));
    }

    /// Assemble the file
    pub fn finish(self) -> String {
        let mut out = String::new();
        for doc in &self.docs {
            out.push_str(&format!("//! {}\n", doc).replace("//! \n", "//!\n"));
        }
        if !self.docs.is_empty() {
            out.push('\n');
        }
        for import in &self.imports {
            out.push_str(&format!("use {};\n", import));
        }
        if !self.imports.is_empty() {
            out.push('\n');
        }
        for line in &self.body {
            out.push_str(line);
            out.push('\n');
        }
        clean_generated_source(&out)
    }
}

impl EventSink for CodeWriter {
    fn emit(&mut self, event: RenderEvent) {
        match event {
            RenderEvent::FileDoc(text) => self.docs.push(text),
            RenderEvent::Import(path) => {
                self.imports.insert(path);
            }
            RenderEvent::Line(text) => self.push(&text),
            RenderEvent::Open(text) => {
                self.push(&text);
                self.depth += 1;
            }
            RenderEvent::Close(text) => {
                if self.body.last().is_some_and(String::is_empty) {
                    self.body.pop();
                }
                self.depth = self.depth.saturating_sub(1);
                self.push(&text);
            }
            RenderEvent::Blank => {
                // Collapse runs of separators and drop ones directly inside a block opener.
                let after_open = self.body.last().is_some_and(|l| l.ends_with('{') || l.ends_with('('));
                if !after_open && self.body.last().is_some_and(|l| !l.is_empty()) {
                    self.body.push(String::new());
                }
            }
        }
    }
}
