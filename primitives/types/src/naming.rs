//! Naming rules for generated identifiers
//!
//! Raw names from the code model are split into words, recased, and escaped
//! when they would clash with a Rust keyword or a prelude type. Collisions
//! inside one namespace are settled by [`NameRegistry`].

use std::collections::BTreeMap;

use ir::ModelError;

/// Rust keywords, strict and reserved
pub const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "self",
    "static", "struct", "super", "trait", "true", "try", "type", "typeof", "union", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Type names generated code must not shadow
pub const RESERVED_TYPE_NAMES: &[&str] =
    &["Self", "Option", "Result", "String", "Vec", "Box", "Some", "None", "Ok", "Err", "Response", "Value"];

/// What an identifier names; selects the escape suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// Model or enum type
    Model,
    /// Client or method group type
    Client,
    /// Model property
    Property,
    /// Method parameter
    Parameter,
    /// Client method
    Method,
    /// Operation (proxy)
    Operation,
    /// Enum member
    EnumMember,
}

impl NameKind {
    fn suffix(&self) -> &'static str {
        match self {
            NameKind::Model => "Model",
            NameKind::Client => "Client",
            NameKind::Property => "Property",
            NameKind::Parameter => "Parameter",
            NameKind::Method => "Method",
            NameKind::Operation => "Operation",
            NameKind::EnumMember => "Value",
        }
    }

    fn style(&self) -> NameStyle {
        match self {
            NameKind::Model | NameKind::Client | NameKind::EnumMember => NameStyle::Pascal,
            _ => NameStyle::Snake,
        }
    }
}

/// Case style of a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// `PascalCase`
    Pascal,
    /// `snake_case`
    Snake,
}

/// Split a raw name into words at case changes and non-alphanumeric characters
pub fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() && c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Capitalize the first letter of a string
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Convert any raw name to snake_case
pub fn to_snake_case(input: &str) -> String {
    split_words(input).iter().map(|w| w.to_lowercase()).collect::<Vec<_>>().join("_")
}

/// Convert any raw name to PascalCase
pub fn to_pascal_case(input: &str) -> String {
    split_words(input).iter().map(|w| capitalize(&w.to_lowercase())).collect()
}

/// Recase a raw name for `kind` and escape it when it is reserved
pub fn identifier(raw: &str, kind: NameKind) -> String {
    let style = kind.style();
    let mut name = match style {
        NameStyle::Pascal => to_pascal_case(raw),
        NameStyle::Snake => to_snake_case(raw),
    };
    if name.is_empty() {
        name = match style {
            NameStyle::Pascal => "Empty".to_string(),
            NameStyle::Snake => "empty".to_string(),
        };
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name = match style {
            NameStyle::Pascal => format!("V{}", name),
            NameStyle::Snake => format!("v{}", name),
        };
    }
    escape_reserved(&name, kind)
}

/// Escape a recased name if it is a keyword or reserved type name
pub fn escape_reserved(name: &str, kind: NameKind) -> String {
    match kind.style() {
        NameStyle::Pascal if RESERVED_TYPE_NAMES.contains(&name) => format!("{}{}", name, kind.suffix()),
        NameStyle::Snake if RUST_KEYWORDS.contains(&name) =>
            format!("{}_{}", name, kind.suffix().to_lowercase()),
        _ => name.to_string(),
    }
}

/// Identity path segments that describe structure rather than naming
const STRUCTURAL_SEGMENTS: &[&str] =
    &["schemas", "properties", "parameters", "operationGroups", "operations", "clients", "choices"];

/// Claims names within one namespace.
///
/// The first claim of a name keeps it. A later claim is suffixed with the
/// words of its identity path that are not already part of the name
/// (`schemas/storage.Error` claiming `Error` becomes `ErrorStorage`). If the
/// path offers no such words, or the suffixed name is taken too, the claim
/// fails with [`ModelError::NameCollision`].
#[derive(Debug, Clone)]
pub struct NameRegistry {
    style: NameStyle,
    taken: BTreeMap<String, String>,
}

impl NameRegistry {
    /// Create an empty registry
    pub fn new(style: NameStyle) -> Self { Self { style, taken: BTreeMap::new() } }

    /// Whether a name is taken
    pub fn is_taken(&self, name: &str) -> bool { self.taken.contains_key(name) }

    /// Take a name unconditionally (for fixed, generator-owned identifiers)
    pub fn reserve(&mut self, name: impl Into<String>) { self.taken.insert(name.into(), String::new()); }

    /// Path that claimed a name
    pub fn owner(&self, name: &str) -> Option<&str> { self.taken.get(name).map(String::as_str) }

    /// Claim `base` for the declaration at `origin_path`
    pub fn claim(&mut self, base: &str, origin_path: &str) -> Result<String, ModelError> {
        if !self.taken.contains_key(base) {
            self.taken.insert(base.to_string(), origin_path.to_string());
            return Ok(base.to_string());
        }

        let collision = || ModelError::NameCollision { name: base.to_string(), path: origin_path.to_string() };
        let suffix = self.path_suffix(base, origin_path);
        if suffix.is_empty() {
            return Err(collision());
        }
        let candidate = match self.style {
            NameStyle::Pascal => format!("{}{}", base, suffix),
            NameStyle::Snake => format!("{}_{}", base, suffix),
        };
        if self.taken.contains_key(&candidate) {
            return Err(collision());
        }
        self.taken.insert(candidate.clone(), origin_path.to_string());
        Ok(candidate)
    }

    fn path_suffix(&self, base: &str, origin_path: &str) -> String {
        let base_words: Vec<String> = split_words(base).iter().map(|w| w.to_lowercase()).collect();
        let words: Vec<String> = origin_path
            .split('/')
            .filter(|segment| !STRUCTURAL_SEGMENTS.contains(segment))
            .flat_map(split_words)
            .map(|w| w.to_lowercase())
            .filter(|w| !base_words.contains(w))
            .collect();
        match self.style {
            NameStyle::Pascal => words.iter().map(|w| capitalize(w)).collect(),
            NameStyle::Snake => words.join("_"),
        }
    }
}
