//! Doc comment emission

use crate::events::EventSink;

/// Sanitize a line for use in Rust doc comments
pub fn sanitize_doc_line(line: &str) -> String {
    let mut result = String::new();
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            // Unbalanced backticks would swallow the rest of the doc block
            '`' if line.matches('`').count() % 2 == 1 => result.push('\''),
            '\\' => {
                if chars.peek() == Some(&'\\') {
                    chars.next();
                }
                result.push_str("\\\\");
            }
            '\t' => result.push_str("    "),
            _ => result.push(ch),
        }
    }

    result
}

/// Doc comment lines for free text, one per non-empty input line.
///
/// Consecutive paragraphs are separated by a bare `///`.
pub fn doc_lines(description: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending_break = false;
    for line in description.lines() {
        let line = line.trim();
        if line.is_empty() {
            pending_break = !lines.is_empty();
            continue;
        }
        if pending_break {
            lines.push("///".to_string());
            pending_break = false;
        }
        lines.push(format!("/// {}", sanitize_doc_line(line)));
    }
    lines
}

/// Emit `description`, or `fallback` when it is empty
pub fn emit_docs<S: EventSink>(sink: &mut S, description: &str, fallback: &str) {
    let text = if description.trim().is_empty() { fallback } else { description };
    for line in doc_lines(text) {
        sink.line(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_lines_keep_paragraphs() {
        assert_eq!(
            doc_lines("  First line.\n\n\nSecond paragraph.  "),
            vec!["/// First line.".to_string(), "///".to_string(), "/// Second paragraph.".to_string()]
        );
        assert!(doc_lines("   \n").is_empty());
    }

    #[test]
    fn test_sanitize_doc_line() {
        assert_eq!(sanitize_doc_line("uses `name`"), "uses `name`");
        assert_eq!(sanitize_doc_line("dangling ` tick"), "dangling ' tick");
        assert_eq!(sanitize_doc_line("a\\b"), "a\\\\b");
    }
}
