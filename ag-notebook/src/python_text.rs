//! Small helpers for rendering Python-source fragments that other crates
//! (the markup transformer's `empty_source.py`, the grading engine's
//! `submission_source.py`) need to write next to a notebook's cell text.

/// Wraps `text` as `source = """…"""`, escaping any inner triple-quote
/// sequence and inserting a trailing newline when the text ends in a quote
/// so the closing fence never collapses into four quotes in a row
/// (spec.md §4.5b).
pub fn wrap_as_source_assignment(text: &str) -> String {
    let mut escaped = text.replace("\"\"\"", "\\\"\\\"\\\"");
    if escaped.ends_with('"') {
        escaped.push('\n');
    }
    format!("source = \"\"\"{escaped}\"\"\"\n")
}
