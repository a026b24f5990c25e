//! Fenced metadata blocks: a ```` ``` ````-delimited block in a markdown
//! cell whose first content line is `# ASSIGNMENT METADATA` or
//! `# EXERCISE METADATA` (spec.md §4.2 table, first two rows).

use serde_json::{Map, Value};

use crate::error::MarkupError;

pub const ASSIGNMENT_MARKER: &str = "# ASSIGNMENT METADATA";
pub const EXERCISE_MARKER: &str = "# EXERCISE METADATA";

/// One fenced block found in a markdown cell.
pub struct FencedBlock {
    /// The parsed mapping, with the marker line removed.
    pub mapping: Map<String, Value>,
    /// The cell source with the fenced block (including its backtick
    /// fences) removed.
    pub remaining_source: String,
}

/// Finds the first fenced block whose first content line equals `marker`,
/// parses the rest as a YAML mapping, and strips the block from the
/// source.
pub fn extract_fenced_block(
    source: &str,
    marker: &str,
) -> Result<Option<FencedBlock>, MarkupError> {
    let mut search_from = 0usize;
    while let Some(rel_start) = source[search_from..].find("```") {
        let fence_start = search_from + rel_start;
        let after_open = fence_start + 3;
        // Skip an optional language tag on the opening fence line.
        let body_start = match source[after_open..].find('\n') {
            Some(nl) => after_open + nl + 1,
            None => break,
        };
        let Some(rel_end) = source[body_start..].find("```") else {
            break;
        };
        let fence_end = body_start + rel_end;
        let body = &source[body_start..fence_end];
        let mut lines = body.lines();
        let first = lines.next().unwrap_or("").trim();

        if first == marker {
            let yaml_body: String = lines.collect::<Vec<_>>().join("\n");
            let mapping: Map<String, Value> = if yaml_body.trim().is_empty() {
                Map::new()
            } else {
                let value: Value = serde_yaml::from_str(&yaml_body)?;
                match value {
                    Value::Object(m) => m,
                    Value::Null => Map::new(),
                    other => {
                        let mut m = Map::new();
                        m.insert("value".into(), other);
                        m
                    }
                }
            };

            let block_end = fence_end + 3;
            let remaining_source =
                format!("{}{}", &source[..fence_start], &source[block_end..]);

            return Ok(Some(FencedBlock {
                mapping,
                remaining_source,
            }));
        }

        search_from = fence_end + 3;
    }

    Ok(None)
}
