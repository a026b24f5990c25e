//! Detects the closed set of cell-magic / comment-marker tokens the master
//! notebook markup language recognizes (spec.md §4.2 table, §9 "Dynamic
//! magic-based authoring DSL" redesign note: modeled as an explicit tagged
//! variant rather than re-parsed ad hoc at every use site).

/// The kind of a code cell, determined from its first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeCellKind {
    MasterOnly,
    Solution,
    StudentTest { name: String },
    InlineTest { name: String },
    Template { name: String },
    Plain,
}

fn first_line(source: &str) -> &str {
    source.lines().next().unwrap_or("").trim()
}

/// Strips the first line (the magic/marker) from a cell's source, if there
/// is one, returning the remaining body.
pub fn strip_first_line(source: &str) -> String {
    match source.find('\n') {
        Some(idx) => source[idx + 1..].to_string(),
        None => String::new(),
    }
}

fn magic_name(line: &str, magic: &str) -> Option<String> {
    line.strip_prefix(magic)
        .map(|rest| rest.trim().to_string())
        .filter(|name| !name.is_empty())
}

pub fn classify_code_cell(source: &str) -> CodeCellKind {
    let line = first_line(source);

    if line == "# MASTER ONLY" {
        return CodeCellKind::MasterOnly;
    }
    if line.starts_with("%%solution") {
        return CodeCellKind::Solution;
    }
    if let Some(name) = magic_name(line, "%%studenttest") {
        return CodeCellKind::StudentTest { name };
    }
    if let Some(name) = magic_name(line, "%%inlinetest") {
        return CodeCellKind::InlineTest { name };
    }
    if let Some(name) = magic_name(line, "%%template") {
        return CodeCellKind::Template { name };
    }
    CodeCellKind::Plain
}

pub fn is_master_only(source: &str) -> bool {
    first_line(source) == "# MASTER ONLY"
}

/// Strips every standalone `# TEST` marker line from a source, used only in
/// student mode (spec.md §4.2 table, last row).
pub fn strip_test_markers(source: &str) -> String {
    source
        .lines()
        .filter(|l| l.trim() != "# TEST")
        .collect::<Vec<_>>()
        .join("\n")
        + if source.ends_with('\n') { "\n" } else { "" }
}

/// Finds a `**lang:xx**` tag anywhere in markdown source. Returns the
/// two-letter code and the source with the tag removed.
pub fn extract_language_tag(source: &str) -> (Option<String>, String) {
    if let Some(start) = source.find("**lang:") {
        let after = &source[start + "**lang:".len()..];
        if after.len() >= 4 && &after[2..4] == "**" {
            let code = after[..2].to_string();
            let end = start + "**lang:".len() + 4;
            let stripped = format!("{}{}", &source[..start], &source[end..]);
            return (Some(code), stripped);
        }
    }
    (None, source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_magics() {
        assert_eq!(classify_code_cell("# MASTER ONLY\nx = 1"), CodeCellKind::MasterOnly);
        assert_eq!(classify_code_cell("%%solution\nx = 1"), CodeCellKind::Solution);
        assert_eq!(
            classify_code_cell("%%studenttest Basic\nassert True"),
            CodeCellKind::StudentTest { name: "Basic".into() }
        );
        assert_eq!(
            classify_code_cell("%%inlinetest Basic\nassert True"),
            CodeCellKind::InlineTest { name: "Basic".into() }
        );
        assert_eq!(
            classify_code_cell("%%template Report\n<p>{{results}}</p>"),
            CodeCellKind::Template { name: "Report".into() }
        );
        assert_eq!(classify_code_cell("x = 1\ny = 2"), CodeCellKind::Plain);
    }

    #[test]
    fn strips_test_marker_lines_only() {
        let src = "x = 1\n# TEST\ny = 2\n";
        assert_eq!(strip_test_markers(src), "x = 1\ny = 2\n");
    }

    #[test]
    fn extracts_language_tag() {
        let (lang, stripped) = extract_language_tag("**lang:fr** Bonjour");
        assert_eq!(lang.as_deref(), Some("fr"));
        assert_eq!(stripped, " Bonjour");
    }
}
