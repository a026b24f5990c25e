//! `# BEGIN UNITTEST` / `# END UNITTEST` extraction (spec.md §4.2 table).

use crate::error::MarkupError;

const BEGIN: &str = "# BEGIN UNITTEST";
const END: &str = "# END UNITTEST";

pub struct UnitTestBlock {
    pub class_name: String,
    pub file_contents: String,
}

/// Finds every `# BEGIN UNITTEST` / `# END UNITTEST` span in a cell's
/// source and turns each into a `<ClassName>.py` file body.
pub fn extract_unittest_blocks(source: &str) -> Result<Vec<UnitTestBlock>, MarkupError> {
    let lines: Vec<&str> = source.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim() == BEGIN {
            let end_offset = lines[i + 1..]
                .iter()
                .position(|l| l.trim() == END)
                .ok_or(MarkupError::UnterminatedUnitTestBlock)?;
            let end = i + 1 + end_offset;
            blocks.push(build_block(&lines[i + 1..end])?);
            i = end + 1;
        } else {
            i += 1;
        }
    }
    Ok(blocks)
}

fn uncomment_import(line: &str) -> Option<String> {
    let leading_ws: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    let rest = line.trim_start();
    let after_hash = rest.strip_prefix('#')?;
    let after_ws = after_hash.trim_start();
    let module = after_ws.strip_prefix("import ")?;
    Some(format!("{leading_ws}import {}", module.trim_start()))
}

fn build_block(body_lines: &[&str]) -> Result<UnitTestBlock, MarkupError> {
    let class_name = body_lines
        .iter()
        .find_map(|l| {
            let trimmed = l.trim_start();
            if trimmed.starts_with("class ") && trimmed.contains("(unittest.TestCase)") {
                let rest = trimmed.strip_prefix("class ")?;
                Some(rest.split('(').next()?.trim().to_string())
            } else {
                None
            }
        })
        .ok_or(MarkupError::MissingUnitTestClass)?;

    let mut imports = Vec::new();
    let mut rest_lines = Vec::new();
    for line in body_lines {
        match uncomment_import(line) {
            Some(imported) => imports.push(imported),
            None => rest_lines.push(*line),
        }
    }

    let mut out = String::new();
    for imp in &imports {
        out.push_str(imp);
        out.push('\n');
    }
    if !imports.is_empty() {
        out.push('\n');
    }
    out.push_str(&rest_lines.join("\n"));
    out.push('\n');

    Ok(UnitTestBlock {
        class_name,
        file_contents: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_name_and_promotes_imports() {
        let src = "\
# BEGIN UNITTEST
import unittest
#   import submission

class FizzBuzzTest(unittest.TestCase):
    def test_one(self):
        self.assertEqual(submission.fizzbuzz(1), \"1\")
# END UNITTEST
";
        let blocks = extract_unittest_blocks(src).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].class_name, "FizzBuzzTest");
        assert!(blocks[0].file_contents.starts_with("import submission\n"));
        assert!(!blocks[0].file_contents.contains('#'));
    }

    #[test]
    fn missing_class_is_an_error() {
        let src = "# BEGIN UNITTEST\nx = 1\n# END UNITTEST\n";
        assert!(matches!(
            extract_unittest_blocks(src),
            Err(MarkupError::MissingUnitTestClass)
        ));
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let src = "# BEGIN UNITTEST\nclass X(unittest.TestCase):\n    pass\n";
        assert!(matches!(
            extract_unittest_blocks(src),
            Err(MarkupError::UnterminatedUnitTestBlock)
        ));
    }
}
