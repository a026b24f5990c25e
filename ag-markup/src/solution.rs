//! `%%solution` cell handling: BEGIN/END SOLUTION span replacement with
//! either a BEGIN/END PROMPT block or an indentation-matched `...`
//! placeholder (spec.md §4.2 table, `%%solution` row).

const BEGIN_SOLUTION: &str = "# BEGIN SOLUTION";
const END_SOLUTION: &str = "# END SOLUTION";
const BEGIN_PROMPT: &str = "# BEGIN PROMPT";
const END_PROMPT: &str = "# END PROMPT";

pub struct SolutionTransform {
    /// The cell body as a student should see it (solution span replaced).
    pub student_body: String,
    /// The replacement text alone — used for the autograder's
    /// `empty_submission.py` / `empty_source.py`.
    pub prompt: String,
}

fn indentation_of(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

fn extract_prompt(span_lines: &[&str], solution_indent: &str) -> String {
    let begin_p = span_lines.iter().position(|l| l.trim() == BEGIN_PROMPT);
    let end_p = span_lines.iter().position(|l| l.trim() == END_PROMPT);
    match (begin_p, end_p) {
        (Some(bp), Some(ep)) if ep > bp => span_lines[bp + 1..ep].join("\n"),
        _ => format!("{solution_indent}..."),
    }
}

/// Transforms a `%%solution` cell's body (magic line already stripped).
pub fn transform_solution(body: &str) -> SolutionTransform {
    let lines: Vec<&str> = body.lines().collect();
    let begin = lines.iter().position(|l| l.trim() == BEGIN_SOLUTION);
    let end = lines.iter().rposition(|l| l.trim() == END_SOLUTION);

    let (Some(b), Some(e)) = (begin, end) else {
        return SolutionTransform {
            student_body: "...".to_string(),
            prompt: "...".to_string(),
        };
    };
    if e <= b {
        return SolutionTransform {
            student_body: "...".to_string(),
            prompt: "...".to_string(),
        };
    }

    let indent = indentation_of(lines[b]);
    let span = &lines[b + 1..e];
    let prompt = extract_prompt(span, &indent);

    let mut out: Vec<&str> = Vec::new();
    out.extend_from_slice(&lines[..b]);
    let prompt_lines: Vec<&str> = prompt.lines().collect();
    out.extend_from_slice(&prompt_lines);
    out.extend_from_slice(&lines[e + 1..]);

    SolutionTransform {
        student_body: out.join("\n"),
        prompt,
    }
}
